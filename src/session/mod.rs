//! In-memory conversation state.
//!
//! - `store`: per-user sessions (onboarding progress)
//! - `user_state`: per-chat router expectations
//! - `context`: rolling message context with idle eviction

pub mod context;
pub mod store;
pub mod user_state;

pub use context::{spawn_sweeper, ContextMessage, ConversationMemory, Role};
pub use store::{OnboardingStep, Session, SessionPatch, SessionState, SessionStore};
pub use user_state::{UserState, UserStateStore};

/// Session key for a Telegram chat.
pub fn user_key(chat_id: i64) -> String {
    format!("telegram:{}", chat_id)
}
