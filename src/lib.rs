//! Bunder Bot library root.

pub mod cli;
pub mod config;
pub mod error;
pub mod intent;
pub mod logging;
pub mod onboarding;
pub mod providers;
pub mod replies;
pub mod responders;
pub mod session;
pub mod telegram;

pub use cli::Commands;
pub use config::{load_settings, Settings};
pub use error::{Error, Result};
pub use providers::Provider;
pub use telegram::{run_bot, Router};
