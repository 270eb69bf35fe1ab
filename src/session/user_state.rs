//! Lightweight per-chat conversation state used by the command router.

use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::intent::Intent;

/// What the router expects from the next free-text message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserState {
    pub last_command: Option<String>,
    pub last_intent: Option<Intent>,
    pub conversation_stage: Option<String>,
    pub expecting_company_name: bool,
    pub expecting_confirmation: bool,
    pub selected_company: Option<String>,
}

impl UserState {
    /// State after a plain command such as `/help`.
    pub fn after_command(command: &str) -> Self {
        Self {
            last_command: Some(command.to_string()),
            ..Self::default()
        }
    }

    pub fn with_stage(mut self, stage: &str) -> Self {
        self.conversation_stage = Some(stage.to_string());
        self
    }

    /// State after a general free-text exchange.
    pub fn general(intent: Option<Intent>) -> Self {
        Self {
            last_command: Some("general".to_string()),
            last_intent: intent,
            ..Self::default()
        }
    }

    pub fn awaiting_company_name() -> Self {
        Self {
            last_command: Some("partners".to_string()),
            expecting_company_name: true,
            ..Self::default()
        }
    }

    pub fn awaiting_confirmation(company: &str) -> Self {
        Self {
            last_command: Some("companyDetail".to_string()),
            expecting_confirmation: true,
            selected_company: Some(company.to_string()),
            ..Self::default()
        }
    }

    pub fn last_command_is(&self, command: &str) -> bool {
        self.last_command.as_deref() == Some(command)
    }
}

/// Chat id → [`UserState`]. Each router step replaces the whole record.
#[derive(Debug, Default)]
pub struct UserStateStore {
    states: RwLock<HashMap<i64, UserState>>,
}

impl UserStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state, or the empty state for an unknown chat.
    pub async fn get(&self, chat_id: i64) -> UserState {
        self.states
            .read()
            .await
            .get(&chat_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn set(&self, chat_id: i64, state: UserState) {
        self.states.write().await.insert(chat_id, state);
    }

    pub async fn clear(&self, chat_id: i64) {
        self.states.write().await.remove(&chat_id);
    }
}
