//! Per-user session store (onboarding progress, authentication flag).

use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::onboarding::{FieldValue, OnboardingData, OnboardingField};

/// Where a user is in the authentication / onboarding lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Initial,
    Authenticating,
    Onboarding,
    OnboardingComplete,
}

/// A user's conversational session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Stable key, `telegram:<chat id>`.
    pub user_id: String,
    pub chat_id: i64,
    pub state: SessionState,
    /// Field currently being collected.
    pub current_field: Option<OnboardingField>,
    pub onboarding_data: OnboardingData,
    pub is_authenticated: bool,
}

impl Session {
    pub fn new(user_id: &str, chat_id: i64) -> Self {
        Self {
            user_id: user_id.to_string(),
            chat_id,
            state: SessionState::Initial,
            current_field: None,
            onboarding_data: OnboardingData::new(),
            is_authenticated: false,
        }
    }

    /// Onboarding is in progress and waiting for an answer.
    pub fn is_collecting(&self) -> bool {
        self.state == SessionState::Onboarding && self.current_field.is_some()
    }
}

/// Partial update merged into a stored [`Session`]. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub chat_id: Option<i64>,
    pub state: Option<SessionState>,
    /// `Some(None)` clears the current field.
    pub current_field: Option<Option<OnboardingField>>,
    pub onboarding_data: Option<OnboardingData>,
    pub is_authenticated: Option<bool>,
}

impl SessionPatch {
    pub fn state(state: SessionState) -> Self {
        Self {
            state: Some(state),
            ..Self::default()
        }
    }

    pub fn with_current_field(mut self, field: Option<OnboardingField>) -> Self {
        self.current_field = Some(field);
        self
    }

    pub fn with_data(mut self, data: OnboardingData) -> Self {
        self.onboarding_data = Some(data);
        self
    }

    fn apply(self, session: &mut Session) {
        if let Some(chat_id) = self.chat_id {
            session.chat_id = chat_id;
        }
        if let Some(state) = self.state {
            session.state = state;
        }
        if let Some(field) = self.current_field {
            session.current_field = field;
        }
        if let Some(data) = self.onboarding_data {
            session.onboarding_data = data;
        }
        if let Some(authenticated) = self.is_authenticated {
            session.is_authenticated = authenticated;
        }
    }
}

/// Result of feeding one answer into the onboarding flow.
#[derive(Debug, Clone, PartialEq)]
pub enum OnboardingStep {
    /// Answer accepted; ask for the next field.
    Next(OnboardingField),
    /// Answer rejected; the same field stays current.
    Invalid {
        field: OnboardingField,
        message: String,
    },
    /// The last field was accepted.
    Complete(OnboardingData),
    /// The session is not collecting onboarding answers.
    NotOnboarding,
}

/// In-memory session map. Entries live until cleared or the process exits.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the session for `user_id`, creating a fresh one if absent.
    pub async fn get_or_create(&self, user_id: &str, chat_id: i64) -> Session {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(user_id.to_string())
            .or_insert_with(|| {
                tracing::debug!("Creating session for {}", user_id);
                Session::new(user_id, chat_id)
            })
            .clone()
    }

    pub async fn get(&self, user_id: &str) -> Option<Session> {
        self.sessions.read().await.get(user_id).cloned()
    }

    /// Merge `patch` into the stored session.
    pub async fn update(&self, user_id: &str, patch: SessionPatch) -> Result<Session> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(user_id)
            .ok_or_else(|| Error::SessionNotFound(user_id.to_string()))?;
        patch.apply(session);
        Ok(session.clone())
    }

    pub async fn clear(&self, user_id: &str) {
        if self.sessions.write().await.remove(user_id).is_some() {
            tracing::debug!("Cleared session for {}", user_id);
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Put the session into onboarding at the first field.
    pub async fn start_onboarding(&self, user_id: &str, chat_id: i64) -> Result<OnboardingField> {
        self.get_or_create(user_id, chat_id).await;
        let first = OnboardingField::next(None)
            .ok_or_else(|| Error::Other("No onboarding fields configured".to_string()))?;
        self.update(
            user_id,
            SessionPatch::state(SessionState::Onboarding)
                .with_current_field(Some(first))
                .with_data(OnboardingData::new()),
        )
        .await?;
        Ok(first)
    }

    /// Validate `answer` for the current field and advance on success.
    pub async fn submit_answer(&self, user_id: &str, answer: &str) -> Result<OnboardingStep> {
        let session = self
            .get(user_id)
            .await
            .ok_or_else(|| Error::SessionNotFound(user_id.to_string()))?;

        let field = match (session.state, session.current_field) {
            (SessionState::Onboarding, Some(field)) => field,
            _ => return Ok(OnboardingStep::NotOnboarding),
        };

        let value: FieldValue = match field.validate(answer) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!("Rejected {} for {}: {}", field, user_id, e);
                return Ok(OnboardingStep::Invalid {
                    field,
                    message: e.user_message(),
                });
            }
        };

        let mut data = session.onboarding_data;
        data.insert(field, value);

        match OnboardingField::next(Some(field)) {
            Some(next) => {
                self.update(
                    user_id,
                    SessionPatch::default()
                        .with_data(data)
                        .with_current_field(Some(next)),
                )
                .await?;
                Ok(OnboardingStep::Next(next))
            }
            None => {
                self.update(
                    user_id,
                    SessionPatch::state(SessionState::OnboardingComplete)
                        .with_data(data.clone())
                        .with_current_field(None),
                )
                .await?;
                tracing::info!("Onboarding complete for {}", user_id);
                Ok(OnboardingStep::Complete(data))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let store = SessionStore::new();
        let first = store.get_or_create("telegram:1", 1).await;
        let second = store.get_or_create("telegram:1", 1).await;

        assert_eq!(first, second);
        assert_eq!(first.state, SessionState::Initial);
        assert!(first.onboarding_data.is_empty());
        assert!(!first.is_authenticated);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_merges_only_patched_keys() {
        let store = SessionStore::new();
        let before = store.get_or_create("telegram:2", 2).await;

        let after = store
            .update("telegram:2", SessionPatch::state(SessionState::OnboardingComplete))
            .await
            .unwrap();

        assert_eq!(after.state, SessionState::OnboardingComplete);
        assert_eq!(after.chat_id, before.chat_id);
        assert_eq!(after.current_field, before.current_field);
        assert_eq!(after.onboarding_data, before.onboarding_data);
        assert_eq!(after.is_authenticated, before.is_authenticated);
        assert_eq!(store.get("telegram:2").await, Some(after));
    }

    #[tokio::test]
    async fn test_update_missing_session_fails() {
        let store = SessionStore::new();
        let err = store
            .update("telegram:404", SessionPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::SessionNotFound(id) if id == "telegram:404"));
    }

    #[tokio::test]
    async fn test_clear_removes_session() {
        let store = SessionStore::new();
        store.get_or_create("telegram:3", 3).await;
        store.clear("telegram:3").await;
        assert!(store.get("telegram:3").await.is_none());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_onboarding_walks_every_field() {
        let store = SessionStore::new();
        let first = store.start_onboarding("telegram:4", 4).await.unwrap();
        assert_eq!(first, OnboardingField::CompanyName);

        let answers = [
            "Acme",
            "https://www.linkedin.com/company/acme",
            "İstanbul",
            "",
            "https://acme.example",
            "Software",
            "Grow abroad",
            "Distributors",
            "50",
            "ERP tools",
            "Türkiye, Germany",
            "growth",
            "joint ventures, reselling",
        ];

        let mut last = None;
        for answer in answers {
            last = Some(store.submit_answer("telegram:4", answer).await.unwrap());
        }

        let data = match last {
            Some(OnboardingStep::Complete(data)) => data,
            other => panic!("expected completion, got {:?}", other),
        };
        assert_eq!(data.len(), OnboardingField::ORDER.len());

        let session = store.get("telegram:4").await.unwrap();
        assert_eq!(session.state, SessionState::OnboardingComplete);
        assert_eq!(session.current_field, None);
    }

    #[tokio::test]
    async fn test_invalid_answer_keeps_field() {
        let store = SessionStore::new();
        store.start_onboarding("telegram:5", 5).await.unwrap();
        store.submit_answer("telegram:5", "Acme").await.unwrap();

        let step = store.submit_answer("telegram:5", "not a url").await.unwrap();
        assert!(matches!(
            step,
            OnboardingStep::Invalid { field: OnboardingField::LinkedInUrl, .. }
        ));
        let session = store.get("telegram:5").await.unwrap();
        assert_eq!(session.current_field, Some(OnboardingField::LinkedInUrl));
        assert_eq!(session.onboarding_data.len(), 1);
    }

    #[tokio::test]
    async fn test_answer_outside_onboarding() {
        let store = SessionStore::new();
        store.get_or_create("telegram:6", 6).await;
        let step = store.submit_answer("telegram:6", "hello").await.unwrap();
        assert_eq!(step, OnboardingStep::NotOnboarding);
    }
}
