//! Completion provider trait.

use async_trait::async_trait;
use thiserror::Error;

use crate::session::ContextMessage;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    #[error("HTTP error: {0}")]
    HttpError(#[source] reqwest::Error),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Timeout")]
    Timeout,

    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    pub fn other(s: impl Into<String>) -> Self {
        ProviderError::Other(s.into())
    }

    /// Map a reqwest failure, keeping timeouts distinguishable.
    ///
    /// The request URL is dropped: it can carry an API key in its query string.
    pub fn from_request(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::HttpError(e.without_url())
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        ProviderError::from_request(e)
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// One completion call.
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    /// Fully rendered prompt for direct model calls.
    pub prompt: String,
    /// The raw user message, for proxies that build their own prompt.
    pub user_text: String,
    pub user_id: String,
    /// Recent conversation, oldest first.
    pub history: Vec<ContextMessage>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, user_text: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            user_text: user_text.into(),
            ..Self::default()
        }
    }

    pub fn for_user(mut self, user_id: impl Into<String>, history: Vec<ContextMessage>) -> Self {
        self.user_id = user_id.into();
        self.history = history;
        self
    }
}

/// Text completion backend.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name.
    fn name(&self) -> &str;

    /// Whether credentials / an endpoint are configured.
    fn is_available(&self) -> bool;

    /// Complete a request. An empty string is a valid (if useless) answer.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}
