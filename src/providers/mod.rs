//! Completion providers.

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

pub mod agent;
pub mod gemini;
pub mod provider;

pub use provider::{CompletionRequest, Provider, ProviderError, Result};

use crate::config::Settings;

/// Stand-in when no API key is configured. Every call fails with `NotConfigured`.
pub struct DisabledProvider {
    name: String,
}

impl DisabledProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Provider for DisabledProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        false
    }

    async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
        Err(ProviderError::NotConfigured(self.name.clone()))
    }
}

/// Shared HTTP client with the configured request timeout.
pub fn http_client(settings: &Settings) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(settings.http_timeout_secs))
        .build()
}

/// The direct model provider.
pub fn create_provider(settings: &Settings, client: Client) -> Arc<dyn Provider> {
    match &settings.gemini.api_key {
        Some(key) => Arc::new(gemini::GeminiProvider::new(
            client,
            settings.gemini.base_url.clone(),
            key.clone(),
            settings.gemini.model.clone(),
        )),
        None => Arc::new(DisabledProvider::new("gemini")),
    }
}

/// The agent endpoint, if one is configured.
pub fn create_agent(settings: &Settings, client: Client) -> Option<Arc<dyn Provider>> {
    settings.agent.url.as_ref().map(|url| {
        Arc::new(agent::AgentProvider::new(
            client,
            url.clone(),
            Duration::from_secs(settings.agent.timeout_secs),
        )) as Arc<dyn Provider>
    })
}
