//! Locally hosted agent endpoint, tried before the direct model call.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::provider::{CompletionRequest, Provider, ProviderError, Result};
use crate::session::ContextMessage;

pub struct AgentProvider {
    client: Client,
    url: String,
    timeout: Duration,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AgentRequest<'a> {
    message: &'a str,
    user_id: &'a str,
    context: &'a [ContextMessage],
}

#[derive(Deserialize)]
struct AgentResponse {
    #[serde(default)]
    response: Option<String>,
}

impl AgentProvider {
    pub fn new(client: Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Provider for AgentProvider {
    fn name(&self) -> &str {
        "agent"
    }

    fn is_available(&self) -> bool {
        !self.url.is_empty()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = AgentRequest {
            message: &request.user_text,
            user_id: &request.user_id,
            context: &request.history,
        };

        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(ProviderError::from_request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let parsed: AgentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;
        Ok(parsed.response.unwrap_or_default())
    }
}
