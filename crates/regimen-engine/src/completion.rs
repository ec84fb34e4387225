//! Chat completion endpoint client.

use std::time::Duration;

use async_trait::async_trait;
use regimen_core::{CompletionRequest, CompletionResponse, ConversationTurn, RegimenError, Result};
use tracing::debug;

/// A service that answers a conversation with the assistant's next turn.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Send the full conversation and return the reply text.
    async fn complete(&self, messages: &[ConversationTurn]) -> Result<String>;
}

/// CompletionBackend over HTTP: `POST { messages }`, read
/// `choices[0].message.content`.
#[derive(Clone)]
pub struct HttpCompletionBackend {
    /// Endpoint URL.
    endpoint: String,

    /// HTTP client.
    http_client: reqwest::Client,
}

impl HttpCompletionBackend {
    /// Create a backend whose requests give up after `timeout`.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RegimenError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(endpoint, http_client))
    }

    /// Create a backend that shares an existing client.
    pub fn with_client(endpoint: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            endpoint: endpoint.into(),
            http_client,
        }
    }
}

#[async_trait]
impl CompletionBackend for HttpCompletionBackend {
    async fn complete(&self, messages: &[ConversationTurn]) -> Result<String> {
        debug!(endpoint = %self.endpoint, turns = messages.len(), "Requesting completion");

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&CompletionRequest { messages })
            .send()
            .await
            .map_err(|e| RegimenError::CompletionTransport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RegimenError::CompletionTransport(e.to_string()))?;

        if !status.is_success() {
            return Err(RegimenError::CompletionStatus {
                status: status.as_u16(),
                body,
            });
        }

        CompletionResponse::parse_content(&body)
    }
}
