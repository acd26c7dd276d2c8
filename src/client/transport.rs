use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use crate::api::models::{ChatReply, ChatRequest, ChatTurn, ErrorBody};
use crate::llm::models::Message as LlmMessage;
use crate::relay::Relay;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Relay unreachable: {0}")]
    Network(String),
    #[error("Relay returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Invalid relay response: {0}")]
    InvalidResponse(String),
    #[error("Relay failed: {0}")]
    Relay(String),
}

/// How the client reaches the completion relay.
#[async_trait]
pub trait RelayTransport: Send + Sync {
    async fn send(&self, turns: &[ChatTurn]) -> Result<ChatReply, TransportError>;
}

/// Talks to a relay over HTTP.
pub struct HttpTransport {
    client: Client,
    url: String,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl RelayTransport for HttpTransport {
    async fn send(&self, turns: &[ChatTurn]) -> Result<ChatReply, TransportError> {
        let body = ChatRequest {
            messages: turns.to_vec(),
        };

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|b| b.error)
                .unwrap_or(text);
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))
    }
}

/// Runs the relay in-process.
#[async_trait]
impl RelayTransport for Relay {
    async fn send(&self, turns: &[ChatTurn]) -> Result<ChatReply, TransportError> {
        let history: Vec<LlmMessage> = turns.iter().cloned().map(LlmMessage::from).collect();
        self.complete(&history)
            .await
            .map(ChatReply::from)
            .map_err(|e| TransportError::Relay(e.to_string()))
    }
}
