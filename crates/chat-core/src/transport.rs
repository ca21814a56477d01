use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{Result, TransportError};

/// Longest slice of an error body kept for diagnostics.
const ERROR_BODY_LIMIT: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// One question, one answer. Implementations keep no state between calls.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(&self, question: &str) -> std::result::Result<ChatResponse, TransportError>;
}

/// JSON-over-HTTP transport for `POST {base_url}/api/chat_bot/`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(TransportError::Request)?;
        Ok(Self::with_client(client, config.endpoint()?))
    }

    pub fn with_client(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn send(&self, question: &str) -> std::result::Result<ChatResponse, TransportError> {
        let request = ChatRequest {
            question: question.to_string(),
        };

        debug!(endpoint = %self.endpoint, "posting question");
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let mut body = body;
            if body.len() > ERROR_BODY_LIMIT {
                let mut cut = ERROR_BODY_LIMIT;
                while !body.is_char_boundary(cut) {
                    cut -= 1;
                }
                body.truncate(cut);
            }
            return Err(TransportError::Status { status, body });
        }

        let payload: ChatResponse = serde_json::from_str(&body)?;
        debug!(%status, len = payload.response.len(), "answer received");
        Ok(payload)
    }
}
