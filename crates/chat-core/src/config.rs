use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::error::{ChatError, Result};

/// Path of the chat-bot endpoint, relative to the configured base URL.
pub const CHAT_BOT_PATH: &str = "api/chat_bot/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the chat-bot backend, e.g. `http://localhost:8000`.
    pub base_url: String,
    /// Deadline for a single question/answer exchange, in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        Ok(config)
    }

    /// Layers the optional config file under explicit overrides (command line
    /// or environment) and validates the result.
    pub fn resolve(
        path: Option<&Path>,
        base_url: Option<String>,
        request_timeout_secs: Option<u64>,
    ) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        if let Some(base_url) = base_url {
            config.base_url = base_url;
        }
        if let Some(secs) = request_timeout_secs {
            config.request_timeout_secs = secs;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Full URL questions are posted to.
    pub fn endpoint(&self) -> Result<Url> {
        let base = self.base_url.trim_end_matches('/');
        let url = Url::parse(&format!("{base}/{CHAT_BOT_PATH}"))
            .map_err(|e| ChatError::Config(format!("base url {:?}: {e}", self.base_url)))?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ChatError::Config(format!(
                "base url {:?} uses unsupported scheme {other:?}",
                self.base_url
            ))),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.endpoint()?;
        if self.request_timeout_secs == 0 {
            return Err(ChatError::Config(
                "request timeout must be at least one second".to_string(),
            ));
        }
        Ok(())
    }
}
