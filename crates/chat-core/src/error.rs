use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

use crate::thread::Ticket;

/// Failure of a single exchange with the chat-bot service.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("chat service answered {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("malformed response payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no response within {0:?}")]
    Timeout(Duration),
}

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("a question is already waiting for its answer")]
    Busy,

    #[error("submission {0} is not the pending one")]
    StaleTicket(Ticket),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ChatError>;
