use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CreatedBy {
    User,
    ChatBot,
}

/// One turn of the conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub content: String,
    pub created_by: CreatedBy,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(created_by: CreatedBy, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            created_by,
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(CreatedBy::User, content)
    }

    pub fn chat_bot(content: impl Into<String>) -> Self {
        Self::new(CreatedBy::ChatBot, content)
    }

    pub fn is_user(&self) -> bool {
        self.created_by == CreatedBy::User
    }

    /// Creation time in the local timezone, formatted for display.
    pub fn timestamp_label(&self) -> String {
        self.created_at
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }
}
