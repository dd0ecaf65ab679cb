use chrono::{DateTime, Utc};
use serde::Serialize;
use ulid::Ulid;

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    /// The unique identifier for the message.
    pub id: Ulid,
    /// The message body as submitted by the anonymous sender.
    pub content: String,
    /// The time the message was received.
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(content: String) -> Self {
        Self {
            id: Ulid::new(),
            content,
            created_at: Utc::now(),
        }
    }

    /// Validates message content, raw byte length with no trimming.
    pub fn validate_content(content: &str) -> Result<(), &'static str> {
        if content.len() < 10 {
            return Err("Message must be at least 10 characters long");
        }

        if content.len() > 500 {
            return Err("Message must be at most 500 characters long");
        }

        Ok(())
    }
}
