//! Inbound message model.
//!
//! `RawMessage` values are constructed by the message-source collaborator
//! (already filtered to unread); the pipeline consumes each exactly once per
//! processing pass and never re-filters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file attached to an inbound message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// The attachment's filename as reported by the source.
    pub filename: String,
    /// Raw attachment bytes.
    pub content: Vec<u8>,
    /// MIME type as reported by the source.
    pub mime_type: String,
}

/// One inbound item from the message source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMessage {
    /// Opaque stable identifier for the sender. Doubles as the dedup key.
    pub sender_id: String,
    /// Full message body, plain text.
    pub text: String,
    /// Attachments in source order.
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Receipt timestamp, used for processing order and dedup tie-breaks.
    pub received_at: DateTime<Utc>,
}

impl RawMessage {
    pub fn new(sender_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
            text: text.into(),
            attachments: Vec::new(),
            received_at: Utc::now(),
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }
}
