use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// A persisted chat message. Exactly one of `recipient_id` / `group_id` is
/// set; the store rejects any other shape. Immutable once persisted.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Message {
    pub id: i64,
    pub content: String,
    pub sender_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<i64>,
    pub timestamp: DateTime<Utc>,
}

/// Fields for persisting a message. Built through the constructors so the
/// recipient/group addressing stays mutually exclusive.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: i64,
    pub recipient_id: Option<i64>,
    pub group_id: Option<i64>,
    pub content: String,
}

impl NewMessage {
    pub fn personal(sender_id: i64, recipient_id: i64, content: &str) -> Self {
        Self {
            sender_id,
            recipient_id: Some(recipient_id),
            group_id: None,
            content: content.to_string(),
        }
    }

    pub fn group(sender_id: i64, group_id: i64, content: &str) -> Self {
        Self {
            sender_id,
            recipient_id: None,
            group_id: Some(group_id),
            content: content.to_string(),
        }
    }
}
