use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// A durable, user-scoped notification. The only mutation after creation is
/// the one-way `is_read` transition.
#[derive(Debug, Clone)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub content: String,
    pub is_read: bool,
    pub timestamp: DateTime<Utc>,
}

/// Notification as returned to its owning user.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NotificationResponse {
    pub id: i64,
    pub content: String,
    pub is_read: bool,
    pub timestamp: DateTime<Utc>,
}

impl From<&Notification> for NotificationResponse {
    fn from(n: &Notification) -> Self {
        Self {
            id: n.id,
            content: n.content.clone(),
            is_read: n.is_read,
            timestamp: n.timestamp,
        }
    }
}
