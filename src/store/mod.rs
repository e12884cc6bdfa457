//! Durable chat storage behind a trait.
//!
//! The realtime core treats storage as a collaborator: it persists messages
//! and notifications here before any delivery, and resolves group membership
//! here (the connection registry's group set is only a routing mirror).
//! Backed by `MemoryStore` for Phase 1 and tests; a SQL-backed
//! implementation slots in behind the same trait.

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::models::group::Group;
use crate::models::message::{Message, NewMessage};
use crate::models::notification::Notification;
use crate::models::user::{NewUser, User};

#[async_trait]
pub trait ChatStore: Send + Sync {
    // Users
    async fn create_user(&self, new: NewUser) -> Result<User, ApiError>;
    async fn find_user(&self, id: i64) -> Result<Option<User>, ApiError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, ApiError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError>;

    // Groups and membership (authoritative)
    async fn create_group(&self, name: &str) -> Result<Group, ApiError>;
    async fn find_group(&self, id: i64) -> Result<Option<Group>, ApiError>;
    async fn groups_for_user(&self, user_id: i64) -> Result<Vec<Group>, ApiError>;
    async fn group_members(&self, group_id: i64) -> Result<Vec<User>, ApiError>;
    async fn is_group_member(&self, group_id: i64, user_id: i64) -> Result<bool, ApiError>;
    /// Idempotent: adding an existing member reports `false`, no error.
    async fn add_group_member(&self, group_id: i64, user_id: i64) -> Result<bool, ApiError>;
    /// Idempotent: removing a non-member reports `false`, no error.
    async fn remove_group_member(&self, group_id: i64, user_id: i64) -> Result<bool, ApiError>;

    // Messages
    /// Persist a message. Exactly one of `recipient_id` / `group_id` must be
    /// set; any other shape is rejected as invalid input.
    async fn persist_message(&self, new: NewMessage) -> Result<Message, ApiError>;
    /// All direct messages the user sent or received, oldest first.
    async fn direct_messages(&self, user_id: i64) -> Result<Vec<Message>, ApiError>;
    /// The two-party direct thread between `a` and `b`, oldest first.
    async fn thread_between(&self, a: i64, b: i64) -> Result<Vec<Message>, ApiError>;
    /// All messages addressed to a group, oldest first.
    async fn group_messages(&self, group_id: i64) -> Result<Vec<Message>, ApiError>;

    // Notifications
    async fn persist_notification(
        &self,
        user_id: i64,
        content: &str,
    ) -> Result<Notification, ApiError>;
    /// Notifications for a user, newest first.
    async fn notifications_for(&self, user_id: i64) -> Result<Vec<Notification>, ApiError>;
    /// Mark a notification read. Idempotent; `Ok(false)` when no such
    /// notification belongs to the user.
    async fn mark_notification_read(&self, id: i64, user_id: i64) -> Result<bool, ApiError>;
    async fn count_unread(&self, user_id: i64) -> Result<i64, ApiError>;
}
