//! In-memory `ChatStore` for Phase 1. Swap in a database-backed
//! implementation behind the same trait when one lands.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use crate::error::ApiError;
use crate::models::group::Group;
use crate::models::message::{Message, NewMessage};
use crate::models::notification::Notification;
use crate::models::user::{NewUser, User};

use super::ChatStore;

#[derive(Default)]
struct Inner {
    users: HashMap<i64, User>,
    groups: HashMap<i64, Group>,
    /// group id → member user ids.
    members: HashMap<i64, HashSet<i64>>,
    /// Insertion order doubles as timestamp order.
    messages: Vec<Message>,
    notifications: Vec<Notification>,
    next_id: i64,
}

impl Inner {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn create_user(&self, new: NewUser) -> Result<User, ApiError> {
        let mut inner = self.inner.lock();
        if inner.users.values().any(|u| u.username == new.username) {
            return Err(ApiError::conflict("Username already registered"));
        }
        let id = inner.next_id();
        let user = User {
            id,
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
        };
        inner.users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, ApiError> {
        Ok(self.inner.lock().users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, ApiError> {
        Ok(self
            .inner
            .lock()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        Ok(self
            .inner
            .lock()
            .users
            .values()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned())
    }

    async fn create_group(&self, name: &str) -> Result<Group, ApiError> {
        let mut inner = self.inner.lock();
        let id = inner.next_id();
        let group = Group {
            id,
            name: name.to_string(),
            created_at: Utc::now(),
        };
        inner.groups.insert(id, group.clone());
        inner.members.insert(id, HashSet::new());
        Ok(group)
    }

    async fn find_group(&self, id: i64) -> Result<Option<Group>, ApiError> {
        Ok(self.inner.lock().groups.get(&id).cloned())
    }

    async fn groups_for_user(&self, user_id: i64) -> Result<Vec<Group>, ApiError> {
        let inner = self.inner.lock();
        let mut groups: Vec<Group> = inner
            .members
            .iter()
            .filter(|(_, members)| members.contains(&user_id))
            .filter_map(|(group_id, _)| inner.groups.get(group_id).cloned())
            .collect();
        groups.sort_by_key(|g| g.id);
        Ok(groups)
    }

    async fn group_members(&self, group_id: i64) -> Result<Vec<User>, ApiError> {
        let inner = self.inner.lock();
        let Some(members) = inner.members.get(&group_id) else {
            return Ok(Vec::new());
        };
        let mut users: Vec<User> = members
            .iter()
            .filter_map(|id| inner.users.get(id).cloned())
            .collect();
        users.sort_by_key(|u| u.id);
        Ok(users)
    }

    async fn is_group_member(&self, group_id: i64, user_id: i64) -> Result<bool, ApiError> {
        Ok(self
            .inner
            .lock()
            .members
            .get(&group_id)
            .is_some_and(|m| m.contains(&user_id)))
    }

    async fn add_group_member(&self, group_id: i64, user_id: i64) -> Result<bool, ApiError> {
        let mut inner = self.inner.lock();
        let Some(members) = inner.members.get_mut(&group_id) else {
            return Err(ApiError::not_found("Group not found"));
        };
        Ok(members.insert(user_id))
    }

    async fn remove_group_member(&self, group_id: i64, user_id: i64) -> Result<bool, ApiError> {
        let mut inner = self.inner.lock();
        let Some(members) = inner.members.get_mut(&group_id) else {
            return Err(ApiError::not_found("Group not found"));
        };
        Ok(members.remove(&user_id))
    }

    async fn persist_message(&self, new: NewMessage) -> Result<Message, ApiError> {
        if new.recipient_id.is_some() == new.group_id.is_some() {
            return Err(ApiError::bad_request(
                "Message must address exactly one of recipient or group",
            ));
        }
        let mut inner = self.inner.lock();
        let id = inner.next_id();
        let message = Message {
            id,
            content: new.content,
            sender_id: new.sender_id,
            recipient_id: new.recipient_id,
            group_id: new.group_id,
            timestamp: Utc::now(),
        };
        inner.messages.push(message.clone());
        Ok(message)
    }

    async fn direct_messages(&self, user_id: i64) -> Result<Vec<Message>, ApiError> {
        Ok(self
            .inner
            .lock()
            .messages
            .iter()
            .filter(|m| {
                m.group_id.is_none()
                    && (m.sender_id == user_id || m.recipient_id == Some(user_id))
            })
            .cloned()
            .collect())
    }

    async fn thread_between(&self, a: i64, b: i64) -> Result<Vec<Message>, ApiError> {
        Ok(self
            .inner
            .lock()
            .messages
            .iter()
            .filter(|m| {
                m.group_id.is_none()
                    && ((m.sender_id == a && m.recipient_id == Some(b))
                        || (m.sender_id == b && m.recipient_id == Some(a)))
            })
            .cloned()
            .collect())
    }

    async fn group_messages(&self, group_id: i64) -> Result<Vec<Message>, ApiError> {
        Ok(self
            .inner
            .lock()
            .messages
            .iter()
            .filter(|m| m.group_id == Some(group_id))
            .cloned()
            .collect())
    }

    async fn persist_notification(
        &self,
        user_id: i64,
        content: &str,
    ) -> Result<Notification, ApiError> {
        let mut inner = self.inner.lock();
        let id = inner.next_id();
        let notification = Notification {
            id,
            user_id,
            content: content.to_string(),
            is_read: false,
            timestamp: Utc::now(),
        };
        inner.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn notifications_for(&self, user_id: i64) -> Result<Vec<Notification>, ApiError> {
        let mut list: Vec<Notification> = self
            .inner
            .lock()
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect();
        list.reverse(); // newest first
        Ok(list)
    }

    async fn mark_notification_read(&self, id: i64, user_id: i64) -> Result<bool, ApiError> {
        let mut inner = self.inner.lock();
        match inner
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
        {
            Some(n) => {
                n.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count_unread(&self, user_id: i64) -> Result<i64, ApiError> {
        Ok(self
            .inner
            .lock()
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read)
            .count() as i64)
    }
}
