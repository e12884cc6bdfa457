//! Fanout dispatcher: turns one inbound chat request into durable storage
//! plus best-effort live delivery.
//!
//! Persistence always completes before the first delivery write. Delivery
//! failures only affect the recipient whose channel broke — they unregister
//! that exact connection and never roll anything back.

use std::sync::Arc;

use crate::error::ApiError;
use crate::models::message::{Message, NewMessage};
use crate::models::notification::Notification;
use crate::store::ChatStore;

use super::events::OutboundEvent;
use super::registry::{ChannelHandle, ConnectionRegistry};

/// Why a send was rejected. `UnknownRecipient`/`UnknownGroup` surface as 404s
/// on the REST path and are silently dropped on the socket path.
#[derive(Debug)]
pub enum DispatchError {
    UnknownRecipient,
    UnknownGroup,
    Storage(ApiError),
}

impl From<ApiError> for DispatchError {
    fn from(err: ApiError) -> Self {
        DispatchError::Storage(err)
    }
}

impl From<DispatchError> for ApiError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::UnknownRecipient => ApiError::not_found("Recipient not found"),
            DispatchError::UnknownGroup => ApiError::not_found("Group not found"),
            DispatchError::Storage(inner) => inner,
        }
    }
}

pub struct FanoutDispatcher {
    store: Arc<dyn ChatStore>,
    registry: Arc<ConnectionRegistry>,
}

impl FanoutDispatcher {
    pub fn new(store: Arc<dyn ChatStore>, registry: Arc<ConnectionRegistry>) -> Self {
        Self { store, registry }
    }

    /// Route a direct message: persist it, persist the recipient's
    /// notification (always, reachable or not), then deliver if reachable.
    pub async fn route_personal(
        &self,
        sender_id: i64,
        recipient_id: i64,
        content: &str,
    ) -> Result<Message, DispatchError> {
        let recipient = self
            .store
            .find_user(recipient_id)
            .await?
            .ok_or(DispatchError::UnknownRecipient)?;

        let message = self
            .store
            .persist_message(NewMessage::personal(sender_id, recipient_id, content))
            .await?;
        self.store
            .persist_notification(
                recipient.id,
                &format!("New message from user {sender_id}"),
            )
            .await?;

        if let Some(channel) = self.registry.snapshot_channel(recipient.id) {
            let event = OutboundEvent::PersonalMessage {
                sender_id,
                sender_name: self.display_name(sender_id).await?,
                content: message.content.clone(),
                timestamp: message.timestamp,
            };
            self.deliver(&channel, event.to_frame());
        }

        Ok(message)
    }

    /// Route a group message. Membership comes from the store, not the
    /// registry's routing mirror. Notifications for every reachable member
    /// are persisted before the first delivery, so one group send is a single
    /// durable unit followed by best-effort delivery. Unreachable members get
    /// neither an event nor a notification on this path.
    pub async fn route_group(
        &self,
        sender_id: i64,
        group_id: i64,
        content: &str,
    ) -> Result<Message, DispatchError> {
        let group = self
            .store
            .find_group(group_id)
            .await?
            .ok_or(DispatchError::UnknownGroup)?;

        let message = self
            .store
            .persist_message(NewMessage::group(sender_id, group_id, content))
            .await?;

        let members = self.store.group_members(group_id).await?;
        let sender_name = self.display_name(sender_id).await?;

        // Reachability snapshot: the sender never receives their own message.
        let targets: Vec<ChannelHandle> = members
            .iter()
            .filter(|m| m.id != sender_id)
            .filter_map(|m| self.registry.snapshot_channel(m.id))
            .collect();

        for target in &targets {
            self.store
                .persist_notification(
                    target.user_id,
                    &format!("New message in group {} from {}", group.name, sender_name),
                )
                .await?;
        }

        let event = OutboundEvent::GroupMessage {
            group_id,
            group_name: group.name.clone(),
            sender_id,
            sender_name,
            content: message.content.clone(),
            timestamp: message.timestamp,
        };
        let frame = event.to_frame();
        for target in &targets {
            // One broken channel must not abort the rest of the fanout.
            self.deliver(target, frame.clone());
        }

        Ok(message)
    }

    /// Out-of-band notification push (membership changes and the like).
    /// Persistence is guaranteed; the live push is best-effort.
    pub async fn notify_user(
        &self,
        user_id: i64,
        content: &str,
    ) -> Result<Notification, DispatchError> {
        let notification = self.store.persist_notification(user_id, content).await?;

        if let Some(channel) = self.registry.snapshot_channel(user_id) {
            let event = OutboundEvent::Notification {
                content: notification.content.clone(),
                timestamp: notification.timestamp,
            };
            self.deliver(&channel, event.to_frame());
        }

        Ok(notification)
    }

    /// Queue a frame on a recipient's channel. A closed channel means the
    /// connection is gone: unregister that exact connection and move on.
    fn deliver(&self, channel: &ChannelHandle, frame: String) {
        if channel.send(frame).is_err() {
            tracing::debug!(
                user_id = channel.user_id,
                "outbound channel closed during delivery, unregistering"
            );
            self.registry.unregister_conn(channel.user_id, channel.conn_id);
        }
    }

    async fn display_name(&self, user_id: i64) -> Result<String, DispatchError> {
        Ok(self
            .store
            .find_user(user_id)
            .await?
            .map(|u| u.username)
            .unwrap_or_else(|| format!("User {user_id}")))
    }
}
