//! Connection registry: the single source of truth for "is this user
//! reachable right now".
//!
//! Uses `DashMap` for shard-level concurrency. Entries hold the sending half
//! of the connection's outbound queue; the receiving half is drained by one
//! writer task per connection, so all writes to a socket go through a single
//! writer. No lock here is ever held across a socket or storage operation —
//! delivery first snapshots the channel out of the map.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::mpsc;

/// Sent when the recipient's outbound queue is gone (writer task ended).
#[derive(Debug)]
pub struct ChannelClosed;

/// A snapshot of one user's live outbound channel. `conn_id` pins the
/// snapshot to a specific connection so a stale handle can never evict a
/// newer one.
#[derive(Debug, Clone)]
pub struct ChannelHandle {
    pub user_id: i64,
    pub conn_id: u64,
    tx: mpsc::UnboundedSender<String>,
}

impl ChannelHandle {
    /// Queue a serialized frame for delivery. Non-blocking; the per-connection
    /// writer task performs the actual socket write.
    pub fn send(&self, frame: String) -> Result<(), ChannelClosed> {
        self.tx.send(frame).map_err(|_| ChannelClosed)
    }
}

struct ConnectionEntry {
    conn_id: u64,
    tx: mpsc::UnboundedSender<String>,
    /// Routing mirror of group membership; the store stays authoritative.
    groups: HashSet<i64>,
}

/// In-memory mapping from user id to their active connection. At most one
/// entry per user at any instant.
pub struct ConnectionRegistry {
    entries: DashMap<i64, ConnectionEntry>,
    next_conn_id: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            next_conn_id: AtomicU64::new(0),
        }
    }

    /// Install the connection for a user, displacing any previous one.
    ///
    /// Returns the new connection id and, if the user was already connected,
    /// the displaced channel handle. The swap is atomic: there is no window
    /// where both channels are registered. Dropping the displaced handle
    /// closes the superseded connection's writer.
    pub fn register(
        &self,
        user_id: i64,
        tx: mpsc::UnboundedSender<String>,
    ) -> (u64, Option<ChannelHandle>) {
        let conn_id = self.next_conn_id.fetch_add(1, Ordering::Relaxed) + 1;
        let prev = self.entries.insert(
            user_id,
            ConnectionEntry {
                conn_id,
                tx,
                groups: HashSet::new(),
            },
        );
        let displaced = prev.map(|e| ChannelHandle {
            user_id,
            conn_id: e.conn_id,
            tx: e.tx,
        });
        (conn_id, displaced)
    }

    /// Idempotent removal; no error if absent.
    pub fn unregister(&self, user_id: i64) {
        self.entries.remove(&user_id);
    }

    /// Remove the entry only if it still belongs to `conn_id`. Used by
    /// session cleanup and delivery-failure handling, where the entry may
    /// already have been replaced by a newer connection.
    pub fn unregister_conn(&self, user_id: i64, conn_id: u64) -> bool {
        self.entries
            .remove_if(&user_id, |_, e| e.conn_id == conn_id)
            .is_some()
    }

    pub fn is_reachable(&self, user_id: i64) -> bool {
        self.entries.contains_key(&user_id)
    }

    /// Idempotent; no-op when the user has no entry (disconnected users are
    /// not tracked).
    pub fn add_group(&self, user_id: i64, group_id: i64) {
        if let Some(mut entry) = self.entries.get_mut(&user_id) {
            entry.groups.insert(group_id);
        }
    }

    /// Idempotent; no-op when the user has no entry.
    pub fn remove_group(&self, user_id: i64, group_id: i64) {
        if let Some(mut entry) = self.entries.get_mut(&user_id) {
            entry.groups.remove(&group_id);
        }
    }

    /// The user's current routing group set, if connected.
    pub fn group_set(&self, user_id: i64) -> Option<HashSet<i64>> {
        self.entries.get(&user_id).map(|e| e.groups.clone())
    }

    /// Clone the user's channel out of the map so delivery never happens
    /// under the shard lock.
    pub fn snapshot_channel(&self, user_id: i64) -> Option<ChannelHandle> {
        self.entries.get(&user_id).map(|e| ChannelHandle {
            user_id,
            conn_id: e.conn_id,
            tx: e.tx.clone(),
        })
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
