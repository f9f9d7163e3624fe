use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

/// A named event for a user's SSE stream (`notification`, `unreadCount`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushEvent {
    pub name: &'static str,
    pub data: String,
}

type Senders = DashMap<Uuid, mpsc::UnboundedSender<PushEvent>>;

/// Per-user registry of open notification streams.
#[derive(Debug, Clone, Default)]
pub struct NotificationHub {
    users: Arc<DashMap<Uuid, Senders>>,
}

/// Receiving half of one stream. Dropping it unregisters the stream.
#[derive(Debug)]
pub struct Subscription {
    pub rx: mpsc::UnboundedReceiver<PushEvent>,
    hub: NotificationHub,
    user_id: Uuid,
    connection_id: Uuid,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.hub.unsubscribe(self.user_id, self.connection_id);
        tracing::debug!(user_id = %self.user_id, "notification stream closed");
    }
}

impl NotificationHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a stream for `user_id`.
    #[must_use]
    pub fn subscribe(&self, user_id: Uuid) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let connection_id = Uuid::new_v4();
        self.users
            .entry(user_id)
            .or_default()
            .insert(connection_id, tx);
        tracing::debug!(%user_id, %connection_id, "notification stream opened");
        Subscription {
            rx,
            hub: self.clone(),
            user_id,
            connection_id,
        }
    }

    fn unsubscribe(&self, user_id: Uuid, connection_id: Uuid) {
        if let Some(senders) = self.users.get(&user_id) {
            senders.remove(&connection_id);
            if senders.is_empty() {
                drop(senders);
                self.users.remove_if(&user_id, |_, s| s.is_empty());
            }
        }
    }

    /// Push an event to every open stream of `user_id`. Returns how many received it.
    pub fn send(&self, user_id: Uuid, name: &'static str, data: String) -> usize {
        let Some(senders) = self.users.get(&user_id) else {
            return 0;
        };
        senders
            .iter()
            .filter(|entry| {
                entry
                    .value()
                    .send(PushEvent {
                        name,
                        data: data.clone(),
                    })
                    .is_ok()
            })
            .count()
    }

    /// Users with at least one open stream.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn stream_count(&self, user_id: Uuid) -> usize {
        self.users.get(&user_id).map_or(0, |s| s.len())
    }
}
