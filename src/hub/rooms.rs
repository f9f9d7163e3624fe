use std::sync::Arc;

use dashmap::DashMap;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::game::Role;

/// A message destined for a specific `WebSocket` client.
pub type WsTx = mpsc::UnboundedSender<String>;

/// One open socket in a room.
#[derive(Debug, Clone)]
pub struct RoomClient {
    pub user_id: Uuid,
    pub role: Role,
    pub tx: WsTx,
}

/// Tracks all open room sockets, keyed by room then by connection id.
#[derive(Debug, Clone, Default)]
pub struct RoomHub {
    rooms: Arc<DashMap<Uuid, DashMap<Uuid, RoomClient>>>,
}

impl RoomHub {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection. A user may hold several (one per tab).
    pub fn register(&self, room_id: Uuid, connection_id: Uuid, client: RoomClient) {
        self.rooms
            .entry(room_id)
            .or_default()
            .insert(connection_id, client);
    }

    /// Drop a connection, returning the client it belonged to.
    pub fn unregister(&self, room_id: Uuid, connection_id: Uuid) -> Option<RoomClient> {
        let clients = self.rooms.get(&room_id)?;
        let removed = clients.remove(&connection_id).map(|(_, client)| client);
        if clients.is_empty() {
            drop(clients);
            self.rooms.remove_if(&room_id, |_, c| c.is_empty());
        }
        removed
    }

    /// Send a raw message to every connection in a room.
    pub fn broadcast(&self, room_id: Uuid, message: &str) {
        if let Some(clients) = self.rooms.get(&room_id) {
            for entry in clients.iter() {
                let _ = entry.value().tx.send(message.to_string());
            }
        }
    }

    /// Broadcast a `{ "type", "payload" }` envelope.
    pub fn emit(&self, room_id: Uuid, event_type: &str, payload: Value) {
        let message = json!({ "type": event_type, "payload": payload }).to_string();
        tracing::debug!(%room_id, event_type, "room broadcast");
        self.broadcast(room_id, &message);
    }

    #[must_use]
    pub fn connection_count(&self, room_id: Uuid) -> usize {
        self.rooms.get(&room_id).map_or(0, |clients| clients.len())
    }

    /// Rooms with at least one open socket.
    #[must_use]
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Whether `user_id` has at least one socket open in the room.
    #[must_use]
    pub fn is_connected(&self, room_id: Uuid, user_id: Uuid) -> bool {
        self.rooms.get(&room_id).is_some_and(|clients| {
            clients.iter().any(|entry| entry.value().user_id == user_id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(role: Role) -> (RoomClient, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            RoomClient {
                user_id: Uuid::new_v4(),
                role,
                tx,
            },
            rx,
        )
    }

    #[test]
    fn test_broadcast_reaches_every_connection() {
        let hub = RoomHub::new();
        let room = Uuid::new_v4();
        let (a, mut rx_a) = client(Role::Architect);
        let (b, mut rx_b) = client(Role::Prospect);
        hub.register(room, Uuid::new_v4(), a);
        hub.register(room, Uuid::new_v4(), b);

        hub.emit(room, "phase-change", json!({ "phase": "planning" }));
        let got_a = rx_a.try_recv().unwrap_or_default();
        let got_b = rx_b.try_recv().unwrap_or_default();
        assert!(got_a.contains("phase-change"));
        assert_eq!(got_a, got_b);
    }

    #[test]
    fn test_unregister_drops_empty_rooms() {
        let hub = RoomHub::new();
        let room = Uuid::new_v4();
        let conn = Uuid::new_v4();
        let (a, _rx) = client(Role::Architect);
        let user = a.user_id;
        hub.register(room, conn, a);
        assert!(hub.is_connected(room, user));
        assert_eq!(hub.connection_count(room), 1);

        let closed = hub.unregister(room, conn);
        assert_eq!(closed.map(|c| c.role), Some(Role::Architect));
        assert!(hub.unregister(room, conn).is_none());
        assert!(!hub.is_connected(room, user));
        assert_eq!(hub.connection_count(room), 0);
    }
}
