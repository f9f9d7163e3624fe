//! In-memory fan-out of realtime messages.
//!
//! [`RoomHub`] relays room events to every `WebSocket` connected to a room;
//! [`NotificationHub`] pushes notification events to a user's open SSE streams.
//! Both are best-effort: a closed receiver is silently skipped.

mod notifications;
mod rooms;

pub use notifications::{NotificationHub, PushEvent, Subscription};
pub use rooms::{RoomClient, RoomHub, WsTx};
