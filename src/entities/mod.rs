pub mod action_log;
pub mod buddy_connection;
pub mod game_state;
pub mod habit;
pub mod habit_log;
pub mod notification;
pub mod planned_action;
pub mod player;
pub mod room;
pub mod room_status;
pub mod turn;
pub mod turn_result;
pub mod user;

pub use room_status::{RoomPhase, RoomStatus};
