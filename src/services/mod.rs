//! Business logic shared by the route handlers.

pub mod buddy_service;
pub mod habit_service;
pub mod notification_service;
pub mod room_service;
pub mod turn_service;

pub use buddy_service::BuddyService;
pub use habit_service::HabitService;
pub use notification_service::NotificationService;
pub use room_service::RoomService;
pub use turn_service::TurnService;

use sea_orm::{DbErr, SqlErr};

use crate::error::AppError;

/// Map a unique-index violation to 409, anything else to 500.
pub(crate) fn conflict_on_unique(err: DbErr, message: &str) -> AppError {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        AppError::Conflict(message.to_string())
    } else {
        AppError::Internal(err.into())
    }
}
