use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, sea_query::Expr,
};
use serde_json::json;
use uuid::Uuid;

use crate::entities::notification;
use crate::error::AppError;
use crate::state::AppState;

/// Newest notifications returned by [`NotificationService::list`].
pub const NOTIFICATION_PAGE_SIZE: u64 = 50;

pub const KIND_BUDDY_REQUEST: &str = "buddy_request";
pub const KIND_BUDDY_ACCEPTED: &str = "buddy_accepted";
pub const KIND_HABIT_MILESTONE: &str = "habit_milestone";

/// A notification about to be stored.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub kind: &'static str,
    pub title: String,
    pub body: String,
    pub entity_type: Option<&'static str>,
    pub entity_id: Option<Uuid>,
    pub related_user_id: Option<Uuid>,
}

pub struct NotificationService;

impl NotificationService {
    /// Persist a notification, then push `notification` and `unreadCount` to the
    /// recipient's open streams.
    pub async fn create_and_send(
        state: &AppState,
        new: NewNotification,
    ) -> Result<notification::Model, AppError> {
        let created = notification::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(new.user_id),
            kind: Set(new.kind.to_string()),
            title: Set(new.title),
            body: Set(new.body),
            entity_type: Set(new.entity_type.map(str::to_string)),
            entity_id: Set(new.entity_id),
            related_user_id: Set(new.related_user_id),
            is_read: Set(false),
            created_at: Set(Utc::now().fixed_offset()),
        }
        .insert(&state.db)
        .await?;

        let delivered = state.notification_hub.send(
            created.user_id,
            "notification",
            serde_json::to_string(&created)?,
        );

        let count = Self::unread_count(state, created.user_id).await?;
        Self::push_unread_count(state, created.user_id, count);

        tracing::debug!(
            user_id = %created.user_id,
            kind = %created.kind,
            streams = delivered,
            "notification created"
        );
        Ok(created)
    }

    /// [`Self::create_and_send`] for side effects that must not fail the request.
    pub async fn send_best_effort(state: &AppState, new: NewNotification) {
        let user_id = new.user_id;
        let kind = new.kind;
        if let Err(e) = Self::create_and_send(state, new).await {
            tracing::warn!(%user_id, kind, "failed to send notification: {e:?}");
        }
    }

    pub async fn list(
        state: &AppState,
        user_id: Uuid,
    ) -> Result<Vec<notification::Model>, AppError> {
        Ok(notification::Entity::find()
            .filter(notification::Column::UserId.eq(user_id))
            .order_by_desc(notification::Column::CreatedAt)
            .limit(NOTIFICATION_PAGE_SIZE)
            .all(&state.db)
            .await?)
    }

    pub async fn unread_count(state: &AppState, user_id: Uuid) -> Result<u64, AppError> {
        Ok(notification::Entity::find()
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .count(&state.db)
            .await?)
    }

    /// Mark one of the user's notifications read. Someone else's id is a 404.
    pub async fn mark_read(
        state: &AppState,
        user_id: Uuid,
        notification_id: Uuid,
    ) -> Result<notification::Model, AppError> {
        let existing = notification::Entity::find_by_id(notification_id)
            .filter(notification::Column::UserId.eq(user_id))
            .one(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found.".to_string()))?;

        let updated = if existing.is_read {
            existing
        } else {
            let mut active: notification::ActiveModel = existing.into();
            active.is_read = Set(true);
            active.update(&state.db).await?
        };

        let count = Self::unread_count(state, user_id).await?;
        Self::push_unread_count(state, user_id, count);
        Ok(updated)
    }

    /// Returns how many notifications were flipped.
    pub async fn mark_all_read(state: &AppState, user_id: Uuid) -> Result<u64, AppError> {
        let result = notification::Entity::update_many()
            .col_expr(notification::Column::IsRead, Expr::value(true))
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::IsRead.eq(false))
            .exec(&state.db)
            .await?;

        Self::push_unread_count(state, user_id, 0);
        Ok(result.rows_affected)
    }

    fn push_unread_count(state: &AppState, user_id: Uuid, count: u64) {
        state
            .notification_hub
            .send(user_id, "unreadCount", json!({ "count": count }).to_string());
    }
}
