use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::Condition;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, ModelTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::entities::buddy_connection::{self, STATUS_ACCEPTED, STATUS_PENDING};
use crate::entities::user;
use crate::error::AppError;
use crate::services::conflict_on_unique;
use crate::services::notification_service::{
    KIND_BUDDY_ACCEPTED, KIND_BUDDY_REQUEST, NewNotification, NotificationService,
};
use crate::state::AppState;

/// A connection paired with the user on the other side of it.
#[derive(Debug, Clone)]
pub struct BuddyEntry {
    pub connection: buddy_connection::Model,
    pub user: user::Model,
}

pub struct BuddyService;

impl BuddyService {
    /// Every connection the user is part of, pending or accepted.
    pub async fn list(state: &AppState, user_id: Uuid) -> Result<Vec<BuddyEntry>, AppError> {
        let connections = buddy_connection::Entity::find()
            .filter(involving(user_id))
            .order_by_desc(buddy_connection::Column::CreatedAt)
            .all(&state.db)
            .await?;
        Self::with_users(state, user_id, connections).await
    }

    /// Incoming requests waiting for this user's answer.
    pub async fn pending(state: &AppState, user_id: Uuid) -> Result<Vec<BuddyEntry>, AppError> {
        let connections = buddy_connection::Entity::find()
            .filter(buddy_connection::Column::ReceiverId.eq(user_id))
            .filter(buddy_connection::Column::Status.eq(STATUS_PENDING))
            .order_by_desc(buddy_connection::Column::CreatedAt)
            .all(&state.db)
            .await?;
        Self::with_users(state, user_id, connections).await
    }

    pub async fn accepted_buddy_ids(state: &AppState, user_id: Uuid) -> Result<Vec<Uuid>, AppError> {
        Ok(buddy_connection::Entity::find()
            .filter(involving(user_id))
            .filter(buddy_connection::Column::Status.eq(STATUS_ACCEPTED))
            .all(&state.db)
            .await?
            .into_iter()
            .map(|c| c.other_party(user_id))
            .collect())
    }

    /// Send a buddy request to `username`.
    pub async fn invite(
        state: &AppState,
        requester: &user::Model,
        username: &str,
    ) -> Result<buddy_connection::Model, AppError> {
        let receiver = user::Entity::find()
            .filter(user::Column::Username.eq(username.trim()))
            .one(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

        if receiver.id == requester.id {
            return Err(AppError::BadRequest(
                "You cannot add yourself as a buddy.".to_string(),
            ));
        }

        let existing = buddy_connection::Entity::find()
            .filter(between(requester.id, receiver.id))
            .one(&state.db)
            .await?;
        if existing.is_some() {
            return Err(AppError::BadRequest(
                "A buddy connection with this user already exists.".to_string(),
            ));
        }

        let created = buddy_connection::ActiveModel {
            id: Set(Uuid::new_v4()),
            requester_id: Set(requester.id),
            receiver_id: Set(receiver.id),
            status: Set(STATUS_PENDING.to_string()),
            created_at: Set(Utc::now().fixed_offset()),
        }
        .insert(&state.db)
        .await
        .map_err(|e| conflict_on_unique(e, "Buddy request already sent."))?;

        tracing::info!(requester_id = %requester.id, receiver_id = %receiver.id, "buddy request sent");

        NotificationService::send_best_effort(
            state,
            NewNotification {
                user_id: receiver.id,
                kind: KIND_BUDDY_REQUEST,
                title: "New Buddy Request".to_string(),
                body: format!(
                    "{} wants to connect as accountability buddies",
                    display_name(requester)
                ),
                entity_type: Some("buddy"),
                entity_id: Some(requester.id),
                related_user_id: Some(requester.id),
            },
        )
        .await;

        Ok(created)
    }

    pub async fn accept(
        state: &AppState,
        receiver: &user::Model,
        connection_id: Uuid,
    ) -> Result<buddy_connection::Model, AppError> {
        let connection = Self::find(state, connection_id).await?;
        if connection.receiver_id != receiver.id {
            return Err(AppError::Forbidden(
                "Only the invited user can accept this request.".to_string(),
            ));
        }
        if connection.status == STATUS_ACCEPTED {
            return Ok(connection);
        }

        let requester_id = connection.requester_id;
        let mut active: buddy_connection::ActiveModel = connection.into();
        active.status = Set(STATUS_ACCEPTED.to_string());
        let accepted = active.update(&state.db).await?;

        tracing::info!(%requester_id, receiver_id = %receiver.id, "buddy request accepted");

        NotificationService::send_best_effort(
            state,
            NewNotification {
                user_id: requester_id,
                kind: KIND_BUDDY_ACCEPTED,
                title: "Buddy Request Accepted!".to_string(),
                body: format!("{} accepted your buddy request", display_name(receiver)),
                entity_type: Some("buddy"),
                entity_id: Some(receiver.id),
                related_user_id: Some(receiver.id),
            },
        )
        .await;

        Ok(accepted)
    }

    /// Declining deletes the pending request.
    pub async fn decline(
        state: &AppState,
        receiver_id: Uuid,
        connection_id: Uuid,
    ) -> Result<(), AppError> {
        let connection = Self::find(state, connection_id).await?;
        if connection.receiver_id != receiver_id {
            return Err(AppError::Forbidden(
                "Only the invited user can decline this request.".to_string(),
            ));
        }
        if connection.status != STATUS_PENDING {
            return Err(AppError::BadRequest(
                "Only pending requests can be declined.".to_string(),
            ));
        }
        connection.delete(&state.db).await?;
        Ok(())
    }

    /// Either party may remove a connection.
    pub async fn remove(
        state: &AppState,
        user_id: Uuid,
        connection_id: Uuid,
    ) -> Result<(), AppError> {
        let connection = Self::find(state, connection_id).await?;
        if !connection.involves(user_id) {
            return Err(AppError::NotFound("Buddy connection not found.".to_string()));
        }
        connection.delete(&state.db).await?;
        tracing::info!(%connection_id, %user_id, "buddy connection removed");
        Ok(())
    }

    async fn find(
        state: &AppState,
        connection_id: Uuid,
    ) -> Result<buddy_connection::Model, AppError> {
        buddy_connection::Entity::find_by_id(connection_id)
            .one(&state.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Buddy connection not found.".to_string()))
    }

    async fn with_users(
        state: &AppState,
        user_id: Uuid,
        connections: Vec<buddy_connection::Model>,
    ) -> Result<Vec<BuddyEntry>, AppError> {
        let other_ids: Vec<Uuid> = connections.iter().map(|c| c.other_party(user_id)).collect();
        let users = user::Entity::find()
            .filter(user::Column::Id.is_in(other_ids))
            .all(&state.db)
            .await?;

        Ok(connections
            .into_iter()
            .filter_map(|connection| {
                let other = connection.other_party(user_id);
                users
                    .iter()
                    .find(|u| u.id == other)
                    .cloned()
                    .map(|user| BuddyEntry { connection, user })
            })
            .collect())
    }
}

fn involving(user_id: Uuid) -> Condition {
    Condition::any()
        .add(buddy_connection::Column::RequesterId.eq(user_id))
        .add(buddy_connection::Column::ReceiverId.eq(user_id))
}

fn between(a: Uuid, b: Uuid) -> Condition {
    Condition::any()
        .add(
            Condition::all()
                .add(buddy_connection::Column::RequesterId.eq(a))
                .add(buddy_connection::Column::ReceiverId.eq(b)),
        )
        .add(
            Condition::all()
                .add(buddy_connection::Column::RequesterId.eq(b))
                .add(buddy_connection::Column::ReceiverId.eq(a)),
        )
}

fn display_name(user: &user::Model) -> &str {
    user.display_name.as_deref().unwrap_or(&user.username)
}
