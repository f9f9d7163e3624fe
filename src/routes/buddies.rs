use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::entities::{buddy_connection, user};
use crate::error::AppError;
use crate::services::BuddyService;
use crate::services::buddy_service::BuddyEntry;
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Build the buddy route group: `/buddies/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_buddies))
        .route("/pending", get(list_pending))
        .route("/invite", post(invite))
        .route("/{connection_id}/accept", post(accept))
        .route("/{connection_id}/decline", post(decline))
        .route("/{connection_id}", delete(remove))
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct InviteRequest {
    username: String,
}

/// What a buddy may see of the other user.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PublicProfile {
    id: Uuid,
    username: String,
    display_name: Option<String>,
    last_seen_at: Option<String>,
}

impl From<user::Model> for PublicProfile {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username,
            display_name: u.display_name,
            last_seen_at: u.last_seen_at.map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BuddyResponse {
    #[serde(flatten)]
    connection: buddy_connection::Model,
    buddy: PublicProfile,
}

impl From<BuddyEntry> for BuddyResponse {
    fn from(entry: BuddyEntry) -> Self {
        Self {
            connection: entry.connection,
            buddy: entry.user.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /api/v1/buddies`: all connections, pending or accepted.
async fn list_buddies(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<BuddyResponse>>, AppError> {
    let entries = BuddyService::list(&state, user.id).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

/// `GET /api/v1/buddies/pending`: requests waiting for the caller.
async fn list_pending(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<BuddyResponse>>, AppError> {
    let entries = BuddyService::pending(&state, user.id).await?;
    Ok(Json(entries.into_iter().map(Into::into).collect()))
}

/// `POST /api/v1/buddies/invite`
async fn invite(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<InviteRequest>,
) -> Result<Response, AppError> {
    let created = BuddyService::invite(&state, &user, &body.username).await?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

/// `POST /api/v1/buddies/{connection_id}/accept`
async fn accept(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(connection_id): Path<Uuid>,
) -> Result<Json<buddy_connection::Model>, AppError> {
    Ok(Json(BuddyService::accept(&state, &user, connection_id).await?))
}

/// `POST /api/v1/buddies/{connection_id}/decline`
async fn decline(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(connection_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    BuddyService::decline(&state, user.id, connection_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /api/v1/buddies/{connection_id}`
async fn remove(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(connection_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    BuddyService::remove(&state, user.id, connection_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
