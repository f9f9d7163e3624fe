use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::entities::{habit, habit_log};
use crate::error::AppError;
use crate::services::HabitService;
use crate::services::habit_service::HabitChanges;
use crate::state::AppState;
use crate::utils::dates::today_iso;
use crate::utils::nullable;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Build the habit route group: `/habits/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_habits).post(create_habit))
        .route("/{habit_id}", patch(update_habit).delete(delete_habit))
}

/// Build the habit log route group: `/habit-logs/...`
pub fn logs_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_logs))
        .route("/toggle", post(toggle_log))
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateHabitRequest {
    name: String,
    emoji: Option<String>,
    target_per_week: Option<i32>,
    is_active: Option<bool>,
}

/// `emoji: null` clears the emoji; an absent field leaves it alone.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateHabitRequest {
    name: Option<String>,
    #[serde(default, deserialize_with = "nullable::present")]
    emoji: Option<Option<String>>,
    target_per_week: Option<i32>,
    is_active: Option<bool>,
    sort_order: Option<i32>,
}

#[derive(Deserialize)]
struct LogsQuery {
    date: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToggleRequest {
    habit_id: Uuid,
    #[serde(rename = "dateISO")]
    date_iso: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ToggleResponse {
    log: habit_log::Model,
    #[serde(skip_serializing_if = "Option::is_none")]
    milestone: Option<u64>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /api/v1/habits`
async fn list_habits(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<habit::Model>>, AppError> {
    Ok(Json(HabitService::list(&state, user.id).await?))
}

/// `POST /api/v1/habits`
async fn create_habit(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<CreateHabitRequest>,
) -> Result<Response, AppError> {
    let created = HabitService::create(
        &state,
        user.id,
        &body.name,
        body.emoji,
        body.target_per_week,
        body.is_active,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

/// `PATCH /api/v1/habits/{habit_id}`
async fn update_habit(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(habit_id): Path<Uuid>,
    Json(body): Json<UpdateHabitRequest>,
) -> Result<Json<habit::Model>, AppError> {
    let changes = HabitChanges {
        name: body.name,
        emoji: body.emoji,
        target_per_week: body.target_per_week,
        is_active: body.is_active,
        sort_order: body.sort_order,
    };
    Ok(Json(
        HabitService::update(&state, user.id, habit_id, changes).await?,
    ))
}

/// `DELETE /api/v1/habits/{habit_id}`: also removes the habit's logs.
async fn delete_habit(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(habit_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    HabitService::delete(&state, user.id, habit_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/v1/habit-logs?date=YYYY-MM-DD`: defaults to today (UTC).
async fn list_logs(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<LogsQuery>,
) -> Result<Json<Vec<habit_log::Model>>, AppError> {
    let date = query.date.unwrap_or_else(today_iso);
    Ok(Json(
        HabitService::logs_for_date(&state, user.id, date.trim()).await?,
    ))
}

/// `POST /api/v1/habit-logs/toggle`
async fn toggle_log(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<ToggleRequest>,
) -> Result<Json<ToggleResponse>, AppError> {
    let outcome = HabitService::toggle(&state, &user, body.habit_id, body.date_iso.trim()).await?;
    Ok(Json(ToggleResponse {
        log: outcome.log,
        milestone: outcome.milestone,
    }))
}
