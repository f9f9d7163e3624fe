use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::auth::middleware::AuthUser;
use crate::error::AppError;
use crate::state::AppState;
use crate::tracker::{HabitUpdate, NewHabit, NewTask, PlannerDay, TaskUpdate, TrackerState};
use crate::utils::dates::parse_iso_date;
use crate::utils::nullable;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Build the offline tracker route group: `/tracker/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_state).delete(clear))
        .route("/export", get(export))
        .route("/import", post(import))
        .route("/habits", post(add_habit))
        .route("/habits/order", put(reorder_habits))
        .route("/habits/{habit_id}", patch(update_habit).delete(delete_habit))
        .route("/habit-logs/toggle", post(toggle_log))
        .route("/planner/{date}", get(planner_day))
        .route("/planner/{date}/tasks", post(add_task))
        .route(
            "/planner/{date}/tasks/{task_id}",
            patch(update_task).delete(delete_task),
        )
        .route("/planner/{date}/tasks/{task_id}/toggle", post(toggle_task))
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddHabitRequest {
    name: String,
    emoji: Option<String>,
    target_per_week: Option<u8>,
    is_active: Option<bool>,
}

/// `emoji: null` clears the emoji; an absent field leaves it alone.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateHabitRequest {
    name: Option<String>,
    #[serde(default, deserialize_with = "nullable::present")]
    emoji: Option<Option<String>>,
    target_per_week: Option<u8>,
    is_active: Option<bool>,
}

#[derive(Deserialize)]
struct ReorderRequest {
    ids: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToggleLogRequest {
    #[serde(rename = "dateISO")]
    date_iso: String,
    habit_id: String,
}

#[derive(Deserialize)]
struct AddTaskRequest {
    title: String,
    time: Option<String>,
    notes: Option<String>,
}

#[derive(Deserialize)]
struct UpdateTaskRequest {
    title: Option<String>,
    done: Option<bool>,
    #[serde(default, deserialize_with = "nullable::present")]
    time: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable::present")]
    notes: Option<Option<String>>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn checked_date(date: &str) -> Result<&str, AppError> {
    parse_iso_date(date).map_err(AppError::BadRequest)?;
    Ok(date.trim())
}

fn not_found(what: &str) -> AppError {
    AppError::NotFound(format!("{what} not found."))
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /api/v1/tracker`
async fn get_state(State(state): State<AppState>, _: AuthUser) -> Json<TrackerState> {
    Json(state.tracker.lock().await.state().clone())
}

/// `DELETE /api/v1/tracker`: forget everything and start from the defaults.
async fn clear(State(state): State<AppState>, _: AuthUser) -> Json<TrackerState> {
    let mut store = state.tracker.lock().await;
    store.clear().await;
    tracing::info!("tracker data cleared");
    Json(store.state().clone())
}

/// `GET /api/v1/tracker/export`: pretty-printed document as a download.
async fn export(State(state): State<AppState>, _: AuthUser) -> Result<Response, AppError> {
    let body = state.tracker.lock().await.state().export_json()?;
    let filename = format!(
        "attachment; filename=\"habit-tracker-{}.json\"",
        crate::utils::dates::today_iso()
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, filename),
        ],
        body,
    )
        .into_response())
}

/// `POST /api/v1/tracker/import`: body is an exported document.
async fn import(
    State(state): State<AppState>,
    _: AuthUser,
    body: String,
) -> Result<Json<TrackerState>, AppError> {
    let mut store = state.tracker.lock().await;
    store
        .import_json(&body)
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid tracker data: {e}")))?;
    Ok(Json(store.state().clone()))
}

/// `POST /api/v1/tracker/habits`
async fn add_habit(
    State(state): State<AppState>,
    _: AuthUser,
    Json(body): Json<AddHabitRequest>,
) -> Result<Response, AppError> {
    let name = body.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("Habit name is required.".to_string()));
    }
    let new_habit = NewHabit {
        name,
        emoji: body.emoji,
        target_per_week: body.target_per_week,
        is_active: body.is_active,
    };
    let mut store = state.tracker.lock().await;
    let id = store.update(|s| s.add_habit(new_habit)).await;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))).into_response())
}

/// `PATCH /api/v1/tracker/habits/{habit_id}`
async fn update_habit(
    State(state): State<AppState>,
    _: AuthUser,
    Path(habit_id): Path<String>,
    Json(body): Json<UpdateHabitRequest>,
) -> Result<StatusCode, AppError> {
    let update = HabitUpdate {
        name: body.name,
        emoji: body.emoji,
        target_per_week: body.target_per_week,
        is_active: body.is_active,
    };
    let found = state
        .tracker
        .lock()
        .await
        .update(|s| s.update_habit(&habit_id, update))
        .await;
    if found {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Habit"))
    }
}

/// `DELETE /api/v1/tracker/habits/{habit_id}`: drops the habit's logs too.
async fn delete_habit(
    State(state): State<AppState>,
    _: AuthUser,
    Path(habit_id): Path<String>,
) -> StatusCode {
    state
        .tracker
        .lock()
        .await
        .update(|s| s.delete_habit(&habit_id))
        .await;
    StatusCode::NO_CONTENT
}

/// `PUT /api/v1/tracker/habits/order`
async fn reorder_habits(
    State(state): State<AppState>,
    _: AuthUser,
    Json(body): Json<ReorderRequest>,
) -> Json<TrackerState> {
    let ids: Vec<&str> = body.ids.iter().map(String::as_str).collect();
    let mut store = state.tracker.lock().await;
    store.update(|s| s.reorder_habits(&ids)).await;
    Json(store.state().clone())
}

/// `POST /api/v1/tracker/habit-logs/toggle`
async fn toggle_log(
    State(state): State<AppState>,
    _: AuthUser,
    Json(body): Json<ToggleLogRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let date = checked_date(&body.date_iso)?;
    let mut store = state.tracker.lock().await;
    store.update(|s| s.toggle_habit_log(date, &body.habit_id)).await;
    let log = store.state().habit_log(date, &body.habit_id).cloned();
    Ok(Json(json!({ "log": log })))
}

/// `GET /api/v1/tracker/planner/{date}`
async fn planner_day(
    State(state): State<AppState>,
    _: AuthUser,
    Path(date): Path<String>,
) -> Result<Json<PlannerDay>, AppError> {
    let date = checked_date(&date)?;
    Ok(Json(state.tracker.lock().await.state().planner_day(date)))
}

/// `POST /api/v1/tracker/planner/{date}/tasks`
async fn add_task(
    State(state): State<AppState>,
    _: AuthUser,
    Path(date): Path<String>,
    Json(body): Json<AddTaskRequest>,
) -> Result<Response, AppError> {
    let date = checked_date(&date)?;
    let title = body.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::BadRequest("Task title is required.".to_string()));
    }
    let new_task = NewTask {
        title,
        time: body.time,
        notes: body.notes,
    };
    let mut store = state.tracker.lock().await;
    let id = store.update(|s| s.add_task(date, new_task)).await;
    Ok((StatusCode::CREATED, Json(json!({ "id": id }))).into_response())
}

/// `PATCH /api/v1/tracker/planner/{date}/tasks/{task_id}`
async fn update_task(
    State(state): State<AppState>,
    _: AuthUser,
    Path((date, task_id)): Path<(String, String)>,
    Json(body): Json<UpdateTaskRequest>,
) -> Result<StatusCode, AppError> {
    let date = checked_date(&date)?;
    let update = TaskUpdate {
        title: body.title,
        done: body.done,
        time: body.time,
        notes: body.notes,
    };
    let found = state
        .tracker
        .lock()
        .await
        .update(|s| s.update_task(date, &task_id, update))
        .await;
    if found {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Task"))
    }
}

/// `DELETE /api/v1/tracker/planner/{date}/tasks/{task_id}`
async fn delete_task(
    State(state): State<AppState>,
    _: AuthUser,
    Path((date, task_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let date = checked_date(&date)?;
    state
        .tracker
        .lock()
        .await
        .update(|s| s.delete_task(date, &task_id))
        .await;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/v1/tracker/planner/{date}/tasks/{task_id}/toggle`
async fn toggle_task(
    State(state): State<AppState>,
    _: AuthUser,
    Path((date, task_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    let date = checked_date(&date)?;
    let found = state
        .tracker
        .lock()
        .await
        .update(|s| s.toggle_task(date, &task_id))
        .await;
    if found {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found("Task"))
    }
}
