use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::response::sse::{Event, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use futures_util::Stream;
use serde_json::{Value, json};
use tokio::time::{Instant, Interval};
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::entities::notification;
use crate::error::AppError;
use crate::hub::Subscription;
use crate::services::NotificationService;
use crate::state::AppState;

/// Client reconnect delay sent with the first event.
const RECONNECT_AFTER: Duration = Duration::from_millis(5000);

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Build the notification route group: `/notifications/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/unread-count", get(unread_count))
        .route("/mark-all-read", post(mark_all_read))
        .route("/stream", get(stream))
        .route("/{notification_id}/read", post(mark_read))
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /api/v1/notifications`: newest first, at most 50.
async fn list_notifications(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<notification::Model>>, AppError> {
    Ok(Json(NotificationService::list(&state, user.id).await?))
}

/// `GET /api/v1/notifications/unread-count`
async fn unread_count(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, AppError> {
    let count = NotificationService::unread_count(&state, user.id).await?;
    Ok(Json(json!({ "count": count })))
}

/// `POST /api/v1/notifications/{notification_id}/read`
async fn mark_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<notification::Model>, AppError> {
    Ok(Json(
        NotificationService::mark_read(&state, user.id, notification_id).await?,
    ))
}

/// `POST /api/v1/notifications/mark-all-read`
async fn mark_all_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Value>, AppError> {
    let updated = NotificationService::mark_all_read(&state, user.id).await?;
    Ok(Json(json!({ "updated": updated })))
}

// ─────────────────────────────────────────────────────────────────────────────
// Server-Sent Events
// ─────────────────────────────────────────────────────────────────────────────

struct StreamState {
    greeting: Option<Event>,
    subscription: Subscription,
    heartbeat: Interval,
}

/// `GET /api/v1/notifications/stream?token=...`
///
/// Emits `connected`, then `notification` / `unreadCount` as they happen and a
/// `heartbeat` every `SSE_HEARTBEAT_SECS`. The stream unregisters itself when
/// the client goes away.
async fn stream(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let period = Duration::from_secs(state.config.sse_heartbeat_secs.max(1));
    let greeting = Event::default()
        .event("connected")
        .data(json!({ "userId": user.id }).to_string())
        .retry(RECONNECT_AFTER);

    let subscription = state.notification_hub.subscribe(user.id);
    tracing::info!(
        user_id = %user.id,
        streams = state.notification_hub.stream_count(user.id),
        "notification stream opened"
    );

    let initial = StreamState {
        greeting: Some(greeting),
        subscription,
        heartbeat: tokio::time::interval_at(Instant::now() + period, period),
    };

    Sse::new(futures_util::stream::unfold(initial, next_event))
}

async fn next_event(mut s: StreamState) -> Option<(Result<Event, Infallible>, StreamState)> {
    if let Some(greeting) = s.greeting.take() {
        return Some((Ok(greeting), s));
    }

    let event = tokio::select! {
        pushed = s.subscription.rx.recv() => {
            let push = pushed?;
            Event::default().event(push.name).data(push.data)
        }
        _ = s.heartbeat.tick() => Event::default()
            .event("heartbeat")
            .data(json!({ "time": Utc::now().to_rfc3339() }).to_string()),
    };
    Some((Ok(event), s))
}
