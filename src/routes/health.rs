use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    realtime: Option<RealtimeStats>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RealtimeStats {
    open_rooms: usize,
    notification_users: usize,
}

/// `GET /health`: liveness only, no dependencies touched.
async fn liveness() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        database: None,
        realtime: None,
    })
}

/// `GET /api/v1/health`: readiness, including a database ping.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let (status, database) = match state.db.ping().await {
        Ok(()) => (StatusCode::OK, "connected"),
        Err(e) => {
            tracing::warn!("health check database ping failed: {e}");
            (StatusCode::SERVICE_UNAVAILABLE, "disconnected")
        }
    };

    let body = HealthResponse {
        status: if status == StatusCode::OK { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database: Some(database),
        realtime: Some(RealtimeStats {
            open_rooms: state.room_hub.room_count(),
            notification_users: state.notification_hub.user_count(),
        }),
    };

    (status, Json(body))
}

/// Routes mounted at the root.
pub fn root_router() -> Router<AppState> {
    Router::new().route("/health", get(liveness))
}

/// Routes mounted under `/api/v1`.
pub fn api_router() -> Router<AppState> {
    Router::new().route("/health", get(readiness))
}
