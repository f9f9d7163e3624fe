mod auth;
mod buddies;
mod habits;
mod health;
mod notifications;
mod rooms;
mod tracker;

use axum::Router;

use crate::state::AppState;

/// Build the complete application router.
///
/// Structure:
/// - `GET /health`: liveness probe
/// - `GET /api/v1/health`: readiness with database and realtime stats
/// - `/api/v1/auth`, `/api/v1/me`: accounts and presence heartbeat
/// - `/api/v1/rooms`: Data Architect rooms, turns and the room socket
/// - `/api/v1/habits`, `/api/v1/habit-logs`, `/api/v1/buddies`: Anchors
/// - `/api/v1/notifications`: inbox and SSE stream
/// - `/api/v1/tracker`: single-user offline tracker document
pub fn router() -> Router<AppState> {
    let api_v1 = Router::new()
        .merge(health::api_router())
        .nest("/auth", auth::router())
        .nest("/me", auth::me_router())
        .nest("/rooms", rooms::router())
        .nest("/habits", habits::router())
        .nest("/habit-logs", habits::logs_router())
        .nest("/buddies", buddies::router())
        .nest("/notifications", notifications::router())
        .nest("/tracker", tracker::router());

    Router::new()
        .merge(health::root_router())
        .nest("/api/v1", api_v1)
}
