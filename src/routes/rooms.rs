use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::entities::{player, room};
use crate::error::AppError;
use crate::game::{ActionInput, Role};
use crate::hub::RoomClient;
use crate::services::room_service::{Membership, RoomDetail, RoomLists, TurnDetail};
use crate::services::turn_service::SubmitOutcome;
use crate::services::{RoomService, TurnService};
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Build the room route group: `/rooms/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_rooms).post(create_room))
        .route("/join", post(join_room))
        .route("/{room_id}", get(get_room))
        .route("/{room_id}/start", post(start_game))
        .route("/{room_id}/submit", post(submit_actions))
        .route("/{room_id}/turns/{turn_number}", get(get_turn))
        .route("/{room_id}/ws", get(ws_upgrade))
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateRoomRequest {
    scenario_id: String,
}

#[derive(Deserialize)]
struct JoinRoomRequest {
    code: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest {
    #[serde(default)]
    actions: Vec<ActionInput>,
    event_choice_id: Option<String>,
}

#[derive(Serialize)]
struct MembershipResponse {
    room: room::Model,
    player: player::Model,
}

impl From<Membership> for MembershipResponse {
    fn from(m: Membership) -> Self {
        Self {
            room: m.room,
            player: m.player,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `POST /api/v1/rooms`: open a room for a scenario; the creator plays ARCHITECT.
async fn create_room(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<CreateRoomRequest>,
) -> Result<Response, AppError> {
    let membership = RoomService::create_room(&state, &user, body.scenario_id.trim()).await?;
    Ok((StatusCode::CREATED, Json(MembershipResponse::from(membership))).into_response())
}

/// `POST /api/v1/rooms/join`: take the free seat of a room by its code.
async fn join_room(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<JoinRoomRequest>,
) -> Result<Json<MembershipResponse>, AppError> {
    let (membership, _) = RoomService::join_room(&state, &user, &body.code).await?;
    Ok(Json(membership.into()))
}

/// `GET /api/v1/rooms`: the caller's rooms and open rooms to join.
async fn list_rooms(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<RoomLists>, AppError> {
    Ok(Json(RoomService::list_rooms(&state, user.id).await?))
}

/// `GET /api/v1/rooms/{room_id}`
async fn get_room(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(room_id): Path<Uuid>,
) -> Result<Json<RoomDetail>, AppError> {
    Ok(Json(RoomService::room_detail(&state, room_id, user.id).await?))
}

/// `POST /api/v1/rooms/{room_id}/start`
async fn start_game(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(room_id): Path<Uuid>,
) -> Result<Json<room::Model>, AppError> {
    Ok(Json(TurnService::start_game(&state, room_id, user.id).await?))
}

/// `POST /api/v1/rooms/{room_id}/submit`: plan this turn's actions.
async fn submit_actions(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(room_id): Path<Uuid>,
    Json(body): Json<SubmitRequest>,
) -> Result<Json<SubmitOutcome>, AppError> {
    let outcome =
        TurnService::submit_actions(&state, room_id, &user, body.actions, body.event_choice_id)
            .await?;
    Ok(Json(outcome))
}

/// `GET /api/v1/rooms/{room_id}/turns/{turn_number}`
async fn get_turn(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((room_id, turn_number)): Path<(Uuid, i32)>,
) -> Result<Json<TurnDetail>, AppError> {
    Ok(Json(
        RoomService::get_turn(&state, room_id, user.id, turn_number).await?,
    ))
}

// ─────────────────────────────────────────────────────────────────────────────
// WebSocket
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /api/v1/rooms/{room_id}/ws?token=...`: members only.
async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(room_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let membership = RoomService::load_member(&state, room_id, user.id).await?;
    let role = membership.role();
    Ok(ws.on_upgrade(move |socket| handle_ws_connection(state, room_id, user.id, role, socket)))
}

async fn handle_ws_connection(
    state: AppState,
    room_id: Uuid,
    user_id: Uuid,
    role: Role,
    socket: WebSocket,
) {
    let (mut ws_sink, mut ws_stream) = socket.split();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();
    let connection_id = Uuid::new_v4();
    let first_socket = !state.room_hub.is_connected(room_id, user_id);

    state.room_hub.register(
        room_id,
        connection_id,
        RoomClient {
            user_id,
            role,
            tx: tx.clone(),
        },
    );
    tracing::debug!(
        %room_id,
        %user_id,
        %connection_id,
        connections = state.room_hub.connection_count(room_id),
        "room socket connected"
    );

    let connected = json!({
        "type": "connected",
        "payload": { "roomId": room_id, "userId": user_id, "role": role },
    });
    let _ = ws_sink
        .send(Message::Text(connected.to_string().into()))
        .await;

    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sink.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    if first_socket {
        state.room_hub.emit(
            room_id,
            "presence",
            json!({ "userId": user_id, "role": role, "online": true }),
        );
    }

    while let Some(Ok(msg)) = ws_stream.next().await {
        match msg {
            Message::Text(text) => handle_ws_message(&tx, &text),
            Message::Close(_) => break,
            _ => {}
        }
    }

    send_task.abort();
    let closed = state.room_hub.unregister(room_id, connection_id);
    tracing::debug!(
        %room_id,
        %user_id,
        %connection_id,
        role = ?closed.map(|client| client.role),
        "room socket closed"
    );

    if !state.room_hub.is_connected(room_id, user_id) {
        state.room_hub.emit(
            room_id,
            "presence",
            json!({ "userId": user_id, "role": role, "online": false }),
        );
    }
}

/// Answer inbound client messages. Only `ping` is understood.
fn handle_ws_message(tx: &tokio::sync::mpsc::UnboundedSender<String>, text: &str) {
    let Ok(parsed) = serde_json::from_str::<serde_json::Value>(text) else {
        return;
    };
    if parsed.get("type").and_then(serde_json::Value::as_str) == Some("ping") {
        let pong = json!({
            "type": "pong",
            "payload": { "time": Utc::now().timestamp_millis() },
        });
        let _ = tx.send(pong.to_string());
    }
}
