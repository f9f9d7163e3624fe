use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, TransactionTrait};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::auth::{jwt, password};
use crate::entities::user;
use crate::error::AppError;
use crate::services::HabitService;
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Build the auth route group: `/auth/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(get_me))
}

/// Build the presence route group: `/me/...`
pub fn me_router() -> Router<AppState> {
    Router::new().route("/heartbeat", post(heartbeat))
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest {
    email: String,
    username: String,
    password: String,
    display_name: Option<String>,
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct AuthResponse {
    user: user::Model,
    token: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `POST /api/v1/auth/register`: create an account, seed its default habits,
/// and return a bearer token.
async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Response, AppError> {
    let email = body.email.trim().to_lowercase();
    let username = body.username.trim().to_string();

    password::validate_email(&email).map_err(AppError::BadRequest)?;
    password::validate_username(&username).map_err(AppError::BadRequest)?;
    password::validate_password(&body.password).map_err(AppError::BadRequest)?;

    let existing_email = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    if existing_email.is_some() {
        return Err(AppError::Conflict("Email already registered.".to_string()));
    }

    let existing_username = user::Entity::find()
        .filter(user::Column::Username.eq(&username))
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    if existing_username.is_some() {
        return Err(AppError::Conflict("Username already taken.".to_string()));
    }

    let password_hash = password::hash_password(&body.password)?;
    let display_name = body
        .display_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    let txn = state
        .db
        .begin()
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let user_model = user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        username: Set(username),
        password_hash: Set(password_hash),
        display_name: Set(display_name),
        last_seen_at: Set(None),
        created_at: Set(Utc::now().fixed_offset()),
    }
    .insert(&txn)
    .await
    .map_err(|e| crate::services::conflict_on_unique(e, "Email or username already taken."))?;

    HabitService::seed_defaults(&txn, user_model.id).await?;

    txn.commit()
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    tracing::info!(user_id = %user_model.id, username = %user_model.username, "user registered");

    let token = jwt::generate_access_token(user_model.id, &state.config)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: user_model,
            token,
        }),
    )
        .into_response())
}

/// `POST /api/v1/auth/login`: exchange email and password for a bearer token.
async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let invalid = || AppError::Unauthorized("Invalid email or password.".to_string());
    let email = body.email.trim().to_lowercase();

    let user_model = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(invalid)?;

    if !password::verify_password(&body.password, &user_model.password_hash)? {
        tracing::debug!(user_id = %user_model.id, "login rejected: wrong password");
        return Err(invalid());
    }

    let token = jwt::generate_access_token(user_model.id, &state.config)?;
    Ok(Json(AuthResponse {
        user: user_model,
        token,
    }))
}

/// `GET /api/v1/auth/me`: the authenticated user.
async fn get_me(AuthUser(user_model): AuthUser) -> Json<user::Model> {
    Json(user_model)
}

/// `POST /api/v1/me/heartbeat`: record that the user is online.
async fn heartbeat(
    State(state): State<AppState>,
    AuthUser(user_model): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let mut active: user::ActiveModel = user_model.into();
    active.last_seen_at = Set(Some(Utc::now().fixed_offset()));
    active
        .update(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(Json(json!({ "ok": true })))
}
