use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use sea_orm::EntityTrait;

use crate::auth::{bearer_token, jwt, query_token};
use crate::entities::user;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user, from `Authorization: Bearer <token>` or a `?token=` query parameter.
///
/// ```ignore
/// async fn handler(AuthUser(user): AuthUser) -> impl IntoResponse { ... }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .map(str::to_string)
            .or_else(|| query_token(parts.uri.query()))
            .ok_or_else(|| AppError::Unauthorized("Authentication required.".to_string()))?;

        let user_id = jwt::validate_access_token(&token, &state.config.jwt_secret)
            .map_err(|e| {
                tracing::debug!("bearer token rejected: {e:#}");
                AppError::Unauthorized("Invalid or expired token.".to_string())
            })?
            .sub;

        let user_model = user::Entity::find_by_id(user_id)
            .one(&state.db)
            .await
            .map_err(|e| AppError::Internal(e.into()))?
            .ok_or_else(|| AppError::Unauthorized("User not found.".to_string()))?;

        Ok(Self(user_model))
    }
}
