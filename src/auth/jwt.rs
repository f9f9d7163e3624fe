use anyhow::Context;
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;

/// Audience claim carried by every bearer token this API issues.
const AUDIENCE: &str = "data-architect";

/// Claims of a bearer token. There is no refresh flow: a token lives for
/// `JWT_ACCESS_EXPIRATION_SECS` and the client logs in again afterwards.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

/// Sign a bearer token for `user_id`.
///
/// # Errors
///
/// Returns an error if the token cannot be encoded.
pub fn generate_access_token(user_id: Uuid, config: &Config) -> anyhow::Result<String> {
    let issued = Utc::now();
    let lifetime = i64::try_from(config.jwt_access_expiration_secs).unwrap_or(i64::MAX);
    let expires = issued
        .checked_add_signed(Duration::seconds(lifetime))
        .unwrap_or(chrono::DateTime::<Utc>::MAX_UTC);

    let claims = Claims {
        sub: user_id,
        aud: AUDIENCE.to_string(),
        iat: issued.timestamp(),
        exp: expires.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .context("signing bearer token")
}

/// Check signature, audience and expiry of a bearer token.
///
/// # Errors
///
/// Returns an error for a malformed, foreign, tampered or expired token.
pub fn validate_access_token(token: &str, secret: &str) -> anyhow::Result<Claims> {
    let mut validation = Validation::default();
    validation.set_audience(&[AUDIENCE]);

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .context("rejecting bearer token")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issued_token_validates() {
        let config = Config::for_tests("sqlite::memory:");
        let user_id = Uuid::new_v4();
        let token = generate_access_token(user_id, &config).unwrap_or_default();
        let claims = validate_access_token(&token, &config.jwt_secret);
        assert!(claims.is_ok_and(|c| c.sub == user_id && c.exp > c.iat));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let config = Config::for_tests("sqlite::memory:");
        let token = generate_access_token(Uuid::new_v4(), &config).unwrap_or_default();
        assert!(validate_access_token(&token, "another-secret").is_err());
        assert!(validate_access_token("not-a-jwt", &config.jwt_secret).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let config = Config::for_tests("sqlite::memory:");
        let past = Utc::now().timestamp() - 3600;
        let claims = Claims {
            sub: Uuid::new_v4(),
            aud: AUDIENCE.to_string(),
            iat: past - 60,
            exp: past,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap_or_default();
        assert!(validate_access_token(&token, &config.jwt_secret).is_err());
    }
}
