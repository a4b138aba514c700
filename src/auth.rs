//! Session resolution.
//!
//! Session tokens are HS256 JWTs issued by the identity provider (Supabase
//! auth). The `sub` claim is the user id; `aud` must be `authenticated`.
//! The producer endpoint is guarded separately by `X-Admin-Key`.

use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::AppState;

pub const SESSION_AUDIENCE: &str = "authenticated";

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub aud: String,
    pub exp: i64,
    #[serde(default)]
    pub role: Option<String>,
}

/// Decode and validate a session token, returning the user id.
pub fn verify_session(token: &str, secret: &str) -> Result<Uuid, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[SESSION_AUDIENCE]);

    let data = jsonwebtoken::decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!("session token rejected: {}", e);
        AppError::Unauthorized
    })?;

    Uuid::parse_str(&data.claims.sub).map_err(|_| AppError::Unauthorized)
}

/// Mint a session token. Used by the CLI for local development and by tests;
/// production tokens come from the identity provider.
pub fn issue_session(user_id: Uuid, secret: &str, ttl: chrono::Duration) -> anyhow::Result<String> {
    let claims = SessionClaims {
        sub: user_id.to_string(),
        aud: SESSION_AUDIENCE.to_string(),
        exp: (chrono::Utc::now() + ttl).timestamp(),
        role: Some(SESSION_AUDIENCE.to_string()),
    };
    let token = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    Ok(token)
}

/// The authenticated user, resolved from `Authorization: Bearer <jwt>`.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub Uuid);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AppError::Unauthorized)?;

        let user_id = verify_session(token, &state.config.jwt_secret)?;
        Ok(CurrentUser(user_id))
    }
}

/// Middleware: validates `X-Admin-Key` against the configured admin key.
/// With no admin key configured the guarded routes are closed.
pub async fn admin_auth(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let expected = match state.config.admin_key.as_deref() {
        Some(k) => k,
        None => {
            tracing::warn!("producer endpoint called but DESKHUB_ADMIN_KEY is not set");
            return Err(AppError::ProducerDisabled);
        }
    };

    let provided = req.headers().get("x-admin-key").and_then(|v| v.to_str().ok());

    match provided {
        Some(k) if k == expected => Ok(next.run(req).await),
        Some(k) => {
            // Never log the expected key or the full provided key
            let masked = if k.len() > 8 {
                format!("{}…{}", &k[..4], &k[k.len() - 4..])
            } else {
                "****".to_string()
            };
            tracing::warn!("producer API: invalid admin key (provided: '{}')", masked);
            Err(AppError::InvalidAdminKey)
        }
        None => {
            tracing::warn!("producer API: missing X-Admin-Key header");
            Err(AppError::InvalidAdminKey)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_issued_session_round_trips_user_id() {
        let user = Uuid::new_v4();
        let token = issue_session(user, SECRET, chrono::Duration::minutes(5)).unwrap();
        assert_eq!(verify_session(&token, SECRET).unwrap(), user);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = issue_session(Uuid::new_v4(), SECRET, chrono::Duration::minutes(5)).unwrap();
        assert!(matches!(
            verify_session(&token, "other-secret"),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_expired_session_is_rejected() {
        let token = issue_session(Uuid::new_v4(), SECRET, chrono::Duration::hours(-2)).unwrap();
        assert!(verify_session(&token, SECRET).is_err());
    }

    #[test]
    fn test_non_uuid_subject_is_rejected() {
        let claims = SessionClaims {
            sub: "not-a-uuid".into(),
            aud: SESSION_AUDIENCE.into(),
            exp: (chrono::Utc::now() + chrono::Duration::minutes(5)).timestamp(),
            role: None,
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();
        assert!(verify_session(&token, SECRET).is_err());
    }
}
