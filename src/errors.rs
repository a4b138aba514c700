use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid or missing session")]
    Unauthorized,

    #[error("notification not found")]
    NotFound,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("store unavailable")]
    Unavailable,

    #[error("invalid or missing admin key")]
    InvalidAdminKey,

    #[error("producer API disabled")]
    ProducerDisabled,

    #[error("route not found")]
    RouteNotFound,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code, msg) = match &self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "invalid_session",
                "invalid or missing session".to_string(),
            ),
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                "not_found_error",
                "notification_not_found",
                "notification not found".to_string(),
            ),
            AppError::BadRequest(reason) => (
                StatusCode::BAD_REQUEST,
                "invalid_request_error",
                "bad_request",
                reason.clone(),
            ),
            AppError::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "unavailable_error",
                "store_unavailable",
                "store unavailable".to_string(),
            ),
            AppError::InvalidAdminKey => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "invalid_admin_key",
                "invalid or missing X-Admin-Key".to_string(),
            ),
            AppError::ProducerDisabled => (
                StatusCode::FORBIDDEN,
                "permission_error",
                "producer_disabled",
                "producer API is disabled on this server".to_string(),
            ),
            AppError::RouteNotFound => (
                StatusCode::NOT_FOUND,
                "not_found_error",
                "route_not_found",
                "no such route".to_string(),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": msg,
                "type": error_type,
                "code": code,
            }
        }));

        (status, body).into_response()
    }
}
