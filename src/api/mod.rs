use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderName, HeaderValue, Method},
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::admin_auth;
use crate::errors::AppError;
use crate::AppState;

pub mod handlers;

/// Notification routes for the signed-in user.
pub fn notifications_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/notifications", get(handlers::list_notifications))
        .route(
            "/api/notifications/unread-count",
            get(handlers::count_unread_notifications),
        )
        .route(
            "/api/notifications/read-all",
            patch(handlers::mark_all_notifications_read),
        )
        .route(
            "/api/notifications/:id/read",
            patch(handlers::mark_notification_read),
        )
}

/// Producer routes, guarded by `X-Admin-Key`.
pub fn internal_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/internal/notifications",
            post(handlers::create_notification),
        )
        .route_layer(middleware::from_fn_with_state(state, admin_auth))
}

/// The full HTTP application with health endpoints and middleware.
pub fn app(state: Arc<AppState>) -> Router {
    let dashboard_origin = state.config.dashboard_origin.clone();

    Router::new()
        // Health endpoints (no auth)
        .route("/healthz", get(|| async { "ok" }))
        .route("/readyz", get(readiness_check))
        .merge(notifications_router())
        .merge(internal_router(state.clone()))
        .fallback(fallback_404)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
                    let origin_str = origin.to_str().unwrap_or("");
                    origin_str == dashboard_origin
                        || origin_str.starts_with("http://localhost:")
                        || origin_str.starts_with("http://127.0.0.1:")
                }))
                .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
                .allow_headers([
                    HeaderName::from_static("content-type"),
                    HeaderName::from_static("authorization"),
                    HeaderName::from_static("x-request-id"),
                ])
                .allow_credentials(true),
        )
        .layer(middleware::from_fn(request_id_middleware))
}

async fn fallback_404() -> AppError {
    AppError::RouteNotFound
}

async fn readiness_check(State(state): State<Arc<AppState>>) -> Result<&'static str, AppError> {
    state.store.ping().await.map_err(|e| {
        tracing::warn!("readiness check failed: {}", e);
        AppError::Unavailable
    })?;
    Ok("ok")
}

/// Middleware: tags every response with a unique X-Request-Id so clients can
/// correlate errors with server logs.
async fn request_id_middleware(
    req: axum::extract::Request,
    next: middleware::Next,
) -> axum::response::Response {
    let req_id = uuid::Uuid::new_v4().to_string();
    let mut resp = next.run(req).await;
    if let Ok(val) = HeaderValue::from_str(&req_id) {
        resp.headers_mut().insert("x-request-id", val);
    }
    resp
}
