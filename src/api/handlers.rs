use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::models::notification::{NewNotification, Notification, ReadAllResult, UnreadCount};
use crate::AppState;

// ── Request / Response DTOs ──────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotificationRequest {
    pub user_id: Uuid,
    #[serde(flatten)]
    pub notification: NewNotification,
}

fn parse_notification_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::BadRequest(format!("invalid notification id '{}'", raw)))
}

// ── Notification Handlers ────────────────────────────────────

/// `GET /api/notifications`: the current user's notifications, newest first
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<Notification>>, AppError> {
    let notifs = state
        .store
        .list(user_id, state.config.list_limit)
        .await
        .map_err(|e| {
            tracing::error!("list_notifications failed: {}", e);
            AppError::Internal(e)
        })?;

    Ok(Json(notifs))
}

/// `GET /api/notifications/unread-count`: badge count
pub async fn count_unread_notifications(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<UnreadCount>, AppError> {
    let count = state.store.unread_count(user_id).await.map_err(|e| {
        tracing::error!("count_unread_notifications failed: {}", e);
        AppError::Internal(e)
    })?;

    Ok(Json(UnreadCount { count }))
}

/// `PATCH /api/notifications/:id/read`: acknowledge one notification
///
/// Idempotent: acknowledging an already-read notification echoes it again.
pub async fn mark_notification_read(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
    Path(id_str): Path<String>,
) -> Result<Json<Notification>, AppError> {
    let id = parse_notification_id(&id_str)?;

    let notification = state
        .store
        .mark_read(user_id, id)
        .await
        .map_err(|e| {
            tracing::error!("mark_notification_read failed: {}", e);
            AppError::Internal(e)
        })?
        .ok_or(AppError::NotFound)?;

    tracing::debug!(notification_id = id, user_id = %user_id, "notification acknowledged");
    Ok(Json(notification))
}

/// `PATCH /api/notifications/read-all`: acknowledge everything unread
pub async fn mark_all_notifications_read(
    State(state): State<Arc<AppState>>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<ReadAllResult>, AppError> {
    let updated = state.store.mark_all_read(user_id).await.map_err(|e| {
        tracing::error!("mark_all_notifications_read failed: {}", e);
        AppError::Internal(e)
    })?;

    tracing::debug!(updated, user_id = %user_id, "all notifications acknowledged");
    Ok(Json(ReadAllResult { updated }))
}

/// `POST /api/internal/notifications`: producer endpoint (admin key)
pub async fn create_notification(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateNotificationRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Notification>), AppError> {
    let Json(req) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    if req.notification.title.trim().is_empty() {
        return Err(AppError::BadRequest("title must not be empty".into()));
    }

    let notification = state
        .store
        .create(req.user_id, &req.notification)
        .await
        .map_err(|e| {
            tracing::error!("create_notification failed: {}", e);
            AppError::Internal(e)
        })?;

    tracing::info!(
        notification_id = notification.id,
        user_id = %req.user_id,
        kind = notification.kind.as_str(),
        "notification created"
    );
    Ok((StatusCode::CREATED, Json(notification)))
}
