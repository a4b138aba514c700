//! Notification persistence.
//!
//! The server only talks to `dyn NotificationStore`. Two backends:
//!   - `PgStore`: Postgres via sqlx, the production backend.
//!   - `MemoryStore`: process-local, used by tests and `DESKHUB_STORE=memory`.
//!
//! Every operation is scoped by the owning user; another user's notification
//! behaves exactly like a missing one.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::notification::{NewNotification, Notification};

pub mod memory;
pub mod postgres;

#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Insert a notification for `user_id`. The store assigns `id` and `time`.
    async fn create(&self, user_id: Uuid, new: &NewNotification) -> anyhow::Result<Notification>;

    /// Newest first (`time` desc, then `id` desc), at most `limit` rows.
    async fn list(&self, user_id: Uuid, limit: i64) -> anyhow::Result<Vec<Notification>>;

    async fn unread_count(&self, user_id: Uuid) -> anyhow::Result<i64>;

    /// Set `is_read = true`. Returns the row, or `None` if the user owns no
    /// notification with this id. Already-read rows are returned unchanged.
    async fn mark_read(&self, user_id: Uuid, id: i64) -> anyhow::Result<Option<Notification>>;

    /// Returns how many rows flipped from unread to read.
    async fn mark_all_read(&self, user_id: Uuid) -> anyhow::Result<u64>;

    /// Cheap liveness probe for `/readyz`.
    async fn ping(&self) -> anyhow::Result<()>;
}
