use crate::models::notification::{Notification, ReadAllResult, UnreadCount};

use super::cache::{QueryCache, QueryKey};
use super::http::ApiClient;
use super::{ClientConfig, ClientError};

/// Read-state writes the client can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// Acknowledge one notification.
    MarkRead(i64),
    MarkAllRead,
}

const READ_STATE_KEYS: &[QueryKey] = &[QueryKey::NOTIFICATIONS, QueryKey::UNREAD_COUNT];

impl Mutation {
    pub fn path(&self) -> String {
        match self {
            Mutation::MarkRead(id) => format!("/api/notifications/{}/read", id),
            Mutation::MarkAllRead => "/api/notifications/read-all".to_string(),
        }
    }

    /// Query keys made stale by a confirmed write of this kind.
    pub fn invalidates(&self) -> &'static [QueryKey] {
        match self {
            Mutation::MarkRead(_) | Mutation::MarkAllRead => READ_STATE_KEYS,
        }
    }
}

/// Cached queries plus the mutations that invalidate them.
pub struct NotificationsClient {
    api: ApiClient,
    cache: QueryCache,
}

impl NotificationsClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        Ok(Self {
            api: ApiClient::new(config)?,
            cache: QueryCache::new(config.stale_after),
        })
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// The current user's notifications, through the cache.
    pub async fn notifications(&self) -> Result<Vec<Notification>, ClientError> {
        let key = QueryKey::NOTIFICATIONS;
        self.cache
            .fetch_with(key, || self.api.get_json(key.path()))
            .await
    }

    /// Unread badge count, through the cache. Never negative.
    pub async fn unread_count(&self) -> Result<i64, ClientError> {
        let key = QueryKey::UNREAD_COUNT;
        let body: UnreadCount = self
            .cache
            .fetch_with(key, || self.api.get_json(key.path()))
            .await?;
        Ok(body.count.max(0))
    }

    /// Send `mutation`; on a confirmed write, invalidate its keys. On failure
    /// the cache is not touched.
    pub async fn mutate(&self, mutation: Mutation) -> Result<Option<serde_json::Value>, ClientError> {
        let echo = self.api.patch(&mutation.path()).await?;
        self.cache.invalidate(mutation.invalidates());
        tracing::debug!(?mutation, "mutation confirmed");
        Ok(echo)
    }

    /// Mark one notification read. Returns the server's echo when it sent one.
    pub async fn acknowledge(&self, id: i64) -> Result<Option<Notification>, ClientError> {
        let echo = self.mutate(Mutation::MarkRead(id)).await?;
        Ok(echo.and_then(|v| serde_json::from_value(v).ok()))
    }

    /// Mark every notification read. Returns the flipped count when reported.
    pub async fn acknowledge_all(&self) -> Result<Option<u64>, ClientError> {
        let echo = self.mutate(Mutation::MarkAllRead).await?;
        Ok(echo
            .and_then(|v| serde_json::from_value::<ReadAllResult>(v).ok())
            .map(|r| r.updated))
    }
}
