//! Client half of the notification flow.
//!
//! Reads go through [`cache::QueryCache`]; writes go through
//! [`mutation::NotificationsClient::mutate`], which invalidates the cache only
//! after the server confirms the write. There is no optimistic update: a
//! failed mutation leaves every cached entry exactly as it was.

use std::time::Duration;

use thiserror::Error;

pub mod cache;
pub mod feed;
pub mod http;
pub mod mutation;

pub use cache::{QueryCache, QueryKey};
pub use feed::{FeedAction, FeedEntry, FeedSnapshot, Icon, Locale, NotificationFeed, Route, Toast};
pub use http::ApiClient;
pub use mutation::{Mutation, NotificationsClient};

/// Errors surfaced by the client. The feed treats them all the same way: the
/// action failed and nothing changed.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request did not complete (connect, DNS, timeout, reset).
    #[error("network failure: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("server rejected request: status {status}")]
    Rejected { status: u16 },

    /// A query answered 2xx with a body that does not parse.
    #[error("malformed response: {0}")]
    Decode(String),

    #[error("invalid client configuration: {0}")]
    Config(String),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server origin, e.g. `http://localhost:8080`.
    pub base_url: String,
    /// Session token sent as `Authorization: Bearer`.
    pub token: String,
    /// How long a fetched query stays fresh without an invalidation.
    pub stale_after: Duration,
    /// Transient-failure retries for queries. Mutations never retry.
    pub query_retries: u32,
    pub connect_timeout: Duration,
    pub locale: Locale,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            stale_after: Duration::from_secs(30),
            query_retries: 3,
            connect_timeout: Duration::from_secs(5),
            locale: Locale::En,
        }
    }

    /// Reads `DESKHUB_API_URL`, `DESKHUB_TOKEN` and `DESKHUB_LOCALE`.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let base_url =
            std::env::var("DESKHUB_API_URL").unwrap_or_else(|_| "http://localhost:8080".into());
        let token = std::env::var("DESKHUB_TOKEN")
            .map_err(|_| anyhow::anyhow!("DESKHUB_TOKEN is not set"))?;

        let mut config = Self::new(base_url, token);
        if let Ok(locale) = std::env::var("DESKHUB_LOCALE") {
            config.locale = locale.parse()?;
        }
        Ok(config)
    }
}
