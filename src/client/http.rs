/// HTTP transport for the notification API.
/// Queries go through reqwest-middleware with transient retries; mutations
/// use a bare client so a write is sent exactly once per call.
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::de::DeserializeOwned;

use super::{ClientConfig, ClientError};

pub struct ApiClient {
    base_url: String,
    queries: ClientWithMiddleware,
    mutations: reqwest::Client,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let base = url::Url::parse(&config.base_url)
            .map_err(|e| ClientError::Config(format!("base_url '{}': {}", config.base_url, e)))?;

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|_| ClientError::Config("token is not a valid header value".into()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let build = || {
            reqwest::Client::builder()
                .use_rustls_tls()
                .default_headers(headers.clone())
                .connect_timeout(config.connect_timeout)
                .build()
                .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {}", e)))
        };

        let retry_policy =
            ExponentialBackoff::builder().build_with_max_retries(config.query_retries);
        let queries = ClientBuilder::new(build()?)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            base_url: base.as_str().trim_end_matches('/').to_string(),
            queries,
            mutations: build()?,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET `path` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let resp = self.queries.get(self.url(path)).send().await.map_err(|e| {
            tracing::warn!(path, "query failed after retries: {}", e);
            ClientError::Network(e.to_string())
        })?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(path, status = status.as_u16(), "query rejected");
            return Err(ClientError::Rejected {
                status: status.as_u16(),
            });
        }

        resp.json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// PATCH `path` with no body. A 2xx is a confirmed write; the echo body is
    /// returned when it is present and valid JSON, otherwise `None`.
    pub async fn patch(&self, path: &str) -> Result<Option<serde_json::Value>, ClientError> {
        let resp = self.mutations.patch(self.url(path)).send().await.map_err(|e| {
            tracing::warn!(path, "mutation request failed: {}", e);
            ClientError::Network(e.to_string())
        })?;

        let status = resp.status();
        if !status.is_success() {
            tracing::warn!(path, status = status.as_u16(), "mutation rejected");
            return Err(ClientError::Rejected {
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().await.unwrap_or_default();
        if body.is_empty() {
            return Ok(None);
        }
        Ok(serde_json::from_slice(&body).ok())
    }
}
