use dashmap::DashMap;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::time::{Duration, Instant};

use super::ClientError;

/// Identity of a cached query. The key is the request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryKey(&'static str);

impl QueryKey {
    pub const NOTIFICATIONS: QueryKey = QueryKey("/api/notifications");
    pub const UNREAD_COUNT: QueryKey = QueryKey("/api/notifications/unread-count");

    pub fn path(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

/// One named entry. `epoch` is bumped by every invalidation so a fetch that
/// started before the invalidation cannot store its result as fresh.
struct Slot {
    value: Option<String>,
    fetched_at: Instant,
    stale: bool,
    epoch: u64,
}

impl Slot {
    fn empty() -> Self {
        Self {
            value: None,
            fetched_at: Instant::now(),
            stale: true,
            epoch: 0,
        }
    }

    fn is_fresh(&self, stale_after: Duration) -> bool {
        self.value.is_some() && !self.stale && self.fetched_at.elapsed() < stale_after
    }
}

/// Read-through cache of query results, keyed by query identity.
///
/// Values are stored as JSON and never edited in place; the only writes are
/// a completed fetch and an invalidation.
pub struct QueryCache {
    slots: DashMap<QueryKey, Slot>,
    stale_after: Duration,
}

impl QueryCache {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            slots: DashMap::new(),
            stale_after,
        }
    }

    /// The cached value if it is fresh.
    pub fn get_fresh<T: DeserializeOwned>(&self, key: QueryKey) -> Option<T> {
        let slot = self.slots.get(&key)?;
        if !slot.is_fresh(self.stale_after) {
            return None;
        }
        serde_json::from_str(slot.value.as_deref()?).ok()
    }

    /// The last fetched value, fresh or not.
    pub fn peek<T: DeserializeOwned>(&self, key: QueryKey) -> Option<T> {
        let slot = self.slots.get(&key)?;
        serde_json::from_str(slot.value.as_deref()?).ok()
    }

    /// True when the next read of `key` will hit the server.
    pub fn is_stale(&self, key: QueryKey) -> bool {
        self.slots
            .get(&key)
            .map(|slot| !slot.is_fresh(self.stale_after))
            .unwrap_or(true)
    }

    /// Return the fresh value for `key`, or run `fetch` and cache its result.
    /// A failed fetch leaves the slot untouched.
    pub async fn fetch_with<T, F, Fut>(&self, key: QueryKey, fetch: F) -> Result<T, ClientError>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        if let Some(value) = self.get_fresh(key) {
            tracing::trace!(query = %key, "query cache hit");
            return Ok(value);
        }

        let epoch = self.slots.get(&key).map(|s| s.epoch).unwrap_or(0);
        let value = fetch().await?;
        self.store(key, &value, epoch);
        Ok(value)
    }

    fn store<T: Serialize>(&self, key: QueryKey, value: &T, epoch_at_start: u64) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::warn!(query = %key, "failed to serialize query result: {}", e);
                return;
            }
        };

        let mut slot = self.slots.entry(key).or_insert_with(Slot::empty);
        slot.value = Some(json);
        slot.fetched_at = Instant::now();
        // Invalidated mid-flight: keep the data but force the next read to refetch.
        slot.stale = slot.epoch != epoch_at_start;
    }

    /// Mark every key in `keys` stale.
    pub fn invalidate(&self, keys: &[QueryKey]) {
        for key in keys {
            let mut slot = self.slots.entry(*key).or_insert_with(Slot::empty);
            slot.stale = true;
            slot.epoch += 1;
        }
        tracing::debug!(keys = ?keys, "query cache invalidated");
    }
}
