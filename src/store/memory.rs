use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use super::NotificationStore;
use crate::models::notification::{NewNotification, Notification};

struct Row {
    user_id: Uuid,
    notification: Notification,
}

/// Process-local store. Ids start at 1 and increase monotonically, like a
/// `BIGSERIAL` column.
#[derive(Default)]
pub struct MemoryStore {
    rows: DashMap<i64, Row>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn create(&self, user_id: Uuid, new: &NewNotification) -> anyhow::Result<Notification> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let notification = Notification {
            id,
            kind: new.kind,
            title: new.title.clone(),
            message: new.message.clone(),
            is_read: false,
            data: new.data.clone(),
            time: chrono::Utc::now(),
        };
        self.rows.insert(
            id,
            Row {
                user_id,
                notification: notification.clone(),
            },
        );
        Ok(notification)
    }

    async fn list(&self, user_id: Uuid, limit: i64) -> anyhow::Result<Vec<Notification>> {
        let mut out: Vec<Notification> = self
            .rows
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| r.notification.clone())
            .collect();
        out.sort_by(|a, b| b.time.cmp(&a.time).then(b.id.cmp(&a.id)));
        out.truncate(limit.max(0) as usize);
        Ok(out)
    }

    async fn unread_count(&self, user_id: Uuid) -> anyhow::Result<i64> {
        let count = self
            .rows
            .iter()
            .filter(|r| r.user_id == user_id && !r.notification.is_read)
            .count();
        Ok(count as i64)
    }

    async fn mark_read(&self, user_id: Uuid, id: i64) -> anyhow::Result<Option<Notification>> {
        match self.rows.get_mut(&id) {
            Some(mut row) if row.user_id == user_id => {
                row.notification.is_read = true;
                Ok(Some(row.notification.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn mark_all_read(&self, user_id: Uuid) -> anyhow::Result<u64> {
        let mut updated = 0;
        for mut row in self.rows.iter_mut() {
            if row.user_id == user_id && !row.notification.is_read {
                row.notification.is_read = true;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
