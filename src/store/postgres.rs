use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{ConnectOptions, PgPool};
use uuid::Uuid;

use super::NotificationStore;
use crate::models::notification::{NewNotification, Notification};

const NOTIFICATION_COLUMNS: &str =
    "id, type, title, message, is_read, data, created_at AS time";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// With `log_sql` off, sqlx statement logging is disabled entirely.
    pub async fn connect_with(
        database_url: &str,
        max_connections: u32,
        log_sql: bool,
    ) -> anyhow::Result<Self> {
        let mut options = PgConnectOptions::from_str(database_url)?;
        if !log_sql {
            options = options.disable_statement_logging();
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await?;
        Ok(Self { pool })
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn create(&self, user_id: Uuid, new: &NewNotification) -> anyhow::Result<Notification> {
        let row = sqlx::query_as::<_, Notification>(&format!(
            r#"INSERT INTO notifications (user_id, type, title, message, data)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING {NOTIFICATION_COLUMNS}"#
        ))
        .bind(user_id)
        .bind(new.kind)
        .bind(&new.title)
        .bind(&new.message)
        .bind(&new.data)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list(&self, user_id: Uuid, limit: i64) -> anyhow::Result<Vec<Notification>> {
        let rows = sqlx::query_as::<_, Notification>(&format!(
            r#"SELECT {NOTIFICATION_COLUMNS}
               FROM notifications
               WHERE user_id = $1
               ORDER BY created_at DESC, id DESC
               LIMIT $2"#
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn unread_count(&self, user_id: Uuid) -> anyhow::Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND is_read = false"#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn mark_read(&self, user_id: Uuid, id: i64) -> anyhow::Result<Option<Notification>> {
        // No `is_read = false` filter: an already-read row still comes back.
        let row = sqlx::query_as::<_, Notification>(&format!(
            r#"UPDATE notifications SET is_read = true
               WHERE id = $1 AND user_id = $2
               RETURNING {NOTIFICATION_COLUMNS}"#
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn mark_all_read(&self, user_id: Uuid) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"UPDATE notifications SET is_read = true WHERE user_id = $1 AND is_read = false"#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> anyhow::Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
