//! PostgreSQL implementation of the URL repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_retry::Retry;
use tokio_retry::strategy::{ExponentialBackoff, jitter};

use crate::domain::entities::{DedupEntry, UrlRecord};
use crate::domain::repositories::UrlRepository;
use crate::error::AppError;

/// Extra attempts at checking out a connection for a click increment.
const ACQUIRE_RETRIES: usize = 2;

#[derive(FromRow)]
struct UrlRow {
    short_code: String,
    long_url: String,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    owner_id: Option<String>,
}

impl From<UrlRow> for UrlRecord {
    fn from(row: UrlRow) -> Self {
        Self {
            short_code: row.short_code,
            long_url: row.long_url,
            created_at: row.created_at,
            expires_at: row.expires_at,
            owner_id: row.owner_id,
        }
    }
}

/// PostgreSQL repository for URL records, dedup entries and click counters.
///
/// Every statement uses bind parameters and is bounded by `query_timeout`;
/// an elapsed timeout surfaces as [`AppError::BackendUnavailable`].
pub struct PgUrlRepository {
    pool: Arc<PgPool>,
    query_timeout: Duration,
}

impl PgUrlRepository {
    pub fn new(pool: Arc<PgPool>, query_timeout: Duration) -> Self {
        Self {
            pool,
            query_timeout,
        }
    }

    async fn bounded<T>(
        &self,
        fut: impl Future<Output = Result<T, sqlx::Error>>,
    ) -> Result<T, AppError> {
        tokio::time::timeout(self.query_timeout, fut)
            .await
            .map_err(|_| AppError::backend("database query timed out"))?
            .map_err(AppError::from)
    }
}

#[async_trait]
impl UrlRepository for PgUrlRepository {
    async fn insert_url(&self, record: &UrlRecord) -> Result<bool, AppError> {
        let result = self
            .bounded(
                sqlx::query(
                    r#"
                    INSERT INTO urls (short_code, long_url, created_at, expires_at, owner_id)
                    VALUES ($1, $2, $3, $4, $5)
                    ON CONFLICT (short_code) DO NOTHING
                    "#,
                )
                .bind(&record.short_code)
                .bind(&record.long_url)
                .bind(record.created_at)
                .bind(record.expires_at)
                .bind(&record.owner_id)
                .execute(self.pool.as_ref()),
            )
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn insert_dedup(&self, entry: &DedupEntry) -> Result<(), AppError> {
        self.bounded(
            sqlx::query(
                r#"
                INSERT INTO url_dedup (url_hash, short_code, created_at)
                VALUES ($1, $2, $3)
                ON CONFLICT (url_hash) DO NOTHING
                "#,
            )
            .bind(&entry.url_hash)
            .bind(&entry.short_code)
            .bind(entry.created_at)
            .execute(self.pool.as_ref()),
        )
        .await?;

        Ok(())
    }

    async fn find_by_code(&self, short_code: &str) -> Result<Option<UrlRecord>, AppError> {
        let row = self
            .bounded(
                sqlx::query_as::<_, UrlRow>(
                    r#"
                    SELECT short_code, long_url, created_at, expires_at, owner_id
                    FROM urls
                    WHERE short_code = $1
                    "#,
                )
                .bind(short_code)
                .fetch_optional(self.pool.as_ref()),
            )
            .await?;

        Ok(row.map(UrlRecord::from))
    }

    async fn find_dedup(&self, url_hash: &str) -> Result<Option<String>, AppError> {
        self.bounded(
            sqlx::query_scalar::<_, String>("SELECT short_code FROM url_dedup WHERE url_hash = $1")
                .bind(url_hash)
                .fetch_optional(self.pool.as_ref()),
        )
        .await
    }

    /// Adds one click for `short_code`.
    ///
    /// Only acquiring a connection is retried. Once the upsert has been sent a
    /// lost reply may hide a committed increment, so the statement itself runs
    /// once and any failure after that point is reported, never replayed.
    async fn increment_clicks(&self, short_code: &str) -> Result<(), AppError> {
        let strategy = ExponentialBackoff::from_millis(10)
            .max_delay(Duration::from_secs(1))
            .map(jitter)
            .take(ACQUIRE_RETRIES);

        let mut conn = Retry::spawn(strategy, move || self.bounded(self.pool.acquire())).await?;

        self.bounded(
            sqlx::query(
                r#"
                INSERT INTO url_clicks (short_code, click_count)
                VALUES ($1, 1)
                ON CONFLICT (short_code)
                DO UPDATE SET click_count = url_clicks.click_count + 1
                "#,
            )
            .bind(short_code)
            .execute(&mut *conn),
        )
        .await?;

        Ok(())
    }

    async fn get_clicks(&self, short_code: &str) -> Result<i64, AppError> {
        let clicks = self
            .bounded(
                sqlx::query_scalar::<_, i64>(
                    "SELECT click_count FROM url_clicks WHERE short_code = $1",
                )
                .bind(short_code)
                .fetch_optional(self.pool.as_ref()),
            )
            .await?;

        Ok(clicks.unwrap_or(0))
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.bounded(sqlx::query("SELECT 1").execute(self.pool.as_ref()))
            .await?;
        Ok(())
    }
}
