// src/store/sqlite.rs

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use tracing::{debug, info};

use super::RecordStore;
use crate::core::models::HistoryRecord;
use crate::error::PostureError;

const MAX_CONNECTIONS: u32 = 10;
const BUSY_TIMEOUT: Duration = Duration::from_secs(10);

/// `RecordStore` on a SQLite `history_records` table keyed by URL.
#[derive(Debug, Clone)]
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    /// Connects to (and creates, if needed) the database file and applies migrations.
    ///
    /// # Arguments
    /// * `database_url` - A `sqlite://` URL. The file is opened in WAL mode with a
    ///   busy timeout so concurrent writers wait instead of failing.
    ///
    /// # Returns
    /// The store, or `PostureError::StoreUnavailable` if the file cannot be
    /// opened or a migration fails.
    pub async fn connect(database_url: &str) -> Result<Self, PostureError> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        info!(database_url, "Connected to SQLite record store.");
        Self::from_pool(pool).await
    }

    /// A private in-memory database. The pool holds exactly one connection that
    /// is never recycled, since the data lives and dies with that connection.
    pub async fn in_memory() -> Result<Self, PostureError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self, PostureError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        debug!("Record store migrations applied.");
        Ok(Self { pool })
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn get(&self, url: &str) -> Result<Option<HistoryRecord>, PostureError> {
        let record = sqlx::query_as::<_, HistoryRecord>(
            r#"
            SELECT url, last_refreshed_at, previous_grade, current_grade,
                   previous_server_set_blob, current_server_set_blob
            FROM history_records
            WHERE url = ?
            "#,
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn upsert(&self, record: &HistoryRecord) -> Result<(), PostureError> {
        sqlx::query(
            r#"
            INSERT INTO history_records (url, last_refreshed_at, previous_grade, current_grade,
                                         previous_server_set_blob, current_server_set_blob)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(url) DO UPDATE SET
                last_refreshed_at = excluded.last_refreshed_at,
                previous_grade = excluded.previous_grade,
                current_grade = excluded.current_grade,
                previous_server_set_blob = excluded.previous_server_set_blob,
                current_server_set_blob = excluded.current_server_set_blob
            "#,
        )
        .bind(&record.url)
        .bind(record.last_refreshed_at)
        .bind(&record.previous_grade)
        .bind(&record.current_grade)
        .bind(&record.previous_server_set_blob)
        .bind(&record.current_server_set_blob)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_if_absent(&self, record: &HistoryRecord) -> Result<bool, PostureError> {
        let result = sqlx::query(
            r#"
            INSERT INTO history_records (url, last_refreshed_at, previous_grade, current_grade,
                                         previous_server_set_blob, current_server_set_blob)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(url) DO NOTHING
            "#,
        )
        .bind(&record.url)
        .bind(record.last_refreshed_at)
        .bind(&record.previous_grade)
        .bind(&record.current_grade)
        .bind(&record.previous_server_set_blob)
        .bind(&record.current_server_set_blob)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn replace_if_unchanged(
        &self,
        record: &HistoryRecord,
        expected_refreshed_at: i64,
    ) -> Result<bool, PostureError> {
        let result = sqlx::query(
            r#"
            UPDATE history_records
            SET last_refreshed_at = ?,
                previous_grade = ?,
                current_grade = ?,
                previous_server_set_blob = ?,
                current_server_set_blob = ?
            WHERE url = ? AND last_refreshed_at = ?
            "#,
        )
        .bind(record.last_refreshed_at)
        .bind(&record.previous_grade)
        .bind(&record.current_grade)
        .bind(&record.previous_server_set_blob)
        .bind(&record.current_server_set_blob)
        .bind(&record.url)
        .bind(expected_refreshed_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_urls(&self) -> Result<Vec<String>, PostureError> {
        let urls = sqlx::query_scalar::<_, String>("SELECT url FROM history_records")
            .fetch_all(&self.pool)
            .await?;
        Ok(urls)
    }
}
