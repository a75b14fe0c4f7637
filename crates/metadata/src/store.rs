//! Metadata store trait and the SQLite implementation.

use crate::error::{MetadataError, MetadataResult};
use crate::models::UpdateRow;
use crate::repos::{SortOrder, UpdateRepo};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Executor, Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};

const DEFAULT_QUERY_TIMEOUT_SECS: u64 = 30;

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore: UpdateRepo + Send + Sync {
    /// Run database migrations.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
    query_timeout: Duration,
}

impl SqliteStore {
    /// Open (or create) a database file and apply the schema.
    pub async fn new(
        path: impl AsRef<Path>,
        query_timeout_secs: Option<u64>,
    ) -> MetadataResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // One connection serializes writers and avoids "database is locked".
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self {
            pool,
            query_timeout: Duration::from_secs(
                query_timeout_secs.unwrap_or(DEFAULT_QUERY_TIMEOUT_SECS),
            ),
        };
        store.migrate().await?;
        debug!(path = %path.display(), "opened sqlite metadata store");
        Ok(store)
    }

    /// Log queries that ran past the advisory timeout. SQLite cannot cancel them.
    fn check_elapsed(&self, query: &'static str, started: Instant) {
        let elapsed = started.elapsed();
        if elapsed > self.query_timeout {
            warn!(
                query,
                elapsed_ms = elapsed.as_millis() as u64,
                timeout_secs = self.query_timeout.as_secs(),
                "slow metadata query"
            );
        }
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl UpdateRepo for SqliteStore {
    #[instrument(skip(self, update), fields(partition_key = %update.partition_key, sort_key = update.sort_key))]
    async fn create_update(&self, update: &UpdateRow) -> MetadataResult<()> {
        let started = Instant::now();
        let result = insert_update(&self.pool, update).await;
        self.check_elapsed("create_update", started);
        result
    }

    #[instrument(skip(self, updates), fields(count = updates.len()))]
    async fn create_updates(&self, updates: &[UpdateRow]) -> MetadataResult<()> {
        let started = Instant::now();
        let mut tx = self.pool.begin().await?;
        for update in updates {
            // Dropping the transaction on error rolls back earlier inserts.
            insert_update(&mut *tx, update).await?;
        }
        tx.commit().await?;
        self.check_elapsed("create_updates", started);
        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_latest(
        &self,
        partition_key: &str,
        order: SortOrder,
        limit: u32,
    ) -> MetadataResult<Vec<UpdateRow>> {
        let sql = format!(
            "SELECT * FROM updates WHERE partition_key = ? ORDER BY sort_key {} LIMIT ?",
            order.as_sql()
        );
        let started = Instant::now();
        let rows = sqlx::query_as::<_, UpdateRow>(&sql)
            .bind(partition_key)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;
        self.check_elapsed("find_latest", started);
        Ok(rows)
    }

    async fn get_update(
        &self,
        partition_key: &str,
        sort_key: i64,
    ) -> MetadataResult<Option<UpdateRow>> {
        let row = sqlx::query_as::<_, UpdateRow>(
            "SELECT * FROM updates WHERE partition_key = ? AND sort_key = ?",
        )
        .bind(partition_key)
        .bind(sort_key)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

async fn insert_update<'e, E>(executor: E, update: &UpdateRow) -> MetadataResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    if update.sort_key < 1 {
        return Err(MetadataError::InvalidRecord(format!(
            "sort_key must be positive, got {}",
            update.sort_key
        )));
    }

    let result = sqlx::query(
        "INSERT INTO updates (partition_key, sort_key, id, platform, manifest, runtime_version, \
         ota_update_version, mandatory, active_devices, enabled, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&update.partition_key)
    .bind(update.sort_key)
    .bind(&update.id)
    .bind(&update.platform)
    .bind(&update.manifest)
    .bind(&update.runtime_version)
    .bind(&update.ota_update_version)
    .bind(update.mandatory)
    .bind(update.active_devices)
    .bind(update.enabled)
    .bind(update.created_at)
    .bind(update.updated_at)
    .execute(executor)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(e) if MetadataError::is_unique_violation(&e) => Err(MetadataError::AlreadyExists(
            format!("update {}/{} already exists", update.partition_key, update.sort_key),
        )),
        Err(e) => Err(e.into()),
    }
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS updates (
    partition_key TEXT NOT NULL,
    sort_key INTEGER NOT NULL CHECK (sort_key >= 1),
    id TEXT NOT NULL,
    platform TEXT NOT NULL,
    manifest TEXT NOT NULL,
    runtime_version TEXT NOT NULL,
    ota_update_version TEXT NOT NULL,
    mandatory INTEGER NOT NULL DEFAULT 0,
    active_devices INTEGER NOT NULL DEFAULT 0,
    enabled INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (partition_key, sort_key)
);
"#;
