//! SQLite-backed persistent stores.

use crate::error::{ErrorKind, Result};
use crate::{Store, fold_key};
use async_trait::async_trait;
use exn::ResultExt;
use sqlx::sqlite::{
    SqliteAutoVacuum, SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use std::time::Duration;
use time::UtcDateTime;
use tracing::instrument;

/// Embedded migrations that are run automatically on connect.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// The on-disk cache database.
///
/// Every [`SqliteStore`] obtained from the same `Database` shares one
/// connection and lives in its own partition of a single table.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    async fn new(options: SqliteConnectOptions) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Open the cache database at the given path, creating it if needed.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(Self::base_options().filename(path.as_ref()).create_if_missing(true)).await
    }

    /// An in-memory database, gone once it is closed.
    ///
    /// Not `#[cfg(test)]` so that other crates can use it in their tests.
    pub async fn connect_in_memory() -> Result<Self> {
        Self::new(Self::base_options().filename(":memory:")).await
    }

    fn base_options() -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            // Must be set before the first table is created to take effect.
            .auto_vacuum(SqliteAutoVacuum::Incremental)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // 4 MiB page cache per connection.
            .pragma("cache_size", "-4096")
            .busy_timeout(Duration::from_secs(5))
    }

    #[instrument("performing database migrations")]
    async fn migrate(&self) -> Result<()> {
        MIGRATOR.run(&self.pool).await.or_raise(|| ErrorKind::Migration)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// A store living in the named partition of this database.
    pub fn store(&self, name: impl Into<String>) -> SqliteStore {
        SqliteStore { name: name.into(), pool: self.pool.clone() }
    }

    /// Fold the write-ahead log back into the database file and close.
    pub async fn close(&self) {
        if let Err(e) = sqlx::query("PRAGMA wal_checkpoint(TRUNCATE)").execute(&self.pool).await {
            tracing::warn!(error = %e, "WAL checkpoint failed on close");
        }
        self.pool.close().await;
    }
}

/// One named partition of a [`Database`].
#[derive(Debug, Clone)]
pub struct SqliteStore {
    name: String,
    pool: SqlitePool,
}

impl SqliteStore {
    /// Number of entries currently held in this partition.
    pub async fn len(&self) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as(include_str!("../queries/count_entries.sql"))
            .bind(&self.name)
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}

#[async_trait]
impl Store for SqliteStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let row: Option<(Vec<u8>,)> = sqlx::query_as(include_str!("../queries/get_entry.sql"))
            .bind(&self.name)
            .bind(fold_key(key))
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        sqlx::query(include_str!("../queries/upsert_entry.sql"))
            .bind(&self.name)
            .bind(fold_key(key))
            .bind(value)
            .bind(UtcDateTime::now().unix_timestamp())
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    /// Empty the partition and hand the freed pages back to the filesystem.
    #[instrument(skip(self), fields(store = %self.name))]
    async fn clear(&self) -> Result<()> {
        let removed = sqlx::query(include_str!("../queries/clear_store.sql"))
            .bind(&self.name)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?
            .rows_affected();
        sqlx::query("PRAGMA incremental_vacuum").execute(&self.pool).await.or_raise(|| ErrorKind::Database)?;
        tracing::debug!(removed, "Cleared store");
        Ok(())
    }
}
