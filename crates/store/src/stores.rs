use crate::error::Result;
use crate::{Database, ExpiringStore, MemoryStore, StoreHandle};
use std::sync::Arc;
use std::time::Duration;

/// Default lifetime of cached HTTP API responses.
pub const DEFAULT_HTTP_TTL: Duration = Duration::from_secs(60 * 60);

/// The four cache layers consulted during retrieval.
#[derive(Clone)]
pub struct Stores {
    /// Memoized fetch failures (key → failure message).
    pub failed: StoreHandle,
    /// Downloaded repository archives (key → zip bytes).
    pub archive: StoreHandle,
    /// Decoded file contents (key → UTF-8 text).
    pub decoded: StoreHandle,
    /// Cached API responses, subject to expiry.
    pub http: StoreHandle,
}

impl Stores {
    /// Process-local stores that vanish with the process.
    pub fn in_memory(http_ttl: Duration) -> Self {
        Self {
            failed: Arc::new(MemoryStore::new("failed")),
            archive: Arc::new(MemoryStore::new("archive")),
            decoded: Arc::new(MemoryStore::new("decoded")),
            http: Arc::new(ExpiringStore::new(Arc::new(MemoryStore::new("http")), http_ttl)),
        }
    }

    /// Stores persisted as partitions of one SQLite database.
    pub fn sqlite(db: &Database, http_ttl: Duration) -> Self {
        Self {
            failed: Arc::new(db.store("failed")),
            archive: Arc::new(db.store("archive")),
            decoded: Arc::new(db.store("decoded")),
            http: Arc::new(ExpiringStore::new(Arc::new(db.store("http")), http_ttl)),
        }
    }

    /// Clear every layer.
    ///
    /// Readers consult decoded, then archive, then failed, so clearing in that
    /// same order means a concurrent reader sees data that is at worst stale,
    /// never a half-cleared mix. No lock is taken.
    #[tracing::instrument(skip(self))]
    pub async fn clear_all(&self) -> Result<()> {
        for store in [&self.decoded, &self.archive, &self.failed, &self.http] {
            store.clear().await?;
            tracing::debug!(store = store.name(), "Cleared store");
        }
        Ok(())
    }
}

impl Default for Stores {
    fn default() -> Self {
        Self::in_memory(DEFAULT_HTTP_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Store;

    async fn populate(stores: &Stores) {
        for store in [&stores.failed, &stores.archive, &stores.decoded, &stores.http] {
            store.set_text("owner/repo/file/master", "x").await.unwrap();
        }
    }

    async fn all_empty(stores: &Stores) -> bool {
        for store in [&stores.failed, &stores.archive, &stores.decoded, &stores.http] {
            if store.get("owner/repo/file/master").await.unwrap().is_some() {
                return false;
            }
        }
        true
    }

    #[tokio::test]
    async fn test_clear_all_in_memory() {
        let stores = Stores::default();
        populate(&stores).await;
        assert!(!all_empty(&stores).await);
        stores.clear_all().await.unwrap();
        assert!(all_empty(&stores).await);
    }

    #[tokio::test]
    async fn test_clear_all_sqlite() {
        let db = Database::connect_in_memory().await.unwrap();
        let stores = Stores::sqlite(&db, DEFAULT_HTTP_TTL);
        populate(&stores).await;
        stores.clear_all().await.unwrap();
        assert!(all_empty(&stores).await);
        db.close().await;
    }

    #[tokio::test]
    async fn test_store_names() {
        let stores = Stores::default();
        let names: Vec<&str> = [&stores.failed, &stores.archive, &stores.decoded, &stores.http]
            .into_iter()
            .map(|s| s.name())
            .collect();
        assert_eq!(names, ["failed", "archive", "decoded", "http"]);
    }
}
