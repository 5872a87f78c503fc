//! In-memory store.

use crate::error::Result;
use crate::{Store, fold_key};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Process-local store backed by a `HashMap` behind a [`RwLock`], so all
/// trait methods can operate on `&self` without external synchronisation.
///
/// Used for caches that should not outlive the process, and as the in-memory
/// fake for tests that need a [`Store`] without touching disk.
///
/// # Examples
///
/// ```
/// use tcv_store::{MemoryStore, Store};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::with_entries([("Owner/Repo/README.md/master", "hello")]);
/// assert_eq!(store.get_text("owner/repo/readme.md/MASTER").await?.as_deref(), Some("hello"));
/// # Ok(())
/// # }
/// ```
pub struct MemoryStore {
    name: String,
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), entries: RwLock::new(HashMap::new()) }
    }

    /// Create a store pre-populated with entries (keys are case-folded).
    pub fn with_entries(entries: impl IntoIterator<Item = (impl AsRef<str>, impl Into<Vec<u8>>)>) -> Self {
        let map = entries.into_iter().map(|(key, value)| (fold_key(key.as_ref()), value.into())).collect();
        Self { name: "memory".to_string(), entries: RwLock::new(map) }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Number of entries currently held.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new("memory")
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().await.get(&fold_key(key)).cloned())
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entries.write().await.insert(fold_key(key), value.to_vec());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}
