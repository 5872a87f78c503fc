//! Key-value stores backing the retrieval cache layers.
//!
//! Four logical stores are in play during a check run: failed fetches,
//! downloaded archives, decoded file text, and cached HTTP responses. Each is
//! a [`Store`], either process-local ([`MemoryStore`]) or a partition of an
//! on-disk SQLite [`Database`]. Keys are case-insensitive.

pub mod error;
mod expiring;
mod memory;
mod sqlite;
mod stores;

pub use crate::expiring::ExpiringStore;
pub use crate::memory::MemoryStore;
pub use crate::sqlite::{Database, SqliteStore};
pub use crate::stores::{DEFAULT_HTTP_TTL, Stores};
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use std::sync::Arc;

pub type StoreHandle = Arc<dyn Store + Send + Sync>;

/// Fold a key for case-insensitive lookup.
///
/// Owner and repository names arrive in whatever case the caller typed;
/// `unfoldingWord/en_ULT` and `unfoldingword/EN_ult` are the same repository.
pub fn fold_key(key: &str) -> String {
    key.to_lowercase()
}

/// Unified interface for the cache layers.
///
/// Implementations must fold keys with [`fold_key`] before use. Absence is
/// `Ok(None)`; an `Err` means the store itself is unusable.
///
/// # Examples
///
/// ```
/// use tcv_store::{Store, error::Result};
///
/// async fn remember_failure(store: &(dyn Store + Send + Sync), key: &str, status: u16) -> Result<()> {
///     store.set_text(key, &status.to_string()).await
/// }
/// ```
#[async_trait]
pub trait Store {
    /// Name used in logs.
    fn name(&self) -> &str;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Remove every entry.
    async fn clear(&self) -> Result<()>;

    /// Get a value and decode it as UTF-8.
    async fn get_text(&self, key: &str) -> Result<Option<String>> {
        match self.get(key).await? {
            None => Ok(None),
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .or_raise(|| ErrorKind::InvalidData(format!("{}: {key}", self.name()))),
        }
    }

    async fn set_text(&self, key: &str, value: &str) -> Result<()> {
        self.set(key, value.as_bytes()).await
    }
}
