//! Time-limited decorator for any store.

use crate::error::{ErrorKind, Result};
use crate::{Store, StoreHandle};
use async_trait::async_trait;
use std::time::Duration;
use time::UtcDateTime;

const HEADER_LEN: usize = size_of::<i64>();

/// Wraps a store so that every value expires `ttl` after it was written.
///
/// Values are stored with an 8-byte big-endian expiry prefix (milliseconds
/// since the Unix epoch). Expired entries read as `None` and are left in
/// place until overwritten or cleared. A zero TTL makes every write
/// immediately stale.
pub struct ExpiringStore {
    inner: StoreHandle,
    ttl: Duration,
}

impl ExpiringStore {
    pub fn new(inner: StoreHandle, ttl: Duration) -> Self {
        Self { inner, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn now_millis() -> i64 {
        i64::try_from(UtcDateTime::now().unix_timestamp_nanos() / 1_000_000).unwrap_or(i64::MAX)
    }
}

#[async_trait]
impl Store for ExpiringStore {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let Some(mut raw) = self.inner.get(key).await? else {
            return Ok(None);
        };
        if raw.len() < HEADER_LEN {
            exn::bail!(ErrorKind::InvalidData(format!("{}: truncated expiry header for {key}", self.name())));
        }
        let mut header = [0u8; HEADER_LEN];
        header.copy_from_slice(&raw[..HEADER_LEN]);
        if Self::now_millis() >= i64::from_be_bytes(header) {
            tracing::trace!(store = self.name(), key, "Entry expired");
            return Ok(None);
        }
        raw.drain(..HEADER_LEN);
        Ok(Some(raw))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let ttl = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        let expires_at = Self::now_millis().saturating_add(ttl);
        let mut raw = Vec::with_capacity(HEADER_LEN + value.len());
        raw.extend_from_slice(&expires_at.to_be_bytes());
        raw.extend_from_slice(value);
        self.inner.set(key, &raw).await
    }

    async fn clear(&self) -> Result<()> {
        self.inner.clear().await
    }
}
