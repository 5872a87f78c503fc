//! Remote content host trait and implementations.

mod door43;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use self::door43::{DEFAULT_BASE_URL, Door43Host, HostSettings};
#[cfg(test)]
pub(crate) use self::mock::zip_entries;
#[cfg(any(test, feature = "mock"))]
pub use self::mock::{HostCalls, MockHost};
use crate::error::Result;
use async_trait::async_trait;

/// The remote host serving content repositories.
///
/// Implementations report missing content as
/// [`NotFound`](crate::error::ErrorKind::NotFound) or a
/// [`Status`](crate::error::ErrorKind::Status) error; callers decide whether
/// that is fatal.
#[async_trait]
pub trait RemoteHost {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// Location of the whole-repository archive. Also used as the archive
    /// cache key.
    fn archive_url(&self, owner: &str, repo: &str, git_ref: &str) -> String;

    /// Raw bytes of a single file at `path` on `git_ref`.
    async fn raw_file(&self, owner: &str, repo: &str, path: &str, git_ref: &str) -> Result<Vec<u8>>;

    /// Zip archive of the whole repository at `git_ref`.
    async fn archive(&self, owner: &str, repo: &str, git_ref: &str) -> Result<Vec<u8>>;

    /// Whether `owner` has a repository named exactly `repo`.
    async fn repository_exists(&self, owner: &str, repo: &str) -> Result<bool>;
}
