//! In-memory remote host for testing.

use super::RemoteHost;
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use zip::write::FileOptions;

type RepoKey = (String, String, String);

fn repo_key(owner: &str, repo: &str, git_ref: &str) -> RepoKey {
    (owner.to_lowercase(), repo.to_lowercase(), git_ref.to_lowercase())
}

/// Build a stored (uncompressed) zip archive. Names ending in `/` become
/// directory entries.
///
/// Panics on failure: this only ever writes into memory.
pub(crate) fn zip_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a [u8])>) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, content) in entries {
        let written = if name.ends_with('/') {
            writer.add_directory(name, options)
        } else {
            writer.start_file(name, options).and_then(|()| writer.write_all(content).map_err(Into::into))
        };
        if let Err(e) = written {
            panic!("zip_entries: cannot write {name}: {e}");
        }
    }
    match writer.finish() {
        Ok(cursor) => cursor.into_inner(),
        Err(e) => panic!("zip_entries: cannot finish archive: {e}"),
    }
}

/// Number of requests a [`MockHost`] has served, per endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostCalls {
    pub raw_file: usize,
    pub archive: usize,
    pub repository_exists: usize,
}

impl HostCalls {
    pub fn total(&self) -> usize {
        self.raw_file + self.archive + self.repository_exists
    }
}

/// Remote host serving repositories held in memory.
///
/// Archives are zipped on request, laid out like the real host's (every file
/// under a lowercased repository folder). Each endpoint counts its calls, so
/// tests can assert that a cache layer answered instead of the network.
///
/// # Examples
///
/// ```
/// use tcv_fetch::{MockHost, RemoteHost};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let host = MockHost::default().with_repo("unfoldingWord", "en_ult", "master", [
///     ("57-TIT.usfm", "\\id TIT"),
/// ]);
/// assert!(host.repository_exists("unfoldingWord", "en_ult").await?);
/// assert_eq!(host.calls().repository_exists, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct MockHost {
    repos: HashMap<RepoKey, Vec<(String, Vec<u8>)>>,
    broken_archives: HashSet<RepoKey>,
    corrupt_archives: HashSet<RepoKey>,
    raw_file_calls: AtomicUsize,
    archive_calls: AtomicUsize,
    exists_calls: AtomicUsize,
}

impl MockHost {
    /// Add (or extend) a repository on the given ref.
    pub fn with_repo(
        mut self,
        owner: &str,
        repo: &str,
        git_ref: &str,
        files: impl IntoIterator<Item = (impl Into<String>, impl Into<Vec<u8>>)>,
    ) -> Self {
        let entry = self.repos.entry(repo_key(owner, repo, git_ref)).or_default();
        entry.extend(files.into_iter().map(|(path, content)| (path.into(), content.into())));
        self
    }

    /// Make the archive endpoint fail for this repository/ref with a 500,
    /// while single files stay reachable.
    pub fn with_broken_archive(mut self, owner: &str, repo: &str, git_ref: &str) -> Self {
        self.broken_archives.insert(repo_key(owner, repo, git_ref));
        self
    }

    /// Serve bytes that aren't a zip archive from the archive endpoint.
    pub fn with_corrupt_archive(mut self, owner: &str, repo: &str, git_ref: &str) -> Self {
        self.corrupt_archives.insert(repo_key(owner, repo, git_ref));
        self
    }

    pub fn calls(&self) -> HostCalls {
        HostCalls {
            raw_file: self.raw_file_calls.load(Ordering::Relaxed),
            archive: self.archive_calls.load(Ordering::Relaxed),
            repository_exists: self.exists_calls.load(Ordering::Relaxed),
        }
    }

    fn files(&self, owner: &str, repo: &str, git_ref: &str) -> Result<&[(String, Vec<u8>)]> {
        self.repos
            .get(&repo_key(owner, repo, git_ref))
            .map(Vec::as_slice)
            .ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(format!("{owner}/{repo}@{git_ref}"))))
    }
}

#[async_trait]
impl RemoteHost for MockHost {
    fn name(&self) -> &str {
        "mock"
    }

    fn archive_url(&self, owner: &str, repo: &str, git_ref: &str) -> String {
        format!("mock://{owner}/{repo}/archive/{git_ref}.zip")
    }

    async fn raw_file(&self, owner: &str, repo: &str, path: &str, git_ref: &str) -> Result<Vec<u8>> {
        self.raw_file_calls.fetch_add(1, Ordering::Relaxed);
        self.files(owner, repo, git_ref)?
            .iter()
            .find(|(name, _)| name == path)
            .map(|(_, content)| content.clone())
            .ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(format!("{owner}/{repo}/{path}@{git_ref}"))))
    }

    async fn archive(&self, owner: &str, repo: &str, git_ref: &str) -> Result<Vec<u8>> {
        self.archive_calls.fetch_add(1, Ordering::Relaxed);
        if self.broken_archives.contains(&repo_key(owner, repo, git_ref)) {
            exn::bail!(ErrorKind::Status(500));
        }
        if self.corrupt_archives.contains(&repo_key(owner, repo, git_ref)) {
            return Ok(b"not a zip".to_vec());
        }
        let folder = repo.to_lowercase();
        let files = self.files(owner, repo, git_ref)?;
        let names: Vec<String> = files.iter().map(|(path, _)| format!("{folder}/{path}")).collect();
        Ok(zip_entries(names.iter().map(String::as_str).zip(files.iter().map(|(_, content)| content.as_slice()))))
    }

    async fn repository_exists(&self, owner: &str, repo: &str) -> Result<bool> {
        self.exists_calls.fetch_add(1, Ordering::Relaxed);
        let (owner, repo) = (owner.to_lowercase(), repo.to_lowercase());
        Ok(self.repos.keys().any(|(o, r, _)| *o == owner && *r == repo))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive;

    fn host() -> MockHost {
        MockHost::default()
            .with_repo("unfoldingWord", "en_tq", "master", [("manifest.yaml", "m"), ("tit/01/01.md", "q")])
            .with_repo("unfoldingWord", "en_tn", "newFormat", [("tn_TIT.tsv", "Reference\tID")])
    }

    #[tokio::test]
    async fn test_raw_file() {
        let host = host();
        assert_eq!(host.raw_file("unfoldingWord", "en_tq", "tit/01/01.md", "master").await.unwrap(), b"q");
        let err = host.raw_file("unfoldingWord", "en_tq", "missing.md", "master").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
        let err = host.raw_file("unfoldingWord", "en_tn", "tn_TIT.tsv", "master").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::NotFound(_)));
        assert_eq!(host.calls().raw_file, 3);
    }

    #[tokio::test]
    async fn test_archive_layout() {
        let host = host();
        let bytes = host.archive("unfoldingWord", "en_TQ", "master").await.unwrap();
        let names = archive::list_entries(bytes).await.unwrap();
        assert_eq!(names, ["en_tq/manifest.yaml", "en_tq/tit/01/01.md"]);
    }

    #[tokio::test]
    async fn test_broken_archive() {
        let host = host().with_broken_archive("unfoldingWord", "en_tq", "master");
        let err = host.archive("unfoldingWord", "en_tq", "master").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Status(500)));
        assert!(host.raw_file("unfoldingWord", "en_tq", "manifest.yaml", "master").await.is_ok());
    }

    #[tokio::test]
    async fn test_corrupt_archive() {
        let host = host().with_corrupt_archive("unfoldingWord", "en_tq", "master");
        let bytes = host.archive("unfoldingWord", "en_tq", "master").await.unwrap();
        assert!(archive::list_entries(bytes).await.is_err());
    }

    #[tokio::test]
    async fn test_repository_exists_on_any_ref() {
        let host = host();
        assert!(host.repository_exists("unfoldingWord", "en_tn").await.unwrap());
        assert!(!host.repository_exists("unfoldingWord", "en_ta").await.unwrap());
        assert!(!host.repository_exists("someoneElse", "en_tn").await.unwrap());
        assert_eq!(host.calls(), HostCalls { repository_exists: 3, ..HostCalls::default() });
    }
}
