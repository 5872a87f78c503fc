use crate::HostHandle;
use crate::archive;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use tcv_store::{Stores, fold_key};
use tracing::instrument;

/// Composite key shared by the decoded-file and failed-fetch stores.
fn file_key(owner: &str, repo: &str, path: &str, git_ref: &str) -> String {
    fold_key(&format!("{owner}/{repo}/{path}/{git_ref}"))
}

fn require(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        exn::bail!(ErrorKind::InvalidArgument(format!("{name} must not be empty")));
    }
    Ok(())
}

/// Cached access to repository content.
///
/// Lookups fall through decoded text, then the repository archive, then the
/// memoized failure list, and only then reach the network. Missing content is
/// never an error: it is `None`, and the reason is remembered so the same
/// fetch is not attempted again until the caches are cleared.
#[derive(Clone)]
pub struct Retriever {
    host: HostHandle,
    stores: Stores,
}

impl Retriever {
    pub fn new(host: HostHandle, stores: Stores) -> Self {
        Self { host, stores }
    }

    pub fn host(&self) -> &HostHandle {
        &self.host
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    /// Text of `path` in `owner/repo` at `git_ref`, or `None` if it cannot be
    /// obtained.
    ///
    /// Errors only for empty arguments and cache store failures.
    #[instrument(skip(self))]
    pub async fn get_file(&self, owner: &str, repo: &str, path: &str, git_ref: &str) -> Result<Option<String>> {
        require("owner", owner)?;
        require("repo", repo)?;
        require("path", path)?;
        require("git_ref", git_ref)?;
        let key = file_key(owner, repo, path, git_ref);

        if let Some(text) = self.stores.decoded.get_text(&key).await.or_raise(|| ErrorKind::Store)? {
            tracing::debug!(key = %key, "Decoded file cache hit");
            return Ok(Some(text));
        }

        let text = match self.from_archive(owner, repo, path, git_ref).await? {
            Some(text) => text,
            None => {
                if self.stores.failed.get(&key).await.or_raise(|| ErrorKind::Store)?.is_some() {
                    tracing::debug!(key = %key, "Skipping previously failed fetch");
                    return Ok(None);
                }
                match self.fetch_direct(owner, repo, path, git_ref).await {
                    Ok(text) => text,
                    Err(reason) => {
                        tracing::info!(key = %key, reason = %reason, "Fetch failed");
                        self.stores.failed.set_text(&key, &reason).await.or_raise(|| ErrorKind::Store)?;
                        return Ok(None);
                    },
                }
            },
        };

        self.stores.decoded.set_text(&key, &text).await.or_raise(|| ErrorKind::Store)?;
        Ok(Some(text))
    }

    /// Look the file up inside an already-downloaded archive.
    async fn from_archive(&self, owner: &str, repo: &str, path: &str, git_ref: &str) -> Result<Option<String>> {
        let url = self.host.archive_url(owner, repo, git_ref);
        let Some(bytes) = self.stores.archive.get(&url).await.or_raise(|| ErrorKind::Store)? else {
            return Ok(None);
        };
        match archive::read_entry(bytes, repo, path).await {
            Ok(Some(bytes)) => match String::from_utf8(bytes) {
                Ok(text) => {
                    tracing::debug!(archive = %url, path, "Archive cache hit");
                    Ok(Some(text))
                },
                Err(_) => Ok(None),
            },
            Ok(None) => Ok(None),
            Err(e) => {
                let reason = (*e).to_string();
                tracing::warn!(archive = %url, reason = %reason, "Cached archive is unreadable");
                Ok(None)
            },
        }
    }

    /// Single-file network fetch. `Err` carries the failure message to memoize.
    async fn fetch_direct(&self, owner: &str, repo: &str, path: &str, git_ref: &str) -> std::result::Result<String, String> {
        if !self.repository_exists(owner, repo).await {
            return Err(format!("Repo '{repo}' does not exist!"));
        }
        let bytes = self.host.raw_file(owner, repo, path, git_ref).await.map_err(|e| (*e).to_string())?;
        String::from_utf8(bytes).map_err(|_| format!("{path} is not valid UTF-8 text"))
    }

    /// The memoized reason a previous [`get_file`](Self::get_file) failed.
    pub async fn last_failure(&self, owner: &str, repo: &str, path: &str, git_ref: &str) -> Result<Option<String>> {
        self.stores.failed.get_text(&file_key(owner, repo, path, git_ref)).await.or_raise(|| ErrorKind::Store)
    }

    /// Whether the repository exists on the host.
    ///
    /// A probe that fails (network, malformed response) is logged and reads
    /// as `false`.
    #[instrument(skip(self))]
    pub async fn repository_exists(&self, owner: &str, repo: &str) -> bool {
        match self.host.repository_exists(owner, repo).await {
            Ok(exists) => exists,
            Err(e) => {
                let reason = (*e).to_string();
                tracing::warn!(owner, repo, reason = %reason, "Repository existence probe failed");
                false
            },
        }
    }

    /// Download the repository archive into the archive store.
    ///
    /// Returns `false` if the repository does not exist, the download fails,
    /// or the downloaded bytes are not a readable zip archive. Nothing is
    /// stored in those cases.
    #[instrument(skip(self))]
    pub async fn fetch_archive(&self, owner: &str, repo: &str, git_ref: &str) -> Result<bool> {
        require("owner", owner)?;
        require("repo", repo)?;
        require("git_ref", git_ref)?;
        if !self.repository_exists(owner, repo).await {
            tracing::info!(owner, repo, "Repository does not exist; not fetching archive");
            return Ok(false);
        }
        let url = self.host.archive_url(owner, repo, git_ref);
        Ok(self.download_archive(&url, owner, repo, git_ref).await?.is_some())
    }

    /// Download an archive and store it if it decodes. Returns its entry
    /// names, or `None` if it can't be downloaded or read.
    async fn download_archive(&self, url: &str, owner: &str, repo: &str, git_ref: &str) -> Result<Option<Vec<String>>> {
        let bytes = match self.host.archive(owner, repo, git_ref).await {
            Ok(bytes) => bytes,
            Err(e) => {
                let reason = (*e).to_string();
                tracing::warn!(archive = %url, reason = %reason, "Archive download failed");
                return Ok(None);
            },
        };
        let names = match archive::list_entries(bytes.clone()).await {
            Ok(names) => names,
            Err(e) => {
                let reason = (*e).to_string();
                tracing::warn!(archive = %url, reason = %reason, "Downloaded archive is unreadable");
                return Ok(None);
            },
        };
        self.stores.archive.set(url, &bytes).await.or_raise(|| ErrorKind::Store)?;
        Ok(Some(names))
    }

    /// Repository-relative paths of every file in the repository, optionally
    /// restricted to those starting with `prefix`.
    ///
    /// Downloads the archive if it is not cached yet. `None` means the
    /// archive could not be obtained or decoded, as opposed to an archive
    /// with nothing under `prefix`.
    #[instrument(skip(self))]
    pub async fn get_file_list(
        &self,
        owner: &str,
        repo: &str,
        git_ref: &str,
        prefix: Option<&str>,
    ) -> Result<Option<Vec<String>>> {
        require("owner", owner)?;
        require("repo", repo)?;
        require("git_ref", git_ref)?;
        let url = self.host.archive_url(owner, repo, git_ref);
        let names = match self.stores.archive.get(&url).await.or_raise(|| ErrorKind::Store)? {
            Some(bytes) => match archive::list_entries(bytes).await {
                Ok(names) => names,
                Err(e) => {
                    let reason = (*e).to_string();
                    tracing::warn!(archive = %url, reason = %reason, "Cannot list repository files");
                    return Ok(None);
                },
            },
            None => match self.download_archive(&url, owner, repo, git_ref).await? {
                Some(names) => names,
                None => return Ok(None),
            },
        };
        Ok(Some(archive::relative_paths(names, repo, prefix)))
    }

    /// Reset every cache layer.
    pub async fn clear_caches(&self) -> Result<()> {
        self.stores.clear_all().await.or_raise(|| ErrorKind::Store)
    }
}
