//! HTTP client for Door43 (Gitea) content hosts.

use super::RemoteHost;
use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tcv_store::StoreHandle;
use tracing::instrument;

pub const DEFAULT_BASE_URL: &str = "https://git.door43.org/";
const API_PATH: &str = "api/v1";
const SEARCH_LIMIT: u32 = 50;

/// Connection settings for a [`Door43Host`].
#[derive(Debug, Clone)]
pub struct HostSettings {
    /// Host root, e.g. `https://git.door43.org/`.
    pub base_url: String,
    /// Applies to each network request only.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: concat!("tcv/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[derive(serde::Deserialize)]
struct User {
    id: u64,
}

#[derive(Serialize)]
struct SearchParams<'a> {
    q: &'a str,
    limit: u32,
    uid: u64,
}

#[derive(serde::Deserialize)]
struct SearchResults {
    #[serde(default)]
    data: Vec<RepoSummary>,
}

#[derive(serde::Deserialize)]
struct RepoSummary {
    name: String,
}

/// [`RemoteHost`] speaking the Gitea raw-file, archive and API endpoints.
///
/// API responses (never file or archive bodies) are cached in the given
/// store, keyed by URL plus serialized query parameters. Wrap that store in an
/// [`ExpiringStore`](tcv_store::ExpiringStore) to bound staleness.
pub struct Door43Host {
    base_url: String,
    client: reqwest::Client,
    cache: StoreHandle,
}

impl Door43Host {
    pub fn new(settings: &HostSettings, cache: StoreHandle) -> Result<Self> {
        let mut base_url = settings.base_url.clone();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.as_str())
            .build()
            .or_raise(|| ErrorKind::Network)?;
        Ok(Self { base_url, client, cache })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await.or_raise(|| ErrorKind::Network)?;
        match response.status() {
            StatusCode::NOT_FOUND => exn::bail!(ErrorKind::NotFound(url.to_string())),
            status if !status.is_success() => exn::bail!(ErrorKind::Status(status.as_u16())),
            _ => {},
        }
        Ok(response.bytes().await.or_raise(|| ErrorKind::Network)?.to_vec())
    }

    /// GET a JSON API endpoint, consulting the response cache first.
    async fn cached_json<T, P>(&self, endpoint: &str, params: Option<&P>) -> Result<T>
    where
        T: DeserializeOwned,
        P: Serialize + Sync,
    {
        let url = self.url(&format!("{API_PATH}/{endpoint}"));
        let serialized = match params {
            Some(params) => serde_json::to_string(params).or_raise(|| ErrorKind::InvalidArgument(endpoint.to_string()))?,
            None => String::new(),
        };
        let key = format!("{url}{serialized}");

        let body = match self.cache.get_text(&key).await.or_raise(|| ErrorKind::Store)? {
            Some(body) => {
                tracing::debug!(key = %key, "HTTP cache hit");
                body
            },
            None => {
                let mut request = self.client.get(&url);
                if let Some(params) = params {
                    request = request.query(params);
                }
                let response = request.send().await.or_raise(|| ErrorKind::Network)?;
                match response.status() {
                    StatusCode::NOT_FOUND => exn::bail!(ErrorKind::NotFound(url)),
                    status if !status.is_success() => exn::bail!(ErrorKind::Status(status.as_u16())),
                    _ => {},
                }
                let body = response.text().await.or_raise(|| ErrorKind::Network)?;
                self.cache.set_text(&key, &body).await.or_raise(|| ErrorKind::Store)?;
                body
            },
        };
        serde_json::from_str(&body).or_raise(|| ErrorKind::InvalidData(endpoint.to_string()))
    }
}

#[async_trait]
impl RemoteHost for Door43Host {
    fn name(&self) -> &str {
        &self.base_url
    }

    fn archive_url(&self, owner: &str, repo: &str, git_ref: &str) -> String {
        self.url(&format!("{owner}/{repo}/archive/{git_ref}.zip"))
    }

    #[instrument(skip(self))]
    async fn raw_file(&self, owner: &str, repo: &str, path: &str, git_ref: &str) -> Result<Vec<u8>> {
        self.get_bytes(&self.url(&format!("{owner}/{repo}/raw/branch/{git_ref}/{path}"))).await
    }

    #[instrument(skip(self))]
    async fn archive(&self, owner: &str, repo: &str, git_ref: &str) -> Result<Vec<u8>> {
        let bytes = self.get_bytes(&self.archive_url(owner, repo, git_ref)).await?;
        tracing::info!(owner, repo, git_ref, size = bytes.len(), "Downloaded repository archive");
        Ok(bytes)
    }

    #[instrument(skip(self))]
    async fn repository_exists(&self, owner: &str, repo: &str) -> Result<bool> {
        let user: User = match self.cached_json::<User, ()>(&format!("users/{owner}"), None).await {
            Ok(user) => user,
            Err(e) if matches!(&*e, ErrorKind::NotFound(_)) => return Ok(false),
            Err(e) => return Err(e),
        };
        let params = SearchParams { q: repo, limit: SEARCH_LIMIT, uid: user.id };
        let results: SearchResults = self.cached_json("repos/search", Some(&params)).await?;
        Ok(results.data.iter().any(|found| found.name == repo))
    }
}
