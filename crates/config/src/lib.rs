//! Layered configuration.
//!
//! Built-in defaults, then an optional TOML, YAML or JSON file, then
//! `TCV_`-prefixed environment variables (`__` separates nesting levels, so
//! `TCV_HOST__BASE_URL` sets `host.base_url`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tcv_check::{CheckOptions, DEFAULT_ORIGINAL_LANGUAGE_THRESHOLD};
use tcv_fetch::{DEFAULT_BASE_URL, HostSettings};
use tcv_notice::ProcessingOptions;
use tcv_store::{DEFAULT_HTTP_TTL, Database, Stores};

const ENV_PREFIX: &str = "TCV_";
const DATABASE_FILENAME: &str = "tcv.sqlite";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: HostConfig,
    pub cache: CacheConfig,
    pub preload: PreloadConfig,
    pub processing: ProcessingOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        let settings = HostSettings::default();
        Self { base_url: DEFAULT_BASE_URL.to_string(), timeout_secs: settings.timeout.as_secs(), user_agent: settings.user_agent }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// SQLite cache database. Defaults to the user's cache directory.
    pub database: Option<PathBuf>,
    /// Keep every cache layer in memory only.
    pub in_memory: bool,
    /// Lifetime of cached API responses.
    pub http_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { database: None, in_memory: false, http_ttl_secs: DEFAULT_HTTP_TTL.as_secs() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreloadConfig {
    pub original_language_threshold: usize,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self { original_language_threshold: DEFAULT_ORIGINAL_LANGUAGE_THRESHOLD }
    }
}

impl Config {
    /// Load configuration, optionally from a file whose extension picks the
    /// format.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            if !path.is_file() {
                exn::bail!(ErrorKind::NotFound(path.display().to_string()));
            }
            figment = match path.extension().and_then(|extension| extension.to_str()) {
                Some("toml") => figment.merge(Toml::file(path)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(path.display().to_string())),
            };
            tracing::debug!(path = %path.display(), "Loading configuration file");
        }
        let config: Config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(|e| exn::Exn::from(ErrorKind::Invalid(e.to_string())))?;
        config.processing.validate().or_raise(|| ErrorKind::Invalid("processing".to_string()))?;
        Ok(config)
    }

    /// Where the cache database lives, or `None` if caches stay in memory.
    pub fn database_path(&self) -> Option<PathBuf> {
        if self.cache.in_memory {
            return None;
        }
        if let Some(path) = &self.cache.database {
            return Some(path.clone());
        }
        match ProjectDirs::from("org", "door43", "tcv") {
            Some(dirs) => Some(dirs.cache_dir().join(DATABASE_FILENAME)),
            None => {
                tracing::warn!("No cache directory available; caching in memory");
                None
            },
        }
    }

    pub fn http_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.http_ttl_secs)
    }

    pub fn host_settings(&self) -> HostSettings {
        HostSettings {
            base_url: self.host.base_url.clone(),
            timeout: Duration::from_secs(self.host.timeout_secs),
            user_agent: self.host.user_agent.clone(),
        }
    }

    /// Check options with the configured preload threshold.
    pub fn check_options(&self) -> CheckOptions {
        CheckOptions { original_language_threshold: self.preload.original_language_threshold, ..CheckOptions::default() }
    }

    /// Open the configured cache layers, creating the database if needed.
    pub async fn open_stores(&self) -> Result<Stores> {
        let Some(path) = self.database_path() else {
            return Ok(Stores::in_memory(self.http_ttl()));
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).or_raise(|| ErrorKind::Cache)?;
        }
        tracing::info!(path = %path.display(), "Opening cache database");
        let db = Database::connect(&path).await.or_raise(|| ErrorKind::Cache)?;
        Ok(Stores::sqlite(&db, self.http_ttl()))
    }
}
