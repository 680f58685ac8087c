//! Runtime settings, read once from the environment at startup.

use crate::object_store::{FsObjectStore, MemoryObjectStore, ObjectStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Where blobs live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectStoreConfig {
    Filesystem(PathBuf),
    Memory,
}

impl ObjectStoreConfig {
    pub fn build(&self) -> Arc<dyn ObjectStore> {
        match self {
            Self::Filesystem(root) => Arc::new(FsObjectStore::new(root.clone())),
            Self::Memory => Arc::new(MemoryObjectStore::new()),
        }
    }
}

/// Bounds for one archive rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveLimits {
    pub fetch_timeout: Duration,
    pub max_total_bytes: u64,
}

impl Default for ArchiveLimits {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(30),
            max_total_bytes: 50 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub object_store: ObjectStoreConfig,
    pub archive: ArchiveLimits,
    /// Fall back to case-insensitive email when a desired participant carries no known id.
    pub match_by_email: bool,
    pub json_limit_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_path: "docket.sqlite".to_string(),
            object_store: ObjectStoreConfig::Filesystem(PathBuf::from("./blobs")),
            archive: ArchiveLimits::default(),
            match_by_email: true,
            json_limit_bytes: 10 * 1024 * 1024,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any variable source; unset or unparseable values keep
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        let object_store = match lookup("DOCKET_OBJECT_STORE") {
            Some(v) if v.eq_ignore_ascii_case("memory") => ObjectStoreConfig::Memory,
            Some(v) if !v.trim().is_empty() => ObjectStoreConfig::Filesystem(PathBuf::from(v)),
            _ => defaults.object_store,
        };

        Self {
            host: lookup("DOCKET_HOST").unwrap_or(defaults.host),
            port: lookup("DOCKET_PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.port),
            database_path: lookup("DOCKET_DATABASE").unwrap_or(defaults.database_path),
            object_store,
            archive: ArchiveLimits {
                fetch_timeout: parsed("DOCKET_ARCHIVE_FETCH_TIMEOUT_SECS")
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.archive.fetch_timeout),
                max_total_bytes: parsed("DOCKET_ARCHIVE_MAX_BYTES")
                    .unwrap_or(defaults.archive.max_total_bytes),
            },
            match_by_email: lookup("DOCKET_MATCH_BY_EMAIL")
                .map(|v| matches!(v.trim(), "1" | "true" | "TRUE" | "True"))
                .unwrap_or(defaults.match_by_email),
            json_limit_bytes: parsed("DOCKET_JSON_LIMIT_BYTES")
                .map(|v| v as usize)
                .unwrap_or(defaults.json_limit_bytes),
        }
    }
}
