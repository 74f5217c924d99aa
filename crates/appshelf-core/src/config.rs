//! Configuration and data directory management.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 3040;
pub const DEFAULT_QUOTA_MB: u64 = 512;
pub const DEFAULT_SEARCH_TTL_HOURS: u64 = 24;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 20;
pub const SEMANTIC_SCHOLAR_URL: &str = "https://api.semanticscholar.org";
pub const OPENALEX_URL: &str = "https://api.openalex.org";

/// Paths to all AppShelf data directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// SQLite database directory (`data/db/`).
    pub db: PathBuf,
    /// Markdown documents served by the spec viewer (`data/specs/`).
    pub specs: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            db: root.join("db"),
            specs: root.join("specs"),
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.db)?;
        std::fs::create_dir_all(&self.specs)?;
        Ok(())
    }
}

/// Top-level AppShelf configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppShelfConfig {
    /// Interface the local shell binds to.
    pub host: String,
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// Upper bound on stored document payload bytes.
    pub quota_bytes: u64,
    /// Freshness window of the search-results cache.
    pub search_cache_ttl: Duration,
    /// Timeout for each outbound HTTP request.
    pub http_timeout: Duration,
    pub semantic_scholar_url: String,
    pub openalex_url: String,
}

impl AppShelfConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let host = std::env::var("APPSHELF_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env_parse("APPSHELF_PORT").unwrap_or(DEFAULT_PORT);
        let quota_mb = env_parse("APPSHELF_QUOTA_MB").unwrap_or(DEFAULT_QUOTA_MB);
        let ttl_hours = env_parse("APPSHELF_SEARCH_TTL_HOURS").unwrap_or(DEFAULT_SEARCH_TTL_HOURS);
        let timeout_secs =
            env_parse("APPSHELF_HTTP_TIMEOUT_SECS").unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);

        let data_paths = DataPaths::new(data_dir)?;

        Ok(Self {
            host,
            port,
            data_paths,
            quota_bytes: quota_from_mb(quota_mb),
            search_cache_ttl: ttl_from_hours(ttl_hours),
            http_timeout: Duration::from_secs(timeout_secs),
            semantic_scholar_url: std::env::var("APPSHELF_SEMANTIC_SCHOLAR_URL")
                .unwrap_or_else(|_| SEMANTIC_SCHOLAR_URL.to_string()),
            openalex_url: std::env::var("APPSHELF_OPENALEX_URL")
                .unwrap_or_else(|_| OPENALEX_URL.to_string()),
        })
    }

    /// Configuration with defaults only, rooted at `data_dir`. Ignores the environment.
    pub fn with_defaults(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        Ok(Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            data_paths: DataPaths::new(data_dir)?,
            quota_bytes: quota_from_mb(DEFAULT_QUOTA_MB),
            search_cache_ttl: ttl_from_hours(DEFAULT_SEARCH_TTL_HOURS),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            semantic_scholar_url: SEMANTIC_SCHOLAR_URL.to_string(),
            openalex_url: OPENALEX_URL.to_string(),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Quota in bytes; oversized values saturate instead of overflowing.
fn quota_from_mb(mb: u64) -> u64 {
    mb.saturating_mul(1024 * 1024)
}

fn ttl_from_hours(hours: u64) -> Duration {
    Duration::from_secs(hours.saturating_mul(3600))
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_paths_created() {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(dir.path().join("data")).unwrap();
        assert!(paths.db.is_dir());
        assert!(paths.specs.is_dir());
    }

    #[test]
    fn test_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppShelfConfig::with_defaults(dir.path()).unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.search_cache_ttl, Duration::from_secs(24 * 3600));
        assert_eq!(config.quota_bytes, 512 * 1024 * 1024);
        assert_eq!(config.bind_addr(), "127.0.0.1:3040");
    }

    #[test]
    fn test_huge_limits_saturate() {
        assert_eq!(quota_from_mb(2), 2 * 1024 * 1024);
        assert_eq!(quota_from_mb(u64::MAX), u64::MAX);
        assert_eq!(ttl_from_hours(u64::MAX), Duration::from_secs(u64::MAX));
    }
}
