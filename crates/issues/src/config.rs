//! Configuration file loading.
//!
//! The server reads an optional `issues.toml`. Every table and key is
//! optional; missing values fall back to defaults, and command-line flags
//! override whatever the file says.
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:8080"
//!
//! [database]
//! path = "/var/lib/issues/issues.db"
//!
//! [list]
//! latest_limit = 10
//! ```

use crate::service::{DEFAULT_LATEST_LIMIT, MAX_LATEST_LIMIT};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "issues.toml";
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";
pub const DEFAULT_DATABASE_PATH: &str = "issues.db";

/// Root configuration structure loaded from `issues.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackerConfig {
    /// HTTP listener settings (optional).
    pub server: Option<ServerConfig>,
    /// Persistence settings (optional).
    pub database: Option<DatabaseConfig>,
    /// List view settings (optional).
    pub list: Option<ListConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address to listen on (default: "0.0.0.0:3000").
    pub bind: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// SQLite file (default: "issues.db").
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListConfig {
    /// How many issues the latest-issues view returns (default: 5, max 50).
    pub latest_limit: Option<usize>,
}

impl TrackerConfig {
    /// Load configuration from `path`.
    ///
    /// Returns an empty config (all tables None) if the file doesn't exist.
    /// Returns an error if the file exists but is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let config: TrackerConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(config)
    }

    pub fn bind(&self) -> String {
        self.server
            .as_ref()
            .and_then(|s| s.bind.clone())
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
    }

    pub fn database_path(&self) -> PathBuf {
        self.database
            .as_ref()
            .and_then(|d| d.path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_PATH))
    }

    /// Latest-issues limit, clamped to 1..=50.
    pub fn latest_limit(&self) -> usize {
        self.list
            .as_ref()
            .and_then(|l| l.latest_limit)
            .unwrap_or(DEFAULT_LATEST_LIMIT)
            .clamp(1, MAX_LATEST_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = TrackerConfig::default();
        assert_eq!(config.bind(), "0.0.0.0:3000");
        assert_eq!(config.database_path(), PathBuf::from("issues.db"));
        assert_eq!(config.latest_limit(), 5);
    }

    #[test]
    fn test_parse_full_config() {
        let config_toml = r#"
[server]
bind = "127.0.0.1:8080"

[database]
path = "/tmp/tracker.db"

[list]
latest_limit = 12
"#;
        let config: TrackerConfig = toml::from_str(config_toml).unwrap();
        assert_eq!(config.bind(), "127.0.0.1:8080");
        assert_eq!(config.database_path(), PathBuf::from("/tmp/tracker.db"));
        assert_eq!(config.latest_limit(), 12);
    }

    #[test]
    fn test_partial_config_keeps_other_defaults() {
        let config: TrackerConfig = toml::from_str("[list]\nlatest_limit = 500\n").unwrap();
        assert_eq!(config.bind(), DEFAULT_BIND);
        assert_eq!(config.latest_limit(), MAX_LATEST_LIMIT);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let result: std::result::Result<TrackerConfig, _> =
            toml::from_str("[server]\nport = 3000\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = TrackerConfig::load(&temp_dir.path().join(DEFAULT_CONFIG_FILE)).unwrap();
        assert!(config.server.is_none());
        assert!(config.database.is_none());
    }

    #[test]
    fn test_load_existing_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "[database]\npath = \"data.db\"\n").unwrap();

        let config = TrackerConfig::load(&path).unwrap();
        assert_eq!(config.database_path(), PathBuf::from("data.db"));
    }

    #[test]
    fn test_load_malformed_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(DEFAULT_CONFIG_FILE);
        std::fs::write(&path, "[server\nbind = ").unwrap();

        let err = TrackerConfig::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse"));
    }
}
