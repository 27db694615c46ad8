//! Configuration management for justlog

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::logging::{Level, DEFAULT_DATE_FORMAT};

/// Default config file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "justlog.toml";

/// Logger configuration, supplied once when the [`Logger`](crate::logging::Logger) is built
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggerConfig {
    /// Log file location; no file sink is installed when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file_path: Option<PathBuf>,

    /// Minimum level for the logger and its file sink (default: info)
    #[serde(default = "default_level")]
    pub level: Level,

    /// Minimum level echoed to stderr; stderr output is off when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr_level: Option<Level>,

    /// Size in bytes above which the file is rotated to `<file>.1` (default: 1 MB)
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,

    /// Number of rotated backups to keep (default: 5)
    #[serde(default = "default_backup_count")]
    pub backup_count: usize,

    /// Days of entries to keep; 0 keeps everything (default: 0)
    #[serde(default)]
    pub backup_days: u64,

    /// Name reported in diagnostics (default: "app")
    #[serde(default = "default_logger_name")]
    pub logger_name: String,

    /// chrono format string for the head-line timestamp
    #[serde(default = "default_date_format")]
    pub date_format: String,

    /// Minimum level for the row-store sink, when one is attached
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_store_level: Option<Level>,
}

fn default_level() -> Level {
    Level::Info
}

fn default_max_bytes() -> u64 {
    1_000_000
}

fn default_backup_count() -> usize {
    5
}

fn default_logger_name() -> String {
    "app".to_string()
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::new("logs/app.log")
    }
}

impl LoggerConfig {
    /// File-backed configuration with every other setting at its default
    pub fn new(log_file_path: impl Into<PathBuf>) -> Self {
        Self {
            log_file_path: Some(log_file_path.into()),
            level: default_level(),
            stderr_level: None,
            ..Self::stderr_default()
        }
    }

    /// Configuration used before anything was set up: no file, stderr at WARNING
    pub fn stderr_default() -> Self {
        Self {
            log_file_path: None,
            level: Level::Warning,
            stderr_level: Some(Level::Warning),
            max_bytes: default_max_bytes(),
            backup_count: default_backup_count(),
            backup_days: 0,
            logger_name: default_logger_name(),
            date_format: default_date_format(),
            row_store_level: None,
        }
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_stderr_level(mut self, level: Option<Level>) -> Self {
        self.stderr_level = level;
        self
    }

    pub fn with_rotation(mut self, max_bytes: u64, backup_count: usize) -> Self {
        self.max_bytes = max_bytes;
        self.backup_count = backup_count;
        self
    }

    pub fn with_backup_days(mut self, backup_days: u64) -> Self {
        self.backup_days = backup_days;
        self
    }
}

/// Settings for the browser log viewer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ViewerConfig {
    /// Serve the viewer from the `justlog` binary (default: true)
    #[serde(default = "default_viewer_enabled")]
    pub enabled: bool,

    /// Port on 127.0.0.1 to listen on (default: 8765)
    #[serde(default = "default_viewer_port")]
    pub port: u16,

    /// Entries per page when the request does not say (default: 200)
    #[serde(default = "default_per_page")]
    pub per_page: usize,
}

fn default_viewer_enabled() -> bool {
    true
}

fn default_viewer_port() -> u16 {
    8765
}

fn default_per_page() -> usize {
    200
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            enabled: default_viewer_enabled(),
            port: default_viewer_port(),
            per_page: default_per_page(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub logger: LoggerConfig,

    #[serde(default)]
    pub viewer: ViewerConfig,
}

impl Config {
    /// Load configuration from file, or return default if not found
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(
            config.logger.log_file_path,
            Some(PathBuf::from("logs/app.log"))
        );
        assert_eq!(config.logger.level, Level::Info);
        assert_eq!(config.logger.stderr_level, None);
        assert_eq!(config.logger.max_bytes, 1_000_000);
        assert_eq!(config.logger.backup_count, 5);
        assert_eq!(config.logger.backup_days, 0);
        assert_eq!(config.logger.logger_name, "app");
        assert_eq!(config.logger.date_format, "%Y-%m-%d %H:%M:%S");
        assert_eq!(config.viewer.port, 8765);
        assert_eq!(config.viewer.per_page, 200);
        assert!(config.viewer.enabled);
    }

    #[test]
    fn test_stderr_default() {
        let config = LoggerConfig::stderr_default();
        assert_eq!(config.log_file_path, None);
        assert_eq!(config.level, Level::Warning);
        assert_eq!(config.stderr_level, Some(Level::Warning));
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        config.logger.stderr_level = Some(Level::Error);
        config.logger.backup_days = 14;

        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed, config);
    }

    #[test]
    fn test_config_partial_toml() {
        let toml_str = r#"
            [logger]
            log_file_path = "/var/log/site.log"
            level = "debug"
            stderr_level = "warning"

            [viewer]
            port = 9000
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(
            config.logger.log_file_path,
            Some(PathBuf::from("/var/log/site.log"))
        );
        assert_eq!(config.logger.level, Level::Debug);
        assert_eq!(config.logger.stderr_level, Some(Level::Warning));
        assert_eq!(config.logger.backup_count, 5);
        assert_eq!(config.viewer.port, 9000);
        assert!(config.viewer.enabled);
    }

    #[test]
    fn test_config_empty_toml_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_missing_file_returns_default() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load(&temp_dir.path().join("missing.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("justlog.toml");

        let mut config = Config::default();
        config.viewer.port = 7000;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.viewer.port, 7000);
    }

    #[test]
    fn test_load_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("justlog.toml");
        std::fs::write(&path, "[logger]\nlevel = \"loud\"\n").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
