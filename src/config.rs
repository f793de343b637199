//! Configuration file handling with TOML support.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Application configuration loaded from TOML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,

    /// Input file locations
    #[serde(default)]
    pub files: FilesConfig,

    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneralConfig {
    /// API timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Auto-refresh interval in seconds, 0 disables
    #[serde(default)]
    pub refresh_interval: f64,

    /// Fetch quotes as soon as the dashboard opens
    #[serde(default = "default_true")]
    pub refresh_on_start: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            refresh_interval: 0.0,
            refresh_on_start: true,
        }
    }
}

fn default_timeout() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

/// Where inputs are read from, relative to the working directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilesConfig {
    #[serde(default = "default_tickers_file")]
    pub tickers: PathBuf,

    #[serde(default = "default_details_template")]
    pub details_template: PathBuf,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            tickers: default_tickers_file(),
            details_template: default_details_template(),
        }
    }
}

fn default_tickers_file() -> PathBuf {
    PathBuf::from("tickers.txt")
}

fn default_details_template() -> PathBuf {
    PathBuf::from("details-template.md")
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log file used while the dashboard owns the terminal
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
        }
    }
}

fn default_log_file() -> PathBuf {
    PathBuf::from("tickrs.log")
}

impl Config {
    /// Load configuration from file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load configuration from default location or create default.
    pub fn load_or_default() -> Self {
        if let Some(path) = Self::default_config_path() {
            if path.exists() {
                match Self::load(&path) {
                    Ok(config) => return config,
                    Err(e) => {
                        eprintln!("Warning: Failed to load config: {:#}", e);
                    }
                }
            }
        }
        Config::default()
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tickrs").join("config.toml"))
    }
}

/// Generate a sample configuration file content.
pub fn sample_config() -> &'static str {
    r##"# tickrs configuration file

[general]
# API timeout in seconds
timeout = 10
# Auto-refresh interval in seconds for the dashboard, 0 disables
refresh_interval = 0.0
# Fetch quotes as soon as the dashboard opens
refresh_on_start = true

[files]
# One ticker per line, '#' starts a comment
tickers = "tickers.txt"
# Rendered in the details pane, {{ field }} placeholders
details_template = "details-template.md"

[logging]
# Dashboard log output (the terminal is busy drawing)
file = "tickrs.log"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_sample_config_parses() {
        let config: Config = toml::from_str(sample_config()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str("[general]\ntimeout = 3\n").unwrap();
        assert_eq!(config.general.timeout, 3);
        assert!(config.general.refresh_on_start);
        assert_eq!(config.files.tickers, PathBuf::from("tickers.txt"));
        assert_eq!(config.logging.file, PathBuf::from("tickrs.log"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[files]\ntickers = \"watch.txt\"").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.files.tickers, PathBuf::from("watch.txt"));
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[general\ntimeout = ").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
