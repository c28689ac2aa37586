//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/repopulse/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/repopulse/` (~/.config/repopulse/)
//! - Data: `$XDG_DATA_HOME/repopulse/` (~/.local/share/repopulse/)
//! - State/Logs: `$XDG_STATE_HOME/repopulse/` (~/.local/state/repopulse/)

use crate::error::{Error, Result};
use crate::types::RepoId;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// GitHub API bearer token.
///
/// An opaque secret: redacted from `Debug` output so it cannot leak into
/// logs or error messages.
#[derive(Clone, Deserialize)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// GitHub API configuration
    #[serde(default)]
    pub github: GithubConfig,

    /// Repositories to fetch, as "owner/name" strings.
    /// Empty means discover the authenticated user's repositories.
    #[serde(default)]
    pub repos: Vec<String>,

    /// Storage path overrides
    #[serde(default)]
    pub storage: StorageConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// GitHub API configuration
#[derive(Debug, Deserialize, Clone)]
pub struct GithubConfig {
    /// Token from the config file; the `GITHUB_TOKEN` environment
    /// variable takes precedence when set.
    pub token: Option<Token>,

    /// API base URL (overridable for tests)
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GithubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GithubConfig {
    /// Resolve the bearer token: environment first, then config file.
    pub fn resolve_token(&self) -> Result<Token> {
        if let Ok(value) = std::env::var("GITHUB_TOKEN") {
            if !value.is_empty() {
                return Ok(Token::new(value));
            }
        }

        self.token.clone().ok_or_else(|| {
            Error::Config(
                "no GitHub token: set GITHUB_TOKEN or [github].token in config.toml".to_string(),
            )
        })
    }
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Storage path overrides
#[derive(Debug, Deserialize, Default)]
pub struct StorageConfig {
    /// Override path for the SQLite database
    pub database_path: Option<PathBuf>,
    /// Override path for the CSV mirror
    pub csv_path: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Parse the configured repository list.
    pub fn repo_list(&self) -> Result<Vec<RepoId>> {
        self.repos
            .iter()
            .map(|s| s.parse().map_err(Error::Config))
            .collect()
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/repopulse/config.toml` (~/.config/repopulse/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("repopulse").join("config.toml")
    }

    /// Returns the data directory path (for the database and CSV mirror)
    ///
    /// `$XDG_DATA_HOME/repopulse/` (~/.local/share/repopulse/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("repopulse")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/repopulse/` (~/.local/state/repopulse/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("repopulse")
    }

    /// Returns the database file path, honoring the storage override.
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::data_dir().join("traffic.db"))
    }

    /// Returns the CSV mirror path, honoring the storage override.
    pub fn csv_path(&self) -> PathBuf {
        self.storage
            .csv_path
            .clone()
            .unwrap_or_else(|| Self::data_dir().join("traffic.csv"))
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/repopulse/repopulse.log`
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("repopulse.log")
    }

    /// Ensure XDG base directory environment variables are set.
    ///
    /// This is mainly for CLI binaries that want explicit, stable path
    /// behavior before invoking other components that read these env vars.
    pub fn ensure_xdg_env() {
        let home = home_dir();

        if std::env::var("XDG_DATA_HOME").is_err() {
            std::env::set_var("XDG_DATA_HOME", home.join(".local/share"));
        }

        if std::env::var("XDG_STATE_HOME").is_err() {
            std::env::set_var("XDG_STATE_HOME", home.join(".local/state"));
        }

        if std::env::var("XDG_CONFIG_HOME").is_err() {
            std::env::set_var("XDG_CONFIG_HOME", home.join(".config"));
        }
    }
}
