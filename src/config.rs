//! Configuration management for Chatkeep
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{ChatkeepError, Result};
use crate::identity::DEFAULT_MAX_AGE_DAYS;
use crate::storage::DEFAULT_CONVERSATIONS_KEY;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for Chatkeep
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where conversations are persisted
    #[serde(default)]
    pub storage: StorageConfig,

    /// Lifetime of the identity cookies
    #[serde(default)]
    pub cookies: CookieConfig,

    /// Remote history endpoint
    #[serde(default)]
    pub history: HistoryConfig,
}

/// Local persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the key-value store and the cookie jar
    ///
    /// Defaults to the platform data directory when unset.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Key the conversation list is stored under
    #[serde(default = "default_conversations_key")]
    pub conversations_key: String,
}

fn default_conversations_key() -> String {
    DEFAULT_CONVERSATIONS_KEY.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            conversations_key: default_conversations_key(),
        }
    }
}

impl StorageConfig {
    /// Resolve the data directory, falling back to the platform default
    ///
    /// # Errors
    ///
    /// Returns `ChatkeepError::Config` if no platform data directory exists
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }

        let proj_dirs = ProjectDirs::from("com", "chatkeep", "chatkeep").ok_or_else(|| {
            ChatkeepError::Config("Could not determine data directory".to_string())
        })?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    /// Path of the key-value database inside `data_dir`
    pub fn database_path(data_dir: &Path) -> PathBuf {
        data_dir.join("conversations.db")
    }

    /// Path of the cookie jar inside `data_dir`
    pub fn cookie_jar_path(data_dir: &Path) -> PathBuf {
        data_dir.join("cookies.json")
    }
}

/// Cookie lifetime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieConfig {
    /// Days before the identity cookies expire
    #[serde(default = "default_max_age_days")]
    pub max_age_days: i64,
}

/// Longest accepted cookie lifetime, in days
pub const MAX_COOKIE_AGE_DAYS: i64 = 36_500;

fn default_max_age_days() -> i64 {
    DEFAULT_MAX_AGE_DAYS
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            max_age_days: default_max_age_days(),
        }
    }
}

impl CookieConfig {
    /// Lifetime as a duration
    pub fn max_age(&self) -> chrono::Duration {
        chrono::Duration::days(self.max_age_days)
    }
}

/// HTTP method used for the history request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum HistoryMethod {
    /// `GET` with no body
    #[default]
    Get,
    /// `POST` with a JSON body
    Post,
}

impl std::fmt::Display for HistoryMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryMethod::Get => write!(f, "GET"),
            HistoryMethod::Post => write!(f, "POST"),
        }
    }
}

impl std::str::FromStr for HistoryMethod {
    type Err = ChatkeepError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "GET" => Ok(HistoryMethod::Get),
            "POST" => Ok(HistoryMethod::Post),
            other => Err(ChatkeepError::Config(format!(
                "Invalid history method: {}. Must be one of: GET, POST",
                other
            ))),
        }
    }
}

/// Remote history endpoint configuration
///
/// No URL means sync is not configured, which is a normal state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Endpoint URL
    #[serde(default)]
    pub url: Option<String>,

    /// Request method
    #[serde(default)]
    pub method: HistoryMethod,
}

impl HistoryConfig {
    /// The configured URL, ignoring blank values
    pub fn endpoint(&self) -> Option<&str> {
        self.url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Whether a remote endpoint is configured
    pub fn is_configured(&self) -> bool {
        self.endpoint().is_some()
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ChatkeepError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ChatkeepError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(data_dir) = std::env::var("CHATKEEP_DATA_DIR") {
            tracing::debug!(data_dir = %data_dir, "Env override: CHATKEEP_DATA_DIR");
            self.storage.data_dir = Some(PathBuf::from(data_dir));
        }

        if let Ok(url) = std::env::var("CHATKEEP_HISTORY_URL") {
            tracing::debug!(url = %url, "Env override: CHATKEEP_HISTORY_URL");
            self.history.url = Some(url);
        }

        if let Ok(method) = std::env::var("CHATKEEP_HISTORY_METHOD") {
            match method.parse() {
                Ok(value) => self.history.method = value,
                Err(_) => tracing::warn!("Invalid CHATKEEP_HISTORY_METHOD: {}", method),
            }
        }

        if let Ok(max_age) = std::env::var("CHATKEEP_COOKIE_MAX_AGE_DAYS") {
            if let Ok(value) = max_age.parse() {
                self.cookies.max_age_days = value;
            } else {
                tracing::warn!("Invalid CHATKEEP_COOKIE_MAX_AGE_DAYS: {}", max_age);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(data_dir) = &cli.data_dir {
            tracing::debug!("Using data directory override from CLI: {}", data_dir.display());
            self.storage.data_dir = Some(data_dir.clone());
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        if self.storage.conversations_key.trim().is_empty() {
            return Err(ChatkeepError::Config(
                "storage.conversations_key cannot be empty".to_string(),
            )
            .into());
        }

        if self.cookies.max_age_days <= 0 {
            return Err(ChatkeepError::Config(
                "cookies.max_age_days must be greater than 0".to_string(),
            )
            .into());
        }

        if self.cookies.max_age_days > MAX_COOKIE_AGE_DAYS {
            return Err(ChatkeepError::Config(format!(
                "cookies.max_age_days cannot exceed {}",
                MAX_COOKIE_AGE_DAYS
            ))
            .into());
        }

        if let Some(endpoint) = self.history.endpoint() {
            let url = url::Url::parse(endpoint).map_err(|e| {
                ChatkeepError::Config(format!("Invalid history.url '{}': {}", endpoint, e))
            })?;

            if !matches!(url.scheme(), "http" | "https") {
                return Err(ChatkeepError::Config(format!(
                    "history.url must use http or https, got: {}",
                    url.scheme()
                ))
                .into());
            }
        }

        Ok(())
    }
}
