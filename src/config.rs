//! Configuration management for tango.
//!
//! Global config lives in `~/.tango/config.toml`, the record database in
//! `~/.tango/tango.db`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Error;

/// Global tango configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub digest: DigestConfig,

    #[serde(default)]
    pub notify: NotifyConfig,
}

/// Bounds and scoring horizon for digest generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestConfig {
    /// Maximum phrases in the review section (default 5).
    #[serde(default = "default_max_review_phrases")]
    pub max_review_phrases: usize,

    /// Maximum error patterns in the weakness section (default 3).
    #[serde(default = "default_max_weakness_patterns")]
    pub max_weakness_patterns: usize,

    /// Maximum entries in the recent-corrections section (default 5).
    #[serde(default = "default_max_recent_corrections")]
    pub max_recent_corrections: usize,

    /// Staleness horizon in days (default 7). Past it, staleness outranks
    /// any amount of retrieval frequency.
    #[serde(default = "default_staleness_horizon_days")]
    pub staleness_horizon_days: f64,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            max_review_phrases: default_max_review_phrases(),
            max_weakness_patterns: default_max_weakness_patterns(),
            max_recent_corrections: default_max_recent_corrections(),
            staleness_horizon_days: default_staleness_horizon_days(),
        }
    }
}

impl DigestConfig {
    /// Reject bounds that would produce an unbounded or empty digest.
    pub fn validate(&self) -> Result<(), Error> {
        if self.max_review_phrases == 0 {
            return Err(Error::InvalidConfig(
                "max_review_phrases must be positive".to_string(),
            ));
        }
        if self.max_weakness_patterns == 0 {
            return Err(Error::InvalidConfig(
                "max_weakness_patterns must be positive".to_string(),
            ));
        }
        if self.max_recent_corrections == 0 {
            return Err(Error::InvalidConfig(
                "max_recent_corrections must be positive".to_string(),
            ));
        }
        if !self.staleness_horizon_days.is_finite() || self.staleness_horizon_days <= 0.0 {
            return Err(Error::InvalidConfig(
                "staleness_horizon_days must be a positive number".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outbound chat channel configuration.
///
/// Channel identifiers and the access token are explicit config, never
/// ambient state. Disabled until the user fills these in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Push-message endpoint of the chat provider.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Bearer token for the push endpoint.
    #[serde(default)]
    pub access_token: String,

    /// Recipient identifier (user or channel ID).
    #[serde(default)]
    pub to: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: default_api_url(),
            access_token: String::new(),
            to: String::new(),
        }
    }
}

impl NotifyConfig {
    /// True when the channel has everything it needs to push.
    pub fn is_configured(&self) -> bool {
        self.enabled && !self.access_token.is_empty() && !self.to.is_empty()
    }
}

fn default_max_review_phrases() -> usize {
    5
}

fn default_max_weakness_patterns() -> usize {
    3
}

fn default_max_recent_corrections() -> usize {
    5
}

fn default_staleness_horizon_days() -> f64 {
    7.0
}

fn default_api_url() -> String {
    "https://api.line.me/v2/bot/message/push".to_string()
}

impl Config {
    /// Load config from ~/.tango/config.toml, defaults if absent.
    pub fn load() -> Result<Self, Error> {
        let path = Self::path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| Error::ConfigParse(e.to_string()))?;
        Ok(config)
    }

    /// Save config to ~/.tango/config.toml.
    pub fn save(&self) -> Result<(), Error> {
        let path = Self::path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| Error::ConfigParse(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Path to the global tango directory (~/.tango/).
    pub fn global_dir() -> Result<PathBuf, Error> {
        let home = dirs::home_dir().ok_or(Error::HomeDirNotFound)?;
        Ok(home.join(".tango"))
    }

    /// Path to the config file.
    pub fn path() -> Result<PathBuf, Error> {
        Ok(Self::global_dir()?.join("config.toml"))
    }

    /// Path to the record database.
    pub fn db_path() -> Result<PathBuf, Error> {
        Ok(Self::global_dir()?.join("tango.db"))
    }
}
