//! Configuration loading and management
//!
//! Handles parsing of `config.toml` in the data directory.

use serde::Deserialize;
use std::path::Path;

use crate::error::{Error, Result};
use crate::lock::DEFAULT_LOCK_TIMEOUT_MS;
use crate::storage::DEFAULT_SLOT;
use crate::views::Filter;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Persistent slot settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Terminal UI settings
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageConfig {
    /// Key of the task slot; also the file stem on disk
    #[serde(default = "default_slot")]
    pub slot: String,

    /// How long a write waits for the slot lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

fn default_slot() -> String {
    DEFAULT_SLOT.to_string()
}

fn default_lock_timeout_ms() -> u64 {
    DEFAULT_LOCK_TIMEOUT_MS
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            slot: default_slot(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UiConfig {
    /// Filter used by `td list` and the TUI when none is given
    #[serde(default = "default_filter")]
    pub default_filter: String,

    /// Show the stats pane when the TUI starts
    #[serde(default = "default_true")]
    pub show_stats: bool,
}

fn default_filter() -> String {
    Filter::All.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            default_filter: default_filter(),
            show_stats: true,
        }
    }
}

impl UiConfig {
    pub fn filter(&self) -> Result<Filter> {
        self.default_filter.parse().map_err(|_| {
            Error::InvalidConfig(format!(
                "ui.default_filter: unknown filter '{}' (expected all|active|done)",
                self.default_filter
            ))
        })
    }
}

impl Config {
    /// Load and validate configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise return defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.storage.validate()?;
        self.ui.filter()?;
        Ok(())
    }
}

impl StorageConfig {
    fn validate(&self) -> Result<()> {
        let slot = self.slot.as_str();
        if slot.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "storage.slot cannot be empty".to_string(),
            ));
        }
        if !slot
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
        {
            return Err(Error::InvalidConfig(format!(
                "storage.slot '{slot}' may only contain letters, digits, '-' and '_'"
            )));
        }
        if self.lock_timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "storage.lock_timeout_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
