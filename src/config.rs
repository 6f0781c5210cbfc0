//! Configuration file handling.
//!
//! This module provides loading and saving of solaudit configuration
//! from a TOML file. Values flow into components as explicit constructor
//! inputs; nothing reads the environment at arbitrary points.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/solaudit/config.toml`
//! - macOS: `~/Library/Application Support/solaudit/config.toml`
//! - Windows: `%APPDATA%\solaudit\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! default_level = "quick"
//! default_format = "text"
//! etherscan_timeout_secs = 10
//! etherscan_api_url = "https://api.etherscan.io/api"
//! # tool_timeout_secs = 900
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Application configuration.
///
/// The Etherscan API key is deliberately not part of the file: it is read
/// once from `ETHERSCAN_API_KEY` via [`Config::etherscan_api_key`] and
/// handed to the enricher explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Audit level used when no `--level` flag is provided.
    pub default_level: String,

    /// Output format used when no `--format` flag is provided.
    ///
    /// Valid values: "text", "json"
    pub default_format: String,

    /// Per-tool timeout override in seconds. When unset, the audit
    /// level's own budget applies.
    pub tool_timeout_secs: Option<u64>,

    /// Budget for each Etherscan request, in seconds.
    pub etherscan_timeout_secs: u64,

    /// Etherscan API base URL.
    pub etherscan_api_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_level: "quick".to_string(),
            default_format: "text".to_string(),
            tool_timeout_secs: None,
            etherscan_timeout_secs: 10,
            etherscan_api_url: crate::etherscan::DEFAULT_API_URL.to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from the config file.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or
    /// parsed.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves the configuration to the config file, creating the parent
    /// directory if needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("solaudit")
            .join("config.toml")
    }

    /// Reads the Etherscan API key from the environment, treating an
    /// empty value as absent.
    pub fn etherscan_api_key() -> Option<String> {
        std::env::var("ETHERSCAN_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())
    }
}
