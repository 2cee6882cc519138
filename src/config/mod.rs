//! User-level configuration.
//!
//! Stored as TOML at `$PATCHWISE_CONFIG_PATH` or
//! `<config dir>/patchwise/config.toml`. The per-project link lives
//! separately in [`project`].

/// The `.patchwise.toml` project link
pub mod project;

use crate::DEFAULT_API_URL;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "PATCHWISE_CONFIG_PATH";

/// Every key accepted by [`Config::get`] and [`Config::set`]
pub const KEYS: &[&str] = &[
    "auth.api_key",
    "remote.api_url",
    "remote.timeout_secs",
    "scope.max_files",
    "scope.follow_symlinks",
];

/// Contents of the user configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// `[auth]`
    #[serde(default)]
    pub auth: AuthConfig,

    /// `[remote]`
    #[serde(default)]
    pub remote: RemoteConfig,

    /// `[scope]`
    #[serde(default)]
    pub scope: ScopeConfig,
}

/// Stored credentials
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Bearer key sent with every request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Where and how to reach the analysis service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// API root URL
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Limits applied while resolving scopes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeConfig {
    /// Resolved file count above which the user is asked to confirm
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    /// Follow symbolic links while walking
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
            follow_symlinks: false,
        }
    }
}

impl Config {
    /// Location of the user config file
    ///
    /// # Errors
    ///
    /// Returns an error if no platform config directory can be determined
    /// and `PATCHWISE_CONFIG_PATH` is unset.
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }
        let dir = dirs::config_dir().context("Could not determine the user config directory")?;
        Ok(dir.join("patchwise").join("config.toml"))
    }

    /// Load configuration from a file
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cannot create parent directories
    /// - Cannot read or parse the configuration file
    /// - Configuration file contains invalid TOML
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Save configuration to a file
    ///
    /// The file is readable by the owner only, since it may hold an API key.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cannot create parent directories
    /// - Cannot write to the file
    /// - TOML serialization fails
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_str = toml::to_string_pretty(self)?;
        let mut file = std::fs::File::create(path)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        file.write_all(toml_str.as_bytes())?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    /// Get a configuration value by key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        let (section, name) = key.split_once('.')?;

        match (section, name) {
            ("auth", "api_key") => self.auth.api_key.clone(),
            ("remote", "api_url") => Some(self.remote.api_url.clone()),
            ("remote", "timeout_secs") => Some(self.remote.timeout_secs.to_string()),
            ("scope", "max_files") => Some(self.scope.max_files.to_string()),
            ("scope", "follow_symlinks") => Some(self.scope.follow_symlinks.to_string()),
            _ => None,
        }
    }

    /// Set a configuration value by key
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The key format is invalid (must be section.key)
    /// - The key is unknown
    /// - The value is invalid for the key (e.g., a URL without scheme)
    pub fn set(&mut self, key: &str, value: String) -> Result<()> {
        let (section, name) = key
            .split_once('.')
            .with_context(|| format!("Invalid configuration key: {key}"))?;

        match (section, name) {
            ("auth", "api_key") => {
                let value = value.trim().to_string();
                if value.is_empty() {
                    anyhow::bail!("API key cannot be empty");
                }
                self.auth.api_key = Some(value);
            }
            ("remote", "api_url") => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    anyhow::bail!("API URL must start with http:// or https://: {value}");
                }
                self.remote.api_url = value;
            }
            ("remote", "timeout_secs") => {
                let secs: u64 = value
                    .parse()
                    .with_context(|| format!("Invalid number: {value}"))?;
                if secs == 0 {
                    anyhow::bail!("Timeout must be at least 1 second");
                }
                self.remote.timeout_secs = secs;
            }
            ("scope", "max_files") => {
                let max: usize = value
                    .parse()
                    .with_context(|| format!("Invalid number: {value}"))?;
                if max == 0 {
                    anyhow::bail!("scope.max_files must be greater than 0");
                }
                self.scope.max_files = max;
            }
            ("scope", "follow_symlinks") => {
                self.scope.follow_symlinks = value
                    .parse()
                    .with_context(|| format!("Invalid boolean: {value}"))?;
            }
            _ => anyhow::bail!("Unknown configuration key: {key}"),
        }
        Ok(())
    }

    /// Unset a configuration value by key, restoring its default
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown.
    pub fn unset(&mut self, key: &str) -> Result<()> {
        match key {
            "auth.api_key" => self.auth.api_key = None,
            "remote.api_url" => self.remote.api_url = default_api_url(),
            "remote.timeout_secs" => self.remote.timeout_secs = default_timeout_secs(),
            "scope.max_files" => self.scope.max_files = default_max_files(),
            "scope.follow_symlinks" => self.scope.follow_symlinks = false,
            _ => anyhow::bail!("Cannot unset configuration key: {key}"),
        }
        Ok(())
    }
}

// Default functions for serde
fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

const fn default_timeout_secs() -> u64 {
    60
}

const fn default_max_files() -> usize {
    200
}
