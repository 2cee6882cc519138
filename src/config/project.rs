//! Per-project link to the remote service.

use crate::PROJECT_CONFIG_FILE;
use crate::error::PatchError;
use crate::utils::paths::{normalize_lexically, to_posix};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};

/// Persisted link between a local directory and a remote project.
///
/// Written once by `init` and read by every other command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Remote project identifier
    pub project_id: String,
    /// Directory, relative to the project root, that the project analyzes
    pub target_directory: String,
    /// Upper bound on a single upload, in megabytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_upload_size_mb: Option<u64>,
}

impl ProjectConfig {
    /// Link to `project_id` analyzing `target_directory`, without an upload limit
    #[must_use]
    pub fn new(project_id: impl Into<String>, target_directory: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            target_directory: target_directory.into(),
            max_upload_size_mb: None,
        }
    }

    /// Location of the config file for `project_root`
    #[must_use]
    pub fn path(project_root: &Path) -> PathBuf {
        project_root.join(PROJECT_CONFIG_FILE)
    }

    /// Whether `project_root` has been linked
    #[must_use]
    pub fn exists(project_root: &Path) -> bool {
        Self::path(project_root).is_file()
    }

    /// Read and validate the config for `project_root`.
    ///
    /// # Errors
    ///
    /// - `PatchError::ProjectNotInitialized` if the file is absent
    /// - `PatchError::MalformedConfig` if it is not valid TOML for this shape
    /// - `PatchError::InvalidConfig` if a value is unusable
    /// - `PatchError::FileAccess` if it exists but cannot be read
    pub fn load(project_root: &Path) -> Result<Self, PatchError> {
        let path = Self::path(project_root);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(PatchError::ProjectNotInitialized {
                    root: project_root.to_path_buf(),
                    file: PROJECT_CONFIG_FILE,
                });
            }
            Err(e) => return Err(PatchError::file_access(path, e)),
        };

        let config: Self = toml::from_str(&content).map_err(|e| PatchError::MalformedConfig {
            path: path.clone(),
            reason: e.message().to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config into `project_root`, replacing any existing one.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid or cannot be written.
    pub fn save(&self, project_root: &Path) -> Result<()> {
        self.validate()?;
        let path = Self::path(project_root);
        let content = toml::to_string_pretty(self).context("Failed to serialize project config")?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Check the values the engine relies on.
    ///
    /// # Errors
    ///
    /// Returns `PatchError::InvalidConfig` naming the first bad value.
    pub fn validate(&self) -> Result<(), PatchError> {
        if self.project_id.trim().is_empty() {
            return Err(PatchError::InvalidConfig("project_id is empty".into()));
        }
        if self.target_relative().is_none() {
            return Err(PatchError::InvalidConfig(format!(
                "target_directory '{}' must be a relative path inside the project",
                self.target_directory
            )));
        }
        if self.max_upload_size_mb == Some(0) {
            return Err(PatchError::InvalidConfig(
                "max_upload_size_mb must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Normalized posix form of the target directory (`""` for the root)
    #[must_use]
    pub fn target_relative(&self) -> Option<String> {
        let target = Path::new(&self.target_directory);
        if target.is_absolute() {
            return None;
        }
        to_posix(&normalize_lexically(target))
    }

    /// Target directory as a path relative to the project root
    #[must_use]
    pub fn target_path(&self) -> PathBuf {
        match self.target_relative() {
            Some(rel) if !rel.is_empty() => PathBuf::from(rel),
            _ => PathBuf::from("."),
        }
    }

    /// Upload limit in bytes, if configured
    #[must_use]
    pub fn max_upload_bytes(&self) -> Option<u64> {
        self.max_upload_size_mb.map(|mb| mb.saturating_mul(1024 * 1024))
    }
}
