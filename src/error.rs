//! Typed errors raised by the synchronization engine.
//!
//! Command code works with `anyhow::Result`; these values travel inside
//! `anyhow::Error` and can be recovered with `downcast_ref` when a caller
//! needs to branch on the kind of failure.

use crate::remote::RemoteError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while resolving, hashing, archiving or syncing a project.
#[derive(Debug, Error)]
pub enum PatchError {
    /// No project config exists in the project root.
    #[error("Project not initialized: no {file} found in {root}. Did you run 'patchwise init'?")]
    ProjectNotInitialized {
        /// Project root that was searched.
        root: PathBuf,
        /// Name of the expected config file.
        file: &'static str,
    },

    /// The project config exists but cannot be parsed.
    #[error("Malformed project config {path}: {reason}")]
    MalformedConfig {
        /// Path of the config file.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// The project config parsed but holds values the engine cannot use.
    #[error("Invalid project config: {0}")]
    InvalidConfig(String),

    /// A resolved file lies outside the configured target directory.
    #[error(
        "Scope violation: '{file}' is outside the configured target directory '{target_directory}'"
    )]
    ScopeViolation {
        /// Offending file, relative to the project root.
        file: String,
        /// Target directory from the project config.
        target_directory: String,
    },

    /// A file or directory could not be read while building a manifest or archive.
    #[error("Cannot read {path}: {source}")]
    FileAccess {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// `--changed` was requested outside a git work tree.
    #[error("Not a git repository: {0}")]
    NotAGitRepository(PathBuf),

    /// The patch archive exceeds the configured upload limit.
    #[error("Upload of {size} exceeds the project limit of {limit_mb} MB")]
    UploadTooLarge {
        /// Human-readable archive size.
        size: String,
        /// Configured limit.
        limit_mb: u64,
    },

    /// The remote service rejected or failed a request.
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl PatchError {
    /// Wraps an I/O error with the path it happened on.
    pub fn file_access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileAccess {
            path: path.into(),
            source,
        }
    }
}
