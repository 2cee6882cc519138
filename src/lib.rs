#![warn(missing_docs)]
// Allow pedantic strict lints that create false positives in this codebase
#![allow(clippy::arithmetic_side_effects)] // Simple counters and size calculations cannot overflow
#![allow(clippy::float_arithmetic)] // Required for file size formatting
#![allow(clippy::indexing_slicing)] // Bounds checked by logic

//! # Patchwise - Incremental Project Sync for Code Analysis
//!
//! Patchwise links a local source tree to a project on a remote analysis
//! service, keeps the remote copy current by uploading only the files whose
//! content changed, and starts analyses over a chosen set of files.
//!
//! ## Features
//!
//! - **Content-Addressed Manifests**: Every file is identified by the SHA-1 of its bytes
//! - **Minimal Patches**: Only changed or added files are archived and uploaded
//! - **Parallel Hashing**: Uses Rayon for multi-core manifest builds
//! - **Gitignore Aware**: Project `.gitignore` rules apply to every scan
//! - **Scoped Analyses**: Explicit paths, git changes, or the whole target directory
//!
//! ## Architecture
//!
//! The codebase is organized into several key modules:
//!
//! - [`scanner`]: Path classification, ignore rules, directory walks, git change lists
//! - [`tracking`]: Manifest building and scope resolution
//! - [`diff`]: Manifest comparison
//! - [`sync`]: Fetch, diff and patch upload for a linked project
//! - [`remote`]: The analysis service boundary and its HTTP client
//! - [`config`]: User configuration and the per-project link
//! - [`commands`]: Command implementations
//! - [`output`]: Console output with verbosity control
//! - [`utils`]: Hashing, archiving and path helpers
//!
//! ## Example Usage
//!
//! ```no_run
//! use patchwise::ProjectContext;
//! use patchwise::config::project::ProjectConfig;
//! use patchwise::output::Output;
//! use patchwise::sync::{SyncReport, Synchronizer};
//!
//! # fn main() -> anyhow::Result<()> {
//! let ctx = ProjectContext::new(Output::default(), None)?;
//! let project = ProjectConfig::load(&ctx.project_root)?;
//! let remote = ctx.remote()?;
//! let builder = ctx.manifest_builder();
//!
//! match Synchronizer::new(&builder, &remote, &project).sync_if_needed()? {
//!     SyncReport::UpToDate { .. } => println!("up to date"),
//!     SyncReport::Patched { files, .. } => println!("uploaded {} files", files.len()),
//! }
//! # Ok(())
//! # }
//! ```

/// Command-line interface definitions (argument parsing structures).
pub mod cli;

/// Commands module containing all CLI command implementations.
pub mod commands;

/// User configuration and the per-project config file.
pub mod config;

/// Manifest comparison.
pub mod diff;

/// Typed engine errors.
pub mod error;

/// Console output with verbosity control.
pub mod output;

/// Remote analysis service boundary.
pub mod remote;

/// Path classification, ignore rules and directory enumeration.
pub mod scanner;

/// Synchronization of the remote project copy.
pub mod sync;

/// Manifests and scope resolution.
pub mod tracking;

/// Utility functions and helpers.
pub mod utils;

use anyhow::{Context, Result};
use config::project::ProjectConfig;
use error::PatchError;
use output::Output;
use remote::HttpRemote;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracking::manifest::ManifestBuilder;

/// Current version of the patchwise binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the per-project config file in the project root.
pub const PROJECT_CONFIG_FILE: &str = ".patchwise.toml";

/// Environment variable holding an API key that overrides the stored one.
pub const API_KEY_ENV: &str = "PATCHWISE_API_KEY";

/// Environment variable overriding the API root URL.
pub const API_URL_ENV: &str = "PATCHWISE_API_URL";

/// API root used when none is configured.
pub const DEFAULT_API_URL: &str = "https://api.patchwise.dev/v1";

/// Central context for all commands.
///
/// Holds the project root, the loaded user configuration and the console
/// output settings. Nothing in here is global; tests build their own
/// context with [`ProjectContext::new_explicit`].
#[derive(Debug, Clone)]
pub struct ProjectContext {
    /// Directory holding (or about to hold) `.patchwise.toml`.
    pub project_root: PathBuf,

    /// Path to the user configuration file.
    pub config_path: PathBuf,

    /// Loaded user configuration.
    pub config: config::Config,

    /// Console output for this invocation.
    pub output: Output,

    /// API key given on the command line or in the environment.
    pub api_key_override: Option<String>,

    /// API URL given on the command line or in the environment.
    pub api_url_override: Option<String>,

    /// Whether to run in non-interactive mode (no prompts).
    pub non_interactive: bool,
}

impl ProjectContext {
    /// Creates a context for the project containing the current directory.
    ///
    /// The project root is the nearest ancestor holding `.patchwise.toml`,
    /// or the current directory when there is none.
    ///
    /// # Errors
    /// Returns an error if the current directory is unavailable or the user
    /// configuration cannot be read or created.
    pub fn new(output: Output, api_key_override: Option<String>) -> Result<Self> {
        let cwd = std::env::current_dir().context("Could not determine current directory")?;
        let project_root = find_project_root(&cwd).unwrap_or(cwd);
        let config_path = config::Config::default_path()?;

        let mut context = Self::new_explicit(project_root, config_path, output)?;
        context.api_key_override = api_key_override;
        context.non_interactive = false;
        Ok(context)
    }

    /// Creates a context with explicit paths, without prompts.
    /// This avoids the need for environment variable manipulation.
    ///
    /// # Errors
    /// Returns an error if the configuration cannot be loaded or created.
    pub fn new_explicit(project_root: PathBuf, config_path: PathBuf, output: Output) -> Result<Self> {
        let config = config::Config::load(&config_path)?;

        Ok(Self {
            project_root,
            config_path,
            config,
            output,
            api_key_override: None,
            api_url_override: None,
            non_interactive: true,
        })
    }

    /// Load the project config, failing if the project is not linked.
    ///
    /// # Errors
    /// Returns `PatchError::ProjectNotInitialized` or a config error.
    pub fn project_config(&self) -> Result<ProjectConfig, PatchError> {
        ProjectConfig::load(&self.project_root)
    }

    /// API key from the override or the stored config.
    ///
    /// # Errors
    /// Returns an error if neither is set.
    pub fn api_key(&self) -> Result<String> {
        self.api_key_override
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.config.auth.api_key.clone())
            .context("Not logged in. Run 'patchwise login --api-key <KEY>' or set PATCHWISE_API_KEY")
    }

    /// API root from the override or the stored config.
    #[must_use]
    pub fn api_url(&self) -> &str {
        self.api_url_override
            .as_deref()
            .unwrap_or(&self.config.remote.api_url)
    }

    /// HTTP client for the configured service, authenticated with [`Self::api_key`].
    ///
    /// # Errors
    /// Returns an error if no API key is available or the client cannot be built.
    pub fn remote(&self) -> Result<HttpRemote> {
        self.remote_with_key(self.api_key()?)
    }

    /// HTTP client for the configured service using `api_key`.
    ///
    /// # Errors
    /// Returns an error if the client cannot be built.
    pub fn remote_with_key(&self, api_key: String) -> Result<HttpRemote> {
        HttpRemote::new(
            self.api_url(),
            api_key,
            Duration::from_secs(self.config.remote.timeout_secs),
        )
    }

    /// Manifest builder for the project root honoring the scope settings.
    #[must_use]
    pub fn manifest_builder(&self) -> ManifestBuilder {
        ManifestBuilder::new(&self.project_root).follow_symlinks(self.config.scope.follow_symlinks)
    }

    /// Persist the user configuration.
    ///
    /// # Errors
    /// Returns an error if the file cannot be written.
    pub fn save_config(&self) -> Result<()> {
        self.config.save(&self.config_path)
    }
}

/// Nearest directory at or above `start` that holds `.patchwise.toml`.
#[must_use]
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| ProjectConfig::exists(dir))
        .map(Path::to_path_buf)
}
