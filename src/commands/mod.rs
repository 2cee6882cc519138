/// Start an analysis over a resolved scope
pub mod analyze;
/// Read and write user configuration
pub mod config;
/// Print the resolved scope
pub mod files;
/// Link a directory to a remote project
pub mod init;
/// Store or remove the API key
pub mod login;
/// Zip directories to a local file
pub mod pack;
/// Show what a sync would upload
pub mod status;
/// Upload changed files
pub mod sync;

use crate::utils::paths::make_absolute;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Resolve command-line paths against the current directory.
///
/// The project root may be an ancestor of the working directory, so
/// relative arguments are anchored here before they reach the engine.
///
/// # Errors
///
/// Returns an error if the current directory is unavailable.
pub fn absolutize(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    if paths.is_empty() {
        return Ok(Vec::new());
    }
    let cwd = std::env::current_dir().context("Could not determine current directory")?;
    Ok(paths.iter().map(|p| make_absolute(p, &cwd)).collect())
}

/// Shortened form of a secret for display
#[must_use]
pub fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    if secret.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("****{visible}")
    }
}
