//! Directory enumeration shared by the manifest and archive builders.
//!
//! Noise entries (dependency trees, VCS metadata, build output, logs,
//! environment files) are pruned while walking so large trees such as
//! `node_modules` are never descended into. This pruning is an optimization;
//! the classifier still decides what is includable.

use crate::PROJECT_CONFIG_FILE;
use crate::error::PatchError;
use crate::scanner::classify::{is_allowed_dotfile, is_includable};
use crate::scanner::ignore_rules::IgnoreRules;
use crate::utils::paths::posix_relative_to;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Entry names pruned during enumeration.
const NOISE_NAMES: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    "out",
    "target",
    "coverage",
    ".ds_store",
    "thumbs.db",
    PROJECT_CONFIG_FILE,
];

/// Whether an entry name is pruned during enumeration.
#[must_use]
pub fn is_noise(name: &str) -> bool {
    let name = name.to_lowercase();
    if is_allowed_dotfile(&name) {
        return false;
    }
    NOISE_NAMES.contains(&name.as_str()) || name.starts_with(".env") || name.ends_with(".log")
}

/// Whether any segment of a root-relative posix path is pruned during
/// enumeration. Explicit files and git change lists are held to the same
/// rule as directory walks.
#[must_use]
pub fn has_noise_segment(relative_path: &str) -> bool {
    relative_path.split('/').any(is_noise)
}

/// Walks project subtrees and yields includable files relative to the project root
#[derive(Debug, Clone)]
pub struct ProjectWalker {
    /// Root every yielded path is made relative to
    project_root: PathBuf,
    /// Whether to follow symbolic links
    follow_symlinks: bool,
}

impl ProjectWalker {
    /// Create a walker anchored at `project_root`
    #[must_use]
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            follow_symlinks: false,
        }
    }

    /// Set whether symbolic links are followed
    #[must_use]
    pub const fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// The root yielded paths are relative to
    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Enumerate includable files under `start` (a file or a directory,
    /// relative to the project root or absolute).
    ///
    /// Paths are returned relative to the project root in posix form, sorted.
    /// When `rules` is given, ignored paths are dropped as well.
    ///
    /// # Errors
    ///
    /// Returns `PatchError::FileAccess` if `start` does not exist or an entry
    /// cannot be read. Entries that disappear mid-walk are logged and skipped.
    pub fn collect(&self, start: &Path, rules: Option<&IgnoreRules>) -> Result<Vec<String>, PatchError> {
        let start = if start.is_absolute() {
            start.to_path_buf()
        } else {
            self.project_root.join(start)
        };

        let metadata = std::fs::metadata(&start).map_err(|e| PatchError::file_access(&start, e))?;

        let mut files = Vec::new();

        if metadata.is_file() {
            if let Some(rel) = self.accept(&start, rules) {
                files.push(rel);
            }
            return Ok(files);
        }

        for entry in WalkDir::new(&start)
            .follow_links(self.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_noise(&e.file_name().to_string_lossy()))
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if is_vanished(&err) => {
                    warn!(error = %err, "Entry disappeared during scan");
                    continue;
                }
                Err(err) => return Err(walk_error(err, &start)),
            };

            if !entry.file_type().is_file() {
                continue;
            }

            if let Some(rel) = self.accept(entry.path(), rules) {
                files.push(rel);
            }
        }

        files.sort();
        debug!(start = %start.display(), count = files.len(), "Enumerated files");
        Ok(files)
    }

    /// Relative posix path of `path` if it passes classification and rules
    fn accept(&self, path: &Path, rules: Option<&IgnoreRules>) -> Option<String> {
        let Some(rel) = posix_relative_to(path, &self.project_root) else {
            debug!(path = %path.display(), "Skipping path outside project root");
            return None;
        };

        if rel.is_empty() || has_noise_segment(&rel) || !is_includable(Path::new(&rel)) {
            return None;
        }

        if rules.is_some_and(|r| r.ignores(&rel)) {
            return None;
        }

        Some(rel)
    }
}

/// Whether a walk error means the entry was removed after being listed
fn is_vanished(err: &walkdir::Error) -> bool {
    err.depth() > 0
        && err
            .io_error()
            .is_some_and(|e| e.kind() == io::ErrorKind::NotFound)
}

/// Convert a walk error into a file access error naming the failing path
fn walk_error(err: walkdir::Error, start: &Path) -> PatchError {
    let path = err.path().map_or_else(|| start.to_path_buf(), Path::to_path_buf);
    let message = err.to_string();
    let source = err
        .into_io_error()
        .unwrap_or_else(|| io::Error::other(message));
    PatchError::file_access(path, source)
}
