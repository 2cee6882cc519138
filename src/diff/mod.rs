//! Manifest comparison.
//!
//! The diff is additive: it lists local files whose content the remote copy
//! lacks or holds in a different version. Paths only the remote knows about
//! are never uploaded or deleted; [`remote_only`] reports them for display.

use crate::tracking::manifest::Manifest;

/// Changed or added files and their manifest entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileDiff {
    /// Paths to upload, in path order
    pub files_to_update: Vec<String>,
    /// Local manifest restricted to `files_to_update`
    pub manifest_for_update: Manifest,
}

impl FileDiff {
    /// Whether the remote copy is already current
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files_to_update.is_empty()
    }

    /// Number of files to upload
    #[must_use]
    pub fn len(&self) -> usize {
        self.files_to_update.len()
    }
}

/// Compare a fresh local manifest against the remote one.
///
/// A local entry is part of the diff when the remote has no entry for its
/// path or records a different hash.
#[must_use]
pub fn diff_manifests(local: &Manifest, remote: &Manifest) -> FileDiff {
    let mut diff = FileDiff::default();

    for (path, hash) in local.iter() {
        if remote.get(path) != Some(hash) {
            diff.files_to_update.push(path.to_string());
            diff.manifest_for_update.insert(path, hash);
        }
    }

    diff
}

/// Paths present in the remote manifest but absent locally
#[must_use]
pub fn remote_only(local: &Manifest, remote: &Manifest) -> Vec<String> {
    remote
        .paths()
        .filter(|path| !local.contains(path))
        .map(str::to_string)
        .collect()
}
