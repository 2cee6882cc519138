//! Bringing the remote copy of a project up to date.
//!
//! A sync fetches the remote manifest while the local one is built, diffs
//! the two and uploads only the changed files. Nothing is archived or sent
//! when the diff is empty.

use crate::config::project::ProjectConfig;
use crate::diff::{FileDiff, diff_manifests, remote_only};
use crate::error::PatchError;
use crate::remote::RemoteService;
use crate::tracking::manifest::{Manifest, ManifestBuilder};
use crate::utils::archive::build_archive;
use crate::utils::format_size;
use anyhow::Result;
use tracing::{Level, debug, info, span};

/// What a sync did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncReport {
    /// Remote already matched; nothing was uploaded
    UpToDate {
        /// Local files compared
        files_checked: usize,
    },
    /// A patch was uploaded
    Patched {
        /// Uploaded paths
        files: Vec<String>,
        /// Size of the uploaded archive
        archive_bytes: u64,
    },
}

/// Result of comparing local and remote state without uploading
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
    /// Files a sync would upload
    pub diff: FileDiff,
    /// Paths only the remote knows about
    pub remote_only: Vec<String>,
    /// Local files compared
    pub files_checked: usize,
}

/// Drives the fetch, diff and upload steps for one linked project
pub struct Synchronizer<'a> {
    builder: &'a ManifestBuilder,
    remote: &'a dyn RemoteService,
    project: &'a ProjectConfig,
}

impl<'a> Synchronizer<'a> {
    /// Synchronizer for `project`, building local manifests with `builder`
    #[must_use]
    pub fn new(
        builder: &'a ManifestBuilder,
        remote: &'a dyn RemoteService,
        project: &'a ProjectConfig,
    ) -> Self {
        Self {
            builder,
            remote,
            project,
        }
    }

    /// Compare local and remote state without side effects on the remote.
    ///
    /// # Errors
    ///
    /// Returns the local build error if the target directory cannot be
    /// scanned, otherwise the remote error if the manifest fetch failed.
    pub fn plan(&self) -> Result<SyncPlan> {
        let span = span!(Level::DEBUG, "sync_plan", project_id = %self.project.project_id);
        let _guard = span.enter();

        let (local, remote) = self.fetch_and_build()?;
        let diff = diff_manifests(&local, &remote);
        debug!(changed = diff.len(), local = local.len(), remote = remote.len(), "Computed diff");

        Ok(SyncPlan {
            remote_only: remote_only(&local, &remote),
            files_checked: local.len(),
            diff,
        })
    }

    /// Upload whatever the remote copy is missing.
    ///
    /// # Errors
    ///
    /// - `PatchError::FileAccess` if a local file cannot be read
    /// - `PatchError::UploadTooLarge` if the patch exceeds the project limit
    /// - `PatchError::Remote` if fetching the manifest or uploading fails
    pub fn sync_if_needed(&self) -> Result<SyncReport> {
        let span = span!(Level::INFO, "sync", project_id = %self.project.project_id);
        let _guard = span.enter();

        let (local, remote) = self.fetch_and_build()?;
        let diff = diff_manifests(&local, &remote);

        if diff.is_empty() {
            info!(files = local.len(), "Remote copy is up to date");
            return Ok(SyncReport::UpToDate {
                files_checked: local.len(),
            });
        }

        let archive = build_archive(self.builder.project_root(), &diff.files_to_update)?;
        if let Some(limit) = self.project.max_upload_bytes()
            && archive.len() > limit
        {
            return Err(PatchError::UploadTooLarge {
                size: format_size(archive.len()),
                limit_mb: self.project.max_upload_size_mb.unwrap_or_default(),
            }
            .into());
        }

        self.remote
            .upload_patch(&self.project.project_id, &archive, &diff.manifest_for_update)
            .map_err(PatchError::from)?;

        info!(files = diff.len(), bytes = archive.len(), "Patch uploaded");
        Ok(SyncReport::Patched {
            archive_bytes: archive.len(),
            files: diff.files_to_update,
        })
    }

    /// Fetch the remote manifest and build the local one concurrently
    fn fetch_and_build(&self) -> Result<(Manifest, Manifest)> {
        let target = self.project.target_path();
        let (remote, local) = rayon::join(
            || self.remote.fetch_manifest(&self.project.project_id),
            || self.builder.build(&target),
        );

        let local = local?.manifest;
        let remote = remote.map_err(PatchError::from)?;
        Ok((local, remote))
    }
}
