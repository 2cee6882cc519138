use crate::ProjectContext;
use crate::config::project::ProjectConfig;
use crate::error::PatchError;
use crate::remote::RemoteService;
use crate::sync::{SyncReport, Synchronizer};
use crate::utils::archive::build_archive;
use crate::utils::{format_size, plural};
use anyhow::{Context, Result};
use colored::Colorize;

/// Options for linking a directory to a remote project
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitOptions {
    /// Project name; defaults to the project root's directory name
    pub name: Option<String>,
    /// Directory to analyze, relative to the project root
    pub target: String,
    /// Existing remote project to link instead of creating one
    pub project_id: Option<String>,
    /// Upload limit in megabytes
    pub max_upload_mb: Option<u64>,
    /// Replace an existing link
    pub force: bool,
}

/// Link the project root to a remote project
///
/// # Errors
///
/// Returns an error if:
/// - Not logged in
/// - The project is already linked and `force` is not set
/// - The target directory is invalid or unreadable
/// - The service rejects the project or the upload
pub fn execute(ctx: &ProjectContext, options: &InitOptions) -> Result<()> {
    let remote = ctx.remote()?;
    execute_with(ctx, &remote, options)
}

/// Link the project root using `remote`
///
/// A new project gets a full snapshot upload. Linking an existing project
/// runs a sync instead, so only files the remote lacks are sent.
///
/// # Errors
///
/// See [`execute`].
pub fn execute_with(ctx: &ProjectContext, remote: &dyn RemoteService, options: &InitOptions) -> Result<()> {
    let root = &ctx.project_root;

    if ProjectConfig::exists(root) && !options.force {
        anyhow::bail!(
            "Project already initialized at {} (use --force to relink)",
            root.display()
        );
    }

    let mut config = ProjectConfig::new(
        options.project_id.clone().unwrap_or_else(|| "pending".to_string()),
        options.target.clone(),
    );
    config.max_upload_size_mb = options.max_upload_mb;
    config.validate()?;

    let target = root.join(config.target_path());
    if !target.is_dir() {
        anyhow::bail!("Target directory does not exist: {}", target.display());
    }

    let builder = ctx.manifest_builder();

    if options.project_id.is_some() {
        // The link is only written once the remote project has answered.
        let report = Synchronizer::new(&builder, remote, &config).sync_if_needed()?;
        config.save(root)?;
        ctx.output
            .action("Linked", &format!("project {}", config.project_id.bold()));

        match report {
            SyncReport::UpToDate { files_checked } => ctx.output.success(&format!(
                "Remote copy is up to date ({} checked)",
                plural(files_checked, "file")
            )),
            SyncReport::Patched { files, archive_bytes } => ctx.output.success(&format!(
                "Uploaded {} ({})",
                plural(files.len(), "changed file"),
                format_size(archive_bytes)
            )),
        }
        return Ok(());
    }

    let build = builder.build(&config.target_path())?;
    ctx.output
        .verbose(&format!("Archiving {}", plural(build.included_files.len(), "file")));
    let archive = build_archive(root, &build.included_files)?;

    if let Some(limit) = config.max_upload_bytes()
        && archive.len() > limit
    {
        return Err(PatchError::UploadTooLarge {
            size: format_size(archive.len()),
            limit_mb: config.max_upload_size_mb.unwrap_or_default(),
        }
        .into());
    }

    let name = match &options.name {
        Some(name) => name.clone(),
        None => root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .context("Cannot derive a project name from the root directory; pass --name")?,
    };

    config.project_id = remote.create_project(&name).map_err(PatchError::from)?;
    remote
        .upload_project(&config.project_id, &archive, &build.manifest)
        .map_err(PatchError::from)?;
    config.save(root)?;

    ctx.output.success(&format!(
        "Created project {} ({}, {})",
        config.project_id.bold(),
        plural(build.included_files.len(), "file"),
        format_size(archive.len())
    ));
    Ok(())
}
