use crate::ProjectContext;
use crate::remote::RemoteService;
use crate::sync::{SyncReport, Synchronizer};
use crate::utils::{format_size, plural};
use anyhow::Result;

/// Upload files changed since the last sync
///
/// # Errors
///
/// Returns an error if the project is not linked, not logged in, or the
/// sync fails.
pub fn execute(ctx: &ProjectContext) -> Result<()> {
    // Config problems must surface before any credentials or network use.
    ctx.project_config()?;
    let remote = ctx.remote()?;
    execute_with(ctx, &remote).map(|_| ())
}

/// Sync using `remote` and report the outcome
///
/// # Errors
///
/// See [`execute`].
pub fn execute_with(ctx: &ProjectContext, remote: &dyn RemoteService) -> Result<SyncReport> {
    let project = ctx.project_config()?;
    let builder = ctx.manifest_builder();

    let report = Synchronizer::new(&builder, remote, &project).sync_if_needed()?;
    match &report {
        SyncReport::UpToDate { files_checked } => ctx.output.info(&format!(
            "Remote copy is up to date ({} checked)",
            plural(*files_checked, "file")
        )),
        SyncReport::Patched {
            files,
            archive_bytes,
        } => {
            for file in files {
                ctx.output.verbose(&format!("  {file}"));
            }
            ctx.output.success(&format!(
                "Synced {} ({})",
                plural(files.len(), "changed file"),
                format_size(*archive_bytes)
            ));
        }
    }
    Ok(report)
}
