use crate::ProjectContext;
use crate::remote::RemoteService;
use crate::sync::{SyncPlan, Synchronizer};
use crate::utils::plural;
use anyhow::Result;
use colored::Colorize;

/// Show what a sync would upload
///
/// # Errors
///
/// Returns an error if the project is not linked, not logged in, or the
/// manifests cannot be built or fetched.
pub fn execute(ctx: &ProjectContext) -> Result<()> {
    let project = ctx.project_config()?;
    let remote = ctx.remote()?;
    let plan = plan_with(ctx, &remote)?;

    println!("Project {} (target {})", project.project_id.bold(), project.target_directory);
    print_plan(&plan);
    Ok(())
}

/// Compare local and remote manifests using `remote`
///
/// # Errors
///
/// See [`execute`].
pub fn plan_with(ctx: &ProjectContext, remote: &dyn RemoteService) -> Result<SyncPlan> {
    let project = ctx.project_config()?;
    let builder = ctx.manifest_builder();
    Synchronizer::new(&builder, remote, &project).plan()
}

fn print_plan(plan: &SyncPlan) {
    if plan.diff.is_empty() {
        println!(
            "Remote copy is up to date ({} checked)",
            plural(plan.files_checked, "file")
        );
    } else {
        println!("Changes to upload ({}):", plural(plan.diff.len(), "file"));
        for path in &plan.diff.files_to_update {
            println!("  {}", path.green());
        }
    }

    if !plan.remote_only.is_empty() {
        println!();
        println!("Only on remote (kept, not deleted):");
        for path in &plan.remote_only {
            println!("  {}", path.dimmed());
        }
    }
}
