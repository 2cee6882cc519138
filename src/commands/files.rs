use crate::ProjectContext;
use crate::tracking::scope::{ScopeOutcome, ScopeRequest, ScopeResolver, StdinConfirm};
use crate::utils::plural;
use anyhow::Result;

/// Print the files a scope resolves to, one per line on stdout
///
/// Nothing is sent to the service.
///
/// # Errors
///
/// Returns an error if the project is not linked or the scope is invalid.
pub fn execute(ctx: &ProjectContext, request: &ScopeRequest) -> Result<()> {
    let files = resolve(ctx, request)?;

    if files.is_empty() {
        ctx.output.info("No files in scope");
        return Ok(());
    }

    for file in &files {
        println!("{file}");
    }
    ctx.output.verbose(&plural(files.len(), "file"));
    Ok(())
}

/// Resolve `request` without prompting
///
/// # Errors
///
/// See [`execute`].
pub fn resolve(ctx: &ProjectContext, request: &ScopeRequest) -> Result<Vec<String>> {
    let project = ctx.project_config()?;
    let builder = ctx.manifest_builder();
    let request = ScopeRequest {
        assume_yes: true,
        ..request.clone()
    };

    match ScopeResolver::new(&builder, &StdinConfirm).determine_scope(&request, &project)? {
        ScopeOutcome::Resolved(result) => Ok(result.target_file_paths),
        ScopeOutcome::Cancelled => Ok(Vec::new()),
    }
}
