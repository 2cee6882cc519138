use crate::ProjectContext;
use crate::error::PatchError;
use crate::remote::{Analysis, RemoteService};
use crate::tracking::scope::{
    Confirm, DeclineConfirm, ScopeOutcome, ScopeRequest, ScopeResolver, StdinConfirm,
};
use crate::utils::plural;
use anyhow::Result;
use colored::Colorize;

/// What an analyze run ended with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyzeOutcome {
    /// An analysis was started
    Started(Analysis),
    /// The scope resolved to no files
    NothingToAnalyze,
    /// The user declined the large-scope confirmation
    Cancelled,
}

/// Resolve the scope, sync, and start an analysis
///
/// A non-interactive context never prompts: a scope above the file limit
/// is cancelled unless the request sets `assume_yes`.
///
/// # Errors
///
/// Returns an error if the project is not linked, not logged in, the scope
/// is invalid, or a service call fails.
pub fn execute(ctx: &ProjectContext, request: &ScopeRequest) -> Result<()> {
    ctx.project_config()?;
    let remote = ctx.remote()?;
    execute_with(ctx, &remote, request, confirm_for(ctx)).map(|_| ())
}

/// Confirmation source matching the context's interactivity
#[must_use]
pub fn confirm_for(ctx: &ProjectContext) -> &'static dyn Confirm {
    if ctx.non_interactive {
        &DeclineConfirm
    } else {
        &StdinConfirm
    }
}

/// Analyze using `remote`, asking `confirm` for large scopes
///
/// The scope is resolved first so that a cancelled or empty run never
/// touches the network. The remote copy is synced before the analysis
/// starts.
///
/// # Errors
///
/// See [`execute`].
pub fn execute_with(
    ctx: &ProjectContext,
    remote: &dyn RemoteService,
    request: &ScopeRequest,
    confirm: &dyn Confirm,
) -> Result<AnalyzeOutcome> {
    let project = ctx.project_config()?;
    let builder = ctx.manifest_builder();

    let outcome = ScopeResolver::new(&builder, confirm)
        .max_files(ctx.config.scope.max_files)
        .determine_scope(request, &project)?;

    let scope = match outcome {
        ScopeOutcome::Resolved(scope) => scope,
        ScopeOutcome::Cancelled => {
            ctx.output.info("Cancelled");
            return Ok(AnalyzeOutcome::Cancelled);
        }
    };

    if scope.is_empty() {
        ctx.output.info("Nothing to analyze");
        return Ok(AnalyzeOutcome::NothingToAnalyze);
    }

    ctx.output.verbose(&format!(
        "Scope: {} ({})",
        scope.scope,
        plural(scope.target_file_paths.len(), "file")
    ));

    super::sync::execute_with(ctx, remote)?;

    let analysis = remote
        .start_analysis(&project.project_id, &scope.target_file_paths)
        .map_err(PatchError::from)?;

    ctx.output.success(&format!(
        "Analysis {} started for {}",
        analysis.analysis_id.bold(),
        plural(scope.target_file_paths.len(), "file")
    ));
    println!("{}", analysis.results_url);
    Ok(AnalyzeOutcome::Started(analysis))
}
