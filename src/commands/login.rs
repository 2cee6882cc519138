use crate::ProjectContext;
use crate::remote::{RemoteError, RemoteService};
use anyhow::{Context, Result};

/// Verify the API key given on the command line and store it
///
/// # Errors
///
/// Returns an error if:
/// - No key was given
/// - The service rejects the key
/// - Failed to save configuration
pub fn execute(ctx: &mut ProjectContext) -> Result<()> {
    let key = ctx
        .api_key_override
        .clone()
        .filter(|k| !k.trim().is_empty())
        .context("No API key given. Usage: patchwise login --api-key <KEY>")?;
    let remote = ctx.remote_with_key(key.clone())?;
    execute_with(ctx, &remote, &key)
}

/// Verify `key` against `remote` and store it
///
/// # Errors
///
/// Returns an error if the key is rejected or the config cannot be saved.
pub fn execute_with(ctx: &mut ProjectContext, remote: &dyn RemoteService, key: &str) -> Result<()> {
    let account = remote.whoami().map_err(|e| match e {
        RemoteError::Authentication(_) => anyhow::anyhow!("The API key was rejected by the service"),
        other => other.into(),
    })?;

    ctx.config.set("auth.api_key", key.to_string())?;
    ctx.save_config()?;

    let who = account
        .name
        .as_deref()
        .map_or_else(|| account.email.clone(), |name| format!("{name} <{}>", account.email));
    ctx.output.success(&format!("Logged in as {who}"));
    Ok(())
}

/// Remove the stored API key
///
/// # Errors
///
/// Returns an error if the configuration cannot be saved.
pub fn logout(ctx: &mut ProjectContext) -> Result<()> {
    if ctx.config.auth.api_key.is_none() {
        ctx.output.info("Not logged in");
        return Ok(());
    }

    ctx.config.unset("auth.api_key")?;
    ctx.save_config()?;
    ctx.output.success("Logged out");
    Ok(())
}
