use crate::ProjectContext;
use crate::commands::mask_secret;
use anyhow::Result;
use colored::Colorize;

/// Execute config command to get/set configuration values
///
/// # Errors
///
/// Returns an error if:
/// - Failed to set or unset configuration value
/// - Failed to save configuration
pub fn execute(
    ctx: &mut ProjectContext,
    key: Option<&str>,
    value: Option<String>,
    unset: bool,
    list: bool,
) -> Result<()> {
    // If --list flag is set or no key is provided, show all configuration
    let Some(key) = key.filter(|_| !list) else {
        show_all_config(ctx);
        return Ok(());
    };

    if unset {
        ctx.config.unset(key)?;
        ctx.save_config()?;
        ctx.output.success(&format!("Unset {key}"));
    } else if let Some(val) = value {
        ctx.config.set(key, val)?;
        ctx.save_config()?;
        let shown = display_value(key, &ctx.config.get(key).unwrap_or_default());
        ctx.output.success(&format!("Set {key} = {shown}"));
    } else if let Some(val) = ctx.config.get(key) {
        println!("{val}");
    } else {
        ctx.output
            .warning(&format!("Configuration key '{key}' is not set"));
    }

    Ok(())
}

/// Value as shown to the user; secrets are masked
fn display_value(key: &str, value: &str) -> String {
    if key == "auth.api_key" {
        mask_secret(value)
    } else {
        value.to_string()
    }
}

/// Show all configuration values
fn show_all_config(ctx: &ProjectContext) {
    println!("{} {}", "#".dimmed(), ctx.config_path.display().to_string().dimmed());

    println!("{}", "[auth]".bold());
    match &ctx.config.auth.api_key {
        Some(key) => println!("  api_key = {}", mask_secret(key)),
        None => println!("  api_key = {}", "(not set)".dimmed()),
    }

    println!("\n{}", "[remote]".bold());
    println!("  api_url = {}", ctx.config.remote.api_url);
    println!("  timeout_secs = {}", ctx.config.remote.timeout_secs);

    println!("\n{}", "[scope]".bold());
    println!("  max_files = {}", ctx.config.scope.max_files);
    println!("  follow_symlinks = {}", ctx.config.scope.follow_symlinks);
}
