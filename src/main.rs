use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::{Generator, generate};
use colored::Colorize;
use patchwise::cli::{Cli, Commands};
use patchwise::commands;
use patchwise::commands::init::InitOptions;
use patchwise::output::Output;
use patchwise::tracking::scope::ScopeRequest;
use patchwise::ProjectContext;
use std::io;
use std::process;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter directive
const LOG_ENV: &str = "PATCHWISE_LOG";

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

/// Install the stderr subscriber; `PATCHWISE_LOG` wins over `--verbose`
fn init_tracing(verbose: bool) {
    let default = if verbose { "patchwise=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let output = Output::from_flags(cli.verbose, cli.quiet);

    if let Commands::Completion { shell } = cli.command {
        print_completions(shell, &mut Cli::command());
        return Ok(());
    }

    let mut ctx = ProjectContext::new(output, cli.api_key)?;
    ctx.api_url_override = cli.api_url;

    match cli.command {
        Commands::Login => commands::login::execute(&mut ctx)?,
        Commands::Logout => commands::login::logout(&mut ctx)?,
        Commands::Init {
            name,
            target,
            project_id,
            max_upload_mb,
            force,
        } => {
            let options = InitOptions {
                name,
                target,
                project_id,
                max_upload_mb,
                force,
            };
            commands::init::execute(&ctx, &options)?;
        }
        Commands::Files { paths, changed } => {
            let request = ScopeRequest {
                paths: commands::absolutize(&paths)?,
                changed,
                assume_yes: true,
            };
            commands::files::execute(&ctx, &request)?;
        }
        Commands::Status => commands::status::execute(&ctx)?,
        Commands::Sync => commands::sync::execute(&ctx)?,
        Commands::Analyze {
            paths,
            changed,
            yes,
        } => {
            let request = ScopeRequest {
                paths: commands::absolutize(&paths)?,
                changed,
                assume_yes: yes,
            };
            commands::analyze::execute(&ctx, &request)?;
        }
        Commands::Pack { dirs, output } => {
            let dirs = commands::absolutize(&dirs)?;
            commands::pack::execute(&ctx, &dirs, &output)?;
        }
        Commands::Config {
            key,
            value,
            unset,
            list,
        } => commands::config::execute(&mut ctx, key.as_deref(), value, unset, list)?,
        Commands::Completion { shell } => print_completions(shell, &mut Cli::command()),
    }

    Ok(())
}

fn print_completions<G: Generator>(g: G, cmd: &mut clap::Command) {
    generate(g, cmd, cmd.get_name().to_string(), &mut io::stdout());
}
