//! Command-line interface definitions for patchwise.
//!
//! This module contains all CLI argument parsing structures using clap's derive macros.
//!
//! Note: Field-level documentation is provided via clap attributes,
//! so we allow missing_docs for this module to avoid redundant documentation.

#![allow(missing_docs)]

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Main CLI structure for patchwise.
#[derive(Parser)]
#[command(
    name = "patchwise",
    version = crate::VERSION,
    about = "Sync a local project to a code analysis service and run analyses",
    long_about = "Keeps a remote copy of a source tree current by uploading only changed files, \
                  then starts analyses over a chosen set of files"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress informational messages
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// API key to use instead of the stored one
    #[arg(long, global = true, env = "PATCHWISE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// API root URL to use instead of the configured one
    #[arg(long, global = true, env = "PATCHWISE_API_URL")]
    pub api_url: Option<String>,
}

/// All available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Verify the key given with --api-key and store it
    Login,

    /// Remove the stored API key
    Logout,

    /// Link this directory to a remote project and upload it
    Init {
        /// Project name (defaults to the directory name)
        #[arg(short, long)]
        name: Option<String>,

        /// Directory to analyze, relative to the project root
        #[arg(short, long, default_value = ".")]
        target: String,

        /// Link an existing remote project instead of creating one
        #[arg(long)]
        project_id: Option<String>,

        /// Upload limit in megabytes
        #[arg(long)]
        max_upload_mb: Option<u64>,

        /// Replace an existing link
        #[arg(short, long)]
        force: bool,
    },

    /// List the files a scope resolves to
    Files {
        /// Files or directories (default: the target directory)
        paths: Vec<PathBuf>,

        /// Only files changed in the git work tree
        #[arg(short, long)]
        changed: bool,
    },

    /// Show what a sync would upload
    Status,

    /// Upload files changed since the last sync
    Sync,

    /// Sync, then start an analysis over the selected files
    Analyze {
        /// Files or directories (default: the target directory)
        paths: Vec<PathBuf>,

        /// Only files changed in the git work tree
        #[arg(short, long)]
        changed: bool,

        /// Skip the confirmation for large scopes
        #[arg(short, long)]
        yes: bool,
    },

    /// Write a zip archive of one or more directories
    Pack {
        /// Directories or files to include (default: the target directory)
        dirs: Vec<PathBuf>,

        /// Output file
        #[arg(short, long, default_value = "project.zip")]
        output: PathBuf,
    },

    /// Get and set user options
    Config {
        /// Configuration key
        key: Option<String>,

        /// Configuration value to set
        value: Option<String>,

        /// Unset the configuration key
        #[arg(long)]
        unset: bool,

        /// List all configuration values
        #[arg(short, long)]
        list: bool,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_analyze() {
        let cli = Cli::try_parse_from(["patchwise", "-q", "analyze", "src", "lib", "--changed", "-y"]).unwrap();
        assert!(cli.quiet);
        match cli.command {
            Commands::Analyze { paths, changed, yes } => {
                assert_eq!(paths, vec![PathBuf::from("src"), PathBuf::from("lib")]);
                assert!(changed);
                assert!(yes);
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_login_takes_global_key() {
        let cli = Cli::try_parse_from(["patchwise", "login", "--api-key", "k-1"]).unwrap();
        assert!(matches!(cli.command, Commands::Login));
        assert_eq!(cli.api_key.as_deref(), Some("k-1"));
    }

    #[test]
    fn test_init_defaults() {
        let cli = Cli::try_parse_from(["patchwise", "init"]).unwrap();
        match cli.command {
            Commands::Init { target, force, project_id, .. } => {
                assert_eq!(target, ".");
                assert!(!force);
                assert!(project_id.is_none());
            }
            _ => panic!("expected init"),
        }
    }
}
