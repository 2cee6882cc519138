//! User-facing console output.
//!
//! Messages go to stderr so that data printed by commands (file lists,
//! config values) stays clean on stdout. Verbosity lives in an [`Output`]
//! value built once from the command line and passed to commands.

use colored::Colorize;

/// Verbosity level for output messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Suppress informational messages, show only warnings and errors.
    Quiet,
    /// Default verbosity level, show all standard messages.
    #[default]
    Normal,
    /// Show verbose debug messages in addition to standard output.
    Verbose,
}

/// Console writer carrying its own verbosity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Output {
    verbosity: Verbosity,
}

impl Output {
    /// Create an output at `verbosity`
    #[must_use]
    pub const fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    /// Verbosity from `--verbose` / `--quiet`; quiet wins when both are set
    #[must_use]
    pub const fn from_flags(verbose: bool, quiet: bool) -> Self {
        let verbosity = if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        };
        Self::new(verbosity)
    }

    /// Current verbosity
    #[must_use]
    pub const fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    /// Whether messages at `level` are printed
    #[must_use]
    pub fn enabled(&self, level: Verbosity) -> bool {
        self.verbosity >= level
    }

    /// Prints a success message with a green check (respects quiet mode).
    pub fn success(&self, message: &str) {
        if self.enabled(Verbosity::Normal) {
            eprintln!("{} {}", "✓".green().bold(), message);
        }
    }

    /// Prints an informational message in dimmed color (respects quiet mode).
    pub fn info(&self, message: &str) {
        if self.enabled(Verbosity::Normal) {
            eprintln!("{} {}", "ℹ".blue().bold(), message.dimmed());
        }
    }

    /// Prints a warning message in bold yellow (always shown).
    pub fn warning(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow().bold(), message.yellow().bold());
    }

    /// Prints an error message in bold red (always shown).
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red().bold(), message.red().bold());
    }

    /// Prints a verbose debug message (only in verbose mode).
    pub fn verbose(&self, message: &str) {
        if self.enabled(Verbosity::Verbose) {
            eprintln!("{}", message.dimmed());
        }
    }

    /// Prints a git-style action message with dimmed verb and normal message.
    pub fn action(&self, verb: &str, message: &str) {
        if self.enabled(Verbosity::Normal) {
            eprintln!("{} {}", verb.dimmed().bold(), message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flags() {
        assert_eq!(Output::from_flags(false, false).verbosity(), Verbosity::Normal);
        assert_eq!(Output::from_flags(true, false).verbosity(), Verbosity::Verbose);
        assert_eq!(Output::from_flags(false, true).verbosity(), Verbosity::Quiet);
        assert_eq!(Output::from_flags(true, true).verbosity(), Verbosity::Quiet);
    }

    #[test]
    fn test_levels_are_independent_values() {
        let quiet = Output::new(Verbosity::Quiet);
        let verbose = Output::new(Verbosity::Verbose);

        assert!(!quiet.enabled(Verbosity::Normal));
        assert!(quiet.enabled(Verbosity::Quiet));
        assert!(verbose.enabled(Verbosity::Verbose));
        assert!(verbose.enabled(Verbosity::Normal));
        assert!(!Output::default().enabled(Verbosity::Verbose));
    }
}
