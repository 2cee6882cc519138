/// Extension allow-list and deny-list classification of paths.
pub mod classify;

/// Change list from git for `--changed` scopes.
pub mod git;

/// Project `.gitignore` rules.
pub mod ignore_rules;

/// Directory enumeration with noise pruning.
pub mod walk;

pub use classify::{is_excluded_path, is_includable, is_supported_code_file};
pub use ignore_rules::IgnoreRules;
pub use walk::ProjectWalker;
