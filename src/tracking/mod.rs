/// Content-addressed manifests and the file-list builder.
pub mod manifest;

/// Scope resolution and target-directory enforcement.
pub mod scope;

pub use manifest::{Manifest, ManifestBuild, ManifestBuilder};
pub use scope::{Confirm, DeclineConfirm, Scope, ScopeOutcome, ScopeRequest, ScopeResolver, ScopeResult, StdinConfirm};
