//! Remote analysis service boundary.
//!
//! The engine only talks to the service through [`RemoteService`], so the
//! synchronizer can be driven by the HTTP client in production and by an
//! in-memory fake in tests.

mod error;
mod http;

pub use error::RemoteError;
pub use http::HttpRemote;

use crate::tracking::manifest::Manifest;
use crate::utils::archive::Archive;
use serde::{Deserialize, Serialize};

/// Account the API key belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Login e-mail
    pub email: String,
    /// Display name, if set
    #[serde(default)]
    pub name: Option<String>,
}

/// A started analysis run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    /// Service-side analysis identifier
    pub analysis_id: String,
    /// Where the user can follow the results
    pub results_url: String,
}

/// Operations the client needs from the analysis service.
///
/// Implementations carry their own credentials. Every call either succeeds
/// or returns a categorized [`RemoteError`]; nothing is retried here.
pub trait RemoteService: Sync {
    /// Identify the account behind the configured credentials
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Authentication` for a rejected key.
    fn whoami(&self) -> Result<Account, RemoteError>;

    /// Create a project and return its identifier
    ///
    /// # Errors
    ///
    /// Returns a `RemoteError` if the service rejects the request.
    fn create_project(&self, name: &str) -> Result<String, RemoteError>;

    /// Upload a full project snapshot with its manifest
    ///
    /// # Errors
    ///
    /// Returns a `RemoteError` if the upload fails.
    fn upload_project(
        &self,
        project_id: &str,
        archive: &Archive,
        manifest: &Manifest,
    ) -> Result<(), RemoteError>;

    /// The service's current manifest for the project
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Authentication` or `RemoteError::NotFound` for
    /// rejected access, `RemoteError::Network` for transient failures.
    fn fetch_manifest(&self, project_id: &str) -> Result<Manifest, RemoteError>;

    /// Apply a patch: archive of changed files plus their manifest entries
    ///
    /// # Errors
    ///
    /// Returns a `RemoteError` if the upload fails.
    fn upload_patch(
        &self,
        project_id: &str,
        archive: &Archive,
        manifest: &Manifest,
    ) -> Result<(), RemoteError>;

    /// Start an analysis over `files` (project-root-relative paths)
    ///
    /// # Errors
    ///
    /// Returns a `RemoteError` if the service rejects the request.
    fn start_analysis(&self, project_id: &str, files: &[String]) -> Result<Analysis, RemoteError>;
}
