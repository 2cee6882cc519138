#![allow(dead_code)]

use anyhow::Result;
use patchwise::ProjectContext;
use patchwise::config::project::ProjectConfig;
use patchwise::output::{Output, Verbosity};
use patchwise::remote::{Account, Analysis, RemoteError, RemoteService};
use patchwise::tracking::manifest::Manifest;
use patchwise::utils::archive::Archive;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// Test project fixture for consistent test setup
pub struct TestProject {
    pub temp_dir: TempDir,
    pub ctx: ProjectContext,
}

impl TestProject {
    /// Create an empty project root with its own user config
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path().join("project");
        std::fs::create_dir_all(&root)?;
        let config_path = temp_dir.path().join("config/config.toml");

        let ctx = ProjectContext::new_explicit(root, config_path, Output::new(Verbosity::Quiet))?;
        Ok(Self { temp_dir, ctx })
    }

    /// Project root
    pub fn root(&self) -> &Path {
        &self.ctx.project_root
    }

    /// Write `content` to `relative`, creating parent directories
    pub fn write(&self, relative: &str, content: &str) -> Result<PathBuf> {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Write a project config linking `target`
    pub fn link(&self, project_id: &str, target: &str) -> Result<ProjectConfig> {
        let config = ProjectConfig::new(project_id, target);
        config.save(self.root())?;
        Ok(config)
    }
}

/// A call recorded by [`FakeRemote`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Whoami,
    CreateProject(String),
    UploadProject { entries: Vec<String> },
    FetchManifest(String),
    UploadPatch { entries: Vec<String>, manifest: Manifest },
    StartAnalysis(Vec<String>),
}

/// In-memory analysis service
#[derive(Default)]
pub struct FakeRemote {
    manifest: Mutex<Manifest>,
    calls: Mutex<Vec<Call>>,
    fetch_error: Mutex<Option<RemoteError>>,
    archives: Mutex<Vec<Vec<(String, Vec<u8>)>>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// A service that already holds `manifest`
    pub fn with_manifest(manifest: Manifest) -> Self {
        let remote = Self::default();
        *remote.manifest.lock().unwrap() = manifest;
        remote
    }

    /// Make every manifest fetch fail with `error`
    pub fn fail_fetch(&self, error: RemoteError) {
        *self.fetch_error.lock().unwrap() = Some(error);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn manifest(&self) -> Manifest {
        self.manifest.lock().unwrap().clone()
    }

    /// Entries of every uploaded archive, with their bytes
    pub fn archives(&self) -> Vec<Vec<(String, Vec<u8>)>> {
        self.archives.lock().unwrap().clone()
    }

    pub fn patch_uploads(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::UploadPatch { .. }))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn store_archive(&self, archive: &Archive) -> Vec<String> {
        let mut zip = zip::ZipArchive::new(Cursor::new(archive.bytes.as_slice())).unwrap();
        let mut entries = Vec::new();
        for i in 0..zip.len() {
            let mut entry = zip.by_index(i).unwrap();
            let mut bytes = Vec::new();
            entry.read_to_end(&mut bytes).unwrap();
            entries.push((entry.name().to_string(), bytes));
        }
        let names = entries.iter().map(|(n, _)| n.clone()).collect();
        self.archives.lock().unwrap().push(entries);
        names
    }

    fn merge(&self, manifest: &Manifest) {
        let mut stored = self.manifest.lock().unwrap();
        for (path, hash) in manifest.iter() {
            stored.insert(path, hash);
        }
    }
}

impl RemoteService for FakeRemote {
    fn whoami(&self) -> Result<Account, RemoteError> {
        self.record(Call::Whoami);
        Ok(Account {
            email: "dev@example.com".into(),
            name: None,
        })
    }

    fn create_project(&self, name: &str) -> Result<String, RemoteError> {
        self.record(Call::CreateProject(name.to_string()));
        Ok("proj-new".into())
    }

    fn upload_project(
        &self,
        _project_id: &str,
        archive: &Archive,
        manifest: &Manifest,
    ) -> Result<(), RemoteError> {
        let entries = self.store_archive(archive);
        self.record(Call::UploadProject { entries });
        *self.manifest.lock().unwrap() = manifest.clone();
        Ok(())
    }

    fn fetch_manifest(&self, project_id: &str) -> Result<Manifest, RemoteError> {
        self.record(Call::FetchManifest(project_id.to_string()));
        if let Some(err) = self.fetch_error.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(self.manifest())
    }

    fn upload_patch(
        &self,
        _project_id: &str,
        archive: &Archive,
        manifest: &Manifest,
    ) -> Result<(), RemoteError> {
        let entries = self.store_archive(archive);
        self.record(Call::UploadPatch {
            entries,
            manifest: manifest.clone(),
        });
        self.merge(manifest);
        Ok(())
    }

    fn start_analysis(&self, _project_id: &str, files: &[String]) -> Result<Analysis, RemoteError> {
        self.record(Call::StartAnalysis(files.to_vec()));
        Ok(Analysis {
            analysis_id: "an-1".into(),
            results_url: "https://app.example.com/analyses/an-1".into(),
        })
    }
}
