//! Content-addressed manifests of project files.
//!
//! A `Manifest` maps each file path, relative to the project root and in
//! posix form, to the SHA-1 of its bytes. Two manifests built from the same
//! bytes are equal no matter which directory the scan started from, which is
//! what makes diffing against the remote copy possible.
//!
//! # Architecture
//!
//! `ManifestBuilder` has two entry points:
//! 1. [`ManifestBuilder::build`] walks a subtree (directory-walk variant)
//! 2. [`ManifestBuilder::files_for_scope`] starts from explicit paths or
//!    from the git change list (file-list variant)
//!
//! Both apply the path classifier and the project ignore rules.

use crate::error::PatchError;
use crate::scanner::classify::is_includable;
use crate::scanner::git;
use crate::scanner::ignore_rules::IgnoreRules;
use crate::scanner::walk::{ProjectWalker, has_noise_segment};
use crate::utils::hash::hash_files_parallel;
use crate::utils::paths::{normalize_lexically, to_posix};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{Level, debug, info, span};

/// Mapping from relative posix path to content hash
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    /// Sorted path → hash entries
    entries: BTreeMap<String, String>,
}

impl Manifest {
    /// Create an empty manifest
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `hash` for `path`, returning the previous hash if any
    pub fn insert(&mut self, path: impl Into<String>, hash: impl Into<String>) -> Option<String> {
        self.entries.insert(path.into(), hash.into())
    }

    /// Hash recorded for `path`
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    /// Whether `path` has an entry
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate `(path, hash)` pairs in path order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, h)| (p.as_str(), h.as_str()))
    }

    /// Iterate paths in order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// A manifest holding only the entries for `paths`
    #[must_use]
    pub fn restricted_to<'a, I>(&self, paths: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        paths
            .into_iter()
            .filter_map(|p| self.entries.get_key_value(p))
            .map(|(p, h)| (p.clone(), h.clone()))
            .collect()
    }
}

impl FromIterator<(String, String)> for Manifest {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Result of a directory-walk manifest build
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestBuild {
    /// Path → hash for every included file
    pub manifest: Manifest,
    /// Included paths, sorted
    pub included_files: Vec<String>,
}

/// Builds manifests and file lists for a project
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    /// Walker anchored at the project root
    walker: ProjectWalker,
    /// Project ignore rules
    rules: IgnoreRules,
}

impl ManifestBuilder {
    /// Create a builder for `project_root`, loading its `.gitignore`
    #[must_use]
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let walker = ProjectWalker::new(project_root);
        let rules = IgnoreRules::load(walker.project_root());
        Self { walker, rules }
    }

    /// Replace the ignore rules
    #[must_use]
    pub fn with_rules(mut self, rules: IgnoreRules) -> Self {
        self.rules = rules;
        self
    }

    /// Set whether symbolic links are followed while walking
    #[must_use]
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.walker = self.walker.follow_symlinks(follow);
        self
    }

    /// The project root manifests are relative to
    #[must_use]
    pub fn project_root(&self) -> &Path {
        self.walker.project_root()
    }

    /// The ignore rules in effect
    #[must_use]
    pub const fn rules(&self) -> &IgnoreRules {
        &self.rules
    }

    /// Walk `scan_root` and hash every includable, non-ignored file.
    ///
    /// Keys are relative to the project root even when `scan_root` is a
    /// subdirectory.
    ///
    /// # Errors
    ///
    /// Returns `PatchError::FileAccess` if the subtree cannot be walked or any
    /// file cannot be read; no partial manifest is returned.
    pub fn build(&self, scan_root: &Path) -> Result<ManifestBuild, PatchError> {
        let span = span!(Level::DEBUG, "build_manifest", scan_root = %scan_root.display());
        let _guard = span.enter();

        let included_files = self.walker.collect(scan_root, Some(&self.rules))?;
        let manifest = self.hash_files(&included_files)?;

        info!(files = manifest.len(), "Built local manifest");
        Ok(ManifestBuild {
            manifest,
            included_files,
        })
    }

    /// Hash an explicit list of root-relative files.
    ///
    /// # Errors
    ///
    /// Returns `PatchError::FileAccess` if any file cannot be read.
    pub fn hash_files(&self, relative_paths: &[String]) -> Result<Manifest, PatchError> {
        let hashes = hash_files_parallel(self.project_root(), relative_paths)?;
        Ok(hashes.into_iter().collect())
    }

    /// Resolve the files a targeted command acts on.
    ///
    /// With `changed`, the git change list seeds the result and `paths`
    /// (when given) narrow it to those subtrees. Otherwise each path is
    /// walked (directories) or taken as-is (files). The classifier and the
    /// ignore rules apply either way. Output is sorted and deduplicated.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit path does not exist, or if `changed`
    /// is set and the project is not a git work tree.
    pub fn files_for_scope(&self, paths: &[PathBuf], changed: bool) -> Result<Vec<String>> {
        let span = span!(Level::DEBUG, "files_for_scope", paths = paths.len(), changed);
        let _guard = span.enter();

        let mut files = BTreeSet::new();

        if changed {
            let filters: Vec<String> = paths.iter().filter_map(|p| self.root_relative(p)).collect();

            for rel in git::changed_files(self.project_root())? {
                let in_filter = filters.is_empty()
                    || filters
                        .iter()
                        .any(|f| f.is_empty() || rel == *f || rel.starts_with(&format!("{f}/")));
                if in_filter
                    && !has_noise_segment(&rel)
                    && is_includable(Path::new(&rel))
                    && !self.rules.ignores(&rel)
                {
                    files.insert(rel);
                }
            }
        } else {
            for path in paths {
                files.extend(self.walker.collect(path, Some(&self.rules))?);
            }
        }

        debug!(count = files.len(), "Resolved scoped files");
        Ok(files.into_iter().collect())
    }

    /// Posix form of `path` relative to the project root, if it lies inside it
    fn root_relative(&self, path: &Path) -> Option<String> {
        let path = if path.is_absolute() {
            path.strip_prefix(self.project_root()).ok()?.to_path_buf()
        } else {
            path.to_path_buf()
        };
        to_posix(&normalize_lexically(&path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::hash::hash_bytes;
    use std::fs;
    use tempfile::TempDir;

    fn create_project(root: &Path) -> Result<()> {
        fs::create_dir_all(root.join("src/nested"))?;
        fs::create_dir_all(root.join("node_modules/dep"))?;
        fs::write(root.join("src/index.js"), "A")?;
        fs::write(root.join("src/nested/util.js"), "B")?;
        fs::write(root.join("src/generated.js"), "G")?;
        fs::write(root.join("node_modules/dep/index.js"), "dep")?;
        fs::write(root.join("package.json"), "{}")?;
        fs::write(root.join(".gitignore"), "generated.js\n")?;
        Ok(())
    }

    #[test]
    fn test_manifest_basics() {
        let mut manifest = Manifest::new();
        assert!(manifest.is_empty());
        assert_eq!(manifest.insert("b.rs", "2"), None);
        assert_eq!(manifest.insert("a.rs", "1"), None);
        assert_eq!(manifest.insert("a.rs", "3").as_deref(), Some("1"));

        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.get("a.rs"), Some("3"));
        assert!(manifest.contains("b.rs"));
        assert_eq!(manifest.paths().collect::<Vec<_>>(), vec!["a.rs", "b.rs"]);

        let only_b = manifest.restricted_to(["b.rs", "missing.rs"]);
        assert_eq!(only_b.iter().collect::<Vec<_>>(), vec![("b.rs", "2")]);
    }

    #[test]
    fn test_manifest_json_is_flat_object() -> Result<()> {
        let manifest: Manifest = serde_json::from_str(r#"{"src/a.ts":"abc","b.ts":"def"}"#)?;
        assert_eq!(manifest.get("src/a.ts"), Some("abc"));
        assert_eq!(serde_json::to_string(&manifest)?, r#"{"b.ts":"def","src/a.ts":"abc"}"#);
        Ok(())
    }

    #[test]
    fn test_build_whole_project() -> Result<()> {
        let temp_dir = TempDir::new()?;
        create_project(temp_dir.path())?;

        let build = ManifestBuilder::new(temp_dir.path()).build(Path::new("."))?;

        assert_eq!(
            build.included_files,
            vec![".gitignore", "package.json", "src/index.js", "src/nested/util.js"]
        );
        assert_eq!(build.manifest.get("src/index.js"), Some(hash_bytes(b"A").as_str()));
        assert!(!build.manifest.contains("src/generated.js"));
        assert!(!build.manifest.contains("node_modules/dep/index.js"));
        Ok(())
    }

    #[test]
    fn test_build_subdirectory_keys_are_root_relative() -> Result<()> {
        let temp_dir = TempDir::new()?;
        create_project(temp_dir.path())?;

        let builder = ManifestBuilder::new(temp_dir.path());
        let whole = builder.build(Path::new("."))?;
        let nested = builder.build(Path::new("src/nested"))?;

        assert_eq!(nested.included_files, vec!["src/nested/util.js"]);
        assert_eq!(
            nested.manifest.get("src/nested/util.js"),
            whole.manifest.get("src/nested/util.js")
        );
        Ok(())
    }

    #[test]
    fn test_build_is_deterministic() -> Result<()> {
        let temp_dir = TempDir::new()?;
        create_project(temp_dir.path())?;

        let builder = ManifestBuilder::new(temp_dir.path());
        assert_eq!(builder.build(Path::new("."))?, builder.build(Path::new("."))?);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_file_aborts_build() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new()?;
        create_project(temp_dir.path())?;
        let locked = temp_dir.path().join("src/index.js");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000))?;

        // Root can read anything; nothing to assert in that case.
        if fs::read(&locked).is_ok() {
            return Ok(());
        }

        let err = ManifestBuilder::new(temp_dir.path())
            .build(Path::new("."))
            .unwrap_err();
        assert!(matches!(err, PatchError::FileAccess { .. }));
        Ok(())
    }

    #[test]
    fn test_files_for_explicit_paths() -> Result<()> {
        let temp_dir = TempDir::new()?;
        create_project(temp_dir.path())?;

        let builder = ManifestBuilder::new(temp_dir.path());
        let files = builder.files_for_scope(
            &[PathBuf::from("src/nested"), PathBuf::from("package.json"), PathBuf::from("src/nested/util.js")],
            false,
        )?;
        assert_eq!(files, vec!["package.json", "src/nested/util.js"]);

        let files = builder.files_for_scope(&[PathBuf::from("src")], false)?;
        assert_eq!(files, vec!["src/index.js", "src/nested/util.js"]);
        Ok(())
    }

    #[test]
    fn test_walk_and_explicit_files_agree_on_dotfiles() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();
        fs::write(root.join(".env.example"), "API_URL=")?;
        fs::write(root.join(".env.production"), "API_URL=prod")?;
        fs::write(root.join("app.py"), "print()")?;

        let builder = ManifestBuilder::new(root);
        let walked = builder.build(Path::new("."))?.included_files;
        assert_eq!(walked, vec![".env.example", "app.py"]);

        for name in [".env.example", ".env.production"] {
            let explicit = builder.files_for_scope(&[PathBuf::from(name)], false)?;
            assert_eq!(explicit.is_empty(), !walked.contains(&name.to_string()), "{name}");
        }
        Ok(())
    }

    #[test]
    fn test_files_for_missing_path_fails() {
        let temp_dir = TempDir::new().unwrap();
        let builder = ManifestBuilder::new(temp_dir.path());
        let err = builder
            .files_for_scope(&[PathBuf::from("nope.ts")], false)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PatchError>(),
            Some(PatchError::FileAccess { .. })
        ));
    }
}
