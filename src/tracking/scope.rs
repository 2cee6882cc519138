//! Resolution of the file set a command acts on.
//!
//! Explicit paths and `--changed` go through the file-list variant of the
//! manifest builder; otherwise the configured target directory is walked.
//! Every resolved file must live inside the target directory.

use crate::config::project::ProjectConfig;
use crate::error::PatchError;
use crate::tracking::manifest::ManifestBuilder;
use crate::utils::paths::{normalize_lexically, relative_path_from, to_posix};
use anyhow::Result;
use std::fmt;
use std::io::{self, BufRead, Write};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// Default resolved-file count above which confirmation is required
pub const DEFAULT_MAX_FILES: usize = 200;

/// What the user asked a targeted command to act on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeRequest {
    /// Files or directories, relative to the project root or absolute
    pub paths: Vec<PathBuf>,
    /// Only files changed in the git work tree
    pub changed: bool,
    /// Skip the large-scope confirmation
    pub assume_yes: bool,
}

/// How a scope was selected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// An explicit file list
    SelectedFiles,
    /// Everything under the target directory
    EntireProject,
    /// Files changed in the git work tree
    GitDiff,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelectedFiles => write!(f, "selected files"),
            Self::EntireProject => write!(f, "entire project"),
            Self::GitDiff => write!(f, "git diff"),
        }
    }
}

/// Files resolved for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeResult {
    /// How the files were selected
    pub scope: Scope,
    /// Sorted project-root-relative paths; may be empty
    pub target_file_paths: Vec<String>,
}

impl ScopeResult {
    /// Whether there is nothing to act on
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.target_file_paths.is_empty()
    }
}

/// Outcome of scope resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeOutcome {
    /// Files to act on
    Resolved(ScopeResult),
    /// The user declined the large-scope confirmation
    Cancelled,
}

/// Asks the user a yes/no question
pub trait Confirm {
    /// # Errors
    ///
    /// Returns an error if the answer cannot be read.
    fn confirm(&self, prompt: &str) -> Result<bool>;
}

/// Prompts on stderr and reads a `y`/`N` answer from stdin
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        ask(prompt, &mut io::stdin().lock(), &mut io::stderr())
    }
}

/// Answers no without asking, for runs that must not prompt
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclineConfirm;

impl Confirm for DeclineConfirm {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        debug!(prompt, "Declining confirmation in non-interactive mode");
        Ok(false)
    }
}

/// Write `prompt` to `out` and read a `y`/`N` answer from `input`
fn ask(prompt: &str, input: &mut impl BufRead, out: &mut impl Write) -> Result<bool> {
    write!(out, "{prompt} [y/N]: ")?;
    out.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let answer = answer.trim();
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}

/// Resolves [`ScopeRequest`]s against a linked project
pub struct ScopeResolver<'a> {
    builder: &'a ManifestBuilder,
    confirm: &'a dyn Confirm,
    max_files: usize,
}

impl<'a> ScopeResolver<'a> {
    /// Resolver over `builder`'s project, asking `confirm` for large scopes
    #[must_use]
    pub fn new(builder: &'a ManifestBuilder, confirm: &'a dyn Confirm) -> Self {
        Self {
            builder,
            confirm,
            max_files: DEFAULT_MAX_FILES,
        }
    }

    /// Set the soft limit on resolved files
    #[must_use]
    pub const fn max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    /// Determine the files a command acts on.
    ///
    /// # Errors
    ///
    /// - `PatchError::ScopeViolation` if a requested path or a resolved file
    ///   lies outside the target directory
    /// - `PatchError::FileAccess` if an explicit path is missing
    /// - `PatchError::NotAGitRepository` for `changed` outside git
    pub fn determine_scope(
        &self,
        request: &ScopeRequest,
        project: &ProjectConfig,
    ) -> Result<ScopeOutcome> {
        let target = project
            .target_relative()
            .ok_or_else(|| PatchError::InvalidConfig(format!(
                "target_directory '{}' must be a relative path inside the project",
                project.target_directory
            )))?;

        let files = if request.changed || !request.paths.is_empty() {
            let paths = request
                .paths
                .iter()
                .map(|p| self.root_relative(p, &project.target_directory))
                .collect::<Result<Vec<_>, _>>()?;
            self.builder.files_for_scope(&paths, request.changed)?
        } else {
            self.builder.build(&project.target_path())?.included_files
        };

        validate_scope(&files, &target, &project.target_directory)?;
        debug!(count = files.len(), "Scope validated");

        if files.len() > self.max_files && !request.assume_yes {
            let prompt = format!(
                "{} files selected, more than the limit of {}. Continue?",
                files.len(),
                self.max_files
            );
            if !self.confirm.confirm(&prompt)? {
                info!(count = files.len(), "Large scope declined");
                return Ok(ScopeOutcome::Cancelled);
            }
        }

        Ok(ScopeOutcome::Resolved(ScopeResult {
            scope: Scope::SelectedFiles,
            target_file_paths: files,
        }))
    }

    /// Requested path as a path relative to the project root
    fn root_relative(&self, path: &Path, target_directory: &str) -> Result<PathBuf, PatchError> {
        let root = self.builder.project_root();
        let relative = if path.is_absolute() {
            path.strip_prefix(root)
                .map(normalize_lexically)
                .map_err(|_| violation(path, target_directory))?
        } else {
            normalize_lexically(path)
        };

        if escapes(&relative) {
            return Err(violation(path, target_directory));
        }
        Ok(if relative.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            relative
        })
    }
}

/// Check that every file lies inside `target` (posix, `""` for the root).
///
/// # Errors
///
/// Returns `PatchError::ScopeViolation` for the first file outside it.
pub fn validate_scope(files: &[String], target: &str, target_directory: &str) -> Result<(), PatchError> {
    for file in files {
        let relative = relative_path_from(Path::new(file), Path::new(target));
        if escapes(&relative) || Path::new(file).is_absolute() {
            return Err(PatchError::ScopeViolation {
                file: file.clone(),
                target_directory: target_directory.to_string(),
            });
        }
    }
    Ok(())
}

/// Whether a relative path climbs out of its base or is absolute
fn escapes(relative: &Path) -> bool {
    relative.is_absolute()
        || matches!(
            relative.components().next(),
            Some(Component::ParentDir | Component::RootDir | Component::Prefix(_))
        )
}

fn violation(path: &Path, target_directory: &str) -> PatchError {
    PatchError::ScopeViolation {
        file: to_posix(path).unwrap_or_else(|| path.display().to_string()),
        target_directory: target_directory.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::fs;
    use tempfile::TempDir;

    struct Answer {
        value: bool,
        asked: Cell<usize>,
    }

    impl Answer {
        fn new(value: bool) -> Self {
            Self {
                value,
                asked: Cell::new(0),
            }
        }
    }

    impl Confirm for Answer {
        fn confirm(&self, _prompt: &str) -> Result<bool> {
            self.asked.set(self.asked.get() + 1);
            Ok(self.value)
        }
    }

    fn create_project(root: &Path) -> Result<()> {
        fs::create_dir_all(root.join("src/lib"))?;
        fs::create_dir_all(root.join("docs"))?;
        fs::write(root.join("src/main.ts"), "main")?;
        fs::write(root.join("src/lib/util.ts"), "util")?;
        fs::write(root.join("docs/guide.md"), "guide")?;
        fs::write(root.join("README.md"), "readme")?;
        Ok(())
    }

    fn resolved(outcome: ScopeOutcome) -> ScopeResult {
        match outcome {
            ScopeOutcome::Resolved(result) => result,
            ScopeOutcome::Cancelled => panic!("unexpected cancellation"),
        }
    }

    #[test]
    fn test_validate_scope_names_file_and_target() {
        let err = validate_scope(&["../secrets.txt".to_string()], "src", "src").unwrap_err();
        match err {
            PatchError::ScopeViolation {
                file,
                target_directory,
            } => {
                assert_eq!(file, "../secrets.txt");
                assert_eq!(target_directory, "src");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(validate_scope(&["docs/guide.md".to_string()], "src", "src").is_err());
        assert!(validate_scope(&["src/a.ts".to_string()], "src", "src").is_ok());
        assert!(validate_scope(&["docs/guide.md".to_string()], "", ".").is_ok());
    }

    #[test]
    fn test_default_scope_walks_target_directory() -> Result<()> {
        let temp_dir = TempDir::new()?;
        create_project(temp_dir.path())?;
        let builder = ManifestBuilder::new(temp_dir.path());
        let confirm = Answer::new(true);

        let result = resolved(
            ScopeResolver::new(&builder, &confirm)
                .determine_scope(&ScopeRequest::default(), &ProjectConfig::new("p", "src"))?,
        );
        assert_eq!(result.scope, Scope::SelectedFiles);
        assert_eq!(result.target_file_paths, vec!["src/lib/util.ts", "src/main.ts"]);
        assert_eq!(confirm.asked.get(), 0);
        Ok(())
    }

    #[test]
    fn test_explicit_paths_inside_target() -> Result<()> {
        let temp_dir = TempDir::new()?;
        create_project(temp_dir.path())?;
        let builder = ManifestBuilder::new(temp_dir.path());
        let confirm = Answer::new(true);
        let request = ScopeRequest {
            paths: vec![PathBuf::from("src/lib"), temp_dir.path().join("src/main.ts")],
            ..ScopeRequest::default()
        };

        let result = resolved(
            ScopeResolver::new(&builder, &confirm)
                .determine_scope(&request, &ProjectConfig::new("p", "src"))?,
        );
        assert_eq!(result.target_file_paths, vec!["src/lib/util.ts", "src/main.ts"]);
        Ok(())
    }

    #[test]
    fn test_explicit_path_outside_target_is_violation() -> Result<()> {
        let temp_dir = TempDir::new()?;
        create_project(temp_dir.path())?;
        let builder = ManifestBuilder::new(temp_dir.path());
        let confirm = Answer::new(true);
        let resolver = ScopeResolver::new(&builder, &confirm);
        let config = ProjectConfig::new("p", "src");

        for path in [PathBuf::from("docs"), PathBuf::from("../outside.ts"), PathBuf::from("/etc/hosts")] {
            let request = ScopeRequest {
                paths: vec![path.clone()],
                ..ScopeRequest::default()
            };
            let err = resolver.determine_scope(&request, &config).unwrap_err();
            assert!(
                matches!(err.downcast_ref::<PatchError>(), Some(PatchError::ScopeViolation { .. })),
                "expected violation for {}",
                path.display()
            );
        }
        Ok(())
    }

    #[test]
    fn test_empty_scope_is_not_an_error() -> Result<()> {
        let temp_dir = TempDir::new()?;
        fs::create_dir_all(temp_dir.path().join("src"))?;
        fs::write(temp_dir.path().join("src/image.png"), [0u8; 4])?;
        let builder = ManifestBuilder::new(temp_dir.path());
        let confirm = Answer::new(true);

        let result = resolved(
            ScopeResolver::new(&builder, &confirm)
                .determine_scope(&ScopeRequest::default(), &ProjectConfig::new("p", "src"))?,
        );
        assert!(result.is_empty());
        Ok(())
    }

    #[test]
    fn test_soft_limit_confirmation() -> Result<()> {
        let temp_dir = TempDir::new()?;
        create_project(temp_dir.path())?;
        let builder = ManifestBuilder::new(temp_dir.path());
        let config = ProjectConfig::new("p", ".");

        let declined = Answer::new(false);
        let outcome = ScopeResolver::new(&builder, &declined)
            .max_files(2)
            .determine_scope(&ScopeRequest::default(), &config)?;
        assert_eq!(outcome, ScopeOutcome::Cancelled);
        assert_eq!(declined.asked.get(), 1);

        let accepted = Answer::new(true);
        let result = resolved(
            ScopeResolver::new(&builder, &accepted)
                .max_files(2)
                .determine_scope(&ScopeRequest::default(), &config)?,
        );
        assert_eq!(result.target_file_paths.len(), 4);

        let request = ScopeRequest {
            assume_yes: true,
            ..ScopeRequest::default()
        };
        let skipped = Answer::new(false);
        let outcome = ScopeResolver::new(&builder, &skipped)
            .max_files(2)
            .determine_scope(&request, &config)?;
        assert!(matches!(outcome, ScopeOutcome::Resolved(_)));
        assert_eq!(skipped.asked.get(), 0);
        Ok(())
    }

    #[test]
    fn test_prompt_goes_to_given_writer() -> Result<()> {
        let mut out = Vec::new();
        assert!(ask("Continue?", &mut io::Cursor::new("yes\n"), &mut out)?);
        assert_eq!(String::from_utf8(out)?, "Continue? [y/N]: ");

        assert!(ask("Continue?", &mut io::Cursor::new(" Y \n"), &mut Vec::new())?);
        assert!(!ask("Continue?", &mut io::Cursor::new("\n"), &mut Vec::new())?);
        assert!(!ask("Continue?", &mut io::Cursor::new(""), &mut Vec::new())?);
        Ok(())
    }

    #[test]
    fn test_decline_confirm_cancels_large_scope() -> Result<()> {
        let temp_dir = TempDir::new()?;
        create_project(temp_dir.path())?;
        let builder = ManifestBuilder::new(temp_dir.path());
        let config = ProjectConfig::new("p", ".");

        let outcome = ScopeResolver::new(&builder, &DeclineConfirm)
            .max_files(1)
            .determine_scope(&ScopeRequest::default(), &config)?;
        assert_eq!(outcome, ScopeOutcome::Cancelled);
        Ok(())
    }
}
