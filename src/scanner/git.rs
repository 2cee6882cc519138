//! Change list from git: staged, unstaged and untracked files.

use crate::error::PatchError;
use crate::utils::paths::to_posix;
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tracing::{Level, debug, span};

/// Run a git command inside `dir` with stdin detached
fn run_git(dir: &Path, args: &[&str]) -> Result<Output> {
    Command::new("git")
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("Failed to run git {}", args.join(" ")))
}

/// Whether `dir` is inside a git work tree
#[must_use]
pub fn is_work_tree(dir: &Path) -> bool {
    run_git(dir, &["rev-parse", "--is-inside-work-tree"])
        .is_ok_and(|out| out.status.success() && out.stdout.starts_with(b"true"))
}

/// Run a NUL-separated listing command and collect its entries
fn list_paths(dir: &Path, args: &[&str], into: &mut BTreeSet<String>) -> Result<()> {
    let output = run_git(dir, args)?;
    if !output.status.success() {
        anyhow::bail!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    for raw in output.stdout.split(|b| *b == 0) {
        if raw.is_empty() {
            continue;
        }
        let path = String::from_utf8_lossy(raw);
        if let Some(posix) = to_posix(Path::new(path.as_ref()))
            && !posix.is_empty()
        {
            into.insert(posix);
        }
    }
    Ok(())
}

/// Files changed in the work tree under `root`, relative to `root`.
///
/// Covers staged and unstaged modifications plus untracked files that are
/// not excluded by git. Paths that no longer exist (deletions) are dropped.
///
/// # Errors
///
/// Returns `PatchError::NotAGitRepository` when `root` is not inside a git
/// work tree, or an error if a git command fails.
pub fn changed_files(root: &Path) -> Result<Vec<String>> {
    let span = span!(Level::DEBUG, "git_changed_files", root = %root.display());
    let _guard = span.enter();

    if !is_work_tree(root) {
        return Err(PatchError::NotAGitRepository(root.to_path_buf()).into());
    }

    let mut paths = BTreeSet::new();
    // Index vs HEAD; on an unborn branch git compares against the empty tree.
    list_paths(root, &["diff", "--name-only", "--relative", "-z", "--cached"], &mut paths)?;
    list_paths(root, &["diff", "--name-only", "--relative", "-z"], &mut paths)?;
    list_paths(
        root,
        &["ls-files", "--others", "--exclude-standard", "-z"],
        &mut paths,
    )?;

    let existing: Vec<String> = paths
        .into_iter()
        .filter(|p| root.join(p).is_file())
        .collect();

    debug!(count = existing.len(), "Collected changed files");
    Ok(existing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .is_ok_and(|o| o.status.success())
    }

    fn git(dir: &Path, args: &[&str]) -> Result<()> {
        let output = Command::new("git")
            .args([
                "-c",
                "user.name=Test User",
                "-c",
                "user.email=test@example.com",
                "-c",
                "init.defaultBranch=main",
                "-c",
                "commit.gpgsign=false",
            ])
            .args(args)
            .current_dir(dir)
            .output()?;
        anyhow::ensure!(output.status.success(), "git {args:?} failed");
        Ok(())
    }

    #[test]
    fn test_not_a_repository() {
        let temp_dir = TempDir::new().unwrap();
        if !git_available() || is_work_tree(temp_dir.path()) {
            return;
        }

        let err = changed_files(temp_dir.path()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PatchError>(),
            Some(PatchError::NotAGitRepository(_))
        ));
    }

    #[test]
    fn test_changed_files() -> Result<()> {
        if !git_available() {
            return Ok(());
        }
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();

        fs::create_dir_all(root.join("src"))?;
        fs::write(root.join("src/clean.ts"), "clean")?;
        fs::write(root.join("src/edited.ts"), "v1")?;
        fs::write(root.join("src/removed.ts"), "gone soon")?;
        git(root, &["init", "-q"])?;
        git(root, &["add", "."])?;
        git(root, &["commit", "-q", "-m", "initial"])?;

        fs::write(root.join("src/edited.ts"), "v2")?;
        fs::write(root.join("src/staged.ts"), "new")?;
        git(root, &["add", "src/staged.ts"])?;
        fs::write(root.join("src/untracked.ts"), "untracked")?;
        fs::remove_file(root.join("src/removed.ts"))?;

        let files = changed_files(root)?;
        assert_eq!(
            files,
            vec!["src/edited.ts", "src/staged.ts", "src/untracked.ts"]
        );
        Ok(())
    }
}
