use crate::ProjectContext;
use crate::config::project::ProjectConfig;
use crate::utils::archive::build_directory_archive;
use crate::utils::paths::{ensure_parent_dirs, normalize_lexically};
use crate::utils::{format_size, plural};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Write a zip of whole directories (or single files) to `output`
///
/// Paths are relative to the project root or absolute. With none
/// given, the linked target directory (or the root when unlinked) is packed.
///
/// # Errors
///
/// Returns an error if a directory lies outside the project root, cannot be
/// walked, or the output cannot be written.
pub fn execute(ctx: &ProjectContext, dirs: &[PathBuf], output: &Path) -> Result<()> {
    let root = &ctx.project_root;

    let dirs = if dirs.is_empty() {
        let target = if ProjectConfig::exists(root) {
            ctx.project_config()?.target_path()
        } else {
            PathBuf::from(".")
        };
        vec![target]
    } else {
        dirs.iter()
            .map(|dir| root_relative(root, dir))
            .collect::<Result<Vec<_>>>()?
    };

    let archive = build_directory_archive(root, &dirs, ctx.config.scope.follow_symlinks)?;

    ensure_parent_dirs(output)?;
    std::fs::write(output, &archive.bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    ctx.output.success(&format!(
        "Wrote {} ({}, {})",
        output.display(),
        plural(archive.entries.len(), "file"),
        format_size(archive.len())
    ));
    Ok(())
}

fn root_relative(root: &Path, dir: &Path) -> Result<PathBuf> {
    let relative = if dir.is_absolute() {
        dir.strip_prefix(root)
            .with_context(|| format!("{} is outside the project root", dir.display()))?
            .to_path_buf()
    } else {
        dir.to_path_buf()
    };

    let relative = normalize_lexically(&relative);
    if relative.starts_with("..") {
        anyhow::bail!("{} is outside the project root", dir.display());
    }
    if relative.as_os_str().is_empty() {
        return Ok(PathBuf::from("."));
    }
    Ok(relative)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_relative() -> Result<()> {
        let root = Path::new("/work/project");
        assert_eq!(root_relative(root, Path::new("/work/project/src"))?, PathBuf::from("src"));
        assert_eq!(root_relative(root, Path::new("/work/project"))?, PathBuf::from("."));
        assert_eq!(root_relative(root, Path::new("./a/../b"))?, PathBuf::from("b"));
        assert!(root_relative(root, Path::new("/work/other")).is_err());
        assert!(root_relative(root, Path::new("../up")).is_err());
        Ok(())
    }
}
