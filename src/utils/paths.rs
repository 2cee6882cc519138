use anyhow::{Context, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Joins the normal components of a relative path with `/`.
///
/// Returns `None` for paths that are absolute, carry a prefix, or still
/// contain `..` after lexical normalization.
#[must_use]
pub fn to_posix(path: &Path) -> Option<String> {
    let normalized = normalize_lexically(path);
    let mut parts = Vec::new();
    for component in normalized.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(parts.join("/"))
}

/// Path of `path` relative to `base`, in posix form.
///
/// Returns `None` when `path` does not live under `base`.
#[must_use]
pub fn posix_relative_to(path: &Path, base: &Path) -> Option<String> {
    path.strip_prefix(base).ok().and_then(to_posix)
}

/// Resolves `.` and `..` components without touching the filesystem.
///
/// Leading `..` components of a relative path are kept, since there is
/// nothing to pop them against.
#[must_use]
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out.iter().collect()
}

/// Lexical path of `path` relative to `base`, walking up with `..` where needed.
///
/// Both inputs are normalized first. If one is absolute and the other is not,
/// `path` is returned unchanged (normalized), which callers treat as "outside".
#[must_use]
pub fn relative_path_from(path: &Path, base: &Path) -> PathBuf {
    let path = normalize_lexically(path);
    let base = normalize_lexically(base);

    if path.is_absolute() != base.is_absolute() {
        return path;
    }

    let path_parts: Vec<Component<'_>> = path.components().collect();
    let base_parts: Vec<Component<'_>> = base.components().collect();

    let common = path_parts
        .iter()
        .zip(base_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut result = PathBuf::new();
    for _ in common..base_parts.len() {
        result.push("..");
    }
    for part in &path_parts[common..] {
        result.push(part.as_os_str());
    }
    result
}

/// Ensures parent directories exist for a given path
///
/// # Errors
///
/// Returns an error if the parent directories cannot be created
pub fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create parent directories for {}", path.display())
        })?;
    }
    Ok(())
}

/// Makes a path absolute, resolving relative paths from `base`
#[must_use]
pub fn make_absolute(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
