use crate::error::PatchError;
use rayon::prelude::*;
use sha1::{Digest, Sha1};
use std::fs::File;
use std::io;
use std::path::Path;

/// Hex SHA-1 of a byte slice.
#[must_use]
pub fn hash_bytes(data: &[u8]) -> String {
    hex::encode(Sha1::digest(data))
}

/// Hex SHA-1 of a file's bytes, streamed so large files are never loaded whole.
///
/// # Errors
///
/// Returns `PatchError::FileAccess` if the file cannot be opened or read.
pub fn hash_file(path: &Path) -> Result<String, PatchError> {
    let mut file = File::open(path).map_err(|e| PatchError::file_access(path, e))?;
    let mut hasher = Sha1::new();
    io::copy(&mut file, &mut hasher).map_err(|e| PatchError::file_access(path, e))?;
    Ok(hex::encode(hasher.finalize()))
}

/// Hash `relative_paths` under `root` in parallel.
///
/// Results come back in input order, so callers get the same output
/// regardless of which file finished first.
///
/// # Errors
///
/// Returns the first `PatchError::FileAccess` encountered.
pub fn hash_files_parallel(
    root: &Path,
    relative_paths: &[String],
) -> Result<Vec<(String, String)>, PatchError> {
    relative_paths
        .par_iter()
        .map(|rel| {
            let hash = hash_file(&root.join(rel))?;
            Ok((rel.clone(), hash))
        })
        .collect()
}
