//! In-memory zip archives of project files.
//!
//! Entries are deflated at the maximum level. An archive is either complete
//! or not returned at all.

use crate::error::PatchError;
use crate::scanner::walk::ProjectWalker;
use crate::utils::paths::{normalize_lexically, to_posix};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use tracing::{Level, debug, span, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Deflate level used for every entry.
pub const COMPRESSION_LEVEL: i64 = 9;

/// A finished archive and the entry names it contains.
#[derive(Debug, Clone, Default)]
pub struct Archive {
    /// Zip container bytes
    pub bytes: Vec<u8>,
    /// Entry names in the order they were written
    pub entries: Vec<String>,
}

impl Archive {
    /// Size of the archive in bytes
    #[must_use]
    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Whether the archive holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// How a missing source file is treated while writing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MissingFile {
    /// Abort the whole archive
    Fail,
    /// Log and leave the entry out
    Skip,
}

/// Incrementally writes entries into an in-memory zip
struct ArchiveWriter {
    /// Underlying zip writer
    zip: ZipWriter<Cursor<Vec<u8>>>,
    /// Entries written so far
    entries: Vec<String>,
}

impl ArchiveWriter {
    /// Start an empty archive
    fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            entries: Vec::new(),
        }
    }

    /// Append `source` under `entry_name`
    fn add_file(&mut self, source: &Path, entry_name: &str, missing: MissingFile) -> Result<()> {
        let mut file = match File::open(source) {
            Ok(file) => file,
            Err(e) if missing == MissingFile::Skip && e.kind() == io::ErrorKind::NotFound => {
                warn!(path = %source.display(), "File disappeared before archiving, skipping");
                return Ok(());
            }
            Err(e) => return Err(PatchError::file_access(source, e).into()),
        };

        let len = file
            .metadata()
            .map_err(|e| PatchError::file_access(source, e))?
            .len();

        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(COMPRESSION_LEVEL))
            .unix_permissions(0o644)
            .large_file(len > 0xffff_ffff);

        self.zip
            .start_file(entry_name, options)
            .with_context(|| format!("Failed to start archive entry {entry_name}"))?;
        io::copy(&mut file, &mut self.zip).map_err(|e| PatchError::file_access(source, e))?;

        self.entries.push(entry_name.to_string());
        Ok(())
    }

    /// Finalize the central directory and hand back the bytes
    fn finish(self) -> Result<Archive> {
        let cursor = self.zip.finish().context("Failed to finalize archive")?;
        Ok(Archive {
            bytes: cursor.into_inner(),
            entries: self.entries,
        })
    }
}

/// Archive `relative_paths` from `project_root`, one entry per path with
/// the path itself as the entry name.
///
/// # Errors
///
/// Returns an error if a path is not a clean relative path, or if any file
/// cannot be read. No partial archive is returned.
pub fn build_archive(project_root: &Path, relative_paths: &[String]) -> Result<Archive> {
    let span = span!(Level::DEBUG, "build_archive", files = relative_paths.len());
    let _guard = span.enter();

    let mut writer = ArchiveWriter::new();
    for rel in relative_paths {
        if to_posix(Path::new(rel)).as_deref() != Some(rel.as_str()) || rel.is_empty() {
            anyhow::bail!("Refusing to archive non-normalized path '{rel}'");
        }
        writer.add_file(&project_root.join(rel), rel, MissingFile::Fail)?;
    }

    let archive = writer.finish()?;
    debug!(bytes = archive.len(), "Archive built");
    Ok(archive)
}

/// Archive whole directories, enumerating their includable files.
///
/// Each directory keeps its own basename as the top-level folder inside the
/// archive; `.` (the project root) contributes its files at the top level.
/// A file argument becomes a single top-level entry named by its basename.
///
/// # Errors
///
/// Returns an error if a directory cannot be walked, a file cannot be read,
/// or two arguments would produce the same top-level name. Files that vanish
/// between enumeration and reading are logged and skipped.
pub fn build_directory_archive(
    project_root: &Path,
    dirs: &[PathBuf],
    follow_symlinks: bool,
) -> Result<Archive> {
    let span = span!(Level::DEBUG, "build_directory_archive", dirs = dirs.len());
    let _guard = span.enter();

    let walker = ProjectWalker::new(project_root).follow_symlinks(follow_symlinks);
    let mut writer = ArchiveWriter::new();
    // entry name -> argument that produced it
    let mut written: HashMap<String, String> = HashMap::new();

    for dir in dirs {
        let dir_rel = to_posix(&normalize_lexically(dir))
            .with_context(|| format!("Directory '{}' is outside the project", dir.display()))?;
        let is_file = project_root.join(dir).is_file();
        let basename = dir_rel.rsplit('/').next().unwrap_or_default();

        for rel in walker.collect(dir, None)? {
            let entry_name = if is_file {
                basename.to_string()
            } else if dir_rel.is_empty() {
                rel.clone()
            } else {
                let inner = rel.strip_prefix(&format!("{dir_rel}/")).unwrap_or(rel.as_str());
                format!("{basename}/{inner}")
            };

            let source = if dir_rel.is_empty() { ".".to_string() } else { dir_rel.clone() };
            if let Some(previous) = written.get(&entry_name) {
                anyhow::bail!(
                    "'{previous}' and '{source}' both produce archive entry '{entry_name}'; \
                     pack them separately"
                );
            }

            writer.add_file(&project_root.join(&rel), &entry_name, MissingFile::Skip)?;
            written.insert(entry_name, source);
        }
    }

    let archive = writer.finish()?;
    debug!(entries = archive.entries.len(), bytes = archive.len(), "Directory archive built");
    Ok(archive)
}
