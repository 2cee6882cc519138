//! Utility functions and helpers.
//!
//! - [`archive`]: In-memory zip archives of project files
//! - [`hash`]: Content hashing for manifests
//! - [`paths`]: Lexical path normalization and posix conversion
//!
//! # Examples
//!
//! ```
//! use patchwise::utils::format_size;
//!
//! assert_eq!(format_size(1024 * 1024), "1.00 MB");
//! ```

/// In-memory zip archive builder
pub mod archive;
/// Content hashing (SHA-1)
pub mod hash;
/// Path manipulation and resolution utilities
pub mod paths;

/// Formats a file size in bytes into a human-readable string with appropriate units.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn format_size(size: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", size.round() as u64, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

/// Pluralizes `word` for `count` items ("1 file", "3 files").
#[must_use]
pub fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}
