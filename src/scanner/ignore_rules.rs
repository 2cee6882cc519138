//! Project-level `.gitignore` rules.

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;
use tracing::{debug, warn};

/// Name of the ignore file read from the project root.
pub const IGNORE_FILE: &str = ".gitignore";

/// Compiled gitignore patterns anchored at the project root.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    /// Compiled matcher; empty when the project has no ignore file
    matcher: Gitignore,
}

impl IgnoreRules {
    /// Load `.gitignore` from `project_root`.
    ///
    /// A missing file yields an empty rule set. A file that cannot be read or
    /// parsed is logged and also treated as empty.
    #[must_use]
    pub fn load(project_root: &Path) -> Self {
        let path = project_root.join(IGNORE_FILE);
        if !path.is_file() {
            debug!(root = %project_root.display(), "No ignore file");
            return Self::empty();
        }

        let mut builder = GitignoreBuilder::new(project_root);
        if let Some(err) = builder.add(&path) {
            warn!(path = %path.display(), error = %err, "Ignoring unreadable ignore file");
            return Self::empty();
        }

        match builder.build() {
            Ok(matcher) => {
                debug!(rules = matcher.num_ignores(), "Loaded ignore rules");
                Self { matcher }
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "Ignoring invalid ignore file");
                Self::empty()
            }
        }
    }

    /// Compile rules from in-memory lines, anchored at `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern is not valid gitignore syntax.
    pub fn from_lines<I, S>(root: &Path, lines: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GitignoreBuilder::new(root);
        for line in lines {
            builder.add_line(None, line.as_ref())?;
        }
        Ok(Self {
            matcher: builder.build()?,
        })
    }

    /// A rule set that ignores nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            matcher: Gitignore::empty(),
        }
    }

    /// Whether the rule set has no patterns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matcher.is_empty()
    }

    /// Whether a file path relative to the project root is ignored.
    ///
    /// Parent directories are checked too, so `build/` ignores
    /// `build/out/app.js`.
    #[must_use]
    pub fn ignores(&self, relative_path: &str) -> bool {
        if self.matcher.is_empty() || relative_path.is_empty() {
            return false;
        }
        self.matcher
            .matched_path_or_any_parents(Path::new(relative_path), false)
            .is_ignore()
    }
}

impl Default for IgnoreRules {
    fn default() -> Self {
        Self::empty()
    }
}
