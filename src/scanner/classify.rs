//! Path classification independent of any ignore file.
//!
//! A path is *includable* when its extension (or well-known file name) is on
//! the allow-list and none of its segments is on the deny-list. Exclusion
//! always wins. All comparisons are case-insensitive.

use std::path::{Component, Path};

/// Extensions of source, markup and config files the service can analyze.
const SUPPORTED_EXTENSIONS: &[&str] = &[
    // Systems and compiled languages
    "c", "h", "cc", "cpp", "cxx", "hpp", "hh", "hxx", "rs", "go", "java", "kt", "kts", "scala",
    "swift", "m", "mm", "cs", "fs", "fsx", "vb", "zig", "nim", "d", "dart", "groovy",
    // Scripting languages
    "js", "jsx", "mjs", "cjs", "ts", "tsx", "mts", "cts", "py", "pyi", "rb", "php", "pl", "pm",
    "lua", "r", "jl", "ex", "exs", "erl", "hrl", "clj", "cljs", "hs", "ml", "mli", "elm",
    "sh", "bash", "zsh", "fish", "ps1", "psm1", "bat", "cmd",
    // Web and markup
    "html", "htm", "css", "scss", "sass", "less", "vue", "svelte", "astro", "md", "mdx",
    "rst", "txt", "xml", "svg",
    // Data and config
    "json", "jsonc", "json5", "yaml", "yml", "toml", "ini", "cfg", "conf", "properties",
    "gradle", "sql", "graphql", "gql", "proto", "tf", "hcl", "cmake", "mk",
];

/// Extension-less files recognized by full name.
const SUPPORTED_FILE_NAMES: &[&str] = &[
    "dockerfile",
    "makefile",
    "gemfile",
    "rakefile",
    "procfile",
    "jenkinsfile",
    "vagrantfile",
    "cmakelists.txt",
    ".gitignore",
    ".dockerignore",
    ".editorconfig",
    ".eslintrc",
    ".prettierrc",
    ".babelrc",
    ".npmrc",
    ".nvmrc",
    ".env.example",
];

/// Dotfiles allowed through the "hidden segment" rule.
const ALLOWED_DOTFILES: &[&str] = &[
    ".gitignore",
    ".dockerignore",
    ".editorconfig",
    ".eslintrc",
    ".eslintrc.js",
    ".eslintrc.json",
    ".eslintrc.cjs",
    ".eslintrc.yml",
    ".prettierrc",
    ".prettierrc.json",
    ".babelrc",
    ".npmrc",
    ".nvmrc",
    ".env.example",
    ".github",
];

/// Directory and file names that are never part of a project snapshot.
const EXCLUDED_SEGMENTS: &[&str] = &[
    // Version control
    ".git",
    ".svn",
    ".hg",
    // Dependencies
    "node_modules",
    "bower_components",
    "vendor",
    "venv",
    ".venv",
    "site-packages",
    // Build output
    "dist",
    "build",
    "out",
    "target",
    "bin",
    "obj",
    ".next",
    ".nuxt",
    // Caches and tooling state
    "__pycache__",
    ".cache",
    ".pytest_cache",
    ".mypy_cache",
    ".gradle",
    ".idea",
    ".vscode",
    "coverage",
    // Lockfiles
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "cargo.lock",
    "poetry.lock",
    "pipfile.lock",
    "composer.lock",
    "gemfile.lock",
    "go.sum",
];

/// Returns the lowercase file name of `path`, if any.
fn lowercase_name(path: &Path) -> Option<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
}

/// Whether the file's extension or name belongs to the allow-list.
#[must_use]
pub fn is_supported_code_file(path: &Path) -> bool {
    let Some(name) = lowercase_name(path) else {
        return false;
    };

    if SUPPORTED_FILE_NAMES.contains(&name.as_str()) {
        return true;
    }

    // `Path::extension` treats ".eslintrc" as a stem, so dotfiles never land here.
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

/// Whether a lowercase entry name is a dotfile that may be included.
#[must_use]
pub fn is_allowed_dotfile(name: &str) -> bool {
    ALLOWED_DOTFILES.contains(&name)
}

/// Whether any segment of `path` is on the deny-list.
#[must_use]
pub fn is_excluded_path(path: &Path) -> bool {
    path.components().any(|component| {
        let Component::Normal(segment) = component else {
            return false;
        };
        let segment = segment.to_string_lossy().to_lowercase();

        if EXCLUDED_SEGMENTS.contains(&segment.as_str()) {
            return true;
        }

        segment.starts_with('.') && !is_allowed_dotfile(&segment)
    })
}

/// Whether a file belongs in a manifest or archive. Exclusion wins.
#[must_use]
pub fn is_includable(path: &Path) -> bool {
    !is_excluded_path(path) && is_supported_code_file(path)
}
