//! Claude Code project logs
//!
//! Reads session logs from `~/.claude/projects/[encoded-path]/*.jsonl`.
//!
//! Claude Code stores one directory per project, named after the project's
//! absolute path with every `/` replaced by `-`
//! (`/Users/alice/code/api` becomes `-Users-alice-code-api`). The encoding is
//! lossy: a `-` that was part of a directory name decodes to `/` as well.

use crate::config::Config;
use crate::ingest::source::LogSource;
use std::path::{Path, PathBuf};

/// Log source for the Claude Code projects directory.
pub struct ClaudeProjectsSource {
    root: PathBuf,
}

impl ClaudeProjectsSource {
    /// Source rooted at the default projects directory (`~/.claude/projects`).
    pub fn new() -> Self {
        Self {
            root: Config::default_log_dir(),
        }
    }

    /// Source with a custom root path (for testing or `--log-dir`).
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Default for ClaudeProjectsSource {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSource for ClaudeProjectsSource {
    fn name(&self) -> &str {
        "claude-code"
    }

    fn root_path(&self) -> &Path {
        &self.root
    }

    fn file_pattern(&self) -> &str {
        "*/*.jsonl"
    }

    fn project_path(&self, file: &Path) -> String {
        file.parent()
            .and_then(|p| p.file_name())
            .map(|name| decode_project_dir(&name.to_string_lossy()))
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Decodes a project directory name back into a path.
///
/// Names starting with `-` are encoded absolute paths; anything else is
/// returned unchanged.
pub fn decode_project_dir(name: &str) -> String {
    if !name.starts_with('-') {
        return name.to_string();
    }
    let decoded = name.replace('-', "/");
    let trimmed = decoded.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}
