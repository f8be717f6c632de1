//! Log source abstraction
//!
//! A [`LogSource`] knows where one kind of log tree lives, how to find its
//! files and how to map a file back to a project and session.
//!
//! ## Design Principles
//!
//! 1. **Resilience**: malformed lines become warnings, never errors
//! 2. **Read-only**: sources never modify the log tree
//! 3. **Extensible**: other log layouts only require implementing this trait

use crate::error::{Error, Result};
use crate::types::LogEntry;
use chrono::{DateTime, Utc};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// A log file discovered under a source root.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub modified_at: DateTime<Utc>,
    pub size_bytes: u64,
}

/// Entries read from one log file.
#[derive(Debug, Default)]
pub struct ReadResult {
    /// Successfully parsed entries, in file order
    pub entries: Vec<LogEntry>,
    /// One warning per skipped line
    pub warnings: Vec<String>,
}

/// Trait implemented by every log tree layout.
pub trait LogSource: Send + Sync {
    /// Human-readable source name for logging
    fn name(&self) -> &str;

    /// Root directory of the log tree
    fn root_path(&self) -> &Path;

    /// Whether the root exists and is a directory
    fn is_available(&self) -> bool {
        self.root_path().is_dir()
    }

    /// Glob pattern for log files, relative to [`Self::root_path`]
    fn file_pattern(&self) -> &str;

    /// Discover log files modified at or after `cutoff`, sorted by path.
    ///
    /// Files whose metadata cannot be read are skipped with a warning.
    fn discover_files(&self, cutoff: Option<DateTime<Utc>>) -> Result<Vec<SourceFile>> {
        if !self.is_available() {
            return Ok(vec![]);
        }

        let root = glob::Pattern::escape(&self.root_path().to_string_lossy());
        let pattern = format!("{}/{}", root, self.file_pattern());

        let paths =
            glob::glob(&pattern).map_err(|e| Error::Pattern(format!("{}: {}", pattern, e)))?;

        let mut files = Vec::new();
        for entry in paths {
            let path = match entry {
                Ok(path) => path,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping unreadable path during discovery");
                    continue;
                }
            };

            let metadata = match std::fs::metadata(&path) {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to stat log file");
                    continue;
                }
            };

            let modified_at: DateTime<Utc> = metadata
                .modified()
                .map(DateTime::from)
                .unwrap_or_else(|_| Utc::now());

            if cutoff.is_some_and(|c| modified_at < c) {
                tracing::trace!(path = %path.display(), "Skipping log file older than cutoff");
                continue;
            }

            files.push(SourceFile {
                path,
                modified_at,
                size_bytes: metadata.len(),
            });
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    /// Read every entry of a log file.
    ///
    /// Only I/O failures opening or reading the file return `Err`.
    fn read_entries(&self, path: &Path) -> Result<ReadResult> {
        read_jsonl(path)
    }

    /// Project path a log file belongs to
    fn project_path(&self, file: &Path) -> String;

    /// Session id used when an entry carries none
    fn session_id(&self, file: &Path) -> String {
        file.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Read a newline-delimited JSON file into [`LogEntry`] values.
///
/// Blank lines are ignored; lines that fail to parse produce a warning of the
/// form `<file>:<line>: JSON parse error: ...`. Invalid UTF-8 is replaced
/// rather than rejected.
pub fn read_jsonl(path: &Path) -> Result<ReadResult> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut result = ReadResult::default();
    let mut buf = Vec::new();
    let mut line_no = 0usize;

    loop {
        buf.clear();
        let read = reader.read_until(b'\n', &mut buf)?;
        if read == 0 {
            break;
        }
        line_no += 1;

        let line = String::from_utf8_lossy(&buf);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<LogEntry>(line) {
            Ok(entry) => result.entries.push(entry),
            Err(e) => {
                let warning = format!("{}:{}: JSON parse error: {}", path.display(), line_no, e);
                tracing::warn!("{}", warning);
                result.warnings.push(warning);
            }
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_read_jsonl_skips_blank_and_malformed_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.jsonl");
        let mut f = File::create(&path).unwrap();
        writeln!(f, r#"{{"type":"user","sessionId":"s1"}}"#).unwrap();
        writeln!(f).unwrap();
        writeln!(f, "{{not json").unwrap();
        write!(f, r#"{{"type":"assistant"}}"#).unwrap();

        let result = read_jsonl(&path).unwrap();
        assert_eq!(result.entries.len(), 2);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains(":3: JSON parse error"));
    }

    #[test]
    fn test_read_jsonl_missing_file_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(read_jsonl(&dir.path().join("missing.jsonl")).is_err());
    }
}
