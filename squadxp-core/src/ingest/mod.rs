//! Ingestion layer turning raw log files into agent invocations
//!
//! Analysis is a two-pass process: every discovered file is read and its
//! entries run through the extractor, then collaboration links are filled in
//! across the complete invocation list.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────────┐     ┌──────────────────┐
//! │   Log Files     │ ──► │ InvocationAggregator │ ──► │ AgentInvocation  │
//! │ (~/.claude/...) │     │  extract, then link  │     │  (+ collab sets) │
//! └─────────────────┘     └──────────────────────┘     └──────────────────┘
//!                               │
//!                               ▼
//!                    ┌────────────────────────┐
//!                    │  LogSource             │
//!                    │  └─ ClaudeProjectsSource│
//!                    └────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use squadxp_core::ingest::{ClaudeProjectsSource, ExtractOptions, InvocationAggregator};
//!
//! let aggregator = InvocationAggregator::new(
//!     Box::new(ClaudeProjectsSource::new()),
//!     ExtractOptions::default(),
//! );
//! let result = aggregator.scan(None)?;
//! println!("{} invocations from {} files", result.invocations.len(), result.files_processed);
//! ```

mod claude;
mod source;

pub use claude::{decode_project_dir, ClaudeProjectsSource};
pub use source::{read_jsonl, LogSource, ReadResult, SourceFile};

use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::extract;
use crate::types::{AgentInvocation, LogEntry};
use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// Tunables for turning entries into invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Entries inspected for a failure marker, starting at the mentioning entry
    pub lookahead_window: usize,
    /// Maximum characters kept in `task_description`
    pub task_description_chars: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            lookahead_window: 5,
            task_description_chars: 500,
        }
    }
}

impl From<&AnalysisConfig> for ExtractOptions {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            lookahead_window: config.lookahead_window,
            task_description_chars: config.task_description_chars,
        }
    }
}

/// Result of scanning a log tree.
#[derive(Debug, Default)]
pub struct ScanResult {
    /// Invocations sorted by timestamp, with collaboration sets filled in
    pub invocations: Vec<AgentInvocation>,
    /// Number of files read
    pub files_processed: usize,
    /// Number of files that could not be read
    pub files_failed: usize,
    /// Lines skipped because they were not valid JSON
    pub lines_skipped: usize,
    /// User/assistant entries skipped for a missing or invalid timestamp
    pub entries_skipped: usize,
    /// Warnings from reading files
    pub warnings: Vec<String>,
    /// Errors encountered (file path → error message)
    pub errors: Vec<(PathBuf, String)>,
}

/// Reads a log source and produces the linked invocation list.
pub struct InvocationAggregator {
    source: Box<dyn LogSource>,
    options: ExtractOptions,
}

impl InvocationAggregator {
    pub fn new(source: Box<dyn LogSource>, options: ExtractOptions) -> Self {
        Self { source, options }
    }

    pub fn source(&self) -> &dyn LogSource {
        self.source.as_ref()
    }

    pub fn options(&self) -> ExtractOptions {
        self.options
    }

    /// Scan every log file modified at or after `cutoff`.
    pub fn scan(&self, cutoff: Option<DateTime<Utc>>) -> Result<ScanResult> {
        self.scan_with_progress(cutoff, |_, _, _| {})
    }

    /// Scan with a progress callback.
    ///
    /// The callback receives `(current, total, path)` before each file is read.
    /// Unreadable files are recorded in [`ScanResult::errors`] and the scan
    /// continues; only an invalid discovery pattern fails the whole scan.
    pub fn scan_with_progress<F>(
        &self,
        cutoff: Option<DateTime<Utc>>,
        mut progress: F,
    ) -> Result<ScanResult>
    where
        F: FnMut(usize, usize, &Path),
    {
        let mut result = ScanResult::default();

        if !self.source.is_available() {
            tracing::info!(
                source = self.source.name(),
                root = %self.source.root_path().display(),
                "Log directory not found, nothing to analyze"
            );
            return Ok(result);
        }

        let files = self.source.discover_files(cutoff)?;
        let total = files.len();
        tracing::info!(source = self.source.name(), files = total, "Discovered log files");

        for (i, file) in files.iter().enumerate() {
            progress(i + 1, total, &file.path);

            let read = match self.source.read_entries(&file.path) {
                Ok(read) => read,
                Err(e) => {
                    tracing::warn!(
                        path = %file.path.display(),
                        error = %e,
                        "Failed to read log file"
                    );
                    result.files_failed += 1;
                    result.errors.push((file.path.clone(), e.to_string()));
                    continue;
                }
            };

            result.lines_skipped += read.warnings.len();
            result.warnings.extend(read.warnings);

            let project_path = self.source.project_path(&file.path);
            let fallback_session = self.source.session_id(&file.path);
            let extracted =
                extract_entries(&read.entries, &project_path, &fallback_session, &self.options);

            tracing::debug!(
                path = %file.path.display(),
                entries = read.entries.len(),
                invocations = extracted.invocations.len(),
                "Processed log file"
            );

            result.entries_skipped += extracted.entries_skipped;
            result.invocations.extend(extracted.invocations);
            result.files_processed += 1;
        }

        result.invocations.sort_by_key(|inv| inv.timestamp);
        link_collaborations(&mut result.invocations);

        tracing::info!(
            files_processed = result.files_processed,
            files_failed = result.files_failed,
            invocations = result.invocations.len(),
            "Scan complete"
        );

        Ok(result)
    }
}

struct Extracted {
    invocations: Vec<AgentInvocation>,
    entries_skipped: usize,
}

/// A user/assistant entry that mentions at least one agent.
struct Mention {
    timestamp: DateTime<Utc>,
    text: String,
    agents: BTreeSet<String>,
}

/// Extract invocations from the entries of one log file.
///
/// Every user or assistant entry with a valid timestamp and text is checked
/// for agent mentions; each distinct agent yields one invocation sharing the
/// entry's tools, tokens, model and outcome. `collaboration_agents` is left
/// empty; see [`link_collaborations`].
pub fn extract_from_entries(
    entries: &[LogEntry],
    project_path: &str,
    fallback_session_id: &str,
    options: &ExtractOptions,
) -> Vec<AgentInvocation> {
    extract_entries(entries, project_path, fallback_session_id, options).invocations
}

fn extract_entries(
    entries: &[LogEntry],
    project_path: &str,
    fallback_session_id: &str,
    options: &ExtractOptions,
) -> Extracted {
    let mut entries_skipped = 0;

    let mentions: Vec<Option<Mention>> = entries
        .iter()
        .map(|entry| {
            if !entry.is_conversational() {
                return None;
            }
            let Some(timestamp) = entry.parsed_timestamp() else {
                entries_skipped += 1;
                return None;
            };
            let text = entry.text_content();
            if text.is_empty() {
                return None;
            }
            let agents = extract::detect_agents(&text);
            if agents.is_empty() {
                return None;
            }
            Some(Mention {
                timestamp,
                text,
                agents,
            })
        })
        .collect();

    let mut invocations = Vec::new();

    for (idx, mention) in mentions.iter().enumerate() {
        let Some(mention) = mention else {
            continue;
        };
        let entry = &entries[idx];

        let tools = extract::detect_tools(entry);
        let tokens = extract::token_usage(entry);
        let outcome = extract::determine_outcome(entries, idx, options.lookahead_window, |j| {
            mentions[j].is_some()
        });
        let complexity = extract::complexity_score(&mention.text, tools.len(), tokens);
        let session_id = entry
            .session_id
            .clone()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| fallback_session_id.to_string());
        let task_description =
            extract::truncate_chars(&mention.text, options.task_description_chars);

        for agent in &mention.agents {
            invocations.push(AgentInvocation {
                agent_name: agent.clone(),
                session_id: session_id.clone(),
                timestamp: mention.timestamp,
                project_path: project_path.to_string(),
                task_description: task_description.clone(),
                tools_used: tools.clone(),
                success: outcome.success,
                error_message: outcome.error_message.clone(),
                tokens_used: tokens,
                model: extract::model_name(entry),
                git_branch: entry.git_branch.clone().unwrap_or_default(),
                collaboration_agents: BTreeSet::new(),
                complexity_score: complexity,
            });
        }
    }

    Extracted {
        invocations,
        entries_skipped,
    }
}

/// Fill in `collaboration_agents` across a complete invocation list.
///
/// Each invocation receives the other distinct agents seen in its session.
/// Must run after every file has been extracted.
pub fn link_collaborations(invocations: &mut [AgentInvocation]) {
    let mut agents_by_session: HashMap<String, BTreeSet<String>> = HashMap::new();
    for inv in invocations.iter() {
        agents_by_session
            .entry(inv.session_id.clone())
            .or_default()
            .insert(inv.agent_name.clone());
    }

    for inv in invocations.iter_mut() {
        inv.collaboration_agents = agents_by_session
            .get(&inv.session_id)
            .map(|agents| {
                agents
                    .iter()
                    .filter(|a| **a != inv.agent_name)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
    }
}
