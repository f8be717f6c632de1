//! Entity extraction from log entries
//!
//! Agent names are detected in free text through three pattern classes:
//!
//! - **direct**: `/backend-architect`, `/agents/python-pro`
//! - **contextual**: `using python-pro`, `call security-auditor`
//! - **squad**: a suffixed name after `squad`, `team`, `collaboration` or
//!   `together`, within the same sentence
//!
//! Every candidate passes through [`is_valid_agent_name`] before it is
//! accepted. The remaining helpers pull tool usage, token counts and the
//! success signal from the entry a mention came from.

use crate::catalog::{COMPLEXITY_KEYWORDS, DOMAIN_KEYWORDS, KNOWN_TOOLS, ROLE_SUFFIXES};
use crate::types::LogEntry;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Maximum characters kept from an error description.
const ERROR_MESSAGE_CHARS: usize = 200;

static DIRECT_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"/(?:agents?/)?([a-z0-9\-_]+(?:-(?:{}))?)",
        ROLE_SUFFIXES.join("|")
    ))
    .expect("direct call pattern is valid")
});

static CONTEXT_MENTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b(?:using|with|invoke|call|run)\s+([a-z0-9\-_]+-(?:{}))\b",
        ROLE_SUFFIXES.join("|")
    ))
    .expect("context mention pattern is valid")
});

static SQUAD_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:squad|team|collaboration|together)\b")
        .expect("squad keyword pattern is valid")
});

static SUFFIXED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b([a-z0-9\-_]+-(?:{}))\b",
        ROLE_SUFFIXES.join("|")
    ))
    .expect("suffixed name pattern is valid")
});

static TOOL_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    KNOWN_TOOLS
        .iter()
        .map(|(id, name)| {
            let pattern = format!(r#""name":\s*"{}""#, name);
            (*id, Regex::new(&pattern).expect("tool pattern is valid"))
        })
        .collect()
});

/// Returns the distinct agent names mentioned in `text`.
///
/// Matching is case-insensitive; names are returned lowercase.
pub fn detect_agents(text: &str) -> BTreeSet<String> {
    let text = text.to_lowercase();
    let mut candidates = BTreeSet::new();

    for caps in DIRECT_CALL.captures_iter(&text) {
        candidates.insert(caps[1].to_string());
    }
    for caps in CONTEXT_MENTION.captures_iter(&text) {
        candidates.insert(caps[1].to_string());
    }
    for sentence in text.split(['.', '!', '?', '\n']) {
        if let Some(keyword) = SQUAD_KEYWORD.find(sentence) {
            for caps in SUFFIXED_NAME.captures_iter(&sentence[keyword.end()..]) {
                candidates.insert(caps[1].to_string());
            }
        }
    }

    candidates.retain(|name| is_valid_agent_name(name));
    candidates
}

/// A name is valid when one of its `-`-separated parts is a role suffix or
/// a domain keyword.
pub fn is_valid_agent_name(name: &str) -> bool {
    name.split('-')
        .any(|part| ROLE_SUFFIXES.contains(&part) || DOMAIN_KEYWORDS.contains(&part))
}

/// Tool identifiers used by an assistant entry.
pub fn detect_tools(entry: &LogEntry) -> BTreeSet<String> {
    if !entry.is_assistant() {
        return BTreeSet::new();
    }
    let content = entry.content_json();
    TOOL_PATTERNS
        .iter()
        .filter(|(_, pattern)| pattern.is_match(&content))
        .map(|(id, _)| id.to_string())
        .collect()
}

/// Tokens attributed to an assistant entry (input + output + cache reads).
pub fn token_usage(entry: &LogEntry) -> u64 {
    if !entry.is_assistant() {
        return 0;
    }
    entry.usage().map(|u| u.attributed_total()).unwrap_or(0)
}

/// Model name of an assistant entry, empty otherwise.
pub fn model_name(entry: &LogEntry) -> String {
    if !entry.is_assistant() {
        return String::new();
    }
    entry.model().unwrap_or_default().to_string()
}

/// Heuristic task complexity, capped at 5.0.
pub fn complexity_score(text: &str, unique_tools: usize, tokens: u64) -> f64 {
    let mut score = (text.chars().count() as f64 / 1000.0).min(2.0);

    score += unique_tools as f64 * 0.3;

    score += if tokens > 2000 {
        2.0
    } else if tokens > 1000 {
        1.0
    } else if tokens > 500 {
        0.5
    } else {
        0.0
    };

    let lower = text.to_lowercase();
    score += COMPLEXITY_KEYWORDS
        .iter()
        .filter(|kw| lower.contains(*kw))
        .count() as f64
        * 0.2;

    score.min(5.0)
}

/// Success signal for an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub success: bool,
    pub error_message: Option<String>,
}

/// Scans `entries[start..start + window]` for a failure marker.
///
/// The scan includes the mentioning entry itself and stops before any later
/// entry for which `closes_window` returns true. A tool error marker or the
/// words "error"/"failed" in message text mark the invocation as failed.
pub fn determine_outcome(
    entries: &[LogEntry],
    start: usize,
    window: usize,
    closes_window: impl Fn(usize) -> bool,
) -> Outcome {
    let end = start.saturating_add(window).min(entries.len());

    for idx in start..end {
        if idx > start && closes_window(idx) {
            break;
        }
        let entry = &entries[idx];

        if let Some(error) = entry.tool_error() {
            return Outcome {
                success: false,
                error_message: Some(truncate_chars(&error, ERROR_MESSAGE_CHARS)),
            };
        }

        let text = entry.text_content();
        let lower = text.to_lowercase();
        if lower.contains("error") || lower.contains("failed") {
            return Outcome {
                success: false,
                error_message: Some(truncate_chars(&text, ERROR_MESSAGE_CHARS)),
            };
        }
    }

    Outcome {
        success: true,
        error_message: None,
    }
}

/// First `max` characters of `s`.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
