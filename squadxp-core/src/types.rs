//! Core data types for squadxp
//!
//! These types represent the analysis data model: raw log entries read from
//! Claude Code JSONL files, the agent invocations extracted from them, and the
//! squad formations and XP calculations derived from those invocations.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

// ============================================
// Raw log entries
// ============================================

/// A single line of a Claude Code JSONL log.
///
/// Every field is optional; entries missing the fields an extraction step needs
/// are skipped by that step rather than rejected at parse time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogEntry {
    #[serde(rename = "type")]
    pub entry_type: Option<String>,
    pub timestamp: Option<String>,
    pub session_id: Option<String>,
    pub cwd: Option<String>,
    pub git_branch: Option<String>,
    pub message: Option<LogMessage>,
    /// Tool result attached to user entries; a string starting with "Error"
    /// marks a failed tool call.
    pub tool_use_result: Option<serde_json::Value>,
}

/// The `message` object of a log entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogMessage {
    pub role: Option<String>,
    pub model: Option<String>,
    /// Either a plain string or an array of content blocks.
    pub content: Option<serde_json::Value>,
    pub usage: Option<TokenUsage>,
}

/// Token counts reported on assistant messages.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenUsage {
    pub input_tokens: Option<u64>,
    pub output_tokens: Option<u64>,
    pub cache_creation_input_tokens: Option<u64>,
    pub cache_read_input_tokens: Option<u64>,
}

impl TokenUsage {
    /// Tokens attributed to an invocation: input + output + cache reads.
    pub fn attributed_total(&self) -> u64 {
        self.input_tokens.unwrap_or(0)
            + self.output_tokens.unwrap_or(0)
            + self.cache_read_input_tokens.unwrap_or(0)
    }
}

impl LogEntry {
    /// True for `user` and `assistant` entries.
    pub fn is_conversational(&self) -> bool {
        matches!(self.entry_type.as_deref(), Some("user") | Some("assistant"))
    }

    pub fn is_assistant(&self) -> bool {
        self.entry_type.as_deref() == Some("assistant")
    }

    /// Parsed timestamp, or `None` if absent or unparseable.
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp.as_deref().and_then(parse_timestamp)
    }

    /// Text content of the message.
    ///
    /// A string content is returned as is; for block content the `text` blocks
    /// are joined with a space. The result is trimmed.
    pub fn text_content(&self) -> String {
        let Some(content) = self.message.as_ref().and_then(|m| m.content.as_ref()) else {
            return String::new();
        };

        match content {
            serde_json::Value::String(s) => s.trim().to_string(),
            serde_json::Value::Array(blocks) => {
                let mut text = String::new();
                for block in blocks {
                    if block.get("type").and_then(|t| t.as_str()) == Some("text") {
                        if let Some(t) = block.get("text").and_then(|t| t.as_str()) {
                            text.push_str(t);
                            text.push(' ');
                        }
                    }
                }
                text.trim().to_string()
            }
            _ => String::new(),
        }
    }

    /// Compact JSON serialization of the message content (empty if none).
    pub fn content_json(&self) -> String {
        self.message
            .as_ref()
            .and_then(|m| m.content.as_ref())
            .and_then(|c| serde_json::to_string(c).ok())
            .unwrap_or_default()
    }

    pub fn model(&self) -> Option<&str> {
        self.message.as_ref().and_then(|m| m.model.as_deref())
    }

    pub fn usage(&self) -> Option<&TokenUsage> {
        self.message.as_ref().and_then(|m| m.usage.as_ref())
    }

    /// Returns the tool error carried by this entry, if any.
    ///
    /// Recognized markers are a `toolUseResult` string starting with "Error"
    /// and a `tool_result` content block flagged `is_error`. The returned
    /// string is the best available description of the failure.
    pub fn tool_error(&self) -> Option<String> {
        if let Some(serde_json::Value::String(result)) = &self.tool_use_result {
            if result.starts_with("Error") {
                let text = self.text_content();
                return Some(if text.is_empty() { result.clone() } else { text });
            }
        }

        let blocks = self
            .message
            .as_ref()
            .and_then(|m| m.content.as_ref())
            .and_then(|c| c.as_array())?;

        blocks
            .iter()
            .find(|b| {
                b.get("type").and_then(|t| t.as_str()) == Some("tool_result")
                    && b.get("is_error").and_then(|e| e.as_bool()) == Some(true)
            })
            .map(|b| match b.get("content") {
                Some(serde_json::Value::String(s)) if !s.is_empty() => s.clone(),
                _ => "Tool use error".to_string(),
            })
    }
}

/// Parses an ISO-8601 timestamp.
///
/// RFC 3339 strings (with `Z` or an offset) are converted to UTC; timestamps
/// without an offset are taken to be UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

// ============================================
// Analysis records
// ============================================

/// One attributed mention of an agent in one log entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInvocation {
    /// Canonical lowercase-hyphenated agent identifier
    pub agent_name: String,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub project_path: String,
    /// Truncated text of the mentioning message
    pub task_description: String,
    #[serde(default)]
    pub tools_used: BTreeSet<String>,
    pub success: bool,
    #[serde(default)]
    pub error_message: Option<String>,
    pub tokens_used: u64,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub git_branch: String,
    /// Other agents seen in the same session. Filled in by
    /// [`crate::ingest::link_collaborations`] once every file has been read.
    #[serde(default)]
    pub collaboration_agents: BTreeSet<String>,
    /// Heuristic task complexity in `0.0..=5.0`
    pub complexity_score: f64,
}

/// Two or more distinct agents working within one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SquadFormation {
    pub session_id: String,
    /// Sorted unique agent names (always at least two)
    pub agents: Vec<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub project_path: String,
    pub total_tasks: usize,
    pub success_rate: f64,
    /// Heuristic in `0.0..=1.0`
    pub synergy_score: f64,
    pub formation_type: String,
}

/// Itemized XP for one agent across an analysis window.
///
/// `total_xp` always equals [`AgentXpCalculation::itemized_sum`]; build values
/// through [`AgentXpCalculation::from_bonuses`] to keep it that way.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentXpCalculation {
    pub agent_name: String,
    pub base_xp: u64,
    pub success_bonus: u64,
    pub tool_mastery_bonus: u64,
    pub complexity_bonus: u64,
    pub collaboration_bonus: u64,
    pub specialization_bonus: u64,
    pub consistency_bonus: u64,
    pub total_xp: u64,
    pub level: u32,
    /// Cumulative XP needed for the next level (equal to the last threshold at max level)
    pub next_level_xp: u64,
}

/// The itemized components of an [`AgentXpCalculation`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XpBonuses {
    pub base_xp: u64,
    pub success_bonus: u64,
    pub tool_mastery_bonus: u64,
    pub complexity_bonus: u64,
    pub collaboration_bonus: u64,
    pub specialization_bonus: u64,
    pub consistency_bonus: u64,
}

impl AgentXpCalculation {
    /// Builds a calculation whose total, level and next-level threshold are
    /// derived from the given components.
    pub fn from_bonuses(agent_name: impl Into<String>, bonuses: XpBonuses) -> Self {
        let mut calc = Self {
            agent_name: agent_name.into(),
            base_xp: bonuses.base_xp,
            success_bonus: bonuses.success_bonus,
            tool_mastery_bonus: bonuses.tool_mastery_bonus,
            complexity_bonus: bonuses.complexity_bonus,
            collaboration_bonus: bonuses.collaboration_bonus,
            specialization_bonus: bonuses.specialization_bonus,
            consistency_bonus: bonuses.consistency_bonus,
            ..Default::default()
        };
        calc.total_xp = calc.itemized_sum();
        calc.level = crate::analytics::levels::level_for_xp(calc.total_xp);
        calc.next_level_xp = crate::analytics::levels::next_level_xp(calc.level);
        calc
    }

    /// Sum of the seven itemized components.
    pub fn itemized_sum(&self) -> u64 {
        self.base_xp
            + self.success_bonus
            + self.tool_mastery_bonus
            + self.complexity_bonus
            + self.collaboration_bonus
            + self.specialization_bonus
            + self.consistency_bonus
    }
}
