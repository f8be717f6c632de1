//! Per-session XP
//!
//! Session XP is computed in four steps:
//!
//! 1. **Subtotal**: token XP + task XP + tool XP
//! 2. **Performance bonus**: the subtotal times (product of earned multipliers − 1)
//! 3. **Engagement**: flat bonuses for daily login and streaks, never multiplied
//! 4. **Total**: subtotal + performance bonus + engagement
//!
//! Multipliers are kept in thousandths so the reported bonus and total always
//! add up exactly.

use crate::analytics::levels;
use crate::types::AgentInvocation;
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

const INPUT_TOKENS_PER_XP: u64 = 100;
const OUTPUT_TOKENS_PER_XP: u64 = 50;
const CACHE_TOKENS_PER_XP: u64 = 200;

const TOOL_XP: u64 = 10;

/// Multipliers, in thousandths
const UNIT: u64 = 1000;
const TOOL_COMBO_MULTIPLIER: u64 = 1200;
const EFFICIENT_TOOL_MULTIPLIER: u64 = 1500;
const SPEED_MULTIPLIER: u64 = 2000;
const ZERO_ERRORS_MULTIPLIER: u64 = 1500;
const FIRST_TRY_MULTIPLIER: u64 = 1300;

const DAILY_LOGIN_XP: u64 = 100;
const WEEK_STREAK_XP: u64 = 1000;
const MONTH_STREAK_XP: u64 = 5000;

/// Complexity class of a completed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskComplexity {
    Simple,
    Medium,
    Complex,
    Mission,
}

impl TaskComplexity {
    pub fn xp(self) -> u64 {
        match self {
            TaskComplexity::Simple => 50,
            TaskComplexity::Medium => 200,
            TaskComplexity::Complex => 500,
            TaskComplexity::Mission => 1000,
        }
    }

    /// Parses a complexity label; unrecognized labels count as simple.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "medium" => TaskComplexity::Medium,
            "complex" => TaskComplexity::Complex,
            "mission" | "epic" => TaskComplexity::Mission,
            _ => TaskComplexity::Simple,
        }
    }
}

/// What happened in one session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionActivity {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_tokens: u64,
    pub tasks: Vec<TaskComplexity>,
    /// Distinct tools used
    pub tools_used: BTreeSet<String>,
    pub efficient_tools: bool,
    pub fast_completion: bool,
    pub zero_errors: bool,
    pub first_try_success: bool,
    pub daily_login: bool,
    pub streak_days: u32,
}

/// Itemized session XP.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionXp {
    pub input_xp: u64,
    pub output_xp: u64,
    pub cache_xp: u64,
    pub token_xp: u64,
    pub task_xp: u64,
    pub tool_xp: u64,
    /// token_xp + task_xp + tool_xp
    pub subtotal: u64,
    /// Product of earned performance multipliers, in thousandths
    pub multiplier_milli: u64,
    pub multiplier_reasons: Vec<&'static str>,
    pub performance_bonus: u64,
    pub engagement_xp: u64,
    pub total_xp: u64,
    pub level: u32,
}

impl SessionXp {
    /// Multiplier as a float (`3.9` when all three performance flags are set).
    pub fn multiplier(&self) -> f64 {
        self.multiplier_milli as f64 / UNIT as f64
    }
}

pub fn calculate_session_xp(activity: &SessionActivity) -> SessionXp {
    let input_xp = activity.input_tokens / INPUT_TOKENS_PER_XP;
    let output_xp = activity.output_tokens / OUTPUT_TOKENS_PER_XP;
    let cache_xp = activity.cache_tokens / CACHE_TOKENS_PER_XP;
    let token_xp = input_xp + output_xp + cache_xp;

    let task_xp = activity.tasks.iter().map(|t| t.xp()).sum::<u64>();

    let tool_count = activity.tools_used.len() as u64;
    let mut tool_xp = tool_count * TOOL_XP;
    if tool_count > 3 {
        tool_xp = tool_xp * TOOL_COMBO_MULTIPLIER / UNIT;
    }
    if activity.efficient_tools {
        tool_xp = tool_xp * EFFICIENT_TOOL_MULTIPLIER / UNIT;
    }

    let subtotal = token_xp + task_xp + tool_xp;

    let mut multiplier_milli = UNIT;
    let mut multiplier_reasons = Vec::new();
    for (earned, factor, reason) in [
        (activity.fast_completion, SPEED_MULTIPLIER, "Speed Demon"),
        (activity.zero_errors, ZERO_ERRORS_MULTIPLIER, "Flawless Execution"),
        (activity.first_try_success, FIRST_TRY_MULTIPLIER, "First Try Success"),
    ] {
        if earned {
            multiplier_milli = multiplier_milli * factor / UNIT;
            multiplier_reasons.push(reason);
        }
    }
    let performance_bonus = subtotal * (multiplier_milli - UNIT) / UNIT;

    let mut engagement_xp = 0;
    if activity.daily_login {
        engagement_xp += DAILY_LOGIN_XP;
    }
    if activity.streak_days >= 7 {
        engagement_xp += WEEK_STREAK_XP;
    }
    if activity.streak_days >= 30 {
        engagement_xp += MONTH_STREAK_XP;
    }

    let total_xp = subtotal + performance_bonus + engagement_xp;

    SessionXp {
        input_xp,
        output_xp,
        cache_xp,
        token_xp,
        task_xp,
        tool_xp,
        subtotal,
        multiplier_milli,
        multiplier_reasons,
        performance_bonus,
        engagement_xp,
        total_xp,
        level: levels::level_for_xp(total_xp),
    }
}

// ============================================
// Sessions from invocations
// ============================================

const COMPLEX_TASK_WORDS: &[&str] = &[
    "architecture",
    "refactor",
    "implement",
    "design",
    "system",
    "framework",
    "api",
    "database",
];
const MEDIUM_TASK_WORDS: &[&str] = &[
    "debug", "fix", "update", "modify", "enhance", "optimize", "test", "analyze",
];

/// Sessions shorter than this with no failures earn the speed multiplier.
const FAST_SESSION_SECS: i64 = 60;

impl TaskComplexity {
    /// Classifies a task by the words in its description.
    pub fn from_task(description: &str) -> Self {
        let lower = description.to_lowercase();
        if COMPLEX_TASK_WORDS.iter().any(|w| lower.contains(w)) {
            TaskComplexity::Complex
        } else if MEDIUM_TASK_WORDS.iter().any(|w| lower.contains(w)) {
            TaskComplexity::Medium
        } else {
            TaskComplexity::Simple
        }
    }
}

impl SessionActivity {
    /// Activity of one session's invocations.
    ///
    /// Invocations carry a single combined token count, which is rated at the
    /// input-token rate. `streak_days` is the run of consecutive active days
    /// ending on the session's day. A session needs a measurable span (first
    /// to last invocation) to count as a fast completion.
    pub fn from_invocations(invocations: &[&AgentInvocation], streak_days: u32) -> Self {
        let total = invocations.len();
        let successes = invocations.iter().filter(|i| i.success).count();
        let zero_errors = total > 0 && successes == total;

        let span_secs = match (
            invocations.iter().map(|i| i.timestamp).min(),
            invocations.iter().map(|i| i.timestamp).max(),
        ) {
            (Some(start), Some(end)) => (end - start).num_seconds(),
            _ => 0,
        };

        Self {
            input_tokens: invocations.iter().map(|i| i.tokens_used).sum(),
            output_tokens: 0,
            cache_tokens: 0,
            tasks: invocations
                .iter()
                .map(|i| TaskComplexity::from_task(&i.task_description))
                .collect(),
            tools_used: invocations
                .iter()
                .flat_map(|i| i.tools_used.iter().cloned())
                .collect(),
            efficient_tools: false,
            fast_completion: zero_errors && span_secs > 0 && span_secs < FAST_SESSION_SECS,
            zero_errors,
            first_try_success: successes > 0
                && (zero_errors || successes as f64 / total as f64 > 0.9),
            daily_login: total > 0,
            streak_days,
        }
    }
}

/// XP earned in one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionXpRecord {
    pub session_id: String,
    pub start_time: DateTime<Utc>,
    pub streak_days: u32,
    pub xp: SessionXp,
}

/// Session XP for every session in `invocations`, ordered by start time.
pub fn session_xp_records(invocations: &[AgentInvocation]) -> Vec<SessionXpRecord> {
    let mut sessions: BTreeMap<&str, Vec<&AgentInvocation>> = BTreeMap::new();
    for inv in invocations {
        sessions.entry(inv.session_id.as_str()).or_default().push(inv);
    }
    let active_days: BTreeSet<NaiveDate> =
        invocations.iter().map(|i| i.timestamp.date_naive()).collect();

    let mut records: Vec<SessionXpRecord> = sessions
        .into_iter()
        .filter_map(|(session_id, invs)| {
            let start_time = invs.iter().map(|i| i.timestamp).min()?;
            let streak_days = streak_ending_on(&active_days, start_time.date_naive());
            let activity = SessionActivity::from_invocations(&invs, streak_days);
            Some(SessionXpRecord {
                session_id: session_id.to_string(),
                start_time,
                streak_days,
                xp: calculate_session_xp(&activity),
            })
        })
        .collect();

    records.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then_with(|| a.session_id.cmp(&b.session_id))
    });
    records
}

/// Consecutive active days ending on `day` (0 if `day` is not active).
pub fn streak_ending_on(active_days: &BTreeSet<NaiveDate>, day: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut current = Some(day);
    while let Some(d) = current.filter(|d| active_days.contains(d)) {
        streak += 1;
        current = d.checked_sub_days(Days::new(1));
    }
    streak
}
