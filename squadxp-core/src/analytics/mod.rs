//! Analytics over extracted invocations
//!
//! [`analyze`] runs the whole pipeline over a log source:
//!
//! ```text
//! scan ──► link collaborations ──► formations ──► per-agent XP ──► session XP ──► summaries
//! ```
//!
//! Every stage accepts an empty invocation list and returns empty collections.
//!
//! ## Modules
//!
//! - [`squad`]: squad formation detection and synergy
//! - [`xp`]: per-agent XP from invocation lists
//! - [`session_xp`]: per-session XP with performance multipliers
//! - [`levels`]: the level table shared by every XP consumer
//! - [`achievements`]: achievement catalog and unlock checks
//! - [`summary`]: session, agent and project summaries, leaderboard
//! - [`export`]: JSON export

pub mod achievements;
pub mod export;
pub mod levels;
pub mod session_xp;
pub mod squad;
pub mod summary;
pub mod xp;

use crate::error::Result;
use crate::ingest::{link_collaborations, InvocationAggregator, ScanResult};
use crate::types::{AgentInvocation, AgentXpCalculation, SquadFormation};
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub use achievements::{check_achievements, PlayerStats};
pub use export::{export_json, ExportDocument};
pub use session_xp::SessionXpRecord;
pub use summary::{AgentSummary, ProjectSummary, SessionMetrics};

/// File-level statistics from the scan behind a report.
#[derive(Debug, Clone, Default)]
pub struct ScanStats {
    pub files_processed: usize,
    pub files_failed: usize,
    pub lines_skipped: usize,
    pub entries_skipped: usize,
    pub warnings: Vec<String>,
    pub errors: Vec<(PathBuf, String)>,
}

/// Everything one analysis run produces.
#[derive(Debug, Clone, Default)]
pub struct AnalysisReport {
    /// Invocations sorted by timestamp, collaboration sets filled in
    pub invocations: Vec<AgentInvocation>,
    pub formations: Vec<SquadFormation>,
    pub agent_xp: BTreeMap<String, AgentXpCalculation>,
    pub sessions: Vec<SessionMetrics>,
    /// Per-session XP, ordered by start time
    pub session_xp: Vec<SessionXpRecord>,
    /// Highest XP first
    pub agents: Vec<AgentSummary>,
    /// Most agent calls first
    pub projects: Vec<ProjectSummary>,
    pub scan: ScanStats,
}

impl AnalysisReport {
    pub fn player_stats(&self) -> PlayerStats {
        PlayerStats::from_analysis(&self.invocations, &self.agent_xp)
    }
}

/// Start of an analysis window `days` days before `now`; 0 means no cutoff.
pub fn cutoff_for_days(days: u32, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    (days > 0).then(|| now - Duration::days(i64::from(days)))
}

/// Scan the aggregator's source and compute every analytics collection.
pub fn analyze(
    aggregator: &InvocationAggregator,
    cutoff: Option<DateTime<Utc>>,
) -> Result<AnalysisReport> {
    analyze_with_progress(aggregator, cutoff, |_, _, _| {})
}

/// [`analyze`] with a per-file progress callback `(current, total, path)`.
pub fn analyze_with_progress<F>(
    aggregator: &InvocationAggregator,
    cutoff: Option<DateTime<Utc>>,
    progress: F,
) -> Result<AnalysisReport>
where
    F: FnMut(usize, usize, &Path),
{
    let ScanResult {
        invocations,
        files_processed,
        files_failed,
        lines_skipped,
        entries_skipped,
        warnings,
        errors,
    } = aggregator.scan_with_progress(cutoff, progress)?;

    let mut report = build_report(invocations);
    report.scan = ScanStats {
        files_processed,
        files_failed,
        lines_skipped,
        entries_skipped,
        warnings,
        errors,
    };
    Ok(report)
}

/// Compute formations, XP and summaries from an invocation list.
///
/// Collaboration sets are (re)linked first, so the list may come straight
/// from [`crate::ingest::extract_from_entries`].
pub fn build_report(mut invocations: Vec<AgentInvocation>) -> AnalysisReport {
    invocations.sort_by_key(|i| i.timestamp);
    link_collaborations(&mut invocations);

    let formations = squad::detect_formations(&invocations);
    let agent_xp = xp::calculate_agent_xp(&invocations);
    let sessions = summary::session_metrics(&invocations);
    let session_xp = session_xp::session_xp_records(&invocations);
    let agents = summary::agent_summaries(&invocations, &agent_xp);
    let projects = summary::project_summaries(&invocations);

    tracing::info!(
        invocations = invocations.len(),
        formations = formations.len(),
        agents = agent_xp.len(),
        "Analysis complete"
    );

    AnalysisReport {
        invocations,
        formations,
        agent_xp,
        sessions,
        session_xp,
        agents,
        projects,
        scan: ScanStats::default(),
    }
}
