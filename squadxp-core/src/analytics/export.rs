//! JSON export of an analysis report

use crate::analytics::session_xp::SessionXpRecord;
use crate::analytics::summary::{leaderboard, AgentSummary, ProjectSummary, SessionMetrics};
use crate::analytics::AnalysisReport;
use crate::error::{Error, Result};
use crate::types::{AgentInvocation, AgentXpCalculation, SquadFormation};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// Aggregate counts at the top of an export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportSummary {
    pub total_invocations: usize,
    pub total_formations: usize,
    pub total_agents: usize,
    pub total_projects: usize,
    pub total_xp: u64,
    pub overall_success_rate: f64,
    pub total_tokens: u64,
    pub analysis_period_days: u32,
}

/// The exported document; collections are serialized field-for-field.
#[derive(Debug, Serialize)]
pub struct ExportDocument<'a> {
    pub generated_at: DateTime<Utc>,
    pub summary: ExportSummary,
    /// Agents ranked by total XP
    pub agent_xp: Vec<&'a AgentXpCalculation>,
    pub invocations: &'a [AgentInvocation],
    pub formations: &'a [SquadFormation],
    pub sessions: &'a [SessionMetrics],
    pub session_xp: &'a [SessionXpRecord],
    pub agents: &'a [AgentSummary],
    pub projects: &'a [ProjectSummary],
}

impl<'a> ExportDocument<'a> {
    pub fn from_report(
        report: &'a AnalysisReport,
        analysis_period_days: u32,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let successes = report.invocations.iter().filter(|i| i.success).count();
        let overall_success_rate = if report.invocations.is_empty() {
            0.0
        } else {
            successes as f64 / report.invocations.len() as f64
        };

        Self {
            generated_at,
            summary: ExportSummary {
                total_invocations: report.invocations.len(),
                total_formations: report.formations.len(),
                total_agents: report.agent_xp.len(),
                total_projects: report.projects.len(),
                total_xp: report.agent_xp.values().map(|x| x.total_xp).sum(),
                overall_success_rate,
                total_tokens: report.invocations.iter().map(|i| i.tokens_used).sum(),
                analysis_period_days,
            },
            agent_xp: leaderboard(&report.agent_xp),
            invocations: &report.invocations,
            formations: &report.formations,
            sessions: &report.sessions,
            session_xp: &report.session_xp,
            agents: &report.agents,
            projects: &report.projects,
        }
    }
}

/// Writes the report as pretty-printed JSON to `path`.
///
/// The document is written to a temporary sibling file first and renamed into
/// place, so readers never observe a partial export. Concurrent writers to the
/// same path are not coordinated.
pub fn export_json(report: &AnalysisReport, path: &Path, analysis_period_days: u32) -> Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::Export(format!("not a file path: {}", path.display())))?;

    let document = ExportDocument::from_report(report, analysis_period_days, Utc::now());
    let json = serde_json::to_string_pretty(&document)?;

    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    std::fs::write(&tmp_path, json)?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(Error::Export(format!(
            "failed to move export into place at {}: {}",
            path.display(),
            e
        )));
    }

    tracing::info!(
        path = %path.display(),
        invocations = document.summary.total_invocations,
        "Exported analysis"
    );
    Ok(())
}
