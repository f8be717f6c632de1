//! Session, agent and project summaries

use crate::types::{AgentInvocation, AgentXpCalculation};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Aggregate numbers for one session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionMetrics {
    pub session_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: f64,
    pub total_tokens: u64,
    pub tools_used: BTreeSet<String>,
    pub success_rate: f64,
    pub error_count: usize,
    pub agents_invoked: BTreeSet<String>,
}

/// Usage profile of one agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentSummary {
    pub name: String,
    pub total_invocations: usize,
    pub successful_tasks: usize,
    pub failed_tasks: usize,
    pub success_rate: f64,
    pub tokens_consumed: u64,
    pub tools_used: BTreeSet<String>,
    pub projects_worked_on: BTreeSet<String>,
    pub last_used: DateTime<Utc>,
    /// Mean span of the agent's multi-invocation sessions
    pub avg_session_minutes: f64,
    /// How concentrated the agent's use is, in `0.0..=1.0`
    pub focus_score: f64,
    pub xp: AgentXpCalculation,
}

/// Activity within one project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectSummary {
    pub project_path: String,
    pub total_agent_calls: usize,
    pub unique_agents: BTreeSet<String>,
    pub success_rate: f64,
    pub total_tokens: u64,
    pub active_days: usize,
    pub last_activity: DateTime<Utc>,
}

fn rate(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

fn minutes_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 60_000.0
}

/// One [`SessionMetrics`] per session, ordered by start time.
pub fn session_metrics(invocations: &[AgentInvocation]) -> Vec<SessionMetrics> {
    let mut sessions: BTreeMap<&str, Vec<&AgentInvocation>> = BTreeMap::new();
    for inv in invocations {
        sessions.entry(inv.session_id.as_str()).or_default().push(inv);
    }

    let mut metrics: Vec<SessionMetrics> = sessions
        .into_iter()
        .filter_map(|(session_id, invs)| {
            let start_time = invs.iter().map(|i| i.timestamp).min()?;
            let end_time = invs.iter().map(|i| i.timestamp).max()?;
            let successes = invs.iter().filter(|i| i.success).count();

            Some(SessionMetrics {
                session_id: session_id.to_string(),
                start_time,
                end_time,
                duration_minutes: minutes_between(start_time, end_time),
                total_tokens: invs.iter().map(|i| i.tokens_used).sum(),
                tools_used: invs.iter().flat_map(|i| i.tools_used.iter().cloned()).collect(),
                success_rate: rate(successes, invs.len()),
                error_count: invs.len() - successes,
                agents_invoked: invs.iter().map(|i| i.agent_name.clone()).collect(),
            })
        })
        .collect();

    metrics.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then_with(|| a.session_id.cmp(&b.session_id))
    });
    metrics
}

/// Focus: mean of project concentration, tool concentration and usage volume.
pub fn focus_score(projects: usize, tools: usize, invocations: usize) -> f64 {
    let project_focus = (5.0 / projects.max(1) as f64).min(1.0);
    let tool_focus = (10.0 / tools.max(1) as f64).min(1.0);
    let volume = (invocations as f64 / 20.0).min(1.0);
    (project_focus + tool_focus + volume) / 3.0
}

/// One [`AgentSummary`] per agent, highest XP first.
pub fn agent_summaries(
    invocations: &[AgentInvocation],
    agent_xp: &BTreeMap<String, AgentXpCalculation>,
) -> Vec<AgentSummary> {
    let mut by_agent: BTreeMap<&str, Vec<&AgentInvocation>> = BTreeMap::new();
    for inv in invocations {
        by_agent.entry(inv.agent_name.as_str()).or_default().push(inv);
    }

    let mut summaries: Vec<AgentSummary> = by_agent
        .into_iter()
        .filter_map(|(name, invs)| {
            let last_used = invs.iter().map(|i| i.timestamp).max()?;
            let successful = invs.iter().filter(|i| i.success).count();
            let tools: BTreeSet<String> =
                invs.iter().flat_map(|i| i.tools_used.iter().cloned()).collect();
            let projects: BTreeSet<String> = invs.iter().map(|i| i.project_path.clone()).collect();

            let mut spans: BTreeMap<&str, (DateTime<Utc>, DateTime<Utc>, usize)> = BTreeMap::new();
            for inv in &invs {
                let span = spans
                    .entry(inv.session_id.as_str())
                    .or_insert((inv.timestamp, inv.timestamp, 0));
                span.0 = span.0.min(inv.timestamp);
                span.1 = span.1.max(inv.timestamp);
                span.2 += 1;
            }
            let durations: Vec<f64> = spans
                .values()
                .filter(|(_, _, count)| *count > 1)
                .map(|(start, end, _)| minutes_between(*start, *end))
                .collect();
            let avg_session_minutes = if durations.is_empty() {
                0.0
            } else {
                durations.iter().sum::<f64>() / durations.len() as f64
            };

            Some(AgentSummary {
                name: name.to_string(),
                total_invocations: invs.len(),
                successful_tasks: successful,
                failed_tasks: invs.len() - successful,
                success_rate: rate(successful, invs.len()),
                tokens_consumed: invs.iter().map(|i| i.tokens_used).sum(),
                focus_score: focus_score(projects.len(), tools.len(), invs.len()),
                tools_used: tools,
                projects_worked_on: projects,
                last_used,
                avg_session_minutes,
                xp: agent_xp.get(name).cloned().unwrap_or_default(),
            })
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.xp.total_xp
            .cmp(&a.xp.total_xp)
            .then_with(|| a.name.cmp(&b.name))
    });
    summaries
}

/// One [`ProjectSummary`] per project, most agent calls first.
pub fn project_summaries(invocations: &[AgentInvocation]) -> Vec<ProjectSummary> {
    let mut by_project: BTreeMap<&str, Vec<&AgentInvocation>> = BTreeMap::new();
    for inv in invocations {
        by_project.entry(inv.project_path.as_str()).or_default().push(inv);
    }

    let mut summaries: Vec<ProjectSummary> = by_project
        .into_iter()
        .filter_map(|(path, invs)| {
            let last_activity = invs.iter().map(|i| i.timestamp).max()?;
            let successes = invs.iter().filter(|i| i.success).count();
            let days: BTreeSet<NaiveDate> = invs.iter().map(|i| i.timestamp.date_naive()).collect();

            Some(ProjectSummary {
                project_path: path.to_string(),
                total_agent_calls: invs.len(),
                unique_agents: invs.iter().map(|i| i.agent_name.clone()).collect(),
                success_rate: rate(successes, invs.len()),
                total_tokens: invs.iter().map(|i| i.tokens_used).sum(),
                active_days: days.len(),
                last_activity,
            })
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.total_agent_calls
            .cmp(&a.total_agent_calls)
            .then_with(|| a.project_path.cmp(&b.project_path))
    });
    summaries
}

/// Agents ranked by total XP, ties broken by name.
pub fn leaderboard(agent_xp: &BTreeMap<String, AgentXpCalculation>) -> Vec<&AgentXpCalculation> {
    let mut ranked: Vec<&AgentXpCalculation> = agent_xp.values().collect();
    ranked.sort_by(|a, b| {
        b.total_xp
            .cmp(&a.total_xp)
            .then_with(|| a.agent_name.cmp(&b.agent_name))
    });
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::xp::calculate_agent_xp;
    use chrono::{Duration, TimeZone};

    fn inv(
        agent: &str,
        session: &str,
        project: &str,
        minutes: i64,
        success: bool,
    ) -> AgentInvocation {
        AgentInvocation {
            agent_name: agent.to_string(),
            session_id: session.to_string(),
            timestamp: Utc.with_ymd_and_hms(2025, 4, 1, 8, 0, 0).unwrap()
                + Duration::minutes(minutes),
            project_path: project.to_string(),
            task_description: String::new(),
            tools_used: ["read".to_string()].into_iter().collect(),
            success,
            error_message: None,
            tokens_used: 100,
            model: String::new(),
            git_branch: String::new(),
            collaboration_agents: BTreeSet::new(),
            complexity_score: 1.0,
        }
    }

    fn sample() -> Vec<AgentInvocation> {
        vec![
            inv("python-pro", "s1", "/a", 0, true),
            inv("test-engineer", "s1", "/a", 30, false),
            inv("python-pro", "s1", "/a", 45, true),
            inv("python-pro", "s2", "/b", 24 * 60, true),
        ]
    }

    #[test]
    fn test_session_metrics() {
        let metrics = session_metrics(&sample());
        assert_eq!(metrics.len(), 2);

        let s1 = &metrics[0];
        assert_eq!(s1.session_id, "s1");
        assert_eq!(s1.duration_minutes, 45.0);
        assert_eq!(s1.total_tokens, 300);
        assert_eq!(s1.error_count, 1);
        assert!((s1.success_rate - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(s1.agents_invoked.len(), 2);

        assert_eq!(metrics[1].duration_minutes, 0.0);
        assert!(session_metrics(&[]).is_empty());
    }

    #[test]
    fn test_agent_summaries() {
        let invocations = sample();
        let xp = calculate_agent_xp(&invocations);
        let summaries = agent_summaries(&invocations, &xp);

        assert_eq!(summaries.len(), 2);
        let python = &summaries[0];
        assert_eq!(python.name, "python-pro");
        assert_eq!(python.total_invocations, 3);
        assert_eq!(python.failed_tasks, 0);
        assert_eq!(python.projects_worked_on.len(), 2);
        // Only s1 has more than one python-pro invocation
        assert_eq!(python.avg_session_minutes, 45.0);
        assert_eq!(python.xp, xp["python-pro"]);
        assert!(summaries[0].xp.total_xp >= summaries[1].xp.total_xp);
    }

    #[test]
    fn test_focus_score() {
        assert!((focus_score(1, 1, 20) - 1.0).abs() < 1e-9);
        // 10 projects -> 0.5, 20 tools -> 0.5, 10 invocations -> 0.5
        assert!((focus_score(10, 20, 10) - 0.5).abs() < 1e-9);
        assert!((focus_score(0, 0, 0) - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_project_summaries() {
        let summaries = project_summaries(&sample());
        assert_eq!(summaries[0].project_path, "/a");
        assert_eq!(summaries[0].total_agent_calls, 3);
        assert_eq!(summaries[0].unique_agents.len(), 2);
        assert_eq!(summaries[0].active_days, 1);
        assert_eq!(summaries[1].project_path, "/b");
    }

    #[test]
    fn test_leaderboard_order() {
        let xp = calculate_agent_xp(&sample());
        let board = leaderboard(&xp);
        assert_eq!(board[0].agent_name, "python-pro");
        assert_eq!(board[1].agent_name, "test-engineer");
        assert!(leaderboard(&BTreeMap::new()).is_empty());
    }
}
