//! Squad formation detection
//!
//! A squad is two or more distinct agents invoked within one session. Each
//! squad is classified against the named formation catalog, falling back to
//! the specialization domains its agents cover, and given a synergy score.

use crate::catalog::{specializations_for, FORMATIONS};
use crate::types::{AgentInvocation, SquadFormation};
use std::collections::{BTreeMap, BTreeSet};

/// Groups invocations by session and returns one formation per session with
/// at least two distinct agents, ordered by session id.
pub fn detect_formations(invocations: &[AgentInvocation]) -> Vec<SquadFormation> {
    let mut sessions: BTreeMap<&str, Vec<&AgentInvocation>> = BTreeMap::new();
    for inv in invocations {
        sessions.entry(inv.session_id.as_str()).or_default().push(inv);
    }

    let mut formations = Vec::new();

    for (session_id, mut session) in sessions {
        let agents: BTreeSet<&str> = session.iter().map(|i| i.agent_name.as_str()).collect();
        if agents.len() < 2 {
            continue;
        }

        session.sort_by_key(|i| i.timestamp);

        let (Some(first), Some(last)) = (session.first(), session.last()) else {
            continue;
        };

        let agents: Vec<String> = agents.into_iter().map(str::to_string).collect();

        formations.push(SquadFormation {
            session_id: session_id.to_string(),
            formation_type: classify_formation(&agents),
            start_time: first.timestamp,
            end_time: last.timestamp,
            project_path: first.project_path.clone(),
            total_tasks: session.len(),
            success_rate: success_rate(&session),
            synergy_score: synergy_score(&agents, &session),
            agents,
        });
    }

    tracing::debug!(formations = formations.len(), "Detected squad formations");
    formations
}

/// Names the formation a set of agents forms.
///
/// The first catalog formation sharing at least two agents wins. Otherwise
/// the label comes from the specialization domains covered: three or more is
/// `multi-disciplinary`, exactly two are joined with a hyphen, fewer is
/// `specialized`.
pub fn classify_formation(agents: &[String]) -> String {
    for (name, members) in FORMATIONS {
        let shared = agents
            .iter()
            .filter(|a| members.contains(&a.as_str()))
            .count();
        if shared >= 2 {
            return (*name).to_string();
        }
    }

    let domains = covered_specializations(agents);
    match domains.len() {
        0 | 1 => "specialized".to_string(),
        2 => domains.into_iter().collect::<Vec<_>>().join("-"),
        _ => "multi-disciplinary".to_string(),
    }
}

/// Synergy of a squad, in `0.0..=1.0`.
///
/// Mean of specialization diversity (distinct domains per agent, capped at
/// 1.0), session success rate and temporal coordination
/// (`1 - mean_gap_seconds / 3600`, floored at 0).
pub fn synergy_score(agents: &[String], session: &[&AgentInvocation]) -> f64 {
    if agents.len() < 2 || session.is_empty() {
        return 0.0;
    }

    let diversity =
        (covered_specializations(agents).len() as f64 / agents.len() as f64).min(1.0);

    let mut timestamps: Vec<_> = session.iter().map(|i| i.timestamp).collect();
    timestamps.sort();
    let gaps: Vec<f64> = timestamps
        .windows(2)
        .map(|w| (w[1] - w[0]).num_milliseconds() as f64 / 1000.0)
        .collect();
    let mean_gap = if gaps.is_empty() {
        0.0
    } else {
        gaps.iter().sum::<f64>() / gaps.len() as f64
    };
    let coordination = (1.0 - mean_gap / 3600.0).max(0.0);

    ((diversity + success_rate(session) + coordination) / 3.0).clamp(0.0, 1.0)
}

fn success_rate(session: &[&AgentInvocation]) -> f64 {
    if session.is_empty() {
        return 0.0;
    }
    session.iter().filter(|i| i.success).count() as f64 / session.len() as f64
}

fn covered_specializations(agents: &[String]) -> BTreeSet<&'static str> {
    agents
        .iter()
        .flat_map(|a| specializations_for(a))
        .collect()
}
