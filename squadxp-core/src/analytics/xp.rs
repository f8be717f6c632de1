//! Per-agent XP from an invocation list
//!
//! | Component            | Rule                                                  |
//! |----------------------|-------------------------------------------------------|
//! | base_xp              | 20 per invocation                                     |
//! | success_bonus        | 30 per successful invocation                          |
//! | tool_mastery_bonus   | 15 per distinct tool                                  |
//! | complexity_bonus     | `int(avg_complexity * 40 * invocations)`              |
//! | collaboration_bonus  | 25 per invocation with any collaborator               |
//! | specialization_bonus | 20 per distinct project matching the agent's domain   |
//! | consistency_bonus    | 100 / 50 / 25 for 7+ / 3+ / 2+ distinct active days   |

use crate::catalog::primary_specialization;
use crate::types::{AgentInvocation, AgentXpCalculation, XpBonuses};
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

const BASE_XP_PER_INVOCATION: u64 = 20;
const SUCCESS_XP: u64 = 30;
const TOOL_MASTERY_XP: u64 = 15;
const COMPLEXITY_XP: f64 = 40.0;
const COLLABORATION_XP: u64 = 25;
const SPECIALIZATION_XP_PER_PROJECT: u64 = 20;

/// XP for every agent in `invocations`, keyed by agent name.
pub fn calculate_agent_xp(invocations: &[AgentInvocation]) -> BTreeMap<String, AgentXpCalculation> {
    let mut by_agent: BTreeMap<&str, Vec<&AgentInvocation>> = BTreeMap::new();
    for inv in invocations {
        by_agent.entry(inv.agent_name.as_str()).or_default().push(inv);
    }

    by_agent
        .into_iter()
        .map(|(name, invs)| (name.to_string(), agent_xp(name, &invs)))
        .collect()
}

/// XP for one agent from its invocations.
pub fn agent_xp(agent_name: &str, invocations: &[&AgentInvocation]) -> AgentXpCalculation {
    let count = invocations.len() as u64;
    if count == 0 {
        return AgentXpCalculation::from_bonuses(agent_name, XpBonuses::default());
    }

    let successes = invocations.iter().filter(|i| i.success).count() as u64;

    let unique_tools: BTreeSet<&str> = invocations
        .iter()
        .flat_map(|i| i.tools_used.iter().map(String::as_str))
        .collect();

    let avg_complexity =
        invocations.iter().map(|i| i.complexity_score).sum::<f64>() / invocations.len() as f64;
    let complexity_bonus = (avg_complexity * COMPLEXITY_XP * count as f64).max(0.0) as u64;

    let collaborative = invocations
        .iter()
        .filter(|i| !i.collaboration_agents.is_empty())
        .count() as u64;

    AgentXpCalculation::from_bonuses(
        agent_name,
        XpBonuses {
            base_xp: count * BASE_XP_PER_INVOCATION,
            success_bonus: successes * SUCCESS_XP,
            tool_mastery_bonus: unique_tools.len() as u64 * TOOL_MASTERY_XP,
            complexity_bonus,
            collaboration_bonus: collaborative * COLLABORATION_XP,
            specialization_bonus: specialization_bonus(agent_name, invocations),
            consistency_bonus: consistency_bonus(invocations),
        },
    )
}

/// 20 XP per distinct project whose path mentions the agent's primary
/// specialization or one of its member agents.
///
/// Paths are also checked in their projects-directory form (`/` as `-`),
/// since decoding splits hyphenated names like `ml-engineer`.
pub fn specialization_bonus(agent_name: &str, invocations: &[&AgentInvocation]) -> u64 {
    let Some((domain, members)) = primary_specialization(agent_name) else {
        return 0;
    };

    let matching: BTreeSet<&str> = invocations
        .iter()
        .filter(|i| {
            let path = i.project_path.to_lowercase();
            let encoded = path.replace('/', "-");
            path.contains(domain)
                || members
                    .iter()
                    .any(|m| path.contains(m) || encoded.contains(m))
        })
        .map(|i| i.project_path.as_str())
        .collect();

    matching.len() as u64 * SPECIALIZATION_XP_PER_PROJECT
}

/// Bonus for use spread over distinct calendar days (UTC).
pub fn consistency_bonus(invocations: &[&AgentInvocation]) -> u64 {
    if invocations.len() < 2 {
        return 0;
    }

    let days: BTreeSet<NaiveDate> = invocations.iter().map(|i| i.timestamp.date_naive()).collect();
    match days.len() {
        n if n >= 7 => 100,
        n if n >= 3 => 50,
        2 => 25,
        _ => 0,
    }
}
