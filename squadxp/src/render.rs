//! Plain-text rendering of analysis results

use chrono::{DateTime, Utc};
use squadxp_core::analytics::achievements::{self, PlayerStats};
use squadxp_core::analytics::levels::{self, LevelProgress};
use squadxp_core::analytics::summary::leaderboard;
use squadxp_core::analytics::AnalysisReport;
use squadxp_core::registry::AgentMetadata;
use squadxp_core::types::AgentXpCalculation;

/// Width of task descriptions in listings
const TASK_WIDTH: usize = 60;

pub fn overview(report: &AnalysisReport, days: u32) {
    let scan = &report.scan;
    let successes = report.invocations.iter().filter(|i| i.success).count();
    let total_xp: u64 = report.agent_xp.values().map(|x| x.total_xp).sum();

    println!("Analysis window: {}", window_label(days));
    println!(
        "Files: {} processed, {} failed, {} malformed lines skipped",
        scan.files_processed, scan.files_failed, scan.lines_skipped
    );
    println!();
    println!("Invocations:  {}", report.invocations.len());
    println!("Agents:       {}", report.agent_xp.len());
    println!("Projects:     {}", report.projects.len());
    println!("Sessions:     {}", report.sessions.len());
    println!("Squads:       {}", report.formations.len());
    println!(
        "Success rate: {}",
        percent(rate(successes, report.invocations.len()))
    );
    println!("Total XP:     {}", total_xp);

    if report.invocations.is_empty() {
        println!();
        println!("No agent invocations found.");
        return;
    }

    println!();
    println!("Top agents:");
    for calc in leaderboard(&report.agent_xp).into_iter().take(5) {
        println!(
            "  {:<28} L{:<4} {:>8} XP",
            calc.agent_name, calc.level, calc.total_xp
        );
    }

    if !report.projects.is_empty() {
        println!();
        println!("Busiest projects:");
        for project in report.projects.iter().take(5) {
            println!(
                "  {:<40} {:>4} calls, {} agents",
                project.project_path,
                project.total_agent_calls,
                project.unique_agents.len()
            );
        }
    }
}

pub fn invocations(report: &AnalysisReport, limit: usize) {
    if report.invocations.is_empty() {
        println!("No agent invocations found.");
        return;
    }

    println!(
        "Showing {} of {} invocations (newest first)",
        limit.min(report.invocations.len()),
        report.invocations.len()
    );
    for inv in report.invocations.iter().rev().take(limit) {
        println!(
            "{}  {:<4} {:<28} {:>7} tok  {}",
            timestamp(inv.timestamp),
            if inv.success { "ok" } else { "FAIL" },
            inv.agent_name,
            inv.tokens_used,
            truncate(&inv.task_description, TASK_WIDTH)
        );
        if let Some(error) = &inv.error_message {
            println!("      error: {}", truncate(error, TASK_WIDTH));
        }
    }
}

pub fn squads(report: &AnalysisReport) {
    if report.formations.is_empty() {
        println!("No squad formations found.");
        return;
    }

    for formation in &report.formations {
        println!(
            "{} [{}] {}",
            formation.session_id, formation.formation_type, formation.project_path
        );
        println!("  agents:  {}", formation.agents.join(", "));
        println!(
            "  window:  {} .. {}",
            timestamp(formation.start_time),
            timestamp(formation.end_time)
        );
        println!(
            "  tasks:   {}  success {}  synergy {:.2}",
            formation.total_tasks,
            percent(formation.success_rate),
            formation.synergy_score
        );
    }
}

pub fn xp_leaderboard(report: &AnalysisReport) {
    if report.agent_xp.is_empty() {
        println!("No agent XP yet.");
        return;
    }

    println!("{:<4} {:<28} {:>6} {:>10}  {}", "#", "Agent", "Level", "XP", "Tier");
    for (rank, calc) in leaderboard(&report.agent_xp).into_iter().enumerate() {
        println!(
            "{:<4} {:<28} {:>6} {:>10}  {}",
            rank + 1,
            calc.agent_name,
            calc.level,
            calc.total_xp,
            levels::Tier::for_level(calc.level)
        );
    }
}

pub fn xp_breakdown(calc: &AgentXpCalculation) {
    println!("{}", calc.agent_name);
    println!("  base:            {:>8}", calc.base_xp);
    println!("  success:         {:>8}", calc.success_bonus);
    println!("  tool mastery:    {:>8}", calc.tool_mastery_bonus);
    println!("  complexity:      {:>8}", calc.complexity_bonus);
    println!("  collaboration:   {:>8}", calc.collaboration_bonus);
    println!("  specialization:  {:>8}", calc.specialization_bonus);
    println!("  consistency:     {:>8}", calc.consistency_bonus);
    println!("  total:           {:>8}", calc.total_xp);
    level_line(&levels::level_progress(calc.total_xp));
}

pub fn sessions(report: &AnalysisReport) {
    if report.sessions.is_empty() {
        println!("No sessions with agent activity.");
        return;
    }

    for metrics in &report.sessions {
        let xp = report
            .session_xp
            .iter()
            .find(|r| r.session_id == metrics.session_id);

        println!("{}  {}", metrics.session_id, timestamp(metrics.start_time));
        println!(
            "  {:.1} min, {} tokens, {} errors, success {}",
            metrics.duration_minutes,
            metrics.total_tokens,
            metrics.error_count,
            percent(metrics.success_rate)
        );
        println!(
            "  agents: {}",
            metrics.agents_invoked.iter().cloned().collect::<Vec<_>>().join(", ")
        );
        if let Some(record) = xp {
            let xp = &record.xp;
            let mut line = format!(
                "  xp: {} (base {} + bonus {} + engagement {})",
                xp.total_xp, xp.subtotal, xp.performance_bonus, xp.engagement_xp
            );
            if !xp.multiplier_reasons.is_empty() {
                line.push_str(&format!(
                    " x{:.2} {}",
                    xp.multiplier(),
                    xp.multiplier_reasons.join(", ")
                ));
            }
            println!("{}", line);
        }
    }
}

pub fn level_report(xp: u64, daily_xp: Option<f64>, now: DateTime<Utc>) {
    let progress = levels::level_progress(xp);
    level_line(&progress);

    let Some(daily_xp) = daily_xp.filter(|d| *d > 0.0) else {
        return;
    };
    println!("Average daily XP: {:.1}", daily_xp);
    for milestone in levels::level_timeline(xp, daily_xp, 5) {
        let eta = milestone
            .estimated_date(now)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  L{:<4} {:>10} XP to go   ~{}",
            milestone.level, milestone.xp_needed, eta
        );
    }
}

fn level_line(progress: &LevelProgress) {
    if progress.is_max_level {
        println!("  level {} ({}), max level", progress.level, progress.tier);
    } else {
        println!(
            "  level {} ({}), {:.1}% to next, {} XP to go",
            progress.level, progress.tier, progress.progress_percent, progress.xp_to_next
        );
    }
}

pub fn achievements(stats: &PlayerStats) {
    let unlocked = achievements::check_achievements(stats);
    let unlocked_xp: u64 = unlocked.iter().map(|a| a.xp_reward()).sum();

    println!(
        "Player: {} XP, level {}, {} tasks, {} agents, {} day streak",
        stats.total_xp,
        stats.level(),
        stats.total_tasks,
        stats.unique_agents,
        stats.streak_days
    );
    println!();
    println!("Unlocked ({}, {} XP):", unlocked.len(), unlocked_xp);
    for a in &unlocked {
        println!("  [x] {:<18} {:?}/{:?}  {}", a.name, a.rarity, a.category, a.description);
    }

    println!();
    println!("In progress:");
    for a in achievements::catalog()
        .iter()
        .filter(|a| !unlocked.iter().any(|u| u.id == a.id))
    {
        let (current, target) = stats.progress(a.condition);
        println!("  [ ] {:<18} {}/{}  {}", a.name, current, target, a.description);
    }
}

pub fn agents(agents: &[AgentMetadata]) {
    if agents.is_empty() {
        println!("No agents found.");
        return;
    }

    for agent in agents {
        let tech: Vec<&str> = agent.tech_stack.iter().map(String::as_str).collect();
        println!(
            "{:<28} {:<20} {:<12} {}",
            agent.name,
            agent.category,
            agent.difficulty,
            tech.join(",")
        );
        println!("  {}", truncate(&agent.description, 76));
    }
    println!();
    println!("{} agent(s)", agents.len());
}

pub fn squad_recommendation(project_type: &str, squad: &[String]) {
    println!("Recommended squad for {}:", project_type);
    for name in squad {
        println!("  - {}", name);
    }
}

fn window_label(days: u32) -> String {
    if days == 0 {
        "all time".to_string()
    } else {
        format!("last {} days", days)
    }
}

fn rate(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

pub fn percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

pub fn timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

/// First `max` characters, with `...` when cut.
pub fn truncate(s: &str, max: usize) -> String {
    let s = s.replace('\n', " ");
    if s.chars().count() <= max {
        return s;
    }
    let cut: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut)
}
