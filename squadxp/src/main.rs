//! squadxp - agent usage analytics and XP for Claude Code logs
//!
//! Reads session logs, attributes messages to named agents and reports
//! invocations, squad formations and XP as plain text.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Logs: $XDG_STATE_HOME/squadxp/squadxp.log (~/.local/state/squadxp/squadxp.log)
//! - Config: $XDG_CONFIG_HOME/squadxp/config.toml (~/.config/squadxp/config.toml)

mod render;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use squadxp_core::analytics::{self, AnalysisReport};
use squadxp_core::ingest::{ClaudeProjectsSource, ExtractOptions, InvocationAggregator};
use squadxp_core::registry::{AgentRegistry, SearchFilters};
use squadxp_core::Config;
use std::collections::BTreeSet;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "squadxp")]
#[command(about = "Agent usage analytics and XP for Claude Code logs")]
#[command(version)]
struct Args {
    /// Claude Code projects directory (default: ~/.claude/projects)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Days of history to analyze; 0 analyzes everything
    #[arg(long, global = true)]
    days: Option<u32>,

    /// Hide the progress bar
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Overview of agent activity in the analysis window
    Analyze,

    /// Most recent agent invocations
    Invocations {
        /// Number of invocations to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Detected squad formations
    Squads,

    /// XP leaderboard, or the XP breakdown of one agent
    Xp {
        /// Agent name
        agent: Option<String>,
    },

    /// Per-session metrics and XP
    Sessions,

    /// Level progress for the analyzed XP
    Levels {
        /// Show progress for this XP value instead of analyzing logs
        #[arg(long)]
        xp: Option<u64>,
    },

    /// Achievements unlocked and in progress
    Achievements,

    /// Agent definition files in the search paths
    Agents {
        /// Match name, description or specialties
        #[arg(short, long)]
        search: Option<String>,

        /// Only agents in this category
        #[arg(short, long)]
        category: Option<String>,

        /// List agents similar to this one
        #[arg(long, conflicts_with = "recommend")]
        similar: Option<String>,

        /// Recommend a squad for a project type (web-app, api, data-pipeline, ...)
        #[arg(long)]
        recommend: Option<String>,

        /// Tech stack for --recommend, comma separated
        #[arg(long, value_delimiter = ',', requires = "recommend")]
        tech: Vec<String>,
    },

    /// Write the full analysis as JSON
    Export {
        /// Output file
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Ensure XDG environment variables are set before using core library
    Config::ensure_xdg_env();

    let mut config = Config::load().context("failed to load configuration")?;
    if let Some(dir) = &args.log_dir {
        config.analysis.log_dir = Some(dir.clone());
    }
    if let Some(days) = args.days {
        config.analysis.days_back = days;
    }

    let _log_guard =
        squadxp_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!("squadxp starting");

    let days = config.analysis.days_back;

    match args.command {
        Command::Analyze => {
            let report = run_analysis(&config, args.quiet)?;
            render::overview(&report, days);
        }
        Command::Invocations { limit } => {
            let report = run_analysis(&config, args.quiet)?;
            render::invocations(&report, limit);
        }
        Command::Squads => {
            let report = run_analysis(&config, args.quiet)?;
            render::squads(&report);
        }
        Command::Xp { agent } => {
            let report = run_analysis(&config, args.quiet)?;
            match agent {
                Some(name) => {
                    let calc = report
                        .agent_xp
                        .get(&name)
                        .with_context(|| format!("no invocations found for agent '{}'", name))?;
                    render::xp_breakdown(calc);
                }
                None => render::xp_leaderboard(&report),
            }
        }
        Command::Sessions => {
            let report = run_analysis(&config, args.quiet)?;
            render::sessions(&report);
        }
        Command::Levels { xp: Some(xp) } => {
            println!("XP: {}", xp);
            render::level_report(xp, None, Utc::now());
        }
        Command::Levels { xp: None } => {
            let report = run_analysis(&config, args.quiet)?;
            let total: u64 = report.agent_xp.values().map(|x| x.total_xp).sum();
            let active_days: BTreeSet<NaiveDate> = report
                .invocations
                .iter()
                .map(|i| i.timestamp.date_naive())
                .collect();
            let daily = (!active_days.is_empty()).then(|| total as f64 / active_days.len() as f64);

            println!("XP: {}", total);
            render::level_report(total, daily, Utc::now());
        }
        Command::Achievements => {
            let report = run_analysis(&config, args.quiet)?;
            render::achievements(&report.player_stats());
        }
        Command::Agents {
            search,
            category,
            similar,
            recommend,
            tech,
        } => {
            let registry = AgentRegistry::from_config(&config);

            if let Some(name) = similar {
                render::agents(&registry.similar_agents(&name, 5));
            } else if let Some(project_type) = recommend {
                let tech: Vec<&str> = tech.iter().map(String::as_str).collect();
                render::squad_recommendation(
                    &project_type,
                    &registry.recommended_squad(&project_type, &tech),
                );
            } else {
                let filters = SearchFilters {
                    categories: category.into_iter().collect(),
                    ..Default::default()
                };
                let query = search.unwrap_or_default();
                render::agents(&registry.search(&query, &filters));
            }
        }
        Command::Export { path } => {
            let report = run_analysis(&config, args.quiet)?;
            analytics::export_json(&report, &path, days)
                .with_context(|| format!("failed to export to {}", path.display()))?;
            println!(
                "Exported {} invocations to {}",
                report.invocations.len(),
                path.display()
            );
        }
    }

    Ok(())
}

/// Scan the configured log directory with a progress bar on stderr.
fn run_analysis(config: &Config, quiet: bool) -> Result<AnalysisReport> {
    let log_dir = config.analysis.resolved_log_dir();
    tracing::info!(path = %log_dir.display(), "Analyzing logs");

    let aggregator = InvocationAggregator::new(
        Box::new(ClaudeProjectsSource::with_root(&log_dir)),
        ExtractOptions::from(&config.analysis),
    );
    let cutoff = analytics::cutoff_for_days(config.analysis.days_back, Utc::now());

    let pb = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(0)
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner} [{bar:40}] {pos}/{len} {msg}")
            .context("invalid progress template")?
            .progress_chars("#>-"),
    );

    let report = analytics::analyze_with_progress(&aggregator, cutoff, |current, total, path| {
        if current == 1 {
            pb.set_length(total as u64);
        }
        pb.set_position(current as u64);
        pb.set_message(
            path.file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("...")
                .to_string(),
        );
    })
    .with_context(|| format!("failed to analyze logs in {}", log_dir.display()))?;

    pb.finish_and_clear();

    for (path, error) in &report.scan.errors {
        eprintln!("warning: skipped {}: {}", path.display(), error);
    }

    Ok(report)
}
