//! # squadxp-core
//!
//! Core library for squadxp - agent usage analytics and XP over Claude Code
//! session logs.
//!
//! This library provides:
//! - Domain types for log entries, agent invocations and squad formations
//! - Entity extraction (agent mentions, tools, outcomes) from log entries
//! - Log discovery and the two-pass invocation aggregator
//! - Analytics: squads, per-agent and per-session XP, levels, achievements
//! - A registry of agent definition files
//! - Configuration management and logging infrastructure
//!
//! ## Architecture
//!
//! Data flows through three layers:
//! - **Raw:** JSONL session logs on disk (read-only)
//! - **Extracted:** [`AgentInvocation`] records with collaboration links
//! - **Derived:** formations, XP, summaries (recomputed on every run)
//!
//! ## Example
//!
//! ```rust,no_run
//! use squadxp_core::analytics::{analyze, cutoff_for_days};
//! use squadxp_core::ingest::{ClaudeProjectsSource, ExtractOptions, InvocationAggregator};
//! use squadxp_core::Config;
//!
//! let config = Config::load().expect("failed to load config");
//! let aggregator = InvocationAggregator::new(
//!     Box::new(ClaudeProjectsSource::with_root(config.analysis.resolved_log_dir())),
//!     ExtractOptions::from(&config.analysis),
//! );
//! let cutoff = cutoff_for_days(config.analysis.days_back, chrono::Utc::now());
//! let report = analyze(&aggregator, cutoff).expect("analysis failed");
//! println!("{} invocations", report.invocations.len());
//! ```

// Re-export commonly used items at the crate root
pub use analytics::{analyze, AnalysisReport};
pub use config::Config;
pub use error::{Error, Result};
pub use ingest::{ExtractOptions, InvocationAggregator, ScanResult};
pub use registry::{AgentMetadata, AgentRegistry};
pub use types::*;

// Public modules
pub mod analytics;
pub mod catalog;
pub mod config;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod logging;
pub mod registry;
pub mod types;
