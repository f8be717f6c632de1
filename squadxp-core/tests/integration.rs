//! Integration tests for the squadxp ingestion and analytics pipeline
//!
//! Log trees are written into temp directories laid out like
//! `~/.claude/projects`; `tests/fixtures/claude-code/` holds a captured session.

use chrono::{Duration, TimeZone, Utc};
use filetime::FileTime;
use serde_json::{json, Value};
use squadxp_core::analytics::{self, analyze, build_report, levels, squad, xp};
use squadxp_core::extract::detect_agents;
use squadxp_core::ingest::{ClaudeProjectsSource, ExtractOptions, InvocationAggregator};
use squadxp_core::types::AgentInvocation;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/claude-code")
}

/// Write a session log under `root/<project_dir>/<file>`.
fn write_session(root: &Path, project_dir: &str, file: &str, entries: &[Value]) -> PathBuf {
    let dir = root.join(project_dir);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(file);
    let body: Vec<String> = entries.iter().map(|e| e.to_string()).collect();
    std::fs::write(&path, body.join("\n") + "\n").unwrap();
    path
}

fn aggregator(root: &Path) -> InvocationAggregator {
    InvocationAggregator::new(
        Box::new(ClaudeProjectsSource::with_root(root)),
        ExtractOptions::default(),
    )
}

fn user(session: &str, ts: &str, text: &str) -> Value {
    json!({
        "type": "user",
        "sessionId": session,
        "timestamp": ts,
        "message": {"role": "user", "content": text}
    })
}

fn assistant(session: &str, ts: &str, text: &str, input: u64, output: u64) -> Value {
    json!({
        "type": "assistant",
        "sessionId": session,
        "timestamp": ts,
        "message": {
            "role": "assistant",
            "model": "claude-sonnet-4",
            "content": [{"type": "text", "text": text}],
            "usage": {"input_tokens": input, "output_tokens": output}
        }
    })
}

fn names(invocations: &[AgentInvocation]) -> Vec<&str> {
    invocations.iter().map(|i| i.agent_name.as_str()).collect()
}

// ============================================
// End-to-end scenarios
// ============================================

#[test]
fn test_two_agent_session_with_failure() {
    let dir = TempDir::new().unwrap();
    write_session(
        dir.path(),
        "-srv-payments",
        "sess-a.jsonl",
        &[
            assistant(
                "sess-a",
                "2025-04-01T10:00:00Z",
                "Using backend-architect to design the payments API",
                1000,
                500,
            ),
            user("sess-a", "2025-04-01T10:10:00Z", "/security-auditor review the auth flow"),
            json!({
                "type": "user",
                "sessionId": "sess-a",
                "timestamp": "2025-04-01T10:11:00Z",
                "message": {"role": "user", "content": [
                    {"type": "tool_result", "tool_use_id": "t1", "content": "token validation rejected", "is_error": true}
                ]},
                "toolUseResult": "Error: token validation rejected"
            }),
        ],
    );

    let report = analyze(&aggregator(dir.path()), None).unwrap();

    assert_eq!(names(&report.invocations), vec!["backend-architect", "security-auditor"]);
    let backend = &report.invocations[0];
    let auditor = &report.invocations[1];

    assert_eq!(backend.tokens_used, 1500);
    assert_eq!(backend.project_path, "/srv/payments");
    assert!(backend.success);
    assert!(!auditor.success);
    assert_eq!(
        auditor.error_message.as_deref(),
        Some("Error: token validation rejected")
    );

    assert_eq!(
        backend.collaboration_agents,
        BTreeSet::from(["security-auditor".to_string()])
    );
    assert_eq!(
        auditor.collaboration_agents,
        BTreeSet::from(["backend-architect".to_string()])
    );

    assert_eq!(report.formations.len(), 1);
    let formation = &report.formations[0];
    assert_eq!(formation.agents, vec!["backend-architect", "security-auditor"]);
    assert_eq!(formation.success_rate, 0.5);
    assert_eq!(formation.total_tasks, 2);
    assert_eq!(formation.end_time - formation.start_time, Duration::minutes(10));
}

#[test]
fn test_single_agent_xp_breakdown() {
    let start = Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap();
    let projects = ["/home/dev/python-etl", "/srv/api", "/srv/web", "/srv/cli"];

    let invocations: Vec<AgentInvocation> = (0..20)
        .map(|i| AgentInvocation {
            agent_name: "python-pro".to_string(),
            session_id: format!("s{}", i),
            timestamp: start + Duration::days(i % 8),
            project_path: projects[(i % 4) as usize].to_string(),
            task_description: "task".to_string(),
            tools_used: BTreeSet::from([format!("tool-{}", i % 12)]),
            success: true,
            error_message: None,
            tokens_used: 100,
            model: String::new(),
            git_branch: String::new(),
            collaboration_agents: BTreeSet::new(),
            complexity_score: 1.5,
        })
        .collect();

    let all = xp::calculate_agent_xp(&invocations);
    let calc = &all["python-pro"];

    assert_eq!(calc.base_xp, 400);
    assert_eq!(calc.success_bonus, 600);
    assert_eq!(calc.tool_mastery_bonus, 180);
    assert_eq!(calc.consistency_bonus, 100);
    assert_eq!(calc.specialization_bonus, 20);
    assert_eq!(calc.complexity_bonus, 1200);
    assert_eq!(calc.collaboration_bonus, 0);
    assert_eq!(calc.total_xp, 2500);
    assert_eq!(calc.level, levels::level_for_xp(2500));
}

#[test]
fn test_empty_log_directory() {
    let dir = TempDir::new().unwrap();

    let report = analyze(&aggregator(dir.path()), None).unwrap();
    assert!(report.invocations.is_empty());
    assert!(report.formations.is_empty());
    assert!(report.agent_xp.is_empty());
    assert_eq!(report.scan.files_processed, 0);

    let missing = analyze(&aggregator(&dir.path().join("absent")), None).unwrap();
    assert!(missing.invocations.is_empty());
    assert!(missing.agent_xp.is_empty());
}

#[test]
fn test_fixture_session() {
    let report = analyze(&aggregator(&fixture_root()), None).unwrap();

    assert_eq!(report.scan.files_processed, 1);
    assert_eq!(report.scan.lines_skipped, 1);
    assert!(report.scan.warnings[0].contains(":4: JSON parse error"));

    assert_eq!(names(&report.invocations), vec!["python-pro", "test-engineer"]);
    let python = &report.invocations[0];
    let tests = &report.invocations[1];

    assert_eq!(python.session_id, "fixture-001");
    assert_eq!(python.project_path, "/home/dev/python/api");
    assert_eq!(python.git_branch, "feature/ingest");
    assert!(python.success);
    assert_eq!(python.tokens_used, 0);

    assert_eq!(tests.tokens_used, 1400);
    assert_eq!(tests.model, "claude-sonnet-4");
    assert_eq!(tests.tools_used, BTreeSet::from(["bash".to_string()]));
    assert!(!tests.success);
    assert_eq!(tests.error_message.as_deref(), Some("pytest: 2 failed"));

    assert_eq!(report.agent_xp["python-pro"].specialization_bonus, 20);
    assert_eq!(report.formations.len(), 1);
    assert_eq!(report.formations[0].success_rate, 0.5);
}

#[test]
fn test_specialization_matches_hyphenated_member_in_project_dir() {
    let dir = TempDir::new().unwrap();
    write_session(
        dir.path(),
        "-home-dev-ml-engineer-lab",
        "s.jsonl",
        &[user("s", "2025-04-01T10:00:00Z", "/python-pro tune the feature loader")],
    );

    let report = analyze(&aggregator(dir.path()), None).unwrap();

    assert_eq!(report.invocations[0].project_path, "/home/dev/ml/engineer/lab");
    assert_eq!(report.agent_xp["python-pro"].specialization_bonus, 20);
}

// ============================================
// Ingestion behavior
// ============================================

#[test]
fn test_malformed_lines_and_entries_are_tolerated() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("-work-app");
    std::fs::create_dir_all(&path).unwrap();
    std::fs::write(
        path.join("s.jsonl"),
        [
            "not json at all",
            r#"{"type":"user","sessionId":"s","message":{"content":"/rust-pro no timestamp"}}"#,
            r#"{"type":"user","sessionId":"s","timestamp":"yesterday","message":{"content":"/rust-pro bad timestamp"}}"#,
            "",
            r#"{"type":"user","sessionId":"s","timestamp":"2025-04-02T08:00:00","message":{"content":"/rust-pro port the parser"}}"#,
            "{\"truncated\":",
        ]
        .join("\n"),
    )
    .unwrap();

    let report = analyze(&aggregator(dir.path()), None).unwrap();
    assert_eq!(names(&report.invocations), vec!["rust-pro"]);
    assert_eq!(report.scan.lines_skipped, 2);
    assert_eq!(report.scan.entries_skipped, 2);
    assert!(report.scan.errors.is_empty());
}

#[test]
fn test_cutoff_skips_old_files() {
    let dir = TempDir::new().unwrap();
    let old = write_session(
        dir.path(),
        "-work-old",
        "old.jsonl",
        &[user("old", "2020-01-01T00:00:00Z", "/golang-pro old work")],
    );
    write_session(
        dir.path(),
        "-work-new",
        "new.jsonl",
        &[user("new", "2025-04-02T08:00:00Z", "/rust-pro new work")],
    );

    let old_mtime = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap().timestamp();
    filetime::set_file_mtime(&old, FileTime::from_unix_time(old_mtime, 0)).unwrap();

    let cutoff = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let report = analyze(&aggregator(dir.path()), Some(cutoff)).unwrap();
    assert_eq!(report.scan.files_processed, 1);
    assert_eq!(names(&report.invocations), vec!["rust-pro"]);

    let all = analyze(&aggregator(dir.path()), None).unwrap();
    assert_eq!(all.scan.files_processed, 2);
}

#[test]
fn test_collaboration_spans_files_of_one_session() {
    let dir = TempDir::new().unwrap();
    write_session(
        dir.path(),
        "-work-app",
        "part-1.jsonl",
        &[user("shared", "2025-04-02T08:00:00Z", "/python-pro write the loader")],
    );
    write_session(
        dir.path(),
        "-work-app",
        "part-2.jsonl",
        &[user("shared", "2025-04-02T08:30:00Z", "/test-engineer cover the loader")],
    );

    let report = analyze(&aggregator(dir.path()), None).unwrap();
    assert_eq!(report.formations.len(), 1);
    assert_eq!(
        report.invocations[0].collaboration_agents,
        BTreeSet::from(["test-engineer".to_string()])
    );
}

#[test]
fn test_progress_callback_sees_every_file() {
    let dir = TempDir::new().unwrap();
    for i in 0..3 {
        write_session(
            dir.path(),
            "-work-app",
            &format!("s{}.jsonl", i),
            &[user(&format!("s{}", i), "2025-04-02T08:00:00Z", "/rust-pro go")],
        );
    }

    let mut seen = Vec::new();
    analytics::analyze_with_progress(&aggregator(dir.path()), None, |current, total, _| {
        seen.push((current, total))
    })
    .unwrap();
    assert_eq!(seen, vec![(1, 3), (2, 3), (3, 3)]);
}

// ============================================
// Properties
// ============================================

const AGENT_TEXTS: &[&str] = &[
    "/backend-architect and /frontend-developer pair up",
    "Using python-pro, then call security-auditor.",
    "The squad: data-engineer plus ml-engineer",
    "nothing to see here",
    "/agents/rust-pro refactor /tmp/build",
];

#[test]
fn test_extraction_is_idempotent() {
    for text in AGENT_TEXTS {
        assert_eq!(detect_agents(text), detect_agents(text), "text: {}", text);
    }
}

#[test]
fn test_fan_out_shares_context() {
    let dir = TempDir::new().unwrap();
    write_session(
        dir.path(),
        "-work-app",
        "s.jsonl",
        &[user("s", "2025-04-02T08:00:00Z", AGENT_TEXTS[0])],
    );

    let report = analyze(&aggregator(dir.path()), None).unwrap();
    assert_eq!(report.invocations.len(), 2);
    let (a, b) = (&report.invocations[0], &report.invocations[1]);
    assert_ne!(a.agent_name, b.agent_name);
    assert_eq!(a.timestamp, b.timestamp);
    assert_eq!(a.session_id, b.session_id);
    assert_eq!(a.project_path, b.project_path);
}

#[test]
fn test_collaboration_symmetry() {
    let dir = TempDir::new().unwrap();
    write_session(
        dir.path(),
        "-work-app",
        "s.jsonl",
        &[
            user("s", "2025-04-02T08:00:00Z", "/python-pro build it"),
            user("s", "2025-04-02T08:05:00Z", "/rust-pro port it"),
            user("s", "2025-04-02T08:10:00Z", "/test-engineer check it"),
            user("s", "2025-04-02T08:15:00Z", "/python-pro polish it"),
        ],
    );

    let report = analyze(&aggregator(dir.path()), None).unwrap();
    let all: BTreeSet<String> = report.invocations.iter().map(|i| i.agent_name.clone()).collect();
    assert_eq!(all.len(), 3);

    for inv in &report.invocations {
        let mut expected = all.clone();
        expected.remove(&inv.agent_name);
        assert_eq!(inv.collaboration_agents, expected, "agent: {}", inv.agent_name);
    }
}

#[test]
fn test_xp_is_sum_of_components() {
    let report = analyze(&aggregator(&fixture_root()), None).unwrap();
    assert!(!report.agent_xp.is_empty());
    for calc in report.agent_xp.values() {
        assert_eq!(calc.total_xp, calc.itemized_sum(), "agent: {}", calc.agent_name);
        assert_eq!(
            calc.total_xp,
            calc.base_xp
                + calc.success_bonus
                + calc.tool_mastery_bonus
                + calc.complexity_bonus
                + calc.collaboration_bonus
                + calc.specialization_bonus
                + calc.consistency_bonus
        );
    }
}

#[test]
fn test_no_formation_for_single_agent_sessions() {
    let dir = TempDir::new().unwrap();
    write_session(
        dir.path(),
        "-work-app",
        "solo.jsonl",
        &[
            user("solo", "2025-04-02T08:00:00Z", "/python-pro one"),
            user("solo", "2025-04-02T08:01:00Z", "/python-pro two"),
        ],
    );
    write_session(
        dir.path(),
        "-work-app",
        "pair.jsonl",
        &[
            user("pair", "2025-04-02T09:00:00Z", "/python-pro one"),
            user("pair", "2025-04-02T09:01:00Z", "/rust-pro two"),
        ],
    );

    let report = analyze(&aggregator(dir.path()), None).unwrap();
    assert_eq!(report.formations.len(), 1);
    assert_eq!(report.formations[0].session_id, "pair");
    for formation in &report.formations {
        let distinct: BTreeSet<&String> = formation.agents.iter().collect();
        assert!(distinct.len() >= 2);
    }
}

#[test]
fn test_synergy_within_bounds() {
    let agents = [
        "python-pro",
        "data-engineer",
        "ml-engineer",
        "cloud-architect",
        "frontend-developer",
        "unknown-specialist",
    ];
    let start = Utc.with_ymd_and_hms(2025, 4, 2, 8, 0, 0).unwrap();

    for size in 2..=agents.len() {
        for gap_minutes in [0, 1, 30, 600] {
            for failures in 0..size {
                let invocations: Vec<AgentInvocation> = agents[..size]
                    .iter()
                    .enumerate()
                    .map(|(i, name)| AgentInvocation {
                        agent_name: name.to_string(),
                        session_id: "s".to_string(),
                        timestamp: start + Duration::minutes(i as i64 * gap_minutes),
                        project_path: "/p".to_string(),
                        task_description: String::new(),
                        tools_used: BTreeSet::new(),
                        success: i >= failures,
                        error_message: None,
                        tokens_used: 0,
                        model: String::new(),
                        git_branch: String::new(),
                        collaboration_agents: BTreeSet::new(),
                        complexity_score: 0.0,
                    })
                    .collect();
                let refs: Vec<&AgentInvocation> = invocations.iter().collect();
                let names: Vec<String> = agents[..size].iter().map(|s| s.to_string()).collect();

                let score = squad::synergy_score(&names, &refs);
                assert!((0.0..=1.0).contains(&score), "score {} out of bounds", score);

                for formation in build_report(invocations).formations {
                    assert!((0.0..=1.0).contains(&formation.synergy_score));
                }
            }
        }
    }
}

#[test]
fn test_levels_never_decrease() {
    let mut previous = levels::level_for_xp(0);
    let mut xp = 0u64;
    while xp < 20_000_000 {
        let level = levels::level_for_xp(xp);
        assert!(level >= previous, "level dropped at {} XP", xp);
        previous = level;
        xp += 997;
    }

    for pair in levels::thresholds().windows(2) {
        assert!(levels::level_for_xp(pair[0]) <= levels::level_for_xp(pair[1]));
        assert!(levels::level_for_xp(pair[1] - 1) <= levels::level_for_xp(pair[1]));
    }
}
