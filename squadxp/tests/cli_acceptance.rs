use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

struct CliTestEnv {
    _temp_dir: TempDir,
    base: PathBuf,
    home: PathBuf,
    xdg_config: PathBuf,
    xdg_state: PathBuf,
}

impl CliTestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let base = temp_dir.path().to_path_buf();
        let home = base.join("home");
        let xdg_config = base.join("xdg-config");
        let xdg_state = base.join("xdg-state");

        fs::create_dir_all(&home).expect("failed to create HOME");
        fs::create_dir_all(&xdg_config).expect("failed to create XDG_CONFIG_HOME");
        fs::create_dir_all(&xdg_state).expect("failed to create XDG_STATE_HOME");

        seed_claude_fixture(&home);

        Self {
            _temp_dir: temp_dir,
            base,
            home,
            xdg_config,
            xdg_state,
        }
    }

    fn agents_dir(&self) -> PathBuf {
        self.home.join(".claude/agents")
    }
}

fn seed_claude_fixture(home: &Path) {
    let source = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(
        "../squadxp-core/tests/fixtures/claude-code/-home-dev-python-api/fixture-session.jsonl",
    );
    let target = home
        .join(".claude/projects/-home-dev-python-api")
        .join("fixture-session.jsonl");

    fs::create_dir_all(target.parent().expect("missing fixture parent"))
        .expect("failed to create claude fixture directories");
    fs::copy(source, target).expect("failed to copy claude fixture");
}

fn write_agent(env: &CliTestEnv, rel: &str, content: &str) {
    let path = env.agents_dir().join(rel);
    fs::create_dir_all(path.parent().expect("missing agent parent"))
        .expect("failed to create agent directories");
    fs::write(path, content).expect("failed to write agent file");
}

fn run_bin(env: &CliTestEnv, args: &[&str]) -> Output {
    let bin_path = PathBuf::from(assert_cmd::cargo::cargo_bin!("squadxp"));

    Command::new(bin_path)
        .args(args)
        .current_dir(&env.base)
        .env("HOME", &env.home)
        .env("XDG_CONFIG_HOME", &env.xdg_config)
        .env("XDG_STATE_HOME", &env.xdg_state)
        .output()
        .unwrap_or_else(|e| panic!("failed to execute squadxp: {e}"))
}

fn assert_success(args: &[&str], output: &Output) {
    if output.status.success() {
        return;
    }

    let rendered_args = args
        .iter()
        .map(|arg| OsString::from(arg).to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    panic!(
        "squadxp {rendered_args} failed\nstatus: {}\nstdout:\n{}\nstderr:\n{}",
        output.status, stdout, stderr
    );
}

fn run_ok(env: &CliTestEnv, args: &[&str]) -> String {
    let output = run_bin(env, args);
    assert_success(args, &output);
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn analyze_reports_fixture_agents() {
    let env = CliTestEnv::new();

    let stdout = run_ok(&env, &["analyze", "--days", "0", "-q"]);

    assert!(stdout.contains("Analysis window: all time"), "got:\n{stdout}");
    assert!(stdout.contains("Invocations:  2"), "got:\n{stdout}");
    assert!(stdout.contains("Squads:       1"), "got:\n{stdout}");
    assert!(stdout.contains("python-pro"));
    assert!(stdout.contains("test-engineer"));
    assert!(stdout.contains("/home/dev/python/api"));
}

#[test]
fn analyze_warns_about_malformed_lines() {
    let env = CliTestEnv::new();

    let stdout = run_ok(&env, &["analyze", "--days", "0", "-q"]);

    assert!(
        stdout.contains("1 processed, 0 failed, 1 malformed lines skipped"),
        "got:\n{stdout}"
    );
}

#[test]
fn empty_log_dir_is_not_an_error() {
    let env = CliTestEnv::new();
    let empty = env.base.join("empty-projects");
    fs::create_dir_all(&empty).expect("failed to create empty log dir");
    let empty = empty.to_string_lossy().into_owned();

    let stdout = run_ok(&env, &["analyze", "--log-dir", &empty, "-q"]);

    assert!(stdout.contains("Invocations:  0"), "got:\n{stdout}");
    assert!(stdout.contains("No agent invocations found."));
}

#[test]
fn invocations_lists_failures_with_errors() {
    let env = CliTestEnv::new();

    let stdout = run_ok(&env, &["invocations", "--days", "0", "-q"]);

    assert!(stdout.contains("Showing 2 of 2 invocations"), "got:\n{stdout}");
    assert!(stdout.contains("FAIL"));
    assert!(stdout.contains("error: pytest: 2 failed"));
}

#[test]
fn squads_lists_fixture_formation() {
    let env = CliTestEnv::new();

    let stdout = run_ok(&env, &["squads", "--days", "0", "-q"]);

    assert!(stdout.contains("fixture-001"), "got:\n{stdout}");
    assert!(stdout.contains("agents:  python-pro, test-engineer"));
    assert!(stdout.contains("success 50.0%"));
}

#[test]
fn xp_shows_leaderboard_and_breakdown() {
    let env = CliTestEnv::new();

    let board = run_ok(&env, &["xp", "--days", "0", "-q"]);
    assert!(board.contains("python-pro"), "got:\n{board}");
    assert!(board.contains("test-engineer"));

    let breakdown = run_ok(&env, &["xp", "python-pro", "--days", "0", "-q"]);
    assert!(breakdown.contains("specialization:"), "got:\n{breakdown}");
    assert!(breakdown.contains("total:"));
    assert!(breakdown.contains("level "));
}

#[test]
fn xp_for_unknown_agent_fails() {
    let env = CliTestEnv::new();

    let output = run_bin(&env, &["xp", "nobody", "--days", "0", "-q"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("no invocations found for agent 'nobody'"),
        "got:\n{stderr}"
    );
}

#[test]
fn sessions_show_session_xp() {
    let env = CliTestEnv::new();

    let stdout = run_ok(&env, &["sessions", "--days", "0", "-q"]);

    assert!(stdout.contains("fixture-001"), "got:\n{stdout}");
    assert!(stdout.contains("agents: python-pro, test-engineer"));
    assert!(stdout.contains("xp: "));
}

#[test]
fn levels_for_explicit_xp_skips_analysis() {
    let env = CliTestEnv::new();

    let stdout = run_ok(&env, &["levels", "--xp", "0"]);

    assert!(stdout.contains("XP: 0"), "got:\n{stdout}");
    assert!(stdout.contains("level 1"));
    assert!(!stdout.contains("Average daily XP"));
}

#[test]
fn levels_from_logs_include_timeline() {
    let env = CliTestEnv::new();

    let stdout = run_ok(&env, &["levels", "--days", "0", "-q"]);

    assert!(stdout.contains("Average daily XP"), "got:\n{stdout}");
    assert!(stdout.contains("XP to go"));
}

#[test]
fn achievements_lists_unlocked_and_pending() {
    let env = CliTestEnv::new();

    let stdout = run_ok(&env, &["achievements", "--days", "0", "-q"]);

    assert!(stdout.contains("Player: "), "got:\n{stdout}");
    assert!(stdout.contains("Unlocked ("));
    assert!(stdout.contains("In progress:"));
}

#[test]
fn export_writes_json_document() {
    let env = CliTestEnv::new();
    let path = env.base.join("report.json");
    let path_arg = path.to_string_lossy().into_owned();

    let stdout = run_ok(&env, &["export", &path_arg, "--days", "0", "-q"]);
    assert!(stdout.contains("Exported 2 invocations"), "got:\n{stdout}");

    let raw = fs::read_to_string(&path).expect("export file should exist");
    let doc: serde_json::Value = serde_json::from_str(&raw).expect("export should be JSON");
    assert_eq!(doc["summary"]["total_invocations"], 2);
    assert_eq!(doc["summary"]["total_formations"], 1);
    assert_eq!(doc["summary"]["analysis_period_days"], 0);
    assert_eq!(doc["invocations"][0]["agent_name"], "python-pro");
    assert_eq!(doc["session_xp"][0]["session_id"], "fixture-001");
}

#[test]
fn agents_filters_and_recommends() {
    let env = CliTestEnv::new();
    write_agent(
        &env,
        "security/security-auditor.md",
        "---\nname: security-auditor\ndescription: Reviews code for vulnerabilities\n---\nAudit everything.\n",
    );
    write_agent(
        &env,
        "development/rust-pro.md",
        "---\nname: rust-pro\ndescription: Writes idiomatic Rust with tokio\n---\nSystems work.\n",
    );

    let all = run_ok(&env, &["agents"]);
    assert!(all.contains("2 agent(s)"), "got:\n{all}");

    let security = run_ok(&env, &["agents", "--category", "security"]);
    assert!(security.contains("security-auditor"), "got:\n{security}");
    assert!(!security.contains("rust-pro"));

    let searched = run_ok(&env, &["agents", "--search", "idiomatic"]);
    assert!(searched.contains("rust-pro"), "got:\n{searched}");
    assert!(searched.contains("1 agent(s)"));

    let squad = run_ok(&env, &["agents", "--recommend", "api", "--tech", "rust,go"]);
    assert!(squad.contains("Recommended squad for api:"), "got:\n{squad}");
    assert!(squad.contains("- security-auditor"));
    assert!(squad.contains("- rust-pro"));
}
