//! CLI contract tests
//!
//! Runs the built binary against temporary candidate and config files.

use std::path::Path;
use std::process::Command;

fn riskplan_bin() -> String {
    env!("CARGO_BIN_EXE_riskplan").to_string()
}

const CANDIDATES: &str = r#"[
  {"id": "Auth", "risk_score": 0.9, "loc": 200, "complexity": 3, "module_path": "auth/service"},
  {"id": "Util", "risk_score": 0.2, "loc": 50, "complexity": 1, "module_path": "util"},
  {"id": "Orders", "risk_score": 0.6, "loc": 400, "complexity": 15, "module_path": "api/orders"}
]"#;

fn setup() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("risks.json"), CANDIDATES).unwrap();
    dir
}

fn run(dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(riskplan_bin())
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run riskplan");
    (
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

fn json_ids(stdout: &str) -> Vec<String> {
    let parsed: serde_json::Value = serde_json::from_str(stdout).expect("stdout is JSON");
    parsed["entries"]
        .as_array()
        .expect("entries array")
        .iter()
        .map(|e| e["id"].as_str().unwrap_or_default().to_string())
        .collect()
}

#[test]
fn test_prioritize_json_default_strategy() {
    let dir = setup();
    let (code, stdout, _) = run(dir.path(), &["prioritize", "risks.json", "--format", "json"]);
    assert_eq!(code, 0);
    assert_eq!(json_ids(&stdout), vec!["Auth", "Util", "Orders"]);
}

#[test]
fn test_prioritize_top_k() {
    let dir = setup();
    let (code, stdout, _) = run(
        dir.path(),
        &["prioritize", "risks.json", "--strategy", "top_k_coverage", "--k", "1", "-f", "json"],
    );
    assert_eq!(code, 0);
    assert_eq!(json_ids(&stdout), vec!["Auth"]);
}

#[test]
fn test_prioritize_text_output() {
    let dir = setup();
    let (code, stdout, _) = run(dir.path(), &["prioritize", "risks.json"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Prioritization Plan"));
    assert!(stdout.contains("Auth"));
}

#[test]
fn test_infeasible_budget_exits_nonzero() {
    let dir = setup();
    let (code, stdout, stderr) = run(
        dir.path(),
        &["prioritize", "risks.json", "--strategy", "budget_optimization", "--budget-hours", "0.2"],
    );
    assert_eq!(code, 1);
    assert!(stdout.is_empty());
    assert!(stderr.contains("budget_hours"), "stderr: {}", stderr);
}

#[test]
fn test_unknown_strategy_exits_nonzero() {
    let dir = setup();
    let (code, _, stderr) = run(dir.path(), &["prioritize", "risks.json", "--strategy", "lucky"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Unknown strategy"));
}

#[test]
fn test_output_file() {
    let dir = setup();
    let (code, _, _) = run(
        dir.path(),
        &["prioritize", "risks.json", "-f", "json", "-o", "plan.json"],
    );
    assert_eq!(code, 0);
    let written = std::fs::read_to_string(dir.path().join("plan.json")).unwrap();
    assert_eq!(json_ids(&written).len(), 3);
}

#[test]
fn test_wrapped_candidates_file() {
    let dir = setup();
    std::fs::write(
        dir.path().join("wrapped.json"),
        format!(r#"{{"candidates": {}}}"#, CANDIDATES),
    )
    .unwrap();
    let (code, stdout, _) = run(dir.path(), &["prioritize", "wrapped.json", "-f", "json"]);
    assert_eq!(code, 0);
    assert_eq!(json_ids(&stdout).len(), 3);
}

#[test]
fn test_init_then_policy() {
    let dir = setup();
    let (code, _, _) = run(dir.path(), &["init"]);
    assert_eq!(code, 0);
    assert!(dir.path().join("riskplan.toml").exists());

    // Refuses to overwrite
    let (code, _, stderr) = run(dir.path(), &["init"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("already exists"));

    let (code, stdout, _) = run(
        dir.path(),
        &["prioritize", "risks.json", "--policy", "sprint", "-f", "json"],
    );
    assert_eq!(code, 0);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["strategy"], "budget_optimization");
}

#[test]
fn test_explicit_config_errors_are_fatal() {
    let dir = setup();
    std::fs::write(dir.path().join("bad.toml"), "[solver]\ntimeout_ms = 0\n").unwrap();
    let (code, _, stderr) = run(
        dir.path(),
        &["--config", "bad.toml", "prioritize", "risks.json"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("bad.toml"));
}

#[test]
fn test_config_changes_ranking() {
    let dir = setup();
    // Make "util" modules the most critical
    std::fs::write(
        dir.path().join("riskplan.toml"),
        r#"
[criticality]
weights = { high = 10.0, medium = 1.0, low = 1.0 }
rules = [{ pattern = "util", level = "high" }]
"#,
    )
    .unwrap();
    let (code, stdout, _) = run(dir.path(), &["prioritize", "risks.json", "-f", "json"]);
    assert_eq!(code, 0);
    assert_eq!(json_ids(&stdout)[0], "Util");
}

#[test]
fn test_compare_json() {
    let dir = setup();
    let (code, stdout, _) = run(dir.path(), &["compare", "risks.json", "-f", "json"]);
    assert_eq!(code, 0);
    let rows: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let rows = rows.as_array().expect("rows array");
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[0]["strategy"], "maximize_popt20");
    assert!(rows[0]["metrics"]["popt20_score"].as_f64().is_some());
}

#[test]
fn test_compare_against_defects() {
    let dir = setup();
    std::fs::write(
        dir.path().join("bugs.json"),
        r#"[{"class_name": "Orders", "has_defect": true}, {"class_name": "Auth", "has_defect": false}]"#,
    )
    .unwrap();
    let (code, stdout, _) = run(
        dir.path(),
        &["compare", "risks.json", "--defects", "bugs.json", "--baseline-coverage", "0.2", "-f", "json"],
    );
    assert_eq!(code, 0);
    let rows: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let ranked = &rows[0]["metrics"];
    assert_eq!(ranked["basis"], "defects");
    // Orders is in the full ranking, so every labelled defect is recalled
    assert_eq!(ranked["recall_top20"].as_f64(), Some(1.0));
    assert!((ranked["estimated_coverage_gain"].as_f64().unwrap() - 0.8).abs() < 1e-9);

    let (code, _, stderr) = run(
        dir.path(),
        &["compare", "risks.json", "--baseline-coverage", "2"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("baseline_coverage"));
}
