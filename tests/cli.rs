use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn studytrack(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("studytrack").unwrap();
    cmd.env("STUDYTRACK_HOME", home.path())
        .env_remove("STUDYTRACK_DB")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

fn json(home: &TempDir, args: &[&str]) -> Value {
    let output = studytrack(home)
        .args(["-o", "json"])
        .args(args)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "studytrack {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

fn new_user(home: &TempDir) -> String {
    json(home, &["user", "add", "Ada"])["id"]
        .as_str()
        .unwrap()
        .to_string()
}

fn new_session(home: &TempDir, owner: &str) -> String {
    json(
        home,
        &["session", "create", "--owner", owner, "--subject", "Calculus", "--target", "45"],
    )["id"]
        .as_str()
        .unwrap()
        .to_string()
}

#[test]
fn test_help() {
    let home = TempDir::new().unwrap();
    studytrack(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("study session"));
}

#[test]
fn test_full_lifecycle() {
    let home = TempDir::new().unwrap();
    let owner = new_user(&home);
    let id = new_session(&home, &owner);

    assert_eq!(json(&home, &["session", "start", &id])["status"], "active");

    let sampled = json(
        &home,
        &["session", "sample", &id, "--focus", "90", "--posture", "60", "--eye-strain", "20"],
    );
    assert_eq!(sampled["average_metrics"]["focus_score"], 45.0);

    assert_eq!(json(&home, &["session", "pause", &id])["status"], "paused");
    assert_eq!(json(&home, &["session", "resume", &id])["status"], "active");

    let with_break = json(
        &home,
        &["session", "break", &id, "--duration", "5", "--reason", "tired"],
    );
    assert_eq!(with_break["breaks"][0]["type"], "manual");

    let done = json(&home, &["session", "complete", &id, "--notes", "solid"]);
    assert_eq!(done["status"], "completed");
    assert_eq!(done["average_metrics"]["focus_score"], 45.0);
    assert!(done["end_time"].is_string());
    assert!(done["actual_duration_minutes"].as_u64().is_some());

    let stats = json(&home, &["user", "stats", &owner]);
    assert_eq!(stats["stats"]["total_sessions"], 1);
    assert_eq!(stats["stats"]["streak_days"], 1);
}

#[test]
fn test_invalid_transition_fails() {
    let home = TempDir::new().unwrap();
    let owner = new_user(&home);
    let id = new_session(&home, &owner);

    studytrack(&home)
        .args(["session", "pause", &id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot pause a session that is planned"));
}

#[test]
fn test_break_duration_validated() {
    let home = TempDir::new().unwrap();
    let owner = new_user(&home);
    let id = new_session(&home, &owner);

    studytrack(&home)
        .args(["session", "break", &id, "--duration", "61"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("duration_minutes"));
}

#[test]
fn test_unknown_session() {
    let home = TempDir::new().unwrap();
    studytrack(&home)
        .args(["session", "show", "6f1f5a5e-3b7a-4a4e-9a55-2f9d4f0c1e21"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_simulate_and_report() {
    let home = TempDir::new().unwrap();
    let owner = new_user(&home);
    let id = new_session(&home, &owner);
    json(&home, &["session", "start", &id]);

    let recorded = json(
        &home,
        &["session", "simulate", &id, "--count", "6", "--seed", "4"],
    );
    assert_eq!(recorded.as_array().unwrap().len(), 6);

    let report = json(&home, &["report", &id, "--points", "3"]);
    assert_eq!(report["analytics"]["total_data_points"], 6);
    assert_eq!(report["timeline"].as_array().unwrap().len(), 3);
}

#[test]
fn test_report_without_activity() {
    let home = TempDir::new().unwrap();
    let owner = new_user(&home);
    let id = new_session(&home, &owner);

    studytrack(&home)
        .args(["report", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("No activity recorded"));
}

#[test]
fn test_list_filters_by_status() {
    let home = TempDir::new().unwrap();
    let owner = new_user(&home);
    let a = new_session(&home, &owner);
    new_session(&home, &owner);
    json(&home, &["session", "cancel", &a]);

    let cancelled = json(&home, &["session", "list", "--status", "cancelled"]);
    assert_eq!(cancelled["count"], 1);
    assert_eq!(cancelled["items"][0]["id"], a.as_str());

    let all = json(&home, &["session", "list", "--owner", &owner]);
    assert_eq!(all["count"], 2);
}

#[test]
fn test_db_flag_overrides_home() {
    let home = TempDir::new().unwrap();
    let db = home.path().join("elsewhere.db");

    studytrack(&home)
        .args(["--db", db.to_str().unwrap(), "user", "add", "Grace"])
        .assert()
        .success();

    assert!(db.exists());
    assert!(!home.path().join("studytrack.db").exists());
}

#[test]
fn test_config_default_target() {
    let home = TempDir::new().unwrap();
    std::fs::write(
        home.path().join("config.yaml"),
        "session:\n  default_target_minutes: 25\n",
    )
    .unwrap();
    let owner = new_user(&home);

    let session = json(
        &home,
        &["session", "create", "--owner", &owner, "--subject", "Latin"],
    );
    assert_eq!(session["target_duration_minutes"], 25);
}

#[test]
fn test_completions() {
    let home = TempDir::new().unwrap();
    studytrack(&home)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("studytrack"));
}
