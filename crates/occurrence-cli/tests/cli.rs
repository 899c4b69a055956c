use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

fn occurrences() -> Command {
    Command::cargo_bin("occurrences").unwrap()
}

fn scratch_file(name: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("occurrences-cli-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}

const WEEKLY_SATURDAY: &str = r#"{"weekday":"Saturday","rule":"weekly"}"#;

#[test]
fn label_prints_plain_text() {
    occurrences()
        .arg("label")
        .write_stdin(r#"{"weekday":"Thursday","rule":"1st/3rd"}"#)
        .assert()
        .success()
        .stdout("1st & 3rd Thursday\n");
}

#[test]
fn interpret_reports_recurrence_and_diagnostics() {
    let json = stdout_json(
        occurrences()
            .arg("interpret")
            .write_stdin(r#"{"weekday":"Funday","rule":"weekly","anchor_date":"2026-01-24"}"#),
    );
    assert_eq!(json["recurrence"]["kind"], "unknown");
    assert_eq!(json["label"], "Schedule unknown");
    assert_eq!(json["confidence"], "ambiguous");
    assert_eq!(json["diagnostics"][0]["kind"], "invalid_weekday");
}

#[test]
fn expand_lists_window_dates() {
    let json = stdout_json(
        occurrences()
            .args(["expand", "--start", "2026-01-24", "--end", "2026-02-23"])
            .write_stdin(WEEKLY_SATURDAY),
    );
    let dates: Vec<&str> = json["occurrences"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["date"].as_str().unwrap())
        .collect();
    assert_eq!(
        dates,
        vec!["2026-01-24", "2026-01-31", "2026-02-07", "2026-02-14", "2026-02-21"]
    );
    assert_eq!(json["is_confident"], true);
    assert_eq!(json["cap_exceeded"], false);
}

#[test]
fn expand_defaults_to_display_window_from_today() {
    let json = stdout_json(
        occurrences()
            .args(["expand", "--today", "2026-01-01", "--cap", "2"])
            .write_stdin(WEEKLY_SATURDAY),
    );
    assert_eq!(json["occurrences"].as_array().unwrap().len(), 2);
    assert_eq!(json["occurrences"][0]["date"], "2026-01-03");
    assert_eq!(json["cap_exceeded"], true);
}

#[test]
fn next_reports_no_occurrence_for_seasonal() {
    let json = stdout_json(
        occurrences()
            .args(["next", "--from", "2026-01-01"])
            .write_stdin(r#"{"rule":"seasonal"}"#),
    );
    assert!(json["occurrence"].is_null());
    assert_eq!(json["is_confident"], false);
}

#[test]
fn next_finds_fifth_friday() {
    let json = stdout_json(
        occurrences()
            .args(["next", "--from", "2027-01-30"])
            .write_stdin(r#"{"weekday":"Friday","rule":"5th"}"#),
    );
    assert_eq!(json["occurrence"]["date"], "2027-04-30");
}

#[test]
fn merge_flags_cancelled_dates() {
    let overrides = scratch_file(
        "overrides.json",
        r#"[{"date":"2026-01-31","status":"cancelled","notes":"Venue closed"}]"#,
    );
    let json = stdout_json(
        occurrences()
            .args(["merge", "--start", "2026-01-24", "--end", "2026-02-07", "--overrides"])
            .arg(&overrides)
            .write_stdin(r#"{"weekday":"Saturday","rule":"weekly","base":{"start_time":"10:00"}}"#),
    );
    let rows = json.as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1]["date"], "2026-01-31");
    assert_eq!(rows[1]["is_cancelled"], true);
    assert_eq!(rows[1]["notes"], "Venue closed");
    assert_eq!(rows[0]["is_cancelled"], false);
    assert_eq!(rows[0]["display_start_time"], "10:00");
}

#[test]
fn merge_single_date_not_on_schedule_is_null() {
    let overrides = scratch_file("empty.json", "[]");
    let json = stdout_json(
        occurrences()
            .args(["merge", "--date", "2026-01-30", "--overrides"])
            .arg(&overrides)
            .write_stdin(WEEKLY_SATURDAY),
    );
    assert!(json.is_null());
}

#[test]
fn invalid_date_key_fails_with_message() {
    occurrences()
        .args(["expand", "--start", "2026-04-31", "--end", "2026-05-31"])
        .write_stdin(WEEKLY_SATURDAY)
        .assert()
        .failure()
        .stderr(predicate::str::contains("--start expects YYYY-MM-DD"));
}

#[test]
fn invalid_timezone_fails() {
    occurrences()
        .args(["label", "--timezone", "Not/AZone"])
        .write_stdin(WEEKLY_SATURDAY)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid timezone"));
}

#[test]
fn config_file_sets_timezone_and_cap() {
    let config = scratch_file("config.json", r#"{"timezone":"Europe/London","cap":1}"#);
    let json = stdout_json(
        occurrences()
            .args(["expand", "--start", "2026-01-01", "--end", "2026-01-31", "--config"])
            .arg(&config)
            .write_stdin(WEEKLY_SATURDAY),
    );
    assert_eq!(json["occurrences"].as_array().unwrap().len(), 1);
    assert_eq!(json["cap_exceeded"], true);
}
