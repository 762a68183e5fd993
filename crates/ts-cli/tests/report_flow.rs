//! End-to-end tests for the report pipeline.
//!
//! Tests the full flow: saved events JSON → categorize → aggregate → output

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn timesplit_binary() -> String {
    env!("CARGO_BIN_EXE_timesplit").to_string()
}

/// Run the binary with an isolated HOME so no user config leaks in.
fn timesplit(home: &Path, args: &[&str]) -> Output {
    Command::new(timesplit_binary())
        .env("HOME", home)
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("TIMESPLIT_ACCESS_TOKEN")
        .env_remove("TIMESPLIT_CALENDAR_ID")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to run timesplit")
}

/// Build an `events.list` page with one timed event per (day, hours, title).
fn events_page(events: &[(u32, u32, &str)]) -> String {
    let items: Vec<serde_json::Value> = events
        .iter()
        .map(|(day, hours, title)| {
            serde_json::json!({
                "status": "confirmed",
                "summary": title,
                "start": {"dateTime": format!("2019-04-{day:02}T09:00:00Z")},
                "end": {"dateTime": format!("2019-04-{day:02}T{:02}:00:00Z", 9 + hours)},
            })
        })
        .collect();
    serde_json::json!({"kind": "calendar#events", "items": items}).to_string()
}

fn write_events(dir: &Path, body: &str) -> String {
    let path = dir.join("events.json");
    std::fs::write(&path, body).unwrap();
    path.to_string_lossy().into_owned()
}

/// Seventeen days of five-hour admin blocks reproduce the reference figures.
#[test]
fn test_report_seventeen_days_of_admin() {
    let temp = TempDir::new().unwrap();
    let events: Vec<(u32, u32, &str)> = (1..=17).map(|day| (day, 5, "Team admin")).collect();
    let input = write_events(temp.path(), &events_page(&events));

    let output = timesplit(temp.path(), &["report", "--input", &input]);
    assert!(
        output.status.success(),
        "report should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("HOURS SPENT OVER 17 MEASURED DAYS\n"));
    assert!(stdout.contains("admin            85h"));
    assert!(stdout.contains("Total hours:      85h"));
    assert!(stdout.contains("Avg hours/day:     5h"));
    assert!(stdout.contains("Avg hours/week:   25h"));
    assert!(stdout.contains("Avg effort:       71%"));
    assert!(stdout.contains("admin            50%"));
    assert!(stdout.contains("=== DETAIL ==="));
}

/// JSON output exposes the report as structured data.
#[test]
fn test_report_json_output() {
    let temp = TempDir::new().unwrap();
    let input = write_events(
        temp.path(),
        &events_page(&[
            (1, 2, "People API sync"),
            (2, 1, "Lunch"),
            (3, 3, "Mentoring: career chat"),
        ]),
    );

    let output = timesplit(temp.path(), &["report", "--input", &input, "--json"]);
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["event_count"], 3);
    assert_eq!(value["discarded"], 1);

    let totals = value["report"]["per_category"].as_array().unwrap();
    let hours = |name: &str| {
        totals
            .iter()
            .find(|t| t["category"] == name)
            .map(|t| t["hours"].as_i64().unwrap())
    };
    assert_eq!(hours("people api"), Some(2));
    assert_eq!(hours("people"), Some(0));
    assert_eq!(hours("career"), Some(3));
    assert_eq!(hours("mentoring"), Some(0));
    assert_eq!(value["report"]["total_hours"], 5);
}

/// An empty calendar prints the no-events message instead of a report.
#[test]
fn test_report_without_events() {
    let temp = TempDir::new().unwrap();
    let input = write_events(temp.path(), r#"{"kind": "calendar#events", "items": []}"#);

    let output = timesplit(temp.path(), &["report", "--input", &input]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("No upcoming events found."));
    assert!(!stdout.contains("SUMMARY"));
}

/// Events can be piped through stdin.
#[test]
fn test_report_reads_stdin() {
    let temp = TempDir::new().unwrap();
    let mut child = Command::new(timesplit_binary())
        .env("HOME", temp.path())
        .env_remove("XDG_CONFIG_HOME")
        .args(["report", "--input", "-", "--json"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    child
        .stdin
        .take()
        .unwrap()
        .write_all(events_page(&[(1, 4, "VMS planning")]).as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["report"]["total_hours"], 4);
}

/// A config file can replace the category rules and measurement window.
#[test]
fn test_report_with_custom_config() {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("custom.toml");
    std::fs::write(
        &config_path,
        r#"
[measurement]
measured_days = 10
nominal_day_hours = 8

[categories]
categories = ["deploy", "review", "misc"]
exclusions = [{ trigger = "dry run", suppresses = "deploy" }]
fallbacks = []
default_category = "misc"
"#,
    )
    .unwrap();
    let input = write_events(
        temp.path(),
        &events_page(&[(1, 4, "Deploy API"), (2, 4, "Deploy dry run")]),
    );

    let output = timesplit(
        temp.path(),
        &[
            "--config",
            config_path.to_str().unwrap(),
            "report",
            "--input",
            &input,
        ],
    );
    assert!(
        output.status.success(),
        "report should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("HOURS SPENT OVER 10 MEASURED DAYS\n"));
    assert!(stdout.contains("deploy            4h"));
    assert!(stdout.contains("misc              4h"));
    // 4 * 100 / 80 = 5%
    assert!(stdout.contains("deploy            5%"));
}

/// An inconsistent rule table is rejected before any events are read.
#[test]
fn test_invalid_config_is_rejected() {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("broken.toml");
    std::fs::write(
        &config_path,
        r#"
[categories]
categories = ["deploy"]
exclusions = []
fallbacks = []
default_category = "other"
"#,
    )
    .unwrap();

    let output = timesplit(
        temp.path(),
        &["--config", config_path.to_str().unwrap(), "classify", "x"],
    );
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid configuration"), "stderr: {stderr}");
}

/// Classify shows the tags for each title.
#[test]
fn test_classify_titles() {
    let temp = TempDir::new().unwrap();
    let output = timesplit(
        temp.path(),
        &["classify", "Email admin", "Squad retro", "Unfocussed"],
    );
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "Email admin -> admin",
            "Squad retro -> people",
            "Unfocussed -> unfocused",
        ]
    );
}

/// Without a token or input file the report fails with a clear message.
#[test]
fn test_report_without_token_fails() {
    let temp = TempDir::new().unwrap();
    let output = timesplit(temp.path(), &["report"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("no usable access token"), "stderr: {stderr}");
}

/// A cached token with an unreadable client secret file is reported before
/// any request is made.
#[test]
fn test_report_with_invalid_credentials_fails() {
    let temp = TempDir::new().unwrap();
    let config_dir = temp.path().join(".config").join("timesplit");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("token.json"),
        r#"{"access_token": "ya29.cached", "refresh_token": "1//refresh"}"#,
    )
    .unwrap();
    std::fs::write(config_dir.join("credentials.json"), r#"{"other": {}}"#).unwrap();

    let output = timesplit(temp.path(), &["report"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("failed to load client credentials"),
        "stderr: {stderr}"
    );
}
