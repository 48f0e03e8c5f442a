//! Command integration tests
//!
//! | Exit Code | Meaning |
//! |-----------|---------|
//! | 0 | Success: no errors (warnings allowed) |
//! | 1 | Failure: one or more errors after policy |

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

const CLEAN: &str = "\
Project name,Launch
ID,Name,Hierarchy Level,Duration,Start,Finish,Predecessors,Percent Complete,Assigned To
1,Plan,1,5d,04/03/2024,08/03/2024,,100,Ana
2,Design,1.1,5d,11/03/2024,15/03/2024,1,50,Rui
3,Build,1.2,10d,18/03/2024,29/03/2024,2,0,Rui
4,Test,1.3,5d,01/04/2024,05/04/2024,3,0,Ana
5,Ship,2,1d,08/04/2024,08/04/2024,4,0,Ana
";

const DUPLICATES: &str = "\
ID,Name,Duration,Start,Finish
1,Plan,5d,04/03/2024,08/03/2024
1,Plan again,5d,11/03/2024,15/03/2024
2,Build,10d,18/03/2024,29/03/2024
3,Ship,5d,01/04/2024,05/04/2024
";

fn write_fixture(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn run(args: &[&str], file: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_schedview"))
        .args(args)
        .arg(file)
        .env_remove("RUST_LOG")
        .env_remove("SCHEDVIEW_CONFIG")
        .output()
        .expect("failed to execute schedview")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// =============================================================================
// check
// =============================================================================

#[test]
fn check_clean_file_exits_0() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(&dir, "plan.csv", CLEAN);

    let output = run(&["check"], &file);
    assert_eq!(output.status.code(), Some(0));
    let text = stdout(&output);
    assert!(text.contains("Project: Launch"));
    assert!(text.contains("5 tasks processed, 0 rows skipped: 0 error(s), 0 warning(s)"));
}

#[test]
fn check_warnings_only_exits_0() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(&dir, "dupes.csv", DUPLICATES);

    let output = run(&["check"], &file);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).contains("warning[DUPLICATE_IDS]: Duplicate task IDs found: 1"));
}

#[test]
fn check_strict_escalates_warnings() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(&dir, "dupes.csv", DUPLICATES);

    let output = run(&["check", "--strict"], &file);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("error[DUPLICATE_IDS]"));
}

#[test]
fn check_quiet_does_not_change_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(&dir, "dupes.csv", DUPLICATES);

    let output = run(&["check", "--quiet"], &file);
    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).is_empty());

    let output = run(&["check", "--quiet", "--strict"], &file);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn check_fatal_error_exits_1() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(&dir, "notes.csv", "Meeting notes\nnothing tabular here\n");

    let output = run(&["check"], &file);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("error[PROCESSING_FAILED]"));
}

#[test]
fn check_json_has_same_exit_semantics() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(&dir, "dupes.csv", DUPLICATES);

    let output = run(&["check", "--format", "json"], &file);
    assert_eq!(output.status.code(), Some(0));
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["tasks_processed"], 4);
    assert_eq!(value["diagnostics"][0]["code"], "DUPLICATE_IDS");

    let output = run(&["check", "--format", "json", "--strict"], &file);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn unsupported_file_type_fails() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(&dir, "plan.txt", CLEAN);

    let output = run(&["check"], &file);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unsupported file type"));
}

// =============================================================================
// export
// =============================================================================

#[test]
fn export_filters_and_sorts() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(&dir, "plan.csv", CLEAN);
    let out = dir.path().join("out.csv");

    let output = run(
        &["export", "--assignee", "Ana", "--sort", "name", "--desc", "-o", out.to_str().unwrap()],
        &file,
    );
    assert_eq!(output.status.code(), Some(0));

    let csv = fs::read_to_string(&out).unwrap();
    let names: Vec<&str> = csv
        .lines()
        .skip(1)
        .map(|line| line.split("\",\"").nth(2).unwrap())
        .collect();
    assert_eq!(names, vec!["Test", "Ship", "Plan"]);
    assert!(csv.starts_with("\"Task Number\",\"Hierarchy Level\",\"Name\""));
}

#[test]
fn export_rejects_unknown_sort_key() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(&dir, "plan.csv", CLEAN);

    let output = run(&["export", "--sort", "colour"], &file);
    assert_eq!(output.status.code(), Some(1));
}

// =============================================================================
// layout
// =============================================================================

#[test]
fn layout_prints_geometry() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(&dir, "plan.csv", CLEAN);

    let output = run(&["layout", "--today", "2024-03-01"], &file);
    assert_eq!(output.status.code(), Some(0));

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["time_range"]["start"], "2024-02-26");
    assert_eq!(value["time_range"]["end"], "2024-04-22");
    assert_eq!(value["virtualized"], false);
    assert_eq!(value["bars"].as_array().unwrap().len(), 5);
    assert_eq!(value["edges"].as_array().unwrap().len(), 4);
    assert_eq!(value["bars"][0]["x"], 210.0);
}

#[test]
fn layout_honours_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_fixture(&dir, "plan.csv", CLEAN);
    let config = write_fixture(&dir, "schedview.toml", "[gantt]\nday_width = 10.0\nmargin_days_before = 0\n");

    let output = run(
        &["--config", config.to_str().unwrap(), "layout", "--today", "2024-03-01"],
        &file,
    );
    assert_eq!(output.status.code(), Some(0));

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["time_range"]["start"], "2024-03-04");
    assert_eq!(value["bars"][1]["x"], 70.0);
}
