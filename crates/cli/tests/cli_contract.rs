use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;

const CONFIG_VARS: [&str; 5] = [
    "FOLIO_CACHE_CAPACITY",
    "FOLIO_RANGE_RETENTION",
    "FOLIO_VIEW_MODE",
    "FOLIO_ZOOM_INDEX",
    "FOLIO_LOG_LEVEL",
];

fn folio() -> Command {
    let mut command = cargo_bin_cmd!("folio-cli");
    for var in CONFIG_VARS {
        command.env_remove(var);
    }
    command
}

fn stdout_of(command: &mut Command) -> String {
    let output = command.assert().success().get_output().stdout.clone();
    String::from_utf8(output).expect("stdout should be utf-8")
}

fn json_of(command: &mut Command) -> Value {
    serde_json::from_str(&stdout_of(command)).expect("stdout should contain valid json")
}

#[test]
fn preload_clamps_window_at_first_page() {
    let value = json_of(folio().args(["preload", "--page", "1", "--pages", "5"]));

    assert_eq!(value["pages"], json!([1, 2, 3]));
    assert_eq!(value["scale"].as_f64(), Some(1.0));
    assert_eq!(value["scale_key"], "1");
}

#[test]
fn preload_treats_unknown_mode_as_single() {
    let value =
        json_of(folio().args(["preload", "--page", "10", "--pages", "50", "--mode", "spread"]));

    assert_eq!(value["pages"], json!([8, 9, 10, 11, 12]));
}

#[test]
fn preload_clamps_page_beyond_document() {
    let value = json_of(folio().args([
        "preload",
        "--page",
        "100",
        "--pages",
        "10",
        "--zoom-index",
        "9",
    ]));

    assert_eq!(value["pages"], json!([8, 9, 10]));
    assert_eq!(value["scale"].as_f64(), Some(1.0));
}

#[test]
fn merge_retains_last_three_ranges() {
    let stdout = stdout_of(folio().args([
        "merge", "--range", "1-5", "--range", "6-10", "--range", "20-22", "--range", "30-31",
        "--range", "40-44",
    ]));

    insta::assert_snapshot!("merge_retains_last_three", stdout.trim_end());
}

#[test]
fn merge_rejects_invalid_ranges() {
    folio()
        .args(["merge", "--range", "0-3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid page range"));
}

#[test]
fn double_layout_drops_mismatched_spread() {
    let mixed = json_of(folio().args([
        "layout", "--mode", "double", "--visible", "3,4", "--bitmap", "3:792x612", "--bitmap",
        "4:612x792",
    ]));
    assert_eq!(mixed, json!({ "mode": "double", "pages": [3] }));

    let matching = json_of(folio().args([
        "layout", "--mode", "double", "--visible", "3,4", "--bitmap", "3:612x792", "--bitmap",
        "4:612x792",
    ]));
    assert_eq!(matching["pages"], json!([3, 4]));
}

#[test]
fn plan_orders_visible_jobs_first() {
    let stdout =
        stdout_of(folio().args(["plan", "--pages", "20", "--page", "5", "--mode", "double"]));

    insta::assert_snapshot!("plan_double_spread", stdout.trim_end());
}

#[test]
fn range_serves_partial_content() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let source = temp.path().join("doc.pdf");
    let body = temp.path().join("out").join("part.bin");
    fs::write(&source, b"%PDF-1.7 fixture %%EOF").expect("fixture should be written");

    let value = json_of(
        folio()
            .arg("range")
            .arg(&source)
            .args(["--header", "bytes=0-7", "--output"])
            .arg(&body),
    );

    assert_eq!(value["status"], 206);
    assert_eq!(value["headers"]["Content-Range"], "bytes 0-7/22");
    assert_eq!(value["body_len"], 8);
    assert_eq!(fs::read(&body).expect("body should be written"), b"%PDF-1.7");
}

#[test]
fn range_reports_unsatisfiable_requests() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let source = temp.path().join("doc.pdf");
    fs::write(&source, b"0123456789").expect("fixture should be written");

    let value = json_of(folio().arg("range").arg(&source).args(["--header", "bytes=50-"]));

    assert_eq!(value["status"], 416);
    assert_eq!(value["headers"]["Content-Range"], "bytes */10");
}

#[test]
fn range_fails_for_missing_file() {
    let temp = tempfile::tempdir().expect("temp dir should be created");

    folio()
        .arg("range")
        .arg(temp.path().join("missing.pdf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("file does not exist"));
}

#[test]
fn config_file_and_env_are_layered() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let path = temp.path().join("config.json");
    let config = json!({
        "version": 1,
        "config": { "cache_capacity": 64, "default_view_mode": "scroll" }
    });
    fs::write(&path, config.to_string()).expect("config should be written");

    let value = json_of(
        folio().arg("--config").arg(&path).arg("config").env("FOLIO_RANGE_RETENTION", "5"),
    );

    assert_eq!(value["cache_capacity"], 64);
    assert_eq!(value["range_retention"], 5);
    assert_eq!(value["default_view_mode"], "scroll");
}

#[test]
fn broken_config_is_reported() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let path = temp.path().join("config.json");
    fs::write(&path, "not json").expect("config should be written");

    folio()
        .arg("--config")
        .arg(&path)
        .arg("version")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load configuration"));
}

#[test]
fn verbose_flag_logs_to_stderr() {
    folio()
        .args(["--verbose", "merge", "--range", "1-2", "--range", "10-11", "--retention", "1"])
        .assert()
        .success()
        .stderr(predicate::str::contains("forgetting"));
}
