//! CLI tests for the `vlug` binary

use predicates::prelude::*;
use std::io::Write;

#[test]
fn test_text_summary_lists_workloads() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("vlug");
    cmd.args(["-n", "5", "--size", "16", "--quiet"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Timing Summary"))
        .stderr(predicate::str::contains("iter_for_each"))
        .stderr(predicate::str::contains("index_loop"))
        .stderr(predicate::str::contains("fold"));
}

#[test]
fn test_json_output_shape() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("vlug");
    let output = cmd
        .args(["-n", "4", "--runs", "3", "--size", "8", "--format", "json", "--quiet"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["functions"]["fold"]["iterationsRun"], 12);
    assert_eq!(value["functions"]["index_loop"]["iterationsRun"], 12);
    assert_eq!(value["runs"]["run"]["iterationsRun"], 3);
}

#[test]
fn test_console_timers_shown_unless_quiet() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("vlug");
    cmd.args(["-n", "2", "--size", "4"])
        .assert()
        .success()
        .stderr(predicate::str::is_match(r"fold: \d+\.\d{3}ms").unwrap());

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("vlug");
    cmd.args(["-n", "2", "--size", "4", "--quiet"])
        .assert()
        .success()
        .stderr(predicate::str::is_match(r"fold: \d+\.\d{3}ms").unwrap().not());
}

#[test]
fn test_zero_iterations_fails() {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("vlug");
    cmd.args(["--iterations", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("iterations must be a positive integer"));
}

#[test]
fn test_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[runner]\niterations = 3\nlog = false\n\n[cli]\nruns = 2\nsize = 4\nformat = \"json\""
    )
    .unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("vlug");
    let output = cmd.arg("--config").arg(file.path()).output().unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["functions"]["fold"]["iterationsRun"], 6);
    assert_eq!(value["runs"]["run"]["iterationsRun"], 2);
}

#[test]
fn test_bad_config_file_fails() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[runner\niterations = ").unwrap();

    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("vlug");
    cmd.arg("--config")
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse TOML"));
}
