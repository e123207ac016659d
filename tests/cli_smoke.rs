//! Behavioural smoke tests for the CLI entrypoints.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

const CREDENTIAL_VARS: [&str; 4] = [
    "DATABRICKS_ACCOUNT_ID",
    "DATABRICKS_WORKSPACE_ID",
    "DATABRICKS_CLIENT_ID",
    "DATABRICKS_CLIENT_SECRET",
];

#[test]
fn sweep_requires_account_flags() {
    let mut cmd = cargo_bin_cmd!("bricksweep");
    for var in CREDENTIAL_VARS {
        cmd.env_remove(var);
    }
    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("--databricks_account_id"));
}

#[test]
fn sweep_help_lists_flags() {
    let mut cmd = cargo_bin_cmd!("bricksweep");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry_run"))
        .stdout(predicate::str::contains("--on_failure"));
}

#[test]
fn update_help_lists_actions() {
    let mut cmd = cargo_bin_cmd!("bricksweep-update");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--action"))
        .stdout(predicate::str::contains("--deployment_name"));
}

#[test]
fn zero_age_threshold_fails_before_any_request() {
    let mut cmd = cargo_bin_cmd!("bricksweep");
    cmd.env_remove("BRICKSWEEP_CONFIG_PATH")
        .args([
            "--databricks_account_id",
            "acc",
            "--databricks_workspace_id",
            "dbc-1",
            "--client_id",
            "id",
            "--client_secret",
            "secret",
            "--max_age_days",
            "0",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("configuration error"));
}

#[test]
fn blank_client_id_fails_before_any_request() {
    let mut cmd = cargo_bin_cmd!("bricksweep-update");
    cmd.env_remove("BRICKSWEEP_CONFIG_PATH")
        .args([
            "--databricks_account_id",
            "acc",
            "--client_id",
            " ",
            "--client_secret",
            "secret",
            "--dry_run",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("authentication failed"));
}

#[test]
fn unknown_failure_mode_is_a_usage_error() {
    let mut cmd = cargo_bin_cmd!("bricksweep");
    cmd.args([
        "--databricks_account_id",
        "acc",
        "--databricks_workspace_id",
        "dbc-1",
        "--client_id",
        "id",
        "--client_secret",
        "secret",
        "--on_failure",
        "retry-forever",
    ])
    .assert()
    .code(2);
}
