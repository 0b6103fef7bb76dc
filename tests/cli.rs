//! Binary-level CLI tests: exit codes, output streams, and configuration
//! handling

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A confab command isolated from the host environment
///
/// HOME points at an empty tempdir so no global `.env` leaks in, the
/// working directory is fresh so no local `.env` applies, and contexts
/// land under the tempdir.
fn confab(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("confab").unwrap();
    cmd.env_clear()
        .env("HOME", tmp.path())
        .env("CONFAB_CONTEXT_DIR", tmp.path().join("contexts"))
        .env("CONFAB_API_KEY", "test-key")
        .current_dir(tmp.path());
    cmd
}

#[test]
fn info_on_fresh_directory_reports_empty_context() {
    let tmp = TempDir::new().unwrap();
    confab(&tmp)
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("Messages: 0"))
        .stdout(predicate::str::contains("Prune count: 0"))
        .stdout(predicate::str::contains("Context for"));
}

#[test]
fn missing_api_key_exits_with_config_code() {
    let tmp = TempDir::new().unwrap();
    let mut cmd = confab(&tmp);
    cmd.env_remove("CONFAB_API_KEY");

    cmd.arg("info")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("CONFAB_API_KEY"))
        .stderr(predicate::str::contains("export CONFAB_API_KEY"));
}

#[test]
fn reset_succeeds_and_reports() {
    let tmp = TempDir::new().unwrap();
    confab(&tmp)
        .arg("reset")
        .assert()
        .success()
        .stdout(predicate::str::contains("Context reset successfully"));
}

#[test]
fn ask_with_unreachable_endpoint_exits_with_query_code() {
    let tmp = TempDir::new().unwrap();
    let mut cmd = confab(&tmp);
    // Nothing listens here; the query fails after retries
    cmd.env("CONFAB_API_URL", "http://127.0.0.1:9/v1/chat/completions");

    cmd.args(["ask", "anyone", "home?"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("API request failed"));

    // The failed exchange was not persisted
    confab(&tmp)
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("Messages: 0"));
}

#[test]
fn no_arguments_prints_usage_error() {
    let tmp = TempDir::new().unwrap();
    confab(&tmp).assert().failure();
}

#[test]
fn local_env_file_supplies_configuration() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join(".env"), "CONFAB_API_KEY=from-local-env\n").unwrap();

    let mut cmd = confab(&tmp);
    cmd.env_remove("CONFAB_API_KEY");

    // Validation passes because the local .env provided the key
    cmd.arg("info").assert().success();
}

#[test]
fn directory_override_selects_context() {
    let tmp = TempDir::new().unwrap();
    let other = TempDir::new().unwrap();

    confab(&tmp)
        .args(["info", "--directory"])
        .arg(other.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Messages: 0"));
}
