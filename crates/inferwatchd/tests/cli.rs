//! Command-line regression tests for the `inferwatchd` binary.

use std::path::Path;
use std::process::{Command, Output};

fn inferwatchd(config: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_inferwatchd"))
        .arg("--config")
        .arg(config)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .unwrap()
}

#[test]
fn init_then_validate() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config").join("monitoring.toml");

    let out = inferwatchd(&config, &["init"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(config.exists());

    let out = inferwatchd(&config, &["validate"]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    assert!(String::from_utf8_lossy(&out.stdout).contains("configuration OK"));
}

#[test]
fn init_refuses_to_overwrite_without_force() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("monitoring.toml");
    std::fs::write(&config, "# keep me\n").unwrap();

    let out = inferwatchd(&config, &["init"]);
    assert_eq!(out.status.code(), Some(1));
    assert_eq!(std::fs::read_to_string(&config).unwrap(), "# keep me\n");

    let out = inferwatchd(&config, &["init", "--force"]);
    assert!(out.status.success());
    assert!(std::fs::read_to_string(&config).unwrap().contains("[thresholds"));
}

#[test]
fn validate_missing_file_exits_with_failure() {
    let dir = tempfile::tempdir().unwrap();
    let out = inferwatchd(&dir.path().join("absent.toml"), &["validate"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("failed to read config file"));
}

#[test]
fn validate_rejects_inverted_thresholds() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("monitoring.toml");
    std::fs::write(
        &config,
        "[thresholds]\nerror_rate_percent = { warning = 50, critical = 25 }\n",
    )
    .unwrap();

    let out = inferwatchd(&config, &["validate"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("error_rate_percent"));
}

#[test]
fn run_fails_fast_on_bad_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("monitoring.toml");
    std::fs::write(&config, "[service]\nbase_url = \"ftp://nowhere\"\n").unwrap();

    let out = inferwatchd(&config, &["run"]);
    assert_eq!(out.status.code(), Some(1));
}
