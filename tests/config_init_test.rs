// Allow deprecated cargo_bin - the deprecation is for custom build-dir edge case
// which doesn't apply to this project. See: https://docs.rs/assert_cmd
#![allow(deprecated)]

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn default_config_header() -> &'static str {
    "# herald configuration file"
}

#[test]
fn test_config_init_creates_file() {
    let temp = tempfile::tempdir().unwrap();
    let config_path = temp.path().join("config.toml");

    Command::cargo_bin("herald")
        .unwrap()
        .args(["config", "init"])
        .env("HERALD_CONFIG", &config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Config created at"));

    let contents = fs::read_to_string(&config_path).unwrap();
    assert!(contents.contains(default_config_header()));
}

#[test]
fn test_config_init_force_overwrites() {
    let temp = tempfile::tempdir().unwrap();
    let config_path = temp.path().join("config.toml");
    fs::write(&config_path, "existing").unwrap();

    Command::cargo_bin("herald")
        .unwrap()
        .args(["config", "init", "--force"])
        .env("HERALD_CONFIG", &config_path)
        .assert()
        .success();

    let contents = fs::read_to_string(&config_path).unwrap();
    assert!(contents.contains(default_config_header()));
}

#[test]
fn test_config_init_declined_keeps_existing_file() {
    let temp = tempfile::tempdir().unwrap();
    let config_path = temp.path().join("config.toml");
    fs::write(&config_path, "existing").unwrap();

    Command::cargo_bin("herald")
        .unwrap()
        .args(["config", "init"])
        .env("HERALD_CONFIG", &config_path)
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Aborted."));

    assert_eq!(fs::read_to_string(&config_path).unwrap(), "existing");
}

#[test]
fn test_config_init_then_validate_succeeds() {
    let temp = tempfile::tempdir().unwrap();
    let config_path = temp
        .path()
        .join("nested")
        .join("herald")
        .join("config.toml");

    Command::cargo_bin("herald")
        .unwrap()
        .args(["config", "init", "--config", config_path.to_str().unwrap()])
        .assert()
        .success();

    Command::cargo_bin("herald")
        .unwrap()
        .args(["config", "validate"])
        .env("HERALD_CONFIG", &config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration valid"));
}

#[cfg(unix)]
#[test]
fn test_config_init_restricts_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let temp = tempfile::tempdir().unwrap();
    let config_path = temp.path().join("config.toml");

    Command::cargo_bin("herald")
        .unwrap()
        .args(["config", "init"])
        .env("HERALD_CONFIG", &config_path)
        .assert()
        .success();

    let mode = fs::metadata(&config_path).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}
