//! CLI integration tests
//!
//! Tests the gridctl CLI using assert_cmd against a throwaway farm layout.

#![cfg(target_os = "linux")]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Config home, base and estates root under one temp dir
struct Grid {
    dir: TempDir,
}

impl Grid {
    fn new() -> Self {
        let grid = Self {
            dir: TempDir::new().unwrap(),
        };
        fs::create_dir_all(grid.config_home()).unwrap();
        fs::create_dir_all(grid.base()).unwrap();
        fs::create_dir_all(grid.estates()).unwrap();
        grid
    }

    fn config_home(&self) -> PathBuf {
        self.dir.path().join("config")
    }

    fn base(&self) -> PathBuf {
        self.dir.path().join("bin")
    }

    fn estates(&self) -> PathBuf {
        self.dir.path().join("Estates")
    }

    fn add_estate(&self, name: &str) -> PathBuf {
        let dir = self.estates().join(name);
        fs::create_dir_all(dir.join("Regions")).unwrap();
        fs::write(dir.join("OpenSim.ini"), "[Startup]\n").unwrap();
        fs::write(dir.join("Regions").join("Region.ini"), "[Region]\n").unwrap();
        dir
    }

    fn settings_file(&self) -> PathBuf {
        self.config_home().join("gridctl").join("settings")
    }

    fn gridctl(&self) -> Command {
        let mut cmd = Command::cargo_bin("gridctl")
            .expect("Failed to locate gridctl binary - ensure it's built before running tests");
        for key in [
            "VG_REMOTE_HOST",
            "VG_REMOTE_USER",
            "VG_REMOTE_PORT",
            "VG_REMOTE_KEY",
            "VG_REMOTE_PASSWORD",
            "VG_FORCE_SSH",
            "RUST_LOG",
        ] {
            cmd.env_remove(key);
        }
        cmd.env("HOME", self.dir.path())
            .env("XDG_CONFIG_HOME", self.config_home())
            .env("VG_BASE", self.base())
            .env("VG_ESTATES", self.estates())
            .env("VG_FORCE_LOCAL", "1");
        cmd
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn test_cli_help() {
    Grid::new()
        .gridctl()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("gridctl"))
        .stdout(predicate::str::contains("Operator console for an OpenSim grid"));
}

#[test]
fn test_cli_version() {
    Grid::new()
        .gridctl()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("gridctl"));
}

#[test]
fn test_cli_estate_help() {
    Grid::new()
        .gridctl()
        .args(["estate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("start-all"))
        .stdout(predicate::str::contains("stop-all"));
}

#[test]
fn test_settings_path_under_config_home() {
    let grid = Grid::new();
    grid.gridctl()
        .args(["settings", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("gridctl"))
        .stdout(predicate::str::ends_with("settings\n"));
}

#[test]
fn test_settings_set_then_show() {
    let grid = Grid::new();
    grid.gridctl()
        .args(["settings", "set", "remote_host", "grid.example.net"])
        .assert()
        .success()
        .stdout(predicate::str::contains("VG_REMOTE_HOST"));

    assert!(read(&grid.settings_file()).contains("VG_REMOTE_HOST=\"grid.example.net\""));

    grid.gridctl()
        .args(["settings", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("grid.example.net"));
}

#[test]
fn test_settings_password_is_masked() {
    let grid = Grid::new();
    grid.gridctl()
        .args(["settings", "set", "VG_REMOTE_PASSWORD", "hunter2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hunter2").not());

    grid.gridctl()
        .args(["settings", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("********"))
        .stdout(predicate::str::contains("hunter2").not());
}

#[test]
fn test_settings_unknown_key_fails() {
    Grid::new()
        .gridctl()
        .args(["settings", "set", "shell", "bash"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown settings key"));
}

#[test]
fn test_estate_list_shows_valid_estates_only() {
    let grid = Grid::new();
    grid.add_estate("Harbor");
    fs::create_dir_all(grid.estates().join("Broken")).unwrap();

    grid.gridctl()
        .args(["estate", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Harbor"))
        .stdout(predicate::str::contains("STOPPED"))
        .stdout(predicate::str::contains("Broken").not());
}

#[test]
fn test_estate_list_json() {
    let grid = Grid::new();
    grid.add_estate("Harbor");

    let output = grid.gridctl().args(["estate", "list", "--json"]).output().unwrap();
    assert!(output.status.success());

    let list: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"]["name"], "Harbor");
    assert_eq!(list[0]["state"], "stopped");
}

#[test]
fn test_robust_graceful_stop_without_session() {
    Grid::new()
        .gridctl()
        .args(["robust", "stop"])
        .assert()
        .success()
        .stderr(predicate::str::contains("robust: no session found"));
}

#[test]
fn test_unknown_estate_is_reported() {
    let grid = Grid::new();
    grid.add_estate("Harbor");

    grid.gridctl()
        .args(["estate", "start", "Nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found among discovered estates"));
}

#[test]
fn test_login_requires_target() {
    Grid::new()
        .gridctl()
        .args(["login", "enable"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("A target is required"));
}

#[test]
fn test_login_without_session_is_refused() {
    let grid = Grid::new();
    grid.add_estate("Harbor");

    grid.gridctl()
        .args(["login", "disable", "Harbor"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("estate:Harbor: no session found"));
}

#[test]
fn test_clear_session() {
    let grid = Grid::new();
    let marker = grid.config_home().join("gridctl").join("sessions").join("robust.session");
    fs::create_dir_all(marker.parent().unwrap()).unwrap();
    fs::write(&marker, "gridctl:robust\n").unwrap();

    grid.gridctl()
        .args(["clear-session", "robust"])
        .assert()
        .success()
        .stdout(predicate::str::contains("session marker cleared"));
    assert!(!marker.exists());
}

#[test]
fn test_estate_args_round_trip() {
    let grid = Grid::new();
    let dir = grid.add_estate("Harbor");

    grid.gridctl()
        .args(["estate", "args", "Harbor", "--set=--console=rest"])
        .assert()
        .success();
    assert_eq!(read(&dir.join("estate.args")), "--console=rest");

    grid.gridctl()
        .args(["estate", "args", "Harbor"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--console=rest"));
}

#[test]
fn test_batch_with_nothing_to_do() {
    let grid = Grid::new();

    grid.gridctl()
        .args(["estate", "stop-all", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No running estates"));
}
