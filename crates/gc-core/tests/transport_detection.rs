//! Transport detection against stand-in tools on a private PATH

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use gc_core::estates::detect_estates;
use gc_core::transport::{LocalTransport, SshTransport, TransportMode};
use gc_core::{detect_transport, DetectOptions, Transport, TransportConfig};
use tempfile::TempDir;

fn write_tool(dir: &Path, name: &str, body: &str) {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
}

fn remote_cfg() -> TransportConfig {
    TransportConfig {
        host: Some("grid.example.net".into()),
        user: Some("opensim".into()),
        identity_file: Some(PathBuf::from("/home/op/.ssh/id_ed25519")),
        ..TransportConfig::default()
    }
}

#[tokio::test]
async fn test_local_wins_over_remote_settings() {
    let tools = TempDir::new().unwrap();
    let farm = TempDir::new().unwrap();
    write_tool(tools.path(), "gridctl-test-mux", "exit 0");
    let base = farm.path().join("bin");
    let estates = base.join("Estates");
    fs::create_dir_all(&estates).unwrap();

    let opts = DetectOptions::default()
        .with_multiplexer("gridctl-test-mux")
        .with_tool_dir(Some(tools.path().to_path_buf()));
    let transport = detect_transport(&base, &estates, &remote_cfg(), &opts).await;

    assert_eq!(transport.mode(), TransportMode::Local);
}

#[tokio::test]
async fn test_local_heuristic_needs_both_directories() {
    let tools = TempDir::new().unwrap();
    let farm = TempDir::new().unwrap();
    write_tool(tools.path(), "gridctl-test-mux", "exit 0");

    let opts = DetectOptions::default()
        .with_multiplexer("gridctl-test-mux")
        .with_tool_dir(Some(tools.path().to_path_buf()));
    let transport = detect_transport(
        farm.path(),
        &farm.path().join("Estates"),
        &TransportConfig::default(),
        &opts,
    )
    .await;

    assert_eq!(transport.mode(), TransportMode::Unknown);
}

#[tokio::test]
async fn test_force_remote_with_failing_probe_is_unknown() {
    let tools = TempDir::new().unwrap();
    write_tool(tools.path(), "ssh", "echo 'ssh: connect to host grid.example.net port 22: Connection refused' >&2\nexit 255");

    let opts = DetectOptions {
        force_remote: true,
        ..DetectOptions::default()
    }
    .with_tool_dir(Some(tools.path().to_path_buf()));
    let transport = detect_transport(Path::new("/"), Path::new("/"), &remote_cfg(), &opts).await;

    assert_eq!(transport.mode(), TransportMode::Unknown);
}

#[tokio::test]
async fn test_force_remote_with_reachable_host_is_ssh() {
    let tools = TempDir::new().unwrap();
    write_tool(tools.path(), "ssh", "exit 0");

    let opts = DetectOptions {
        force_remote: true,
        ..DetectOptions::default()
    }
    .with_tool_dir(Some(tools.path().to_path_buf()));
    let transport = detect_transport(Path::new("/"), Path::new("/"), &remote_cfg(), &opts).await;

    assert_eq!(transport.mode(), TransportMode::Ssh);
    assert_eq!(transport.to_string(), "ssh opensim@grid.example.net");
}

#[tokio::test]
async fn test_remote_discovery_runs_through_ssh() {
    // The stand-in ssh runs the joined remote command with the local shell.
    let tools = TempDir::new().unwrap();
    write_tool(
        tools.path(),
        "ssh",
        "while [ \"$1\" != \"--\" ]; do shift; done\nshift\nexec sh -c \"$1\"",
    );
    let farm = TempDir::new().unwrap();
    for (name, ini, region) in [("B", true, false), ("A", true, true), ("C", false, true)] {
        let dir = farm.path().join(name);
        fs::create_dir_all(dir.join("Regions")).unwrap();
        if ini {
            fs::write(dir.join("OpenSim.ini"), "").unwrap();
        }
        if region {
            fs::write(dir.join("Regions").join("r.ini"), "").unwrap();
        }
    }

    let ssh = SshTransport::new("grid", 22)
        .with_local(LocalTransport::new().with_path_prefix(tools.path()));
    let names = detect_estates(farm.path(), &Transport::Ssh(ssh)).await;

    assert_eq!(names, vec!["A"]);
}
