//! Status and host snapshot commands

use anyhow::Result;
use serde_json::json;

use gc_core::system::static_snapshot;
use gc_core::Transport;
use gc_orchestrator::Orchestrator;

use crate::output::{format_overview, format_snapshot, print_warning};

fn warn_about_transport(transport: &Transport) {
    match transport {
        Transport::Unknown => print_warning(
            "No usable transport: configure VG_REMOTE_HOST and VG_REMOTE_KEY, or run on the farm host",
        ),
        Transport::Ssh(ssh) if ssh.password_only() => print_warning(
            "Password-only SSH is not supported in batch mode; set VG_REMOTE_KEY",
        ),
        _ => {}
    }
}

/// Transport, host snapshot, and the state of every process
pub async fn status_command(orch: &Orchestrator, as_json: bool) -> Result<()> {
    let transport = &orch.context().transport;
    let system = static_snapshot(transport).await;
    let processes = orch.overview().await?;

    if as_json {
        let doc = json!({
            "transport": transport.to_string(),
            "system": system,
            "processes": processes,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    warn_about_transport(transport);
    println!("Transport: {}", transport);
    print!("{}", format_snapshot(&system));
    println!("{}", format_overview(&processes));
    Ok(())
}

pub async fn sysinfo_command(orch: &Orchestrator, as_json: bool) -> Result<()> {
    let snapshot = static_snapshot(&orch.context().transport).await;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print!("{}", format_snapshot(&snapshot));
    }
    Ok(())
}
