//! Estate command implementations

use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use gc_core::estates::{load_estate_args, save_estate_args};
use gc_core::types::{ProcessState, StopMode};
use gc_core::{LifecycleError, LogicalId};
use gc_orchestrator::{BatchOp, Orchestrator};

use super::{confirm, report_start, report_stop};
use crate::output::{
    format_batch_report, format_overview, print_batch_event, print_info, print_success,
    print_warning,
};

/// List discovered estates with their observed state
pub async fn estate_list(orch: &Orchestrator, json: bool) -> Result<()> {
    let mut observations = Vec::new();
    for name in orch.estates().await {
        observations.push(orch.observe(&LogicalId::Estate(name)).await?);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&observations)?);
    } else {
        println!("{}", format_overview(&observations));
    }
    Ok(())
}

pub async fn estate_start(orch: &Orchestrator, name: &str) -> Result<()> {
    let id = LogicalId::estate(name);
    let outcome = orch.start(&id).await?;
    report_start(&id, &outcome);
    Ok(())
}

pub async fn estate_stop(orch: &Orchestrator, name: &str, mode: StopMode) -> Result<()> {
    let id = LogicalId::estate(name);
    let outcome = orch.stop(&id, mode).await?;
    report_stop(&id, &outcome);
    Ok(())
}

pub async fn estate_restart(orch: &Orchestrator, name: &str, mode: StopMode) -> Result<()> {
    let id = LogicalId::estate(name);
    let outcome = orch.restart(&id, mode).await?;
    report_stop(&id, &outcome.stop);
    report_start(&id, &outcome.start);
    Ok(())
}

/// Start every stopped estate, paced, after confirmation
pub async fn estate_start_all(orch: &Orchestrator, yes: bool) -> Result<()> {
    let targets = orch.estates_in(ProcessState::Stopped).await;
    if targets.is_empty() {
        print_info("No stopped estates");
        return Ok(());
    }
    if !yes && !confirm(&format!("About to start {} estate(s): {}", targets.len(), targets.join(", ")))? {
        print_warning("Aborted");
        return Ok(());
    }
    run_paced(orch, BatchOp::StartAll).await
}

/// Stop every running estate, paced, after confirmation
pub async fn estate_stop_all(orch: &Orchestrator, mode: StopMode, yes: bool) -> Result<()> {
    let targets = orch.estates_in(ProcessState::Running).await;
    if targets.is_empty() {
        print_info("No running estates");
        return Ok(());
    }
    if !yes
        && !confirm(&format!(
            "About to stop ({}) {} estate(s): {}",
            mode,
            targets.len(),
            targets.join(", ")
        ))?
    {
        print_warning("Aborted");
        return Ok(());
    }
    run_paced(orch, BatchOp::StopAll(mode)).await
}

/// Run a batch with live progress; Ctrl-C skips whatever has not started yet
async fn run_paced(orch: &Orchestrator, op: BatchOp) -> Result<()> {
    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                print_warning("Interrupted, finishing the current estate");
                cancel.cancel();
            }
        })
    };

    let (tx, mut rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            print_batch_event(&event);
        }
    });

    let result = match op {
        BatchOp::StartAll => orch.start_all(&cancel, Some(&tx)).await,
        BatchOp::StopAll(mode) => orch.stop_all(mode, &cancel, Some(&tx)).await,
    };
    drop(tx);
    let _ = printer.await;
    watcher.abort();

    let report = result?;
    println!("{}", format_batch_report(&report));
    let attempted = report.attempted();
    report.into_result()?;
    print_success(&format!("{}: {} estate(s) processed", op, attempted));
    Ok(())
}

/// Show or replace the extra launch arguments of an estate
pub async fn estate_args(orch: &Orchestrator, name: &str, set: Option<&str>) -> Result<()> {
    let id = LogicalId::estate(name);
    orch.ensure_known(&id).await?;

    let ctx = orch.context();
    match set {
        Some(content) => {
            save_estate_args(ctx.estates_root(), name, content, &ctx.transport)
                .await
                .map_err(|e| LifecycleError::from_transport(id.clone(), e))?;
            print_success(&format!("{}: launch arguments saved", id));
        }
        None => {
            let args = load_estate_args(ctx.estates_root(), name, &ctx.transport).await;
            let args = args.trim();
            if args.is_empty() {
                print_info(&format!("{}: no extra launch arguments", id));
            } else {
                println!("{}", args);
            }
        }
    }
    Ok(())
}

/// Ask a running estate to re-read its configuration
pub async fn estate_reload(orch: &Orchestrator, name: &str) -> Result<()> {
    let handle = orch.reload_config(name).await?;
    print_success(&format!("estate:{}: config reload sent to {}", name, handle));
    Ok(())
}
