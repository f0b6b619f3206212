//! Robust command implementations

use anyhow::Result;

use gc_core::types::StopMode;
use gc_core::LogicalId;
use gc_orchestrator::Orchestrator;

use super::{report_start, report_stop};

pub async fn robust_start(orch: &Orchestrator) -> Result<()> {
    let outcome = orch.start(&LogicalId::Robust).await?;
    report_start(&LogicalId::Robust, &outcome);
    Ok(())
}

pub async fn robust_stop(orch: &Orchestrator, mode: StopMode) -> Result<()> {
    let outcome = orch.stop(&LogicalId::Robust, mode).await?;
    report_stop(&LogicalId::Robust, &outcome);
    Ok(())
}

pub async fn robust_restart(orch: &Orchestrator, mode: StopMode) -> Result<()> {
    let outcome = orch.restart(&LogicalId::Robust, mode).await?;
    report_stop(&LogicalId::Robust, &outcome.stop);
    report_start(&LogicalId::Robust, &outcome.start);
    Ok(())
}
