//! Paced bulk start and stop
//!
//! Bulk operations run strictly one estate at a time. After every
//! `batch_size` items the host gets a longer cooldown, and a short delay
//! separates items inside a batch. Nothing is paused after the last item.
//! A failure on one estate is recorded and the batch moves on.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use gc_core::config::Pacing;
use gc_core::types::{ProcessState, StopMode};
use gc_core::{GridError, LifecycleError, LogicalId, Transport, TransportError};

use crate::lifecycle::{Orchestrator, StartOutcome, StopOutcome};

/// Which bulk operation a report describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchOp {
    StartAll,
    StopAll(StopMode),
}

impl fmt::Display for BatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchOp::StartAll => write!(f, "start-all"),
            BatchOp::StopAll(mode) => write!(f, "stop-all ({})", mode),
        }
    }
}

/// Kind of pause between two items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseKind {
    /// Short delay inside a batch
    Item,
    /// Long cooldown after a full batch
    Cooldown,
}

/// Pause owed after the item at `index` (zero-based) of `total`.
///
/// `None` after the last item.
pub fn pause_after(index: usize, total: usize, pacing: &Pacing) -> Option<(PauseKind, Duration)> {
    let done = index + 1;
    if done >= total {
        return None;
    }
    if pacing.batch_size > 0 && done % pacing.batch_size == 0 {
        Some((PauseKind::Cooldown, pacing.cooldown))
    } else {
        Some((PauseKind::Item, pacing.item_delay))
    }
}

/// What happened to one estate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ItemOutcome {
    Started(StartOutcome),
    Stopped(StopOutcome),
    Failed { kind: &'static str, message: String },
    /// Not attempted because the batch was cancelled
    Skipped,
}

impl ItemOutcome {
    fn failed(err: &LifecycleError) -> Self {
        ItemOutcome::Failed {
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ItemOutcome::Failed { .. })
    }
}

impl fmt::Display for ItemOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemOutcome::Started(outcome) => write!(f, "{}", outcome),
            ItemOutcome::Stopped(outcome) => write!(f, "{}", outcome),
            ItemOutcome::Failed { message, .. } => write!(f, "{}", message),
            ItemOutcome::Skipped => write!(f, "skipped"),
        }
    }
}

/// One estate's entry in a batch report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchItem {
    pub estate: String,
    pub outcome: ItemOutcome,
}

/// Live progress of a bulk operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    ItemStarted { index: usize, total: usize, estate: String },
    ItemFinished { index: usize, total: usize, item: BatchItem },
    Pausing { kind: PauseKind, duration: Duration },
    Cancelled { remaining: usize },
}

/// Aggregate result of a bulk operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub op: BatchOp,
    pub items: Vec<BatchItem>,
    pub cancelled: bool,
}

impl BatchReport {
    /// Items that failed
    pub fn failures(&self) -> Vec<&BatchItem> {
        self.items.iter().filter(|i| i.outcome.is_failure()).collect()
    }

    /// Items that were attempted (not skipped)
    pub fn attempted(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.outcome != ItemOutcome::Skipped)
            .count()
    }

    /// `Err(PartialBatchFailure)` naming every failed estate, if any failed
    pub fn into_result(self) -> Result<BatchReport, LifecycleError> {
        let failed: Vec<String> = self.failures().iter().map(|i| i.estate.clone()).collect();
        if failed.is_empty() {
            Ok(self)
        } else {
            Err(LifecycleError::PartialBatchFailure {
                failed,
                total: self.items.len(),
            })
        }
    }
}

fn emit(events: Option<&UnboundedSender<BatchEvent>>, event: BatchEvent) {
    if let Some(tx) = events {
        // A dropped receiver only means nobody is watching
        let _ = tx.send(event);
    }
}

impl Orchestrator {
    fn require_transport(&self) -> Result<(), TransportError> {
        match self.context().transport {
            Transport::Unknown => Err(TransportError::Unavailable),
            _ => Ok(()),
        }
    }

    /// Discovered estates currently in `state`, in discovery order
    pub async fn estates_in(&self, state: ProcessState) -> Vec<String> {
        let mut selected = Vec::new();
        for name in self.estates().await {
            let running = self.is_running(&LogicalId::estate(name.as_str())).await;
            if running == (state == ProcessState::Running) {
                selected.push(name);
            }
        }
        selected
    }

    /// Start every stopped estate, paced
    pub async fn start_all(
        &self,
        cancel: &CancellationToken,
        events: Option<&UnboundedSender<BatchEvent>>,
    ) -> Result<BatchReport, GridError> {
        self.require_transport()?;
        let targets = self.estates_in(ProcessState::Stopped).await;
        Ok(self.run_batch(BatchOp::StartAll, targets, cancel, events).await)
    }

    /// Stop every running estate, paced
    pub async fn stop_all(
        &self,
        mode: StopMode,
        cancel: &CancellationToken,
        events: Option<&UnboundedSender<BatchEvent>>,
    ) -> Result<BatchReport, GridError> {
        self.require_transport()?;
        let targets = self.estates_in(ProcessState::Running).await;
        Ok(self.run_batch(BatchOp::StopAll(mode), targets, cancel, events).await)
    }

    /// One batch item. Targets come from discovery, so it is not repeated.
    async fn run_item(&self, op: BatchOp, id: &LogicalId) -> ItemOutcome {
        let _guard = match self.inflight.acquire(id) {
            Ok(guard) => guard,
            Err(e) => return ItemOutcome::failed(&e),
        };
        let result = match op {
            BatchOp::StartAll => self.start_locked(id).await.map(ItemOutcome::Started),
            BatchOp::StopAll(mode) => self.stop_locked(id, mode).await.map(ItemOutcome::Stopped),
        };
        result.unwrap_or_else(|e| ItemOutcome::failed(&e))
    }

    async fn run_batch(
        &self,
        op: BatchOp,
        targets: Vec<String>,
        cancel: &CancellationToken,
        events: Option<&UnboundedSender<BatchEvent>>,
    ) -> BatchReport {
        let total = targets.len();
        let pacing = &self.context().panel.pacing;
        let mut items = Vec::with_capacity(total);
        let mut cancelled = false;

        tracing::info!("{}: {} estates", op, total);
        for (index, estate) in targets.into_iter().enumerate() {
            if cancelled || cancel.is_cancelled() {
                cancelled = true;
                items.push(BatchItem {
                    estate,
                    outcome: ItemOutcome::Skipped,
                });
                continue;
            }

            emit(
                events,
                BatchEvent::ItemStarted {
                    index,
                    total,
                    estate: estate.clone(),
                },
            );
            let id = LogicalId::estate(estate.as_str());
            let outcome = self.run_item(op, &id).await;
            if let ItemOutcome::Failed { message, .. } = &outcome {
                tracing::warn!("{} failed for {}: {}", op, estate, message);
            }

            let item = BatchItem { estate, outcome };
            emit(
                events,
                BatchEvent::ItemFinished {
                    index,
                    total,
                    item: item.clone(),
                },
            );
            items.push(item);

            let Some((kind, duration)) = pause_after(index, total, pacing) else {
                continue;
            };
            if duration.is_zero() {
                continue;
            }
            emit(events, BatchEvent::Pausing { kind, duration });
            tokio::select! {
                _ = tokio::time::sleep(duration) => {}
                _ = cancel.cancelled() => {
                    cancelled = true;
                }
            }
        }

        if cancelled {
            let remaining = items
                .iter()
                .filter(|i| i.outcome == ItemOutcome::Skipped)
                .count();
            tracing::info!("{} cancelled, {} estates skipped", op, remaining);
            emit(events, BatchEvent::Cancelled { remaining });
        }

        BatchReport {
            op,
            items,
            cancelled,
        }
    }
}
