//! Per-process in-flight guard
//!
//! A start, stop, restart or console command for one logical process must
//! not overlap another for the same process. The set of busy ids lives in a
//! [`DashSet`]; each acquisition hands back an RAII guard that frees the id
//! when dropped, including on early return and panic unwinding.

use dashmap::DashSet;
use std::sync::Arc;

use gc_core::{LifecycleError, LogicalId};

/// Set of logical ids with an operation in progress
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    busy: Arc<DashSet<LogicalId>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` busy, or fail with [`LifecycleError::InFlight`] if it already is
    pub fn acquire(&self, id: &LogicalId) -> Result<InFlightGuard, LifecycleError> {
        if !self.busy.insert(id.clone()) {
            tracing::debug!("Rejected overlapping operation on {}", id);
            return Err(LifecycleError::InFlight(id.clone()));
        }
        Ok(InFlightGuard {
            busy: Arc::clone(&self.busy),
            id: id.clone(),
        })
    }

    /// Whether `id` has an operation in progress
    pub fn is_busy(&self, id: &LogicalId) -> bool {
        self.busy.contains(id)
    }
}

/// Frees its id on drop
#[derive(Debug)]
pub struct InFlightGuard {
    busy: Arc<DashSet<LogicalId>>,
    id: LogicalId,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.busy.remove(&self.id);
    }
}
