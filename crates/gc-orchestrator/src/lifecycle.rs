//! Start, stop and observe a single logical process
//!
//! State is never stored: it is observed from the session marker plus the
//! process heuristic every time it is needed.
//!
//! | marker | process | observed state                          |
//! |--------|---------|-----------------------------------------|
//! | none   | no      | Stopped                                 |
//! | stale  | no      | Stopped, marker cleared                 |
//! | none   | yes     | Running, conventional handle adopted    |
//! | set    | yes     | Running                                 |

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use gc_core::estates::detect_estates;
use gc_core::process;
use gc_core::types::{ProcessState, StopMode};
use gc_core::{LifecycleError, LogicalId, Transport};

use crate::guard::InFlight;
use crate::launch::launch_command;
use crate::state::GridContext;

/// Command typed into a console to ask the process to exit
pub const SHUTDOWN_COMMAND: &str = "shutdown";

/// Result of a successful `start`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StartOutcome {
    /// A new window was opened and its marker saved
    Started { handle: String },
    /// The process was already running; nothing was created
    AlreadyRunning,
}

impl fmt::Display for StartOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartOutcome::Started { handle } => write!(f, "started in {}", handle),
            StartOutcome::AlreadyRunning => write!(f, "already running"),
        }
    }
}

/// Result of a successful `stop`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StopOutcome {
    /// `shutdown` was typed into the console; the marker is left in place
    ShutdownSent { handle: String },
    /// Graceful stop found no marker, so there was nothing to talk to
    NoSession,
    /// The process was signalled (if found) and the marker cleared
    ForceStopped { signalled: bool },
}

impl StopOutcome {
    /// Whether any stop action was carried out
    pub fn acted(&self) -> bool {
        matches!(
            self,
            StopOutcome::ShutdownSent { .. } | StopOutcome::ForceStopped { signalled: true }
        )
    }
}

impl fmt::Display for StopOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopOutcome::ShutdownSent { handle } => write!(f, "shutdown sent to {}", handle),
            StopOutcome::NoSession => write!(f, "no session found"),
            StopOutcome::ForceStopped { signalled: true } => write!(f, "terminated"),
            StopOutcome::ForceStopped { signalled: false } => {
                write!(f, "no process found, marker cleared")
            }
        }
    }
}

/// Both halves of a restart
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestartOutcome {
    pub stop: StopOutcome,
    pub start: StartOutcome,
}

/// Observed state of one logical process
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Observation {
    pub id: LogicalId,
    pub state: ProcessState,
    /// Believed multiplexer target, after reconciliation
    pub handle: Option<String>,
}

impl Observation {
    pub fn is_running(&self) -> bool {
        self.state == ProcessState::Running
    }
}

/// Lifecycle operations over a [`GridContext`].
///
/// Cheap to clone; clones share the in-flight guard.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    ctx: Arc<GridContext>,
    pub(crate) inflight: InFlight,
}

impl Orchestrator {
    pub fn new(ctx: GridContext) -> Self {
        Self {
            ctx: Arc::new(ctx),
            inflight: InFlight::new(),
        }
    }

    pub fn context(&self) -> &GridContext {
        &self.ctx
    }

    /// Valid estates under the estates root, sorted by name
    pub async fn estates(&self) -> Vec<String> {
        detect_estates(self.ctx.estates_root(), &self.ctx.transport).await
    }

    /// Fail unless the host is reachable and `id` is known to discovery
    pub async fn ensure_known(&self, id: &LogicalId) -> Result<(), LifecycleError> {
        if let Transport::Unknown = self.ctx.transport {
            return Err(LifecycleError::TransportUnavailable(id.clone()));
        }
        if let LogicalId::Estate(name) = id {
            if !self.estates().await.iter().any(|e| e == name) {
                return Err(LifecycleError::NotFound(id.clone()));
            }
        }
        Ok(())
    }

    /// Whether a live process matches `id`
    pub async fn is_running(&self, id: &LogicalId) -> bool {
        process::is_running(id, self.ctx.estates_root(), &self.ctx.transport).await
    }

    fn registry_error(id: &LogicalId, source: std::io::Error) -> LifecycleError {
        LifecycleError::Registry {
            target: id.clone(),
            source,
        }
    }

    /// Conventional handle for `id` in the base session
    pub fn default_handle(&self, id: &LogicalId) -> String {
        format!("{}:{}", self.ctx.session_name(), id.window_name())
    }

    /// Session marker for `id`, if any
    pub fn session_handle(&self, id: &LogicalId) -> Result<Option<String>, LifecycleError> {
        self.ctx
            .registry
            .load(id)
            .map_err(|e| Self::registry_error(id, e))
    }

    /// Record the conventional handle as the marker of a running `id`
    fn adopt(&self, id: &LogicalId) -> Result<String, LifecycleError> {
        let adopted = self.default_handle(id);
        tracing::info!("Adopting running {} as {}", id, adopted);
        self.ctx
            .registry
            .save(id, &adopted)
            .map_err(|e| Self::registry_error(id, e))?;
        Ok(adopted)
    }

    fn require_session(&self, id: &LogicalId) -> Result<String, LifecycleError> {
        self.session_handle(id)?
            .ok_or_else(|| LifecycleError::NoSession(id.clone()))
    }

    /// Observe `id`, reconciling its marker with the process check.
    ///
    /// Reconciliation is skipped while another operation holds `id`.
    pub async fn observe(&self, id: &LogicalId) -> Result<Observation, LifecycleError> {
        let running = self.is_running(id).await;
        let mut handle = self.session_handle(id)?;
        let reconcile = !self.inflight.is_busy(id);

        match (running, handle.take()) {
            (false, Some(stale)) if reconcile => {
                tracing::info!("Clearing stale session marker {} for {}", stale, id);
                self.ctx
                    .registry
                    .clear(id)
                    .map_err(|e| Self::registry_error(id, e))?;
            }
            (true, None) if reconcile => handle = Some(self.adopt(id)?),
            (_, current) => handle = current,
        }

        Ok(Observation {
            id: id.clone(),
            state: if running {
                ProcessState::Running
            } else {
                ProcessState::Stopped
            },
            handle,
        })
    }

    /// The directory process followed by every discovered estate
    pub async fn overview(&self) -> Result<Vec<Observation>, LifecycleError> {
        let mut ids = vec![LogicalId::Robust];
        ids.extend(self.estates().await.into_iter().map(LogicalId::Estate));

        let mut observations = Vec::with_capacity(ids.len());
        for id in &ids {
            observations.push(self.observe(id).await?);
        }
        Ok(observations)
    }

    /// Start `id` in its own window. A running process is left alone.
    pub async fn start(&self, id: &LogicalId) -> Result<StartOutcome, LifecycleError> {
        self.ensure_known(id).await?;
        let _guard = self.inflight.acquire(id)?;
        self.start_locked(id).await
    }

    /// Start `id`; the caller holds its in-flight guard
    pub(crate) async fn start_locked(&self, id: &LogicalId) -> Result<StartOutcome, LifecycleError> {
        if self.is_running(id).await {
            tracing::info!("{} is already running", id);
            return Ok(StartOutcome::AlreadyRunning);
        }

        let mux = &self.ctx.multiplexer;
        let available = mux
            .probe(&self.ctx.transport)
            .await
            .map_err(|e| LifecycleError::from_transport(id.clone(), e))?;
        if !available {
            return Err(LifecycleError::BinaryMissing {
                target: id.clone(),
                binary: mux.binary().to_string(),
            });
        }

        let command = launch_command(&self.ctx, id).await?;
        let window = id.window_name();
        let handle = mux
            .new_window(self.ctx.session_name(), &window, &command, &self.ctx.transport)
            .await
            .ok_or_else(|| LifecycleError::Multiplexer {
                target: id.clone(),
                reason: format!("could not open window {} in session {}", window, self.ctx.session_name()),
            })?;

        self.ctx
            .registry
            .save(id, &handle)
            .map_err(|e| Self::registry_error(id, e))?;
        tracing::info!("Started {} in {}", id, handle);
        Ok(StartOutcome::Started { handle })
    }

    /// Stop `id`.
    ///
    /// Graceful mode types `shutdown` into the session and returns without
    /// waiting; the marker stays until the next observation finds the
    /// process gone. A running process without a marker is adopted under its
    /// conventional handle first. Forced mode signals the process and always
    /// clears the marker, even when no process matched, the signal failed,
    /// or the host or estate cannot be reached.
    pub async fn stop(&self, id: &LogicalId, mode: StopMode) -> Result<StopOutcome, LifecycleError> {
        if let Err(e) = self.ensure_known(id).await {
            // The marker is local, so a forced stop can still drop it
            if mode == StopMode::Forced && !self.inflight.is_busy(id) {
                self.clear_session(id)?;
                tracing::info!("Cleared session marker of unreachable {}", id);
            }
            return Err(e);
        }
        let _guard = self.inflight.acquire(id)?;
        self.stop_locked(id, mode).await
    }

    /// Stop `id`; the caller holds its in-flight guard
    pub(crate) async fn stop_locked(&self, id: &LogicalId, mode: StopMode) -> Result<StopOutcome, LifecycleError> {
        match mode {
            StopMode::Graceful => {
                let handle = match self.session_handle(id)? {
                    Some(handle) => handle,
                    None if self.is_running(id).await => self.adopt(id)?,
                    None => {
                        tracing::info!("No session found for {}", id);
                        return Ok(StopOutcome::NoSession);
                    }
                };
                self.send_locked(id, &handle, SHUTDOWN_COMMAND).await?;
                tracing::info!("Sent graceful shutdown to {}", id);
                Ok(StopOutcome::ShutdownSent { handle })
            }
            StopMode::Forced => {
                let signalled = process::terminate(id, self.ctx.estates_root(), &self.ctx.transport).await;
                self.ctx
                    .registry
                    .clear(id)
                    .map_err(|e| Self::registry_error(id, e))?;
                let signalled = signalled.map_err(|e| LifecycleError::from_transport(id.clone(), e))?;
                Ok(StopOutcome::ForceStopped { signalled })
            }
        }
    }

    /// Stop, wait the settle delay, then start again.
    ///
    /// Not atomic: if the start half fails the process stays stopped and the
    /// error is returned.
    pub async fn restart(&self, id: &LogicalId, mode: StopMode) -> Result<RestartOutcome, LifecycleError> {
        self.ensure_known(id).await?;
        let _guard = self.inflight.acquire(id)?;

        let stop = self.stop_locked(id, mode).await?;
        tokio::time::sleep(self.ctx.panel.pacing.settle_delay).await;
        let start = self.start_locked(id).await?;
        if start == StartOutcome::AlreadyRunning {
            tracing::warn!("{} was still running after stop; restart did not relaunch it", id);
        }
        Ok(RestartOutcome { stop, start })
    }

    /// Remove the session marker for `id` without touching the process
    pub fn clear_session(&self, id: &LogicalId) -> Result<(), LifecycleError> {
        self.ctx
            .registry
            .clear(id)
            .map_err(|e| Self::registry_error(id, e))
    }

    async fn send_locked(&self, id: &LogicalId, handle: &str, text: &str) -> Result<(), LifecycleError> {
        let mux = &self.ctx.multiplexer;
        if mux.send_text(handle, text, &self.ctx.transport).await {
            return Ok(());
        }
        // Tell an unreachable host apart from a refused send
        match mux.probe(&self.ctx.transport).await {
            Err(e) => Err(LifecycleError::from_transport(id.clone(), e)),
            Ok(false) => Err(LifecycleError::BinaryMissing {
                target: id.clone(),
                binary: mux.binary().to_string(),
            }),
            Ok(true) => Err(LifecycleError::Multiplexer {
                target: id.clone(),
                reason: format!("could not send '{}' to {}", text, handle),
            }),
        }
    }

    /// Type `text` into the session of `id`. Refuses without a marker.
    pub async fn send_command(&self, id: &LogicalId, text: &str) -> Result<String, LifecycleError> {
        self.ensure_known(id).await?;
        let _guard = self.inflight.acquire(id)?;
        let handle = self.require_session(id)?;
        self.send_locked(id, &handle, text).await?;
        tracing::info!("Sent '{}' to {}", text, id);
        Ok(handle)
    }

    /// Trailing `lines` lines of the console of `id`
    pub async fn capture_output(&self, id: &LogicalId, lines: usize) -> Result<String, LifecycleError> {
        if let Transport::Unknown = self.ctx.transport {
            return Err(LifecycleError::TransportUnavailable(id.clone()));
        }
        let handle = self.require_session(id)?;
        Ok(self
            .ctx
            .multiplexer
            .capture_output(&handle, lines, &self.ctx.transport)
            .await)
    }

    /// Argument vector that attaches the operator's terminal to `id`
    pub fn attach_command(&self, id: &LogicalId) -> Result<Vec<String>, LifecycleError> {
        let handle = self.require_session(id)?;
        self.ctx
            .transport
            .interactive_command(&self.ctx.multiplexer.attach_argv(&handle))
            .ok_or_else(|| LifecycleError::TransportUnavailable(id.clone()))
    }

    /// Attach the operator's terminal to the console of `id` until detach
    pub async fn attach(&self, id: &LogicalId) -> Result<i32, LifecycleError> {
        let handle = self.require_session(id)?;
        tracing::info!("Attaching to {} ({})", id, handle);
        self.ctx
            .transport
            .run_interactive(&self.ctx.multiplexer.attach_argv(&handle))
            .await
            .map_err(|e| LifecycleError::from_transport(id.clone(), e))
    }
}
