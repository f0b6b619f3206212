//! gc-orchestrator: lifecycle control for the directory process and estates
//!
//! Every process runs in its own tmux window on the farm host. The
//! orchestrator starts and stops those windows, reconciles session markers
//! against live processes, and paces bulk operations so the host is not
//! flooded with simulators starting at once.

pub mod batch;
pub mod guard;
pub mod launch;
pub mod lifecycle;
pub mod login;
pub mod state;

pub use batch::{pause_after, BatchEvent, BatchItem, BatchOp, BatchReport, ItemOutcome, PauseKind};
pub use guard::InFlight;
pub use lifecycle::{Observation, Orchestrator, RestartOutcome, StartOutcome, StopOutcome};
pub use login::{classify_login_output, LoginAction, LoginResult, LoginStatus};
pub use state::GridContext;
