//! gc-core: Core abstractions for gridctl
//!
//! This crate provides the command transport (local or SSH), the session
//! registry, the tmux driver, estate discovery and the settings/config
//! layer used by the orchestrator and the CLI.

pub mod config;
pub mod error;
pub mod estates;
pub mod multiplexer;
pub mod process;
pub mod registry;
pub mod system;
pub mod transport;
pub mod types;

pub use error::{GridError, LifecycleError, TransportError};
pub use multiplexer::Multiplexer;
pub use registry::SessionRegistry;
pub use transport::{detect_transport, CommandOutput, DetectOptions, Transport, TransportConfig};
pub use types::LogicalId;
