//! Core error types for gridctl

use std::path::PathBuf;
use thiserror::Error;

use crate::types::LogicalId;

/// Top-level error type for the gridctl crates
#[derive(Error, Debug)]
pub enum GridError {
    /// Transport error
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Lifecycle error
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// Failures while executing a command through a transport
#[derive(Error, Debug)]
pub enum TransportError {
    /// No usable local or remote execution path was detected
    #[error("no usable local or remote execution path (unknown transport)")]
    Unavailable,

    /// The program to run could not be found
    #[error("binary not found: {0}")]
    BinaryMissing(String),

    /// The remote shell could not reach or authenticate against the host
    #[error("cannot reach {host}: {detail}")]
    ConnectFailure { host: String, detail: String },

    /// Spawning or waiting on the process failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures reported by lifecycle operations.
///
/// Every variant carries the target so the operator sees which process a
/// status line refers to.
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// Estate is not part of the current discovery
    #[error("{0}: not found among discovered estates")]
    NotFound(LogicalId),

    /// No transport is available to reach the host
    #[error("{0}: transport unavailable")]
    TransportUnavailable(LogicalId),

    /// A required executable is missing
    #[error("{target}: binary missing: {binary}")]
    BinaryMissing { target: LogicalId, binary: String },

    /// The transport failed while running a command
    #[error("{target}: {source}")]
    Transport {
        target: LogicalId,
        #[source]
        source: TransportError,
    },

    /// The multiplexer refused the request
    #[error("{target}: multiplexer error: {reason}")]
    Multiplexer { target: LogicalId, reason: String },

    /// The target has no registry marker
    #[error("{0}: no session found")]
    NoSession(LogicalId),

    /// Another operation for the same target is still running
    #[error("{0}: another operation is already in progress")]
    InFlight(LogicalId),

    /// Reading or writing the session marker failed
    #[error("{target}: session marker error: {source}")]
    Registry {
        target: LogicalId,
        #[source]
        source: std::io::Error,
    },

    /// Some items of a bulk operation failed
    #[error("{} of {total} items failed: {}", .failed.len(), .failed.join(", "))]
    PartialBatchFailure { failed: Vec<String>, total: usize },
}

impl LifecycleError {
    /// Wrap a transport error, promoting `Unavailable` and `BinaryMissing`
    /// to their own variants.
    pub fn from_transport(target: LogicalId, err: TransportError) -> Self {
        match err {
            TransportError::Unavailable => LifecycleError::TransportUnavailable(target),
            TransportError::BinaryMissing(binary) => LifecycleError::BinaryMissing { target, binary },
            source => LifecycleError::Transport { target, source },
        }
    }

    /// Short machine-friendly name of the failure kind
    pub fn kind(&self) -> &'static str {
        match self {
            LifecycleError::NotFound(_) => "not-found",
            LifecycleError::TransportUnavailable(_) => "transport-unavailable",
            LifecycleError::BinaryMissing { .. } => "binary-missing",
            LifecycleError::Transport {
                source: TransportError::ConnectFailure { .. },
                ..
            } => "connect-failure",
            LifecycleError::Transport { .. } => "transport",
            LifecycleError::Multiplexer { .. } => "multiplexer",
            LifecycleError::NoSession(_) => "no-session",
            LifecycleError::InFlight(_) => "in-flight",
            LifecycleError::Registry { .. } => "registry",
            LifecycleError::PartialBatchFailure { .. } => "partial-batch-failure",
        }
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_target() {
        let err = LifecycleError::NoSession(LogicalId::Robust);
        assert_eq!(err.to_string(), "robust: no session found");

        let err = LifecycleError::NotFound(LogicalId::estate("Harbor"));
        assert!(err.to_string().starts_with("estate:Harbor"));
    }

    #[test]
    fn test_partial_batch_failure_lists_items() {
        let err = LifecycleError::PartialBatchFailure {
            failed: vec!["estate:A".into(), "estate:C".into()],
            total: 5,
        };
        assert_eq!(err.to_string(), "2 of 5 items failed: estate:A, estate:C");
    }

    #[test]
    fn test_from_transport_promotes_kinds() {
        let err = LifecycleError::from_transport(LogicalId::Robust, TransportError::Unavailable);
        assert_eq!(err.kind(), "transport-unavailable");

        let err = LifecycleError::from_transport(
            LogicalId::Robust,
            TransportError::BinaryMissing("tmux".into()),
        );
        assert_eq!(err.kind(), "binary-missing");

        let err = LifecycleError::from_transport(
            LogicalId::Robust,
            TransportError::ConnectFailure {
                host: "grid".into(),
                detail: "timed out".into(),
            },
        );
        assert_eq!(err.kind(), "connect-failure");
    }
}
