//! Command execution on the farm host
//!
//! Every operation that touches the host (tmux, process lookup, file
//! probes) goes through a [`Transport`]. The variant is chosen once at
//! startup by [`detect_transport`] and never changes afterwards.

mod detect;
mod local;
mod ssh;

pub use detect::{detect_transport, DetectOptions};
pub use local::LocalTransport;
pub use ssh::{SshTransport, CONNECT_TIMEOUT_SECS};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::TransportError;

/// Which execution path a transport uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    Local,
    Ssh,
    Unknown,
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMode::Local => write!(f, "local"),
            TransportMode::Ssh => write!(f, "ssh"),
            TransportMode::Unknown => write!(f, "unknown"),
        }
    }
}

/// Parameters a transport is built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub mode: TransportMode,
    pub host: Option<String>,
    pub user: Option<String>,
    pub port: u16,
    pub identity_file: Option<PathBuf>,
    pub password: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            mode: TransportMode::Unknown,
            host: None,
            user: None,
            port: 22,
            identity_file: None,
            password: None,
        }
    }
}

impl TransportConfig {
    /// True when a host and some credential material are configured
    pub fn has_remote_credentials(&self) -> bool {
        self.host.is_some() && (self.identity_file.is_some() || self.password.is_some())
    }
}

/// Result of running one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `-1` when the process was killed by a signal
    pub exit_code: i32,
    /// Captured stdout (`None` when capture was off)
    pub stdout: Option<String>,
    /// Captured stderr (`None` when capture was off)
    pub stderr: Option<String>,
}

impl CommandOutput {
    /// Whether the command exited with status 0
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Captured stdout or an empty string
    pub fn stdout_str(&self) -> &str {
        self.stdout.as_deref().unwrap_or("")
    }

    /// Captured stderr or an empty string
    pub fn stderr_str(&self) -> &str {
        self.stderr.as_deref().unwrap_or("")
    }
}

/// Local-or-remote command execution.
///
/// A closed set of variants: `Unknown` is the fail-closed default used
/// when no usable configuration exists, so callers see typed failures
/// instead of crashes.
#[derive(Debug, Clone)]
pub enum Transport {
    Local(LocalTransport),
    Ssh(SshTransport),
    Unknown,
}

impl Transport {
    /// Plain local transport
    pub fn local() -> Self {
        Transport::Local(LocalTransport::new())
    }

    /// Run `argv` on the host.
    ///
    /// With `capture == false` output is discarded and only the exit code
    /// is reported. A non-zero exit is *not* an error; only failures to
    /// execute at all are.
    pub async fn run<S: AsRef<str>>(
        &self,
        argv: &[S],
        capture: bool,
    ) -> Result<CommandOutput, TransportError> {
        match self {
            Transport::Local(local) => local.run(argv, capture).await,
            Transport::Ssh(ssh) => ssh.run(argv, capture).await,
            Transport::Unknown => Err(TransportError::Unavailable),
        }
    }

    /// Whether `path` exists on the host
    pub async fn exists(&self, path: &Path) -> bool {
        match self {
            Transport::Local(local) => local.exists(path),
            Transport::Ssh(ssh) => ssh.exists(path).await,
            Transport::Unknown => false,
        }
    }

    /// Run `argv` and report only whether it exited successfully
    pub async fn succeeds<S: AsRef<str>>(&self, argv: &[S]) -> bool {
        match self.run(argv, false).await {
            Ok(output) => output.success(),
            Err(e) => {
                tracing::debug!("Command failed to run: {}", e);
                false
            }
        }
    }

    /// Execution mode of this transport
    pub fn mode(&self) -> TransportMode {
        match self {
            Transport::Local(_) => TransportMode::Local,
            Transport::Ssh(_) => TransportMode::Ssh,
            Transport::Unknown => TransportMode::Unknown,
        }
    }

    /// Argument vector that hands the operator's terminal to `argv` on the
    /// host (allocating a remote TTY for SSH).
    pub fn interactive_command(&self, argv: &[String]) -> Option<Vec<String>> {
        match self {
            Transport::Local(_) => Some(argv.to_vec()),
            Transport::Ssh(ssh) => Some(ssh.interactive_argv(argv)),
            Transport::Unknown => None,
        }
    }

    /// Hand the operator's terminal to `argv` on the host and wait for it.
    ///
    /// Returns the exit code of the interactive program (or of `ssh`).
    pub async fn run_interactive(&self, argv: &[String]) -> Result<i32, TransportError> {
        match self {
            Transport::Local(local) => local.run_interactive(argv).await,
            Transport::Ssh(ssh) => {
                ssh.launcher()
                    .run_interactive(&ssh.interactive_argv(argv))
                    .await
            }
            Transport::Unknown => Err(TransportError::Unavailable),
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Local(_) => write!(f, "local"),
            Transport::Ssh(ssh) => write!(f, "ssh {}", ssh.destination()),
            Transport::Unknown => write!(f, "unknown"),
        }
    }
}

/// Quote one word for a POSIX shell
pub fn shell_quote(word: &str) -> String {
    if !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@%+,".contains(c))
    {
        return word.to_string();
    }
    format!("'{}'", word.replace('\'', "'\\''"))
}

/// Quote and join an argument vector into one shell command line
pub fn shell_join<S: AsRef<str>>(argv: &[S]) -> String {
    argv.iter()
        .map(|a| shell_quote(a.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}
