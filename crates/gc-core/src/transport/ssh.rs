//! Execution through the system `ssh` client

use std::path::{Path, PathBuf};

use super::{shell_join, CommandOutput, LocalTransport};
use crate::error::TransportError;

/// Connect timeout handed to `ssh -o ConnectTimeout`
pub const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Exit status `ssh` uses for its own failures
const SSH_ERROR_STATUS: i32 = 255;

/// Wraps every command in a non-interactive `ssh` invocation
#[derive(Debug, Clone)]
pub struct SshTransport {
    host: String,
    user: Option<String>,
    port: u16,
    identity_file: Option<PathBuf>,
    password: Option<String>,
    /// Runs the `ssh` client itself
    local: LocalTransport,
}

impl SshTransport {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            user: None,
            port,
            identity_file: None,
            password: None,
            local: LocalTransport::new(),
        }
    }

    pub fn with_user(mut self, user: Option<String>) -> Self {
        self.user = user;
        self
    }

    pub fn with_identity_file(mut self, identity_file: Option<PathBuf>) -> Self {
        self.identity_file = identity_file;
        self
    }

    /// Record a password. Batch mode cannot answer password prompts, so a
    /// password without an identity file is logged as unsupported.
    pub fn with_password(mut self, password: Option<String>) -> Self {
        if password.is_some() && self.identity_file.is_none() {
            tracing::warn!(
                "Password-only authentication for {} is unsupported in batch mode; \
                 configure an identity file",
                self.host
            );
        }
        self.password = password;
        self
    }

    /// Local transport used to launch `ssh`
    pub fn with_local(mut self, local: LocalTransport) -> Self {
        self.local = local;
        self
    }

    /// `user@host` or `host`
    pub fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{}@{}", user, self.host),
            None => self.host.clone(),
        }
    }

    /// Local transport that launches `ssh`
    pub fn launcher(&self) -> &LocalTransport {
        &self.local
    }

    /// Whether only password material is configured
    pub fn password_only(&self) -> bool {
        self.password.is_some() && self.identity_file.is_none()
    }

    /// `ssh` options shared by every invocation
    fn prefix(&self, tty: bool) -> Vec<String> {
        let mut argv = vec!["ssh".to_string()];
        if tty {
            argv.push("-t".to_string());
        } else {
            argv.extend(
                [
                    "-o",
                    "BatchMode=yes",
                    "-o",
                    "StrictHostKeyChecking=accept-new",
                ]
                .map(String::from),
            );
        }
        argv.push("-o".to_string());
        argv.push(format!("ConnectTimeout={}", CONNECT_TIMEOUT_SECS));
        argv.push("-p".to_string());
        argv.push(self.port.to_string());
        if let Some(identity) = &self.identity_file {
            argv.push("-i".to_string());
            argv.push(identity.display().to_string());
        }
        argv.push(self.destination());
        argv
    }

    /// Full local argument vector that runs `argv` on the remote host
    pub fn wrap<S: AsRef<str>>(&self, argv: &[S]) -> Vec<String> {
        let mut full = self.prefix(false);
        full.push("--".to_string());
        full.push(shell_join(argv));
        full
    }

    /// Argument vector for an interactive session running `argv`
    pub fn interactive_argv(&self, argv: &[String]) -> Vec<String> {
        let mut full = self.prefix(true);
        full.push("--".to_string());
        full.push(shell_join(argv));
        full
    }

    pub async fn run<S: AsRef<str>>(
        &self,
        argv: &[S],
        capture: bool,
    ) -> Result<CommandOutput, TransportError> {
        // Capture stderr even when the caller does not, so connection
        // failures can be told apart from remote exit codes.
        let wrapped = self.wrap(argv);
        let output = self.local.run(&wrapped[..], true).await?;
        if output.exit_code == SSH_ERROR_STATUS {
            return Err(TransportError::ConnectFailure {
                host: self.destination(),
                detail: output.stderr_str().trim().to_string(),
            });
        }
        if capture {
            Ok(output)
        } else {
            Ok(CommandOutput {
                exit_code: output.exit_code,
                stdout: None,
                stderr: None,
            })
        }
    }

    pub async fn exists(&self, path: &Path) -> bool {
        let path = path.display().to_string();
        match self.run(&["test", "-e", path.as_str()], false).await {
            Ok(output) => output.success(),
            Err(e) => {
                tracing::warn!("Remote existence check for {} failed: {}", path, e);
                false
            }
        }
    }

    /// Unauthenticated reachability probe: runs `true` on the host
    pub async fn probe(&self) -> bool {
        match self.run(&["true"], false).await {
            Ok(output) => output.success(),
            Err(e) => {
                tracing::info!("SSH probe of {} failed: {}", self.destination(), e);
                false
            }
        }
    }
}
