//! Direct execution on this machine

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;

use super::CommandOutput;
use crate::error::TransportError;

/// Runs commands as child processes of the panel
#[derive(Debug, Clone, Default)]
pub struct LocalTransport {
    /// Directory searched before the inherited `PATH`
    path_prefix: Option<PathBuf>,
}

impl LocalTransport {
    /// Create a local transport using the inherited `PATH`
    pub fn new() -> Self {
        Self::default()
    }

    /// Search `dir` before the inherited `PATH` when resolving programs
    pub fn with_path_prefix(mut self, dir: impl Into<PathBuf>) -> Self {
        self.path_prefix = Some(dir.into());
        self
    }

    /// Effective `PATH` for child processes
    fn search_path(&self) -> Option<OsString> {
        let prefix = self.path_prefix.as_ref()?;
        let inherited = std::env::var_os("PATH").unwrap_or_default();
        let dirs = std::iter::once(prefix.clone()).chain(std::env::split_paths(&inherited));
        std::env::join_paths(dirs).ok()
    }

    /// Resolve `binary` against the effective `PATH`
    pub fn resolve(&self, binary: &str) -> Option<PathBuf> {
        let paths = self
            .search_path()
            .or_else(|| std::env::var_os("PATH"))?;
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        which::which_in(binary, Some(paths), cwd).ok()
    }

    /// Build a command for `argv` with the effective `PATH` applied
    pub(crate) fn command<S: AsRef<str>>(&self, argv: &[S]) -> Result<Command, TransportError> {
        let (program, args) = argv.split_first().ok_or_else(|| {
            TransportError::Io(io::Error::new(io::ErrorKind::InvalidInput, "empty command"))
        })?;

        let mut cmd = Command::new(program.as_ref());
        cmd.args(args.iter().map(AsRef::as_ref))
            .stdin(Stdio::null())
            .kill_on_drop(true);
        if let Some(path) = self.search_path() {
            cmd.env("PATH", path);
        }
        Ok(cmd)
    }

    pub async fn run<S: AsRef<str>>(
        &self,
        argv: &[S],
        capture: bool,
    ) -> Result<CommandOutput, TransportError> {
        let program = program_name(argv);
        let mut cmd = self.command(argv)?;
        tracing::debug!("local: {}", super::shell_join(argv));

        let map_spawn = |e: io::Error| spawn_error(&program, e);

        if capture {
            let output = cmd.output().await.map_err(map_spawn)?;
            Ok(CommandOutput {
                exit_code: output.status.code().unwrap_or(-1),
                stdout: Some(String::from_utf8_lossy(&output.stdout).into_owned()),
                stderr: Some(String::from_utf8_lossy(&output.stderr).into_owned()),
            })
        } else {
            let status = cmd
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await
                .map_err(map_spawn)?;
            Ok(CommandOutput {
                exit_code: status.code().unwrap_or(-1),
                stdout: None,
                stderr: None,
            })
        }
    }

    /// Run `argv` on the operator's terminal and wait for it to exit
    pub async fn run_interactive<S: AsRef<str>>(&self, argv: &[S]) -> Result<i32, TransportError> {
        let program = program_name(argv);
        let mut cmd = self.command(argv)?;
        tracing::debug!("local (interactive): {}", super::shell_join(argv));

        let status = cmd
            .stdin(Stdio::inherit())
            .kill_on_drop(false)
            .status()
            .await
            .map_err(|e| spawn_error(&program, e))?;
        Ok(status.code().unwrap_or(-1))
    }

    pub fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

fn program_name<S: AsRef<str>>(argv: &[S]) -> String {
    argv.first().map(|p| p.as_ref().to_string()).unwrap_or_default()
}

fn spawn_error(program: &str, e: io::Error) -> TransportError {
    if e.kind() == io::ErrorKind::NotFound {
        TransportError::BinaryMissing(program.to_string())
    } else {
        TransportError::Io(e)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn write_script(dir: &Path, name: &str, body: &str) {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[tokio::test]
    async fn test_capture_output() {
        let transport = LocalTransport::new();
        let output = transport.run(&["sh", "-c", "echo out; echo err >&2; exit 3"], true).await.unwrap();
        assert_eq!(output.exit_code, 3);
        assert_eq!(output.stdout.as_deref(), Some("out\n"));
        assert_eq!(output.stderr.as_deref(), Some("err\n"));
    }

    #[tokio::test]
    async fn test_no_capture_reports_exit_code_only() {
        let transport = LocalTransport::new();
        let output = transport.run(&["sh", "-c", "echo hidden"], false).await.unwrap();
        assert!(output.success());
        assert!(output.stdout.is_none());
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let transport = LocalTransport::new();
        let result = transport.run(&["gridctl-no-such-binary"], true).await;
        assert!(matches!(result, Err(TransportError::BinaryMissing(name)) if name == "gridctl-no-such-binary"));
    }

    #[tokio::test]
    async fn test_path_prefix_is_searched_first() {
        let dir = TempDir::new().unwrap();
        write_script(dir.path(), "gridctl-fake-tool", "echo from-prefix");

        let transport = LocalTransport::new().with_path_prefix(dir.path());
        let output = transport.run(&["gridctl-fake-tool"], true).await.unwrap();
        assert_eq!(output.stdout_str().trim(), "from-prefix");
        assert_eq!(
            transport.resolve("gridctl-fake-tool"),
            Some(dir.path().join("gridctl-fake-tool"))
        );
        assert!(LocalTransport::new().resolve("gridctl-fake-tool").is_none());
    }

    #[test]
    fn test_exists() {
        let dir = TempDir::new().unwrap();
        let transport = LocalTransport::new();
        assert!(transport.exists(dir.path()));
        assert!(!transport.exists(&dir.path().join("missing")));
    }
}
