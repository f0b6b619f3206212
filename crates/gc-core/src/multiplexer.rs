//! tmux driver
//!
//! Long-running simulators have no daemon mode, so each one runs in its own
//! window of a shared tmux session. That keeps them alive after the panel
//! exits and gives operators a console to attach to. Commands are typed
//! into the window; there is no acknowledgement beyond tmux's exit code.

use crate::error::TransportError;
use crate::transport::Transport;

/// Fixed size of a freshly created base session
const SESSION_WIDTH: u16 = 200;
const SESSION_HEIGHT: u16 = 50;

/// Drives a tmux binary through a [`Transport`]
#[derive(Debug, Clone)]
pub struct Multiplexer {
    binary: String,
}

impl Default for Multiplexer {
    fn default() -> Self {
        Self::new("tmux")
    }
}

impl Multiplexer {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// The multiplexer executable
    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn argv(&self, args: &[&str]) -> Vec<String> {
        std::iter::once(self.binary.as_str())
            .chain(args.iter().copied())
            .map(String::from)
            .collect()
    }

    /// Run `tmux -V`, keeping transport failures apart from a missing binary
    pub async fn probe(&self, transport: &Transport) -> Result<bool, TransportError> {
        match transport.run(&self.argv(&["-V"]), false).await {
            Ok(output) => Ok(output.success()),
            Err(TransportError::BinaryMissing(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Whether the binary runs on the host
    pub async fn ensure_available(&self, transport: &Transport) -> bool {
        self.probe(transport).await.unwrap_or(false)
    }

    /// Open window `window` in `session` running `command`.
    ///
    /// Creates the base session first if it does not exist. Returns the
    /// target `session:window`, or `None` on any failure.
    pub async fn new_window(
        &self,
        session: &str,
        window: &str,
        command: &str,
        transport: &Transport,
    ) -> Option<String> {
        if !self.ensure_available(transport).await {
            tracing::warn!("{} is not available", self.binary);
            return None;
        }

        if !transport.succeeds(&self.argv(&["has-session", "-t", session])).await {
            let width = SESSION_WIDTH.to_string();
            let height = SESSION_HEIGHT.to_string();
            let created = transport
                .succeeds(&self.argv(&["new-session", "-d", "-s", session, "-x", &width, "-y", &height]))
                .await;
            if !created {
                tracing::warn!("Failed to create base session {}", session);
                return None;
            }
            tracing::info!("Created base session {}", session);
        }

        match transport
            .run(&self.argv(&["new-window", "-d", "-t", session, "-n", window, command]), true)
            .await
        {
            Ok(output) if output.success() => Some(format!("{}:{}", session, window)),
            Ok(output) => {
                tracing::warn!(
                    "new-window {} failed ({}): {}",
                    window,
                    output.exit_code,
                    output.stderr_str().trim()
                );
                None
            }
            Err(e) => {
                tracing::warn!("new-window {} failed: {}", window, e);
                None
            }
        }
    }

    /// Type `text` followed by Enter into `target`.
    ///
    /// Only reports whether tmux accepted the keys.
    pub async fn send_text(&self, target: &str, text: &str, transport: &Transport) -> bool {
        if !self.ensure_available(transport).await {
            return false;
        }
        transport
            .succeeds(&self.argv(&["send-keys", "-t", target, text, "C-m"]))
            .await
    }

    /// Last `lines` lines of the pane scrollback, or empty on failure
    pub async fn capture_output(&self, target: &str, lines: usize, transport: &Transport) -> String {
        if !self.ensure_available(transport).await {
            return String::new();
        }
        let start = format!("-{}", lines);
        match transport
            .run(&self.argv(&["capture-pane", "-p", "-t", target, "-S", &start]), true)
            .await
        {
            Ok(output) if output.success() => output.stdout.unwrap_or_default(),
            Ok(_) => String::new(),
            Err(e) => {
                tracing::debug!("capture-pane {} failed: {}", target, e);
                String::new()
            }
        }
    }

    /// Argument vector attaching a terminal to `target`
    pub fn attach_argv(&self, target: &str) -> Vec<String> {
        self.argv(&["attach", "-t", target])
    }
}
