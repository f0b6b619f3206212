//! Transport detection policy

use std::path::{Path, PathBuf};

use super::{LocalTransport, SshTransport, Transport, TransportConfig};

/// Inputs to [`detect_transport`] that do not come from settings
#[derive(Debug, Clone)]
pub struct DetectOptions {
    /// `VG_FORCE_SSH`: only ever use a probed SSH transport
    pub force_remote: bool,
    /// `VG_FORCE_LOCAL`: always run locally
    pub force_local: bool,
    /// Multiplexer binary that must be resolvable for the local heuristic
    pub multiplexer: String,
    /// Directory searched before `PATH` for local tools
    pub tool_dir: Option<PathBuf>,
}

impl Default for DetectOptions {
    fn default() -> Self {
        Self {
            force_remote: false,
            force_local: false,
            multiplexer: "tmux".to_string(),
            tool_dir: None,
        }
    }
}

impl DetectOptions {
    /// Read the force flags from the process environment
    pub fn from_env() -> Self {
        Self {
            force_remote: env_flag("VG_FORCE_SSH"),
            force_local: env_flag("VG_FORCE_LOCAL"),
            ..Self::default()
        }
    }

    pub fn with_multiplexer(mut self, multiplexer: impl Into<String>) -> Self {
        self.multiplexer = multiplexer.into();
        self
    }

    pub fn with_tool_dir(mut self, tool_dir: Option<PathBuf>) -> Self {
        self.tool_dir = tool_dir;
        self
    }

    fn local(&self) -> LocalTransport {
        match &self.tool_dir {
            Some(dir) => LocalTransport::new().with_path_prefix(dir),
            None => LocalTransport::new(),
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name).map(|v| is_truthy(&v)).unwrap_or(false)
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn build_ssh(cfg: &TransportConfig, local: LocalTransport) -> Option<SshTransport> {
    let host = cfg.host.as_ref()?;
    Some(
        SshTransport::new(host.clone(), cfg.port)
            .with_user(cfg.user.clone())
            .with_identity_file(cfg.identity_file.clone())
            .with_password(cfg.password.clone())
            .with_local(local),
    )
}

/// Decide how to reach the farm host.
///
/// Evaluated in order:
/// 1. force remote: SSH if credentials are configured and a probe succeeds, else Unknown
/// 2. force local: Local
/// 3. multiplexer on `PATH` and both directories present locally: Local
/// 4. remote credentials configured: SSH without probing
/// 5. Unknown
pub async fn detect_transport(
    base: &Path,
    estates: &Path,
    cfg: &TransportConfig,
    opts: &DetectOptions,
) -> Transport {
    let local = opts.local();

    if opts.force_remote {
        if !cfg.has_remote_credentials() {
            tracing::warn!("Remote transport forced but no host/credentials configured");
            return Transport::Unknown;
        }
        return match build_ssh(cfg, local) {
            Some(ssh) if ssh.probe().await => {
                tracing::info!("Using forced SSH transport to {}", ssh.destination());
                Transport::Ssh(ssh)
            }
            _ => {
                tracing::warn!("Remote transport forced but host is unreachable");
                Transport::Unknown
            }
        };
    }

    if opts.force_local {
        tracing::info!("Using forced local transport");
        return Transport::Local(local);
    }

    let multiplexer_found = local.resolve(&opts.multiplexer).is_some();
    if multiplexer_found && base.exists() && estates.exists() {
        tracing::debug!("Multiplexer and farm directories present locally");
        return Transport::Local(local);
    }

    if cfg.has_remote_credentials() {
        if let Some(ssh) = build_ssh(cfg, local) {
            tracing::info!("Using SSH transport to {}", ssh.destination());
            return Transport::Ssh(ssh);
        }
    }

    tracing::warn!("No usable transport: remote operations are disabled");
    Transport::Unknown
}
