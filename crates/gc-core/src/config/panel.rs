//! Panel configuration (`gridctl.toml`)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::serde_utils::duration_secs;

/// Tunables for the operator panel
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Base multiplexer session that hosts every process window
    pub session_name: String,

    /// Multiplexer executable
    pub multiplexer: String,

    /// Extra directory searched first for local tools (tmux, ssh, pgrep)
    pub tool_dir: Option<PathBuf>,

    /// Directory holding session markers (defaults to `<config>/sessions`)
    pub marker_dir: Option<PathBuf>,

    /// Scrollback lines captured for console views
    pub capture_lines: usize,

    /// Pacing for restarts and bulk operations
    pub pacing: Pacing,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            session_name: "gridctl".to_string(),
            multiplexer: "tmux".to_string(),
            tool_dir: None,
            marker_dir: None,
            capture_lines: 200,
            pacing: Pacing::default(),
        }
    }
}

impl PanelConfig {
    /// Load from `path` (or the default location), falling back to defaults
    /// when the file is absent or unreadable.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(super::default_config_path);

        if !path.exists() {
            tracing::debug!("No panel config at {:?}, using defaults", path);
            return Self::default();
        }

        super::load_config(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config from {:?}: {}", path, e);
            Self::default()
        })
    }

    /// Effective marker directory
    pub fn marker_dir(&self) -> PathBuf {
        self.marker_dir
            .clone()
            .unwrap_or_else(super::default_marker_dir)
    }
}

/// Throttling applied to restarts and start-all/stop-all
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pacing {
    /// Operations per batch before a cooldown
    pub batch_size: usize,

    /// Pause after each full batch
    #[serde(with = "duration_secs")]
    pub cooldown: Duration,

    /// Pause between operations inside a batch
    #[serde(with = "duration_secs")]
    pub item_delay: Duration,

    /// Pause between the stop and start halves of a restart
    #[serde(with = "duration_secs")]
    pub settle_delay: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            batch_size: 3,
            cooldown: Duration::from_secs(20),
            item_delay: Duration::from_secs(2),
            settle_delay: Duration::from_secs(2),
        }
    }
}

impl Pacing {
    /// Pacing with every delay set to zero
    pub fn immediate() -> Self {
        Self {
            batch_size: 3,
            cooldown: Duration::ZERO,
            item_delay: Duration::ZERO,
            settle_delay: Duration::ZERO,
        }
    }
}
