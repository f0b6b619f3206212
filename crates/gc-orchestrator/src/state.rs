//! Application context shared by every operation

use std::path::Path;

use gc_core::config::{PanelConfig, Settings};
use gc_core::{detect_transport, DetectOptions, Multiplexer, SessionRegistry, Transport};

/// Everything an operation needs to reach the farm.
///
/// Built once at startup; the transport does not change afterwards.
#[derive(Debug, Clone)]
pub struct GridContext {
    /// Paths and remote-host settings
    pub settings: Settings,
    /// Panel tunables
    pub panel: PanelConfig,
    /// Execution path to the farm host
    pub transport: Transport,
    /// Session markers
    pub registry: SessionRegistry,
    /// tmux driver
    pub multiplexer: Multiplexer,
}

impl GridContext {
    /// Create a context around an already chosen transport
    pub fn new(settings: Settings, panel: PanelConfig, transport: Transport) -> Self {
        let registry = SessionRegistry::new(panel.marker_dir());
        let multiplexer = Multiplexer::new(panel.multiplexer.clone());
        Self {
            settings,
            panel,
            transport,
            registry,
            multiplexer,
        }
    }

    /// Detect the transport from settings and `opts`, then build the context
    pub async fn detect(settings: Settings, panel: PanelConfig, opts: DetectOptions) -> Self {
        let opts = opts
            .with_multiplexer(panel.multiplexer.clone())
            .with_tool_dir(panel.tool_dir.clone());
        let transport = detect_transport(
            &settings.base,
            &settings.estates,
            &settings.transport_config(),
            &opts,
        )
        .await;
        Self::new(settings, panel, transport)
    }

    /// Replace the registry (tests point it at a temp dir)
    pub fn with_registry(mut self, registry: SessionRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Directory containing the simulator binaries
    pub fn base(&self) -> &Path {
        &self.settings.base
    }

    /// Root holding one directory per estate
    pub fn estates_root(&self) -> &Path {
        &self.settings.estates
    }

    /// Base tmux session name
    pub fn session_name(&self) -> &str {
        &self.panel.session_name
    }
}
