//! Configuration management for gridctl
//!
//! Two files live in the per-user config directory: the `KEY="value"`
//! settings file shared with the shell tooling, and `gridctl.toml` with
//! panel tunables.

mod panel;
pub mod serde_utils;
mod settings;

pub use panel::{Pacing, PanelConfig};
pub use settings::{load_settings, load_settings_with, save_settings, Settings};

use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Get the default configuration directory
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gridctl")
}

/// Get the default panel configuration file path
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("gridctl.toml")
}

/// Get the default settings file path
pub fn default_settings_path() -> PathBuf {
    default_config_dir().join("settings")
}

/// Get the default session marker directory
pub fn default_marker_dir() -> PathBuf {
    default_config_dir().join("sessions")
}

/// Load configuration from a file
pub fn load_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Invalid(format!("Failed to read config: {}", e)))?;

    let config: T = toml::from_str(&content)?;
    Ok(config)
}
