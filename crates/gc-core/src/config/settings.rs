//! Operator settings stored as `KEY="value"` lines
//!
//! The file format is shared with the legacy shell tooling, so it is read
//! line by line rather than as TOML: values may be double-, single- or
//! un-quoted, comments and unknown keys are skipped.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::transport::{TransportConfig, TransportMode};

const DEFAULT_BASE: &str = "/home/opensim/opensim/bin";
const DEFAULT_PORT: u16 = 22;

/// Paths and remote-host settings for the farm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory containing the simulator binaries
    pub base: PathBuf,
    /// Root directory holding one sub-directory per estate
    pub estates: PathBuf,
    pub remote_host: String,
    pub remote_user: String,
    pub remote_port: u16,
    /// Identity file passed to the remote shell
    pub remote_key: String,
    /// Accepted for compatibility; batch-mode SSH cannot use it
    pub remote_password: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base: PathBuf::from(DEFAULT_BASE),
            estates: PathBuf::from(DEFAULT_BASE).join("Estates"),
            remote_host: String::new(),
            remote_user: String::new(),
            remote_port: DEFAULT_PORT,
            remote_key: String::new(),
            remote_password: String::new(),
        }
    }
}

impl Settings {
    /// Built-in defaults overridden by environment variables of the same
    /// names as the file keys.
    pub fn from_env(env: impl Fn(&str) -> Option<String>) -> Self {
        let base = env("VG_BASE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BASE));
        let estates = env("VG_ESTATES")
            .map(PathBuf::from)
            .unwrap_or_else(|| base.join("Estates"));

        Self {
            base,
            estates,
            remote_host: env("VG_REMOTE_HOST").unwrap_or_default(),
            remote_user: env("VG_REMOTE_USER").unwrap_or_default(),
            remote_port: env("VG_REMOTE_PORT")
                .and_then(|p| p.trim().parse().ok())
                .unwrap_or(DEFAULT_PORT),
            remote_key: env("VG_REMOTE_KEY").unwrap_or_default(),
            remote_password: env("VG_REMOTE_PASSWORD").unwrap_or_default(),
        }
    }

    /// Apply every recognised `KEY="value"` line of `content`
    pub fn apply_file(&mut self, content: &str) {
        for (key, value) in content.lines().filter_map(parse_line) {
            if let Err(e) = self.set(key, value) {
                tracing::warn!("Ignoring settings line {}: {}", key, e);
            }
        }
    }

    /// Set one value by its file key (`VG_BASE`) or short name (`base`).
    ///
    /// Unknown keys are ignored; an unparsable port is an error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let key = key.trim().to_ascii_uppercase();
        let key = key.strip_prefix("VG_").unwrap_or(&key);
        match key {
            "BASE" => self.base = PathBuf::from(value),
            "ESTATES" => self.estates = PathBuf::from(value),
            "REMOTE_HOST" => self.remote_host = value.to_string(),
            "REMOTE_USER" => self.remote_user = value.to_string(),
            "REMOTE_PORT" => {
                self.remote_port = value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::Invalid(format!("invalid port: {}", value)))?;
            }
            "REMOTE_KEY" => self.remote_key = value.to_string(),
            "REMOTE_PASSWORD" => self.remote_password = value.to_string(),
            other => tracing::debug!("Unknown settings key {}", other),
        }
        Ok(())
    }

    /// Render in the on-disk format
    pub fn to_file_content(&self) -> String {
        let mut out = String::new();
        for (key, value) in self.entries() {
            let _ = writeln!(out, "{}=\"{}\"", key, value);
        }
        out
    }

    /// Key/value pairs in file order
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        vec![
            ("VG_BASE", self.base.display().to_string()),
            ("VG_ESTATES", self.estates.display().to_string()),
            ("VG_REMOTE_HOST", self.remote_host.clone()),
            ("VG_REMOTE_USER", self.remote_user.clone()),
            ("VG_REMOTE_PORT", self.remote_port.to_string()),
            ("VG_REMOTE_KEY", self.remote_key.clone()),
            ("VG_REMOTE_PASSWORD", self.remote_password.clone()),
        ]
    }

    /// Remote-shell parameters derived from these settings
    pub fn transport_config(&self) -> TransportConfig {
        fn non_empty(s: &str) -> Option<String> {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }

        TransportConfig {
            mode: TransportMode::Unknown,
            host: non_empty(&self.remote_host),
            user: non_empty(&self.remote_user),
            port: self.remote_port,
            identity_file: non_empty(&self.remote_key).map(PathBuf::from),
            password: non_empty(&self.remote_password),
        }
    }
}

/// Split a settings line into key and unquoted value
fn parse_line(line: &str) -> Option<(&str, &str)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let (key, value) = line.split_once('=')?;
    let value = value.trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value);
    Some((key.trim(), value))
}

/// Load settings: defaults, then environment, then the file at `path`.
///
/// A missing file is not an error.
pub fn load_settings(path: &Path) -> Settings {
    load_settings_with(path, |key| std::env::var(key).ok())
}

/// [`load_settings`] with an injectable environment lookup
pub fn load_settings_with(path: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::from_env(env);
    match std::fs::read_to_string(path) {
        Ok(content) => settings.apply_file(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No settings file at {:?}, using defaults", path);
        }
        Err(e) => tracing::warn!("Failed to read settings {:?}: {}", path, e),
    }
    settings
}

/// Write settings to `path`, creating the parent directory
pub fn save_settings(path: &Path, settings: &Settings) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ConfigError::Invalid(format!("Failed to create config dir: {}", e)))?;
    }
    std::fs::write(path, settings.to_file_content())
        .map_err(|e| ConfigError::Invalid(format!("Failed to write settings: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_parse_line_variants() {
        assert_eq!(parse_line("VG_BASE=\"/srv/os\""), Some(("VG_BASE", "/srv/os")));
        assert_eq!(parse_line("VG_BASE='/srv/os'"), Some(("VG_BASE", "/srv/os")));
        assert_eq!(parse_line("  VG_BASE = /srv/os  "), Some(("VG_BASE", "/srv/os")));
        assert_eq!(parse_line("# comment"), None);
        assert_eq!(parse_line(""), None);
        assert_eq!(parse_line("no equals sign"), None);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = load_settings_with(&dir.path().join("settings"), env_from(&[]));
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.estates, PathBuf::from("/home/opensim/opensim/bin/Estates"));
    }

    #[test]
    fn test_env_then_file_precedence() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings");
        std::fs::write(
            &path,
            "VG_REMOTE_HOST=\"grid.example.net\"\nVG_UNKNOWN=\"x\"\nVG_REMOTE_PORT=\"oops\"\n",
        )
        .unwrap();

        let settings = load_settings_with(
            &path,
            env_from(&[("VG_BASE", "/srv/os"), ("VG_REMOTE_HOST", "env-host")]),
        );
        assert_eq!(settings.base, PathBuf::from("/srv/os"));
        assert_eq!(settings.estates, PathBuf::from("/srv/os/Estates"));
        assert_eq!(settings.remote_host, "grid.example.net");
        assert_eq!(settings.remote_port, 22);
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cfg").join("settings");
        let mut settings = Settings::default();
        settings.remote_host = "grid".into();
        settings.remote_port = 2222;
        settings.remote_key = "/home/op/.ssh/id_ed25519".into();

        save_settings(&path, &settings).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("VG_REMOTE_PORT=\"2222\""));

        let loaded = load_settings_with(&path, env_from(&[]));
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_set_accepts_short_names() {
        let mut settings = Settings::default();
        settings.set("remote_user", "opensim").unwrap();
        settings.set("VG_ESTATES", "/data/estates").unwrap();
        assert_eq!(settings.remote_user, "opensim");
        assert_eq!(settings.estates, PathBuf::from("/data/estates"));
        assert!(settings.set("remote_port", "abc").is_err());
    }

    #[test]
    fn test_transport_config_drops_empty_values() {
        let mut settings = Settings::default();
        settings.remote_host = "grid".into();
        settings.remote_key = "  ".into();
        let cfg = settings.transport_config();
        assert_eq!(cfg.host.as_deref(), Some("grid"));
        assert!(cfg.identity_file.is_none());
        assert!(cfg.password.is_none());
    }
}
