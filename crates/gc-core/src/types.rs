//! Core domain types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical identity of a supervised process.
///
/// The directory process is a singleton; estates are identified by the
/// basename of their configuration directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum LogicalId {
    /// The Robust directory process
    Robust,
    /// An estate worker bound to `<estates_root>/<name>`
    Estate(String),
}

impl LogicalId {
    /// Create an estate identity
    pub fn estate(name: impl Into<String>) -> Self {
        LogicalId::Estate(name.into())
    }

    /// Parse operator input: `robust`, `estate:<name>` or a bare estate name
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        if input.eq_ignore_ascii_case("robust") {
            return Some(LogicalId::Robust);
        }
        let name = input.strip_prefix("estate:").unwrap_or(input);
        if name.is_empty() || name.contains('/') {
            return None;
        }
        Some(LogicalId::Estate(name.to_string()))
    }

    /// File name of the registry marker for this identity
    pub fn marker_file_name(&self) -> String {
        match self {
            LogicalId::Robust => "robust.session".to_string(),
            LogicalId::Estate(name) => format!("estate_{}.session", name),
        }
    }

    /// Name of the multiplexer window hosting this process.
    ///
    /// tmux splits targets on `:` and `.`, so both become `_`.
    pub fn window_name(&self) -> String {
        match self {
            LogicalId::Robust => "robust".to_string(),
            LogicalId::Estate(name) => format!("estate-{}", name.replace(['.', ':'], "_")),
        }
    }
}

impl fmt::Display for LogicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalId::Robust => write!(f, "robust"),
            LogicalId::Estate(name) => write!(f, "estate:{}", name),
        }
    }
}

/// Observed lifecycle state of a logical process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessState {
    /// No live process matched
    Stopped,
    /// A live process matched the launch heuristic
    Running,
}

impl fmt::Display for ProcessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessState::Stopped => write!(f, "STOPPED"),
            ProcessState::Running => write!(f, "RUNNING"),
        }
    }
}

/// How a stop request should be carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopMode {
    /// Type `shutdown` into the console and let the process exit on its own
    #[default]
    Graceful,
    /// Signal the process and clear the session marker
    Forced,
}

impl fmt::Display for StopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopMode::Graceful => write!(f, "graceful"),
            StopMode::Forced => write!(f, "forced"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_logical_id() {
        assert_eq!(LogicalId::parse("robust"), Some(LogicalId::Robust));
        assert_eq!(LogicalId::parse("ROBUST"), Some(LogicalId::Robust));
        assert_eq!(LogicalId::parse("estate:Harbor"), Some(LogicalId::estate("Harbor")));
        assert_eq!(LogicalId::parse("Harbor"), Some(LogicalId::estate("Harbor")));
        assert_eq!(LogicalId::parse(""), None);
        assert_eq!(LogicalId::parse("estate:"), None);
        assert_eq!(LogicalId::parse("../etc"), None);
    }

    #[test]
    fn test_names() {
        let id = LogicalId::estate("Harbor");
        assert_eq!(id.to_string(), "estate:Harbor");
        assert_eq!(id.marker_file_name(), "estate_Harbor.session");
        assert_eq!(id.window_name(), "estate-Harbor");
        assert_eq!(LogicalId::Robust.marker_file_name(), "robust.session");
        assert_eq!(LogicalId::Robust.window_name(), "robust");
    }

    #[test]
    fn test_window_name_is_a_valid_tmux_target() {
        let id = LogicalId::estate("Harbor.v2");
        assert_eq!(id.window_name(), "estate-Harbor_v2");
        assert_eq!(id.marker_file_name(), "estate_Harbor.v2.session");
        assert_eq!(LogicalId::estate("a:b.c").window_name(), "estate-a_b_c");
    }

    #[test]
    fn test_process_state_display() {
        assert_eq!(format!("{}", ProcessState::Running), "RUNNING");
        assert_eq!(format!("{}", ProcessState::Stopped), "STOPPED");
    }
}
