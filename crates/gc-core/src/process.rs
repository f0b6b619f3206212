//! Process liveness heuristics
//!
//! A process counts as running when some command line on the host contains
//! its launch argument: `inidirectory=<root>/<name>` for estates and
//! `inifile=Robust.HG.ini` for the directory process. This is a substring
//! heuristic over `pgrep -f`; an unrelated process embedding the same text
//! is reported as running too.

use std::path::Path;

use crate::error::TransportError;
use crate::transport::Transport;
use crate::types::LogicalId;

/// Ini file the directory process is launched with
pub const ROBUST_INI: &str = "Robust.HG.ini";

const MARKER_END: &str = "([ \"';]|$)";

/// Escape `text` for use in a POSIX extended regular expression
pub fn ere_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if ".[]()*+?^$|\\{}".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Launch argument identifying the estate `name` under `root`
pub fn estate_marker(root: &Path, name: &str) -> String {
    format!("inidirectory={}", root.join(name).display())
}

/// Launch argument identifying the directory process
pub fn robust_marker() -> String {
    format!("inifile={}", ROBUST_INI)
}

/// `pgrep`/`pkill` pattern for `id`.
///
/// The marker must be followed by a word break (space, quote, `;`) or end
/// of line, so `Harbor` does not match `Harbor2`. A shell running the
/// search itself never matches: the pattern text continues with `(`.
pub fn pattern_for(id: &LogicalId, estates_root: &Path) -> String {
    let marker = match id {
        LogicalId::Robust => robust_marker(),
        LogicalId::Estate(name) => estate_marker(estates_root, name),
    };
    format!("{}{}", ere_escape(&marker), MARKER_END)
}

/// Whether any process command line matches `pattern`
pub async fn process_running(pattern: &str, transport: &Transport) -> Result<bool, TransportError> {
    let output = transport.run(&["pgrep", "-f", pattern], false).await?;
    Ok(output.success())
}

/// Whether the estate `name` under `root` has a live process
pub async fn running_instance(root: &Path, name: &str, transport: &Transport) -> bool {
    is_running(&LogicalId::estate(name), root, transport).await
}

/// Whether `id` has a live process. Transport failures read as not running.
pub async fn is_running(id: &LogicalId, estates_root: &Path, transport: &Transport) -> bool {
    match process_running(&pattern_for(id, estates_root), transport).await {
        Ok(running) => running,
        Err(e) => {
            tracing::debug!("Process check for {} failed: {}", id, e);
            false
        }
    }
}

/// Send SIGTERM to every process matching `id`.
///
/// Returns whether any process was signalled.
pub async fn terminate(id: &LogicalId, estates_root: &Path, transport: &Transport) -> Result<bool, TransportError> {
    let pattern = pattern_for(id, estates_root);
    let output = transport.run(&["pkill", "-TERM", "-f", pattern.as_str()], false).await?;
    if output.success() {
        tracing::info!("Sent SIGTERM to {}", id);
    } else {
        tracing::debug!("No process matched {} (pkill exit {})", id, output.exit_code);
    }
    Ok(output.success())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ere_escape() {
        assert_eq!(ere_escape("Robust.HG.ini"), "Robust\\.HG\\.ini");
        assert_eq!(ere_escape("/srv/a (b)"), "/srv/a \\(b\\)");
        assert_eq!(ere_escape("plain"), "plain");
    }

    #[test]
    fn test_patterns() {
        let root = Path::new("/srv/opensim/Estates");
        assert_eq!(
            pattern_for(&LogicalId::estate("Harbor"), root),
            "inidirectory=/srv/opensim/Estates/Harbor([ \"';]|$)"
        );
        assert_eq!(pattern_for(&LogicalId::Robust, root), "inifile=Robust\\.HG\\.ini([ \"';]|$)");
    }

    #[tokio::test]
    async fn test_unknown_transport_is_not_running() {
        let root = Path::new("/srv/opensim/Estates");
        assert!(!running_instance(root, "Harbor", &Transport::Unknown).await);
        assert!(matches!(
            terminate(&LogicalId::Robust, root, &Transport::Unknown).await,
            Err(TransportError::Unavailable)
        ));
    }
}
