//! Session marker files
//!
//! One small file per logical process records the multiplexer target it
//! was started in. Markers are advisory: a marker may outlive its session
//! (tmux crashed, host rebooted), so callers must confirm with a process
//! check before trusting one.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config;
use crate::types::LogicalId;

/// Registry of believed-started sessions, keyed by logical id
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    dir: PathBuf,
}

impl SessionRegistry {
    /// Registry backed by `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the markers
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the marker for `id`
    pub fn marker_path(&self, id: &LogicalId) -> PathBuf {
        self.dir.join(id.marker_file_name())
    }

    /// Record `handle` for `id`, replacing any previous marker.
    ///
    /// Creates the registry directory if needed.
    pub fn save(&self, id: &LogicalId, handle: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;

        let mut file = fs::File::create(self.marker_path(id))?;
        write!(file, "{}", handle)?;
        tracing::debug!("Saved session marker {} -> {}", id, handle);
        Ok(())
    }

    /// Read the handle for `id`.
    ///
    /// Returns `Ok(None)` if there is no marker or it is empty.
    pub fn load(&self, id: &LogicalId) -> io::Result<Option<String>> {
        match fs::read_to_string(self.marker_path(id)) {
            Ok(contents) => {
                let handle = contents.trim();
                Ok((!handle.is_empty()).then(|| handle.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Remove the marker for `id`.
    ///
    /// Returns `Ok(())` even if the marker doesn't exist.
    pub fn clear(&self, id: &LogicalId) -> io::Result<()> {
        match fs::remove_file(self.marker_path(id)) {
            Ok(()) => {
                tracing::debug!("Cleared session marker for {}", id);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(config::default_marker_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_marker() {
        let dir = TempDir::new().unwrap();
        let registry = SessionRegistry::new(dir.path());
        assert!(registry.load(&LogicalId::Robust).unwrap().is_none());
    }

    #[test]
    fn test_save_creates_directory_and_load_reads_back() {
        let dir = TempDir::new().unwrap();
        let registry = SessionRegistry::new(dir.path().join("sessions"));

        registry.save(&LogicalId::estate("Harbor"), "gridctl:estate-Harbor").unwrap();
        assert_eq!(
            registry.load(&LogicalId::estate("Harbor")).unwrap().as_deref(),
            Some("gridctl:estate-Harbor")
        );
        assert!(dir.path().join("sessions/estate_Harbor.session").exists());
    }

    #[test]
    fn test_save_overwrites() {
        let dir = TempDir::new().unwrap();
        let registry = SessionRegistry::new(dir.path());

        registry.save(&LogicalId::Robust, "old:robust").unwrap();
        registry.save(&LogicalId::Robust, "gridctl:robust").unwrap();
        assert_eq!(
            registry.load(&LogicalId::Robust).unwrap().as_deref(),
            Some("gridctl:robust")
        );
    }

    #[test]
    fn test_clear_marker() {
        let dir = TempDir::new().unwrap();
        let registry = SessionRegistry::new(dir.path());

        registry.save(&LogicalId::Robust, "gridctl:robust").unwrap();
        registry.clear(&LogicalId::Robust).unwrap();
        assert!(registry.load(&LogicalId::Robust).unwrap().is_none());
    }

    #[test]
    fn test_clear_missing_marker() {
        let dir = TempDir::new().unwrap();
        let registry = SessionRegistry::new(dir.path().join("never-created"));
        // Should not error
        registry.clear(&LogicalId::estate("Harbor")).unwrap();
    }

    #[test]
    fn test_markers_are_per_identity() {
        let dir = TempDir::new().unwrap();
        let registry = SessionRegistry::new(dir.path());

        registry.save(&LogicalId::estate("A"), "gridctl:estate-A").unwrap();
        assert!(registry.load(&LogicalId::estate("B")).unwrap().is_none());
        assert!(registry.load(&LogicalId::Robust).unwrap().is_none());
    }
}
