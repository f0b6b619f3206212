//! Estate discovery and per-estate launch arguments
//!
//! An estate is a directory under the estates root holding `OpenSim.ini`
//! and at least one `Regions/*.ini`. Estates are never created here, only
//! detected.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::TransportError;
use crate::transport::Transport;

pub use crate::process::running_instance;

/// Primary configuration file every estate directory must hold
pub const PRIMARY_CONFIG: &str = "OpenSim.ini";
/// Sub-directory holding region configuration files
pub const REGIONS_DIR: &str = "Regions";
/// Extra launch arguments, stored beside the estate config
pub const ARGS_FILE: &str = "estate.args";

/// Whether `path` is a valid estate directory on this machine
pub fn is_valid_estate(path: &Path) -> bool {
    if !path.is_dir() || !path.join(PRIMARY_CONFIG).is_file() {
        return false;
    }
    let Ok(entries) = fs::read_dir(path.join(REGIONS_DIR)) else {
        return false;
    };
    entries.flatten().any(|entry| {
        let path = entry.path();
        path.is_file() && path.extension().is_some_and(|ext| ext == "ini")
    })
}

fn detect_local(root: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(root) else {
        return Vec::new();
    };
    entries
        .flatten()
        .filter(|entry| is_valid_estate(&entry.path()))
        .filter_map(|entry| entry.file_name().to_str().map(String::from))
        .collect()
}

async fn detect_remote(root: &Path, transport: &Transport) -> Vec<String> {
    let root_str = root.display().to_string();
    let listing = match transport
        .run(&["find", root_str.as_str(), "-mindepth", "1", "-maxdepth", "1", "-type", "d"], true)
        .await
    {
        Ok(output) if output.success() => output.stdout.unwrap_or_default(),
        Ok(_) => return Vec::new(),
        Err(e) => {
            tracing::warn!("Estate discovery under {} failed: {}", root_str, e);
            return Vec::new();
        }
    };

    let mut names = Vec::new();
    for line in listing.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let dir = PathBuf::from(line);
        let Some(name) = dir.file_name().and_then(|n| n.to_str()).map(String::from) else {
            continue;
        };

        let ini = dir.join(PRIMARY_CONFIG).display().to_string();
        if !transport.succeeds(&["test", "-f", ini.as_str()]).await {
            continue;
        }

        let regions = dir.join(REGIONS_DIR).display().to_string();
        let has_region = match transport
            .run(&["find", regions.as_str(), "-maxdepth", "1", "-name", "*.ini", "-type", "f"], true)
            .await
        {
            Ok(output) => output.success() && !output.stdout_str().trim().is_empty(),
            Err(_) => false,
        };
        if has_region {
            names.push(name);
        }
    }
    names
}

/// Names of valid estates under `root`, sorted ascending.
///
/// A missing root yields an empty list. An unknown transport does too.
pub async fn detect_estates(root: &Path, transport: &Transport) -> Vec<String> {
    let mut names = match transport {
        Transport::Local(_) => detect_local(root),
        Transport::Ssh(_) => detect_remote(root, transport).await,
        Transport::Unknown => Vec::new(),
    };
    names.sort();
    tracing::debug!("Discovered {} estates under {}", names.len(), root.display());
    names
}

/// Path of the arguments file for estate `name`
pub fn args_path(root: &Path, name: &str) -> PathBuf {
    root.join(name).join(ARGS_FILE)
}

/// Extra launch arguments for `name`, or empty if none were saved
pub async fn load_estate_args(root: &Path, name: &str, transport: &Transport) -> String {
    let path = args_path(root, name);
    match transport {
        Transport::Local(_) => fs::read_to_string(&path).unwrap_or_default(),
        _ => {
            let path = path.display().to_string();
            match transport.run(&["cat", path.as_str()], true).await {
                Ok(output) if output.success() => output.stdout.unwrap_or_default(),
                _ => String::new(),
            }
        }
    }
}

/// Persist extra launch arguments for `name`, replacing any previous ones
pub async fn save_estate_args(
    root: &Path,
    name: &str,
    content: &str,
    transport: &Transport,
) -> Result<(), TransportError> {
    let path = args_path(root, name);
    if let Transport::Local(_) = transport {
        fs::write(&path, content)?;
        return Ok(());
    }

    let path = path.display().to_string();
    let output = transport
        .run(
            &["sh", "-c", "printf '%s' \"$1\" > \"$2\"", "sh", content, path.as_str()],
            true,
        )
        .await?;
    if output.success() {
        Ok(())
    } else {
        Err(TransportError::Io(io::Error::new(
            io::ErrorKind::Other,
            format!("writing {} failed: {}", path, output.stderr_str().trim()),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::LocalTransport;
    use tempfile::TempDir;

    fn make_estate(root: &Path, name: &str, ini: bool, regions: &[&str]) {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        if ini {
            fs::write(dir.join(PRIMARY_CONFIG), "[Startup]\n").unwrap();
        }
        if !regions.is_empty() {
            fs::create_dir_all(dir.join(REGIONS_DIR)).unwrap();
            for region in regions {
                fs::write(dir.join(REGIONS_DIR).join(region), "[Region]\n").unwrap();
            }
        }
    }

    #[tokio::test]
    async fn test_detect_valid_estates_sorted() {
        let dir = TempDir::new().unwrap();
        make_estate(dir.path(), "Zeta", true, &["z.ini"]);
        make_estate(dir.path(), "Alpha", true, &["a.ini", "b.ini"]);
        make_estate(dir.path(), "NoRegions", true, &[]);
        make_estate(dir.path(), "NoIni", false, &["r.ini"]);
        make_estate(dir.path(), "WrongExt", true, &["r.xml"]);
        fs::write(dir.path().join("stray.txt"), "").unwrap();

        let names = detect_estates(dir.path(), &Transport::Local(LocalTransport::new())).await;
        assert_eq!(names, vec!["Alpha", "Zeta"]);
    }

    #[tokio::test]
    async fn test_missing_root_is_empty() {
        let dir = TempDir::new().unwrap();
        let names = detect_estates(&dir.path().join("absent"), &Transport::local()).await;
        assert!(names.is_empty());
        assert!(detect_estates(dir.path(), &Transport::Unknown).await.is_empty());
    }

    #[tokio::test]
    async fn test_estate_args_roundtrip_local() {
        let dir = TempDir::new().unwrap();
        make_estate(dir.path(), "Harbor", true, &["h.ini"]);
        let transport = Transport::local();

        assert_eq!(load_estate_args(dir.path(), "Harbor", &transport).await, "");
        save_estate_args(dir.path(), "Harbor", "--console=basic\n", &transport)
            .await
            .unwrap();
        assert_eq!(
            load_estate_args(dir.path(), "Harbor", &transport).await,
            "--console=basic\n"
        );
        assert!(dir.path().join("Harbor").join(ARGS_FILE).exists());
    }

    #[tokio::test]
    async fn test_save_args_unknown_transport_fails() {
        let dir = TempDir::new().unwrap();
        let result = save_estate_args(dir.path(), "Harbor", "x", &Transport::Unknown).await;
        assert!(matches!(result, Err(TransportError::Unavailable)));
        assert_eq!(load_estate_args(dir.path(), "Harbor", &Transport::Unknown).await, "");
    }
}
