//! Settings command implementations

use std::path::Path;

use anyhow::{Context, Result};

use gc_core::config::{load_settings, load_settings_with, save_settings, Settings};

use crate::output::{display_setting, format_settings, print_info, print_success};

/// Show effective settings (defaults, environment, then file)
pub fn settings_show(path: &Path) -> Result<()> {
    if !path.exists() {
        print_info(&format!("No settings file at {:?}, showing defaults", path));
    }
    let settings = load_settings(path);
    println!("{}", format_settings(&settings.entries()));
    Ok(())
}

/// Set one key in the settings file.
///
/// Only the file is rewritten; environment overrides are not baked in.
pub fn settings_set(path: &Path, key: &str, value: &str) -> Result<()> {
    let file_key = canonical_key(key)
        .ok_or_else(|| anyhow::anyhow!("Unknown settings key: {}", key))?;

    let mut settings = load_settings_with(path, |_| None);
    settings
        .set(file_key, value)
        .with_context(|| format!("Invalid value for {}", file_key))?;
    save_settings(path, &settings)
        .with_context(|| format!("Failed to write settings to {:?}", path))?;

    print_success(&format!("Set {} = {}", file_key, display_setting(file_key, value)));
    Ok(())
}

pub fn settings_path(path: &Path) -> Result<()> {
    println!("{}", path.display());
    Ok(())
}

/// File key for `key`, accepting `VG_BASE`, `vg_base` or `base`
fn canonical_key(key: &str) -> Option<&'static str> {
    let upper = key.trim().to_ascii_uppercase();
    let upper = upper.strip_prefix("VG_").unwrap_or(&upper).to_string();
    Settings::default()
        .entries()
        .into_iter()
        .map(|(k, _)| k)
        .find(|k| k.strip_prefix("VG_") == Some(upper.as_str()))
}
