//! Shared CLI helpers used across multiple commands.

use anyhow::Context;
use cadence_config::{AudioSettings, settings_path};
use std::path::{Path, PathBuf};

/// Settings file to use: the explicit path, or the user settings file.
pub fn resolve_settings_path(explicit: Option<&Path>) -> PathBuf {
    explicit.map_or_else(settings_path, Path::to_path_buf)
}

/// Load settings, falling back to defaults when the file does not exist.
pub fn load_settings(explicit: Option<&Path>) -> anyhow::Result<(AudioSettings, PathBuf)> {
    let path = resolve_settings_path(explicit);
    let settings = AudioSettings::load_or_default(&path)
        .with_context(|| format!("loading settings from {}", path.display()))?;
    Ok((settings, path))
}
