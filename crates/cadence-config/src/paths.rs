//! Platform-specific paths for the settings file.
//!
//! - **User config**: `~/.config/cadence/` (Linux), `~/Library/Application Support/cadence/` (macOS), `%APPDATA%\cadence\` (Windows)
//! - **Settings file**: `audio.toml` inside the user config directory
//!
//! # Example
//!
//! ```rust,no_run
//! use cadence_config::{paths, AudioSettings};
//!
//! let settings = AudioSettings::load_or_default(paths::settings_path()).unwrap();
//! println!("backend: {}", settings.backend);
//! ```

use std::path::PathBuf;

/// Application name used for directory paths.
const APP_NAME: &str = "cadence";

/// File name of the audio settings inside the config directory.
const SETTINGS_FILE: &str = "audio.toml";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the path of the audio settings file.
pub fn settings_path() -> PathBuf {
    user_config_dir().join(SETTINGS_FILE)
}

/// Ensure the user config directory exists.
///
/// Creates the directory and any parent directories if they don't exist.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_user_config_dir() -> Result<PathBuf, crate::ConfigError> {
    let dir = user_config_dir();

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| crate::ConfigError::create_dir(&dir, e))?;
    }

    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_dir_is_app_scoped() {
        assert!(user_config_dir().ends_with(APP_NAME));
    }

    #[test]
    fn settings_file_lives_in_config_dir() {
        let path = settings_path();
        assert_eq!(path.file_name().and_then(|n| n.to_str()), Some("audio.toml"));
        assert_eq!(path.parent(), Some(user_config_dir().as_path()));
    }
}
