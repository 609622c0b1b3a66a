//! Audio settings for the cadence audio system.
//!
//! This crate is the configuration source the audio system reads when it
//! opens a device: which backend and device to use, the requested stream
//! format and the scheduling hints passed through to the backend.
//!
//! # Features
//!
//! - **Settings**: [`AudioSettings`] with documented defaults for every key
//! - **Persistence**: Load and save settings as TOML
//! - **Validation**: Range checks before a device is ever touched
//! - **Paths**: Platform-specific config directory (`std` feature)
//!
//! # Example
//!
//! ```rust,no_run
//! use cadence_config::{AudioSettings, settings_path};
//!
//! // Missing file falls back to defaults; a malformed one is an error
//! let mut settings = AudioSettings::load_or_default(settings_path()).unwrap();
//!
//! settings.block_size = 256;
//! settings.validate().unwrap();
//! settings.save(settings_path()).unwrap();
//!
//! let request = settings.stream_request();
//! assert_eq!(request.block_size, 256);
//! ```

mod error;
mod request;
mod settings;

/// Platform-specific paths for configuration files.
#[cfg(feature = "std")]
pub mod paths;

pub use error::ConfigError;
pub use request::{OpenRequest, StreamOptions};
pub use settings::{
    AudioSettings, BACKEND_DEFAULT, BACKEND_DUMMY, BIT_DEPTHS, BLOCK_SIZE_RANGE,
    BUFFER_COUNT_RANGE, SAMPLE_RATE_RANGE,
};

#[cfg(feature = "std")]
pub use paths::{ensure_user_config_dir, settings_path, user_config_dir};
