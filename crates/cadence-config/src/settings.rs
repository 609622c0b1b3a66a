//! Persisted audio device settings.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::Path;

use crate::error::ConfigError;
use crate::request::{OpenRequest, StreamOptions};

/// Backend name that selects the platform's default host.
pub const BACKEND_DEFAULT: &str = "default";

/// Backend name that selects the headless dummy device.
pub const BACKEND_DUMMY: &str = "dummy";

/// Accepted sample rates in Hz.
pub const SAMPLE_RATE_RANGE: RangeInclusive<u32> = 8000..=384_000;

/// Accepted block sizes in frames.
pub const BLOCK_SIZE_RANGE: RangeInclusive<u32> = 16..=8192;

/// Accepted buffer counts.
pub const BUFFER_COUNT_RANGE: RangeInclusive<u32> = 1..=16;

/// Accepted sample widths in bits.
pub const BIT_DEPTHS: [u16; 3] = [16, 24, 32];

/// Audio device settings.
///
/// Every key is optional in the file; a missing key takes the default shown
/// in the example below.
///
/// # TOML Format
///
/// ```toml
/// backend = "default"      # "dummy", or a host name: "alsa", "jack", "coreaudio", "wasapi", "asio"
/// # device = "USB Audio"   # index, exact or partial name; default output when absent
/// # input_device = "0"
/// enable_input = true
/// sample_rate = 48000
/// block_size = 512
/// bit_depth = 32
/// buffer_count = 2
/// realtime = true
/// exclusive = false
/// low_latency = false
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AudioSettings {
    /// Backend identifier: [`BACKEND_DEFAULT`], [`BACKEND_DUMMY`] or a host name.
    pub backend: String,

    /// Output device selector.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,

    /// Input device selector.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_device: Option<String>,

    /// Capture input alongside output.
    pub enable_input: bool,

    /// Requested sample rate in Hz.
    pub sample_rate: u32,

    /// Requested frames per hardware block.
    pub block_size: u32,

    /// Requested sample width in bits.
    pub bit_depth: u16,

    /// Hardware buffers in the ring.
    pub buffer_count: u32,

    /// Ask for real-time scheduling of the audio thread.
    pub realtime: bool,

    /// Ask for exclusive device access.
    pub exclusive: bool,

    /// Prefer the smallest supported buffer.
    pub low_latency: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            backend: BACKEND_DEFAULT.to_string(),
            device: None,
            input_device: None,
            enable_input: true,
            sample_rate: 48000,
            block_size: 512,
            bit_depth: 32,
            buffer_count: 2,
            realtime: true,
            exclusive: false,
            low_latency: false,
        }
    }
}

impl AudioSettings {
    /// Default settings on the dummy backend.
    pub fn dummy() -> Self {
        Self {
            backend: BACKEND_DUMMY.to_string(),
            ..Self::default()
        }
    }

    /// Returns `true` when the dummy backend is selected.
    pub fn is_dummy(&self) -> bool {
        self.backend.eq_ignore_ascii_case(BACKEND_DUMMY)
    }

    /// Load and validate settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml_str(&content)
    }

    /// Load settings, falling back to defaults when the file does not exist.
    ///
    /// Any other failure (unreadable, malformed, out of range) is an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Parse and validate settings from a TOML string.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let settings: AudioSettings = toml::from_str(toml_str)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save the settings to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml_string()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the settings to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every value against what the audio system accepts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.trim().is_empty() {
            return Err(ConfigError::invalid("backend", "must not be empty"));
        }
        check_range("sample_rate", self.sample_rate, &SAMPLE_RATE_RANGE)?;
        check_range("block_size", self.block_size, &BLOCK_SIZE_RANGE)?;
        check_range("buffer_count", self.buffer_count, &BUFFER_COUNT_RANGE)?;
        if !BIT_DEPTHS.contains(&self.bit_depth) {
            return Err(ConfigError::invalid(
                "bit_depth",
                format!("must be one of 16, 24 or 32, got {}", self.bit_depth),
            ));
        }
        Ok(())
    }

    /// Build the device open request these settings describe.
    pub fn stream_request(&self) -> OpenRequest {
        OpenRequest {
            bit_depth: self.bit_depth,
            sample_rate: self.sample_rate,
            block_size: self.block_size,
            buffer_count: self.buffer_count,
            device: self.device.clone(),
            input_device: self.input_device.clone(),
            enable_input: self.enable_input,
            options: StreamOptions {
                realtime: self.realtime,
                exclusive: self.exclusive,
                low_latency: self.low_latency,
            },
        }
    }
}

fn check_range(key: &'static str, value: u32, range: &RangeInclusive<u32>) -> Result<(), ConfigError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            key,
            format!("must be between {} and {}, got {value}", range.start(), range.end()),
        ))
    }
}
