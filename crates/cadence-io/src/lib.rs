//! Audio device layer and real-time audio system for cadence.
//!
//! This crate provides:
//!
//! - **Device abstraction**: the [`AudioDevice`] capability with a headless
//!   [`DummyDevice`] and a native [`CpalDevice`] (ALSA, JACK, CoreAudio, WASAPI, ...)
//! - **Enumeration**: [`available_backends`], [`list_devices`] and [`probe_device`]
//! - **Orchestration**: [`AudioSystem`], which owns the active device and the
//!   sample buffers and bridges the hardware callback to an [`AudioProcess`] graph
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cadence_config::AudioSettings;
//! use cadence_core::Passthrough;
//! use cadence_io::AudioSystem;
//!
//! let system = AudioSystem::new();
//! system.set_processor(Box::new(Passthrough));
//!
//! let format = system.start(&AudioSettings::dummy())?;
//! println!("running at {} Hz, {} frames", format.sample_rate, format.block_size);
//!
//! system.suspend();
//! // ... rebuild the graph ...
//! system.resume()?;
//! system.stop();
//! # Ok::<(), cadence_io::Error>(())
//! ```
//!
//! [`AudioProcess`]: cadence_core::AudioProcess

pub mod cpal_backend;
pub mod device;
mod devices;
pub mod dummy;
pub mod system;

pub use cpal_backend::CpalDevice;
pub use device::{
    AudioDevice, BlockInfo, DataCallback, ErrorCallback, OpenRequest, Severity, StreamError,
    StreamFormat, StreamOptions,
};
pub use devices::{DeviceInfo, available_backends, list_devices, probe_device};
pub use dummy::DummyDevice;
pub use system::{AudioErrorFlag, AudioSystem, BackendFactory, DeviceFactory, SystemState};

/// Error types for audio I/O operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// The requested backend is not known on this platform.
    #[error("Unknown audio backend: {0}")]
    UnknownBackend(String),

    /// The requested sample format is not supported.
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// The operation needs an open device.
    #[error("Audio device is not open")]
    NotOpen,

    /// The audio system already holds a device; stop it first.
    #[error("Audio system is already running")]
    AlreadyRunning,

    /// A fatal driver error was reported; audio stays silent until restarted.
    #[error("Audio unavailable: {0}")]
    AudioUnavailable(String),

    /// Settings could not be used.
    #[error("Configuration error: {0}")]
    Config(#[from] cadence_config::ConfigError),
}

/// Convenience result type for audio I/O operations.
pub type Result<T> = std::result::Result<T, Error>;
