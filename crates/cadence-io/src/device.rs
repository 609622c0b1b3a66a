//! Audio device capability.
//!
//! An [`AudioDevice`] opens a hardware stream in a requested format, starts
//! and stops it, and invokes a [`DataCallback`] once per hardware block on
//! the backend's real-time thread. Concrete backends differ only in the
//! native API they drive:
//!
//! ```text
//! ┌──────────────────────────────────┐
//! │           AudioSystem            │
//! │  (owns Box<dyn AudioDevice>)     │
//! └──────────────┬───────────────────┘
//!                │ open / start / stop / close
//!                ▼
//! ┌──────────────────────────────────┐
//! │        AudioDevice trait         │
//! └──────────────┬───────────────────┘
//!        ┌───────┴────────┐
//!        ▼                ▼
//! ┌─────────────┐  ┌─────────────┐
//! │ DummyDevice │  │ CpalDevice  │
//! │ (headless)  │  │ ALSA, JACK, │
//! │             │  │ CoreAudio...│
//! └─────────────┘  └─────────────┘
//! ```
//!
//! ## Callbacks
//!
//! Callbacks are boxed closures so the trait stays object-safe and the
//! backend can be chosen at runtime. Hardware buffers are interleaved `f32`
//! (`[L0, R0, L1, R1, ...]`). Runtime driver failures never cross the data
//! callback; they are reported through the [`ErrorCallback`] with a
//! [`Severity`].

use cadence_core::ProcessSetup;
use std::fmt;

use crate::Result;

pub use cadence_config::{OpenRequest, StreamOptions};

/// Stream format a device agreed to, which may differ from the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFormat {
    /// Name of the output device.
    pub device_name: String,
    /// Sample width in bits.
    pub bit_depth: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Maximum frames per callback.
    pub block_size: u32,
    /// Interleaved channels in the callback's input slice (0 when capture is off).
    pub input_channels: usize,
    /// Interleaved channels in the callback's output slice.
    pub output_channels: usize,
}

impl StreamFormat {
    /// Time budget for one block, in seconds.
    pub fn block_duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        f64::from(self.block_size) / f64::from(self.sample_rate)
    }

    /// Layout handed to the processing graph before audio flows.
    pub fn process_setup(&self) -> ProcessSetup {
        ProcessSetup {
            sample_rate: f64::from(self.sample_rate),
            block_size: self.block_size as usize,
            input_channels: self.input_channels,
            output_channels: self.output_channels,
        }
    }
}

/// Per-callback block description.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockInfo {
    /// Frames in this callback.
    pub frames: usize,
    /// Interleaved channels in the input slice.
    pub input_channels: usize,
    /// Interleaved channels in the output slice.
    pub output_channels: usize,
    /// Stream position of the first frame, in seconds since start.
    pub stream_time: f64,
}

/// Classification of a runtime driver error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Recoverable (xrun, transient glitch); logged only.
    Warning,
    /// The device is unusable until the stream is reopened.
    Fatal,
}

/// Runtime error reported by a backend outside the data callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamError {
    /// How the audio system should react.
    pub severity: Severity,
    /// Backend message.
    pub message: String,
}

impl StreamError {
    /// A recoverable error.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    /// An error that leaves the device unusable.
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Fatal,
            message: message.into(),
        }
    }

    /// Returns `true` for [`Severity::Fatal`].
    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Fatal => "fatal",
        };
        write!(f, "{level}: {}", self.message)
    }
}

/// Per-block data callback.
///
/// Called on the backend's real-time thread with the captured input block
/// and the output block to fill, both interleaved. The input slice holds
/// `frames * input_channels` samples and the output slice
/// `frames * output_channels`.
///
/// ## Real-Time Safety
///
/// Implementations must not allocate, block on contended locks, log or
/// panic.
pub type DataCallback = Box<dyn FnMut(&[f32], &mut [f32], &BlockInfo) + Send>;

/// Error callback.
///
/// Backends call this from a non-real-time context (or from the error
/// notification thread the native API provides).
pub type ErrorCallback = Box<dyn FnMut(StreamError) + Send>;

/// Hardware stream capability.
///
/// ## Lifecycle
///
/// `open` → `start` ⇄ `stop` → `close`. `open` on an open device closes it
/// first; `close` is idempotent and guarantees the data callback does not
/// fire again after it returns. `stop` followed by `start` keeps the device
/// handle and is cheaper than a full reopen.
///
/// ## Object Safety
///
/// This trait is object-safe; the audio system holds `Box<dyn AudioDevice>`.
pub trait AudioDevice: Send {
    /// Backend identifier (e.g., "dummy", "alsa", "jack").
    fn backend_name(&self) -> &str;

    /// Opens a stream and registers the callbacks.
    ///
    /// Returns the negotiated format. Callers must use it rather than the
    /// request when sizing buffers.
    fn open(
        &mut self,
        request: &OpenRequest,
        callback: DataCallback,
        errors: ErrorCallback,
    ) -> Result<StreamFormat>;

    /// Tears the stream down. No-op when closed.
    fn close(&mut self);

    /// Begins invoking the data callback.
    ///
    /// Fails with [`Error::NotOpen`](crate::Error::NotOpen) when closed.
    fn start(&mut self) -> Result<()>;

    /// Stops invoking the data callback without releasing the device.
    ///
    /// No-op when closed or already stopped.
    fn stop(&mut self) -> Result<()>;

    /// Negotiated format while open.
    fn format(&self) -> Option<&StreamFormat>;

    /// Returns `true` between `open` and `close`.
    fn is_open(&self) -> bool {
        self.format().is_some()
    }

    /// Returns `true` while the data callback is being invoked.
    fn is_running(&self) -> bool;

    /// Negotiated sample width in bits.
    fn bit_depth(&self) -> Option<u16> {
        self.format().map(|f| f.bit_depth)
    }

    /// Negotiated sample rate in Hz.
    fn sample_rate(&self) -> Option<u32> {
        self.format().map(|f| f.sample_rate)
    }

    /// Negotiated frames per block.
    fn block_size(&self) -> Option<u32> {
        self.format().map(|f| f.block_size)
    }

    /// Negotiated output channel count.
    fn channel_count(&self) -> Option<usize> {
        self.format().map(|f| f.output_channels)
    }
}
