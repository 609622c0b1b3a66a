//! Stream open request handed to an audio device.

/// Scheduling and access hints a backend honours when it can.
///
/// Hints a host cannot express are ignored by the backend, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamOptions {
    /// Ask for real-time priority on the audio thread.
    pub realtime: bool,
    /// Ask for exclusive access to the device.
    pub exclusive: bool,
    /// Prefer the smallest buffer the device supports.
    pub low_latency: bool,
}

/// Requested stream format and device selection.
///
/// The device may negotiate a different block size, sample rate or channel
/// layout. Callers read the negotiated values back from the device instead
/// of assuming the request was honoured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    /// Sample width in bits.
    pub bit_depth: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Frames per hardware block.
    pub block_size: u32,
    /// Number of hardware buffers in the ring, where the backend exposes it.
    pub buffer_count: u32,
    /// Output device selector (index, exact or partial name). `None` is the backend default.
    pub device: Option<String>,
    /// Input device selector. `None` is the backend default input.
    pub input_device: Option<String>,
    /// Open an input stream alongside the output.
    pub enable_input: bool,
    /// Scheduling and access hints.
    pub options: StreamOptions,
}

impl OpenRequest {
    /// Creates a request for the given format on the default devices.
    pub fn new(bit_depth: u16, sample_rate: u32, block_size: u32) -> Self {
        Self {
            bit_depth,
            sample_rate,
            block_size,
            ..Self::default()
        }
    }

    /// Selects the output device.
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    /// Disables or enables the input stream.
    pub fn with_input(mut self, enable: bool) -> Self {
        self.enable_input = enable;
        self
    }

    /// Duration of one block in seconds.
    pub fn block_duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        f64::from(self.block_size) / f64::from(self.sample_rate)
    }
}

impl Default for OpenRequest {
    fn default() -> Self {
        crate::AudioSettings::default().stream_request()
    }
}
