//! Headless audio device.
//!
//! [`DummyDevice`] stands in for hardware when none is available or wanted
//! (CI, servers, tests). It never renegotiates: the format it reports is
//! exactly the format requested. A clock thread paces the data callback at
//! the real block rate, feeding silent input and discarding the output.

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::device::{AudioDevice, BlockInfo, DataCallback, ErrorCallback, OpenRequest, StreamFormat};
use crate::{Error, Result};

/// Name reported for the single dummy device.
pub const DUMMY_DEVICE_NAME: &str = "Dummy";

/// Device that accepts any format and produces/consumes silence.
///
/// ## Example
///
/// ```rust
/// use cadence_io::{AudioDevice, DummyDevice, OpenRequest};
///
/// let mut device = DummyDevice::new();
/// let format = device
///     .open(&OpenRequest::new(24, 44100, 128), Box::new(|_, _, _| {}), Box::new(|_| {}))
///     .unwrap();
/// assert_eq!(format.block_size, 128);
/// assert_eq!(device.sample_rate(), Some(44100));
/// device.close();
/// assert_eq!(device.sample_rate(), None);
/// ```
pub struct DummyDevice {
    input_channels: usize,
    output_channels: usize,
    format: Option<StreamFormat>,
    running: Arc<AtomicBool>,
    clock: Option<Clock>,
}

/// Clock thread and the sender whose drop tells it to exit.
struct Clock {
    shutdown: Sender<()>,
    thread: JoinHandle<()>,
}

impl DummyDevice {
    /// Stereo in, stereo out.
    pub fn new() -> Self {
        Self::with_channels(2, 2)
    }

    /// Custom channel layout.
    pub fn with_channels(input_channels: usize, output_channels: usize) -> Self {
        Self {
            input_channels,
            output_channels,
            format: None,
            running: Arc::new(AtomicBool::new(false)),
            clock: None,
        }
    }

    fn spawn_clock(&self, format: &StreamFormat, callback: DataCallback, errors: ErrorCallback) -> Result<Clock> {
        let (shutdown, shutdown_rx) = crossbeam_channel::bounded(0);
        let running = Arc::clone(&self.running);
        let format = format.clone();

        let thread = std::thread::Builder::new()
            .name("cadence-dummy-clock".into())
            .spawn(move || run_clock(&format, callback, errors, &running, &shutdown_rx))
            .map_err(|e| Error::Stream(format!("failed to spawn dummy clock: {e}")))?;

        Ok(Clock { shutdown, thread })
    }
}

impl Default for DummyDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioDevice for DummyDevice {
    fn backend_name(&self) -> &str {
        cadence_config::BACKEND_DUMMY
    }

    fn open(&mut self, request: &OpenRequest, callback: DataCallback, errors: ErrorCallback) -> Result<StreamFormat> {
        self.close();

        if request.sample_rate == 0 || request.block_size == 0 {
            return Err(Error::UnsupportedFormat(format!(
                "{} Hz, {} frames",
                request.sample_rate, request.block_size
            )));
        }

        let format = StreamFormat {
            device_name: DUMMY_DEVICE_NAME.to_string(),
            bit_depth: request.bit_depth,
            sample_rate: request.sample_rate,
            block_size: request.block_size,
            input_channels: if request.enable_input { self.input_channels } else { 0 },
            output_channels: self.output_channels,
        };

        self.clock = Some(self.spawn_clock(&format, callback, errors)?);
        tracing::debug!(
            sample_rate = format.sample_rate,
            block_size = format.block_size,
            "dummy device opened"
        );
        self.format = Some(format.clone());
        Ok(format)
    }

    fn close(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(Clock { shutdown, thread }) = self.clock.take() {
            drop(shutdown);
            if thread.join().is_err() {
                tracing::warn!("dummy clock thread panicked");
            }
            tracing::debug!("dummy device closed");
        }
        self.format = None;
    }

    fn start(&mut self) -> Result<()> {
        if self.format.is_none() {
            return Err(Error::NotOpen);
        }
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn format(&self) -> Option<&StreamFormat> {
        self.format.as_ref()
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for DummyDevice {
    fn drop(&mut self) {
        self.close();
    }
}

/// Clock loop: one callback per block period while running, until the
/// shutdown sender is dropped.
fn run_clock(
    format: &StreamFormat,
    mut callback: DataCallback,
    _errors: ErrorCallback,
    running: &AtomicBool,
    shutdown: &Receiver<()>,
) {
    let frames = format.block_size as usize;
    let input = vec![0.0f32; frames * format.input_channels];
    let mut output = vec![0.0f32; frames * format.output_channels];
    let period = Duration::from_secs_f64(format.block_duration());

    let mut frames_elapsed: u64 = 0;
    let mut deadline = Instant::now() + period;

    loop {
        let wait = deadline.saturating_duration_since(Instant::now());
        match shutdown.recv_timeout(wait) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
        }
        deadline += period;

        if !running.load(Ordering::SeqCst) {
            continue;
        }

        output.fill(0.0);
        let info = BlockInfo {
            frames,
            input_channels: format.input_channels,
            output_channels: format.output_channels,
            stream_time: frames_elapsed as f64 / f64::from(format.sample_rate),
        };
        callback(&input, &mut output, &info);
        frames_elapsed += frames as u64;
    }
}
