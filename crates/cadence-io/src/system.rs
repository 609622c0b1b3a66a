//! Audio system orchestrator.
//!
//! [`AudioSystem`] owns the active [`AudioDevice`], the input/output
//! [`SampleBuffer`]s sized to the negotiated block, and the processing graph.
//! It bridges the device's real-time callback to the graph and exposes
//! lifecycle, suspend/resume and error-state controls to the control thread.
//!
//! ## Threads
//!
//! ```text
//!  control thread                         audio thread
//!  ──────────────                         ────────────
//!  report_error ──► AudioErrorFlag ◄──── checked first, lock-free
//!  suspend / resume ──► Status ◄───────── open, suspended: lock-free
//!  state / format ────► Status
//!  start / stop ────────────┐        ┌── process_block (try_lock)
//!  set_processor (swap)     ├─ Mutex ┤     clear output
//!                           │ Engine │     deinterleave → graph → interleave
//!                           └────────┘
//! ```
//!
//! One mutex guards {device, buffers, processor}. The control thread takes
//! it with a blocking lock and holds it across device open/start/stop/close,
//! which serializes concurrent control calls. The audio thread only ever
//! uses `try_lock`: if the control thread holds the lock the block is
//! emitted as silence instead of waiting. This keeps the callback wait-free
//! and lets `close` join a backend's audio thread while the lock is held.
//!
//! Status queries never touch the engine lock, so polling them from a UI
//! cannot silence a block. A new graph is prepared outside the lock and only
//! the swap happens under it.
//!
//! ## State Machine
//!
//! ```text
//! Closed ──start()──► Running ──stop()──► Closed
//! Running ──suspend()──► Suspended ──resume()──► Running
//! Running | Suspended ──fatal error──► Error ──stop(), start()──► Running
//! ```

use cadence_config::AudioSettings;
use cadence_core::{AudioProcess, ProcessSetup, SampleBuffer};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use crate::device::{AudioDevice, BlockInfo, DataCallback, ErrorCallback, Severity, StreamError, StreamFormat};
use crate::{CpalDevice, DummyDevice, Error, Result, devices};

/// Shared "device is unusable" flag.
///
/// Raised by fatal stream errors from any thread and checked lock-free at
/// the top of every data callback. Cleared only when
/// [`AudioSystem::start`] begins a new attempt.
#[derive(Debug, Clone, Default)]
pub struct AudioErrorFlag(Arc<AtomicBool>);

impl AudioErrorFlag {
    /// Returns `true` while audio is unavailable.
    #[inline]
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Marks audio as unavailable.
    pub fn raise(&self) {
        self.0.store(true, Ordering::Release);
    }

    fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Observable lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemState {
    /// No device held.
    Closed,
    /// Device running, graph invoked every block.
    Running,
    /// Device running, blocks emitted as silence.
    Suspended,
    /// A fatal error was reported; silence until stop and start.
    Error,
}

/// Creates devices for the audio system.
///
/// Swapped out in tests to inject devices that renegotiate or fail.
pub trait DeviceFactory: Send + Sync {
    /// Instantiate the device the settings select. The device is not opened.
    fn create(&self, settings: &AudioSettings) -> Result<Box<dyn AudioDevice>>;

    /// Report whether a device is currently available.
    fn probe(&self, backend: &str, device: Option<&str>) -> Result<bool> {
        devices::probe_device(backend, device)
    }
}

/// Default factory: [`DummyDevice`] for `"dummy"`, [`CpalDevice`] otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackendFactory;

impl DeviceFactory for BackendFactory {
    fn create(&self, settings: &AudioSettings) -> Result<Box<dyn AudioDevice>> {
        if settings.is_dummy() {
            Ok(Box::new(DummyDevice::new()))
        } else {
            Ok(Box::new(CpalDevice::new(&settings.backend)?))
        }
    }
}

/// Lifecycle state readable without the coordination lock.
///
/// Written by the control thread while it holds the engine lock.
#[derive(Default)]
struct Status {
    open: AtomicBool,
    suspended: AtomicBool,
    format: Mutex<Option<StreamFormat>>,
}

impl Status {
    fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::Acquire)
    }

    fn set_suspended(&self, suspended: bool) {
        self.suspended.store(suspended, Ordering::Release);
    }

    fn publish(&self, format: StreamFormat) {
        *self.format.lock() = Some(format);
        self.open.store(true, Ordering::Release);
    }

    fn reset(&self) {
        self.open.store(false, Ordering::Release);
        self.suspended.store(false, Ordering::Release);
        *self.format.lock() = None;
    }
}

/// State behind the coordination lock.
struct Engine {
    device: Option<Box<dyn AudioDevice>>,
    format: Option<StreamFormat>,
    input: SampleBuffer,
    output: SampleBuffer,
    processor: Option<Box<dyn AudioProcess>>,
}

impl Engine {
    fn new() -> Self {
        Self {
            device: None,
            format: None,
            input: SampleBuffer::new(),
            output: SampleBuffer::new(),
            processor: None,
        }
    }

    fn setup(&self) -> Option<ProcessSetup> {
        self.format.as_ref().map(StreamFormat::process_setup)
    }

    /// Stop and close the held device, releasing buffers.
    fn shutdown(&mut self, status: &Status) -> bool {
        let Some(mut device) = self.device.take() else {
            return false;
        };
        if let Err(e) = device.stop() {
            tracing::warn!(error = %e, "device stop failed during shutdown");
        }
        device.close();
        self.format = None;
        self.input = SampleBuffer::new();
        self.output = SampleBuffer::new();
        status.reset();
        true
    }
}

struct Shared {
    engine: Mutex<Engine>,
    errors: AudioErrorFlag,
    status: Status,
}

impl Shared {
    fn process_block(&self, input: &[f32], output: &mut [f32], info: &BlockInfo) {
        output.fill(0.0);

        if self.errors.is_set() || self.status.is_suspended() || !self.status.is_open() {
            return;
        }
        // Never wait on the control thread.
        let Some(mut guard) = self.engine.try_lock() else {
            return;
        };
        let engine = &mut *guard;
        if engine.device.is_none() {
            return;
        }
        let Some(processor) = engine.processor.as_mut() else {
            return;
        };

        let block = engine.output.block_size();
        let sample_rate = engine.format.as_ref().map_or(0.0, |f| f64::from(f.sample_rate));
        if block == 0 || sample_rate <= 0.0 {
            return;
        }

        let mut offset = 0;
        while offset < info.frames {
            let frames = (info.frames - offset).min(block);
            let src = input.get(offset * info.input_channels..).unwrap_or_default();
            let copied = engine.input.read_interleaved(src, info.input_channels, frames);
            if copied < frames {
                for channel in engine.input.iter_channels_mut() {
                    channel[copied..frames].fill(0.0);
                }
            }

            engine.output.clear();
            let time = info.stream_time + offset as f64 / sample_rate;
            processor.process(&engine.input, &mut engine.output, frames, time);

            let dst = output.get_mut(offset * info.output_channels..).unwrap_or_default();
            engine.output.write_interleaved(dst, info.output_channels, frames);
            offset += frames;
        }
    }

    fn handle_error(&self, error: &StreamError) {
        match error.severity {
            Severity::Warning => tracing::warn!(message = %error.message, "audio stream warning"),
            Severity::Fatal => {
                tracing::error!(message = %error.message, "fatal audio error; output silenced until restart");
                self.errors.raise();
            }
        }
    }
}

/// The audio orchestrator.
///
/// Create one per process (or per output) and share it by reference or
/// `Arc`; every method takes `&self`.
///
/// ## Example
///
/// ```rust
/// use cadence_config::AudioSettings;
/// use cadence_core::{from_fn, SampleBuffer};
/// use cadence_io::{AudioSystem, SystemState};
///
/// let system = AudioSystem::new();
/// system.set_processor(Box::new(from_fn(
///     |_in: &SampleBuffer, out: &mut SampleBuffer, _frames, _time| out.clear(),
/// )));
///
/// let format = system.start(&AudioSettings::dummy()).unwrap();
/// assert_eq!(format.block_size, 512);
/// assert_eq!(system.state(), SystemState::Running);
///
/// system.stop();
/// assert_eq!(system.state(), SystemState::Closed);
/// ```
pub struct AudioSystem {
    shared: Arc<Shared>,
    factory: Box<dyn DeviceFactory>,
}

impl AudioSystem {
    /// Audio system using [`BackendFactory`].
    pub fn new() -> Self {
        Self::with_factory(Box::new(BackendFactory))
    }

    /// Audio system using a custom device factory.
    pub fn with_factory(factory: Box<dyn DeviceFactory>) -> Self {
        Self {
            shared: Arc::new(Shared {
                engine: Mutex::new(Engine::new()),
                errors: AudioErrorFlag::default(),
                status: Status::default(),
            }),
            factory,
        }
    }

    /// Install the processing graph, returning the previous one.
    ///
    /// If a stream is open the graph is prepared for its format first. The
    /// previous graph keeps running while `prepare` executes; only the swap
    /// takes the coordination lock. If the format changes during `prepare`
    /// the graph is prepared again for the new one.
    pub fn set_processor(&self, mut processor: Box<dyn AudioProcess>) -> Option<Box<dyn AudioProcess>> {
        let mut prepared: Option<ProcessSetup> = None;
        loop {
            let current = {
                let mut engine = self.shared.engine.lock();
                let current = engine.setup();
                if current == prepared {
                    return engine.processor.replace(processor);
                }
                current
            };
            if let Some(setup) = &current {
                processor.prepare(setup);
            }
            prepared = current;
        }
    }

    /// Remove the processing graph. Blocks are silent until one is installed.
    pub fn take_processor(&self) -> Option<Box<dyn AudioProcess>> {
        self.shared.engine.lock().processor.take()
    }

    /// Open and start the device the settings describe.
    ///
    /// Clears the error flag, creates the device, opens it, sizes the
    /// buffers to the negotiated format, prepares the graph and starts the
    /// stream. On any failure the device is closed and dropped, leaving the
    /// system [`Closed`](SystemState::Closed).
    ///
    /// # Errors
    ///
    /// [`Error::AlreadyRunning`] if a device is held (call [`stop`](Self::stop)
    /// first), [`Error::Config`] for invalid settings, or the device's own
    /// open/start error.
    pub fn start(&self, settings: &AudioSettings) -> Result<StreamFormat> {
        let mut engine = self.shared.engine.lock();
        if engine.device.is_some() {
            return Err(Error::AlreadyRunning);
        }
        self.shared.errors.clear();

        match self.open_and_start(&mut engine, settings) {
            Ok(format) => {
                tracing::info!(
                    backend = %settings.backend,
                    device = %format.device_name,
                    sample_rate = format.sample_rate,
                    block_size = format.block_size,
                    inputs = format.input_channels,
                    outputs = format.output_channels,
                    "audio system started"
                );
                Ok(format)
            }
            Err(e) => {
                tracing::error!(backend = %settings.backend, error = %e, "audio system failed to start");
                Err(e)
            }
        }
    }

    fn open_and_start(&self, engine: &mut Engine, settings: &AudioSettings) -> Result<StreamFormat> {
        settings.validate()?;
        let mut device = self.factory.create(settings)?;

        let format = device.open(&settings.stream_request(), self.data_callback(), self.error_callback())?;

        let block_size = format.block_size as usize;
        engine.input.create_buffers(format.input_channels, block_size);
        engine.output.create_buffers(format.output_channels, block_size);
        if let Some(processor) = engine.processor.as_mut() {
            processor.prepare(&format.process_setup());
        }
        self.shared.status.set_suspended(false);
        engine.format = Some(format.clone());

        if let Err(e) = device.start() {
            device.close();
            engine.format = None;
            engine.input = SampleBuffer::new();
            engine.output = SampleBuffer::new();
            return Err(e);
        }
        engine.device = Some(device);
        self.shared.status.publish(format.clone());
        Ok(format)
    }

    fn data_callback(&self) -> DataCallback {
        let shared: Weak<Shared> = Arc::downgrade(&self.shared);
        Box::new(move |input, output, info| match shared.upgrade() {
            Some(shared) => shared.process_block(input, output, info),
            None => output.fill(0.0),
        })
    }

    fn error_callback(&self) -> ErrorCallback {
        let shared: Weak<Shared> = Arc::downgrade(&self.shared);
        Box::new(move |error| {
            if let Some(shared) = shared.upgrade() {
                shared.handle_error(&error);
            }
        })
    }

    /// Stop and close the device. Safe to call when never started.
    pub fn stop(&self) {
        if self.shared.engine.lock().shutdown(&self.shared.status) {
            tracing::info!("audio system stopped");
        }
    }

    /// [`stop`](Self::stop) then [`start`](Self::start), e.g. after a device
    /// switch or a fatal error.
    pub fn restart(&self, settings: &AudioSettings) -> Result<StreamFormat> {
        self.stop();
        self.start(settings)
    }

    /// Emit silence without invoking the graph; the stream keeps running.
    ///
    /// No-op while closed.
    pub fn suspend(&self) {
        // Serialized with start/stop; the audio thread reads the flag lock-free.
        let engine = self.shared.engine.lock();
        if engine.device.is_some() && !self.shared.status.is_suspended() {
            self.shared.status.set_suspended(true);
            tracing::debug!("audio processing suspended");
        }
    }

    /// Resume invoking the graph on the next block.
    ///
    /// # Errors
    ///
    /// [`Error::AudioUnavailable`] while the error flag is raised; only a
    /// full [`restart`](Self::restart) clears it.
    pub fn resume(&self) -> Result<()> {
        if self.shared.errors.is_set() {
            return Err(Error::AudioUnavailable(
                "a fatal audio error was reported; restart the audio system".into(),
            ));
        }
        let _engine = self.shared.engine.lock();
        if self.shared.status.is_suspended() {
            self.shared.status.set_suspended(false);
            tracing::debug!("audio processing resumed");
        }
        Ok(())
    }

    /// Returns `true` while suspended.
    pub fn is_suspended(&self) -> bool {
        self.shared.status.is_suspended()
    }

    /// Current lifecycle state.
    ///
    /// Lock-free with respect to the audio thread; safe to poll every frame.
    pub fn state(&self) -> SystemState {
        let status = &self.shared.status;
        if !status.is_open() {
            SystemState::Closed
        } else if self.shared.errors.is_set() {
            SystemState::Error
        } else if status.is_suspended() {
            SystemState::Suspended
        } else {
            SystemState::Running
        }
    }

    /// Negotiated format while a device is held.
    pub fn format(&self) -> Option<StreamFormat> {
        self.shared.status.format.lock().clone()
    }

    /// Handle to the error flag, e.g. for a UI status indicator.
    pub fn error_flag(&self) -> AudioErrorFlag {
        self.shared.errors.clone()
    }

    /// Classify and act on a stream error: warnings are logged, fatal errors
    /// raise the error flag.
    pub fn report_error(&self, error: StreamError) {
        self.shared.handle_error(&error);
    }

    /// The real-time data callback.
    ///
    /// Devices opened by this system call it on their audio thread; hosts
    /// that own the hardware loop may call it directly. Clears `output`
    /// first, so every early return yields silence, then processes the
    /// block in chunks of at most the negotiated block size.
    pub fn process_block(&self, input: &[f32], output: &mut [f32], info: &BlockInfo) {
        self.shared.process_block(input, output, info);
    }

    /// Report whether a device is available without touching the running stream.
    pub fn probe_device(&self, backend: &str, device: Option<&str>) -> Result<bool> {
        self.factory.probe(backend, device)
    }
}

impl Default for AudioSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AudioSystem {
    fn drop(&mut self) {
        self.stop();
    }
}
