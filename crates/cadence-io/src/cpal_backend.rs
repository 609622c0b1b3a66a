//! Native audio device over cpal hosts.
//!
//! [`CpalDevice`] drives any host cpal supports: ALSA and JACK on Linux,
//! CoreAudio on macOS, WASAPI and ASIO on Windows. It builds one output
//! stream and, when capture is enabled, one input stream on the same sample
//! rate. Captured samples cross to the output callback through a bounded
//! lock-free channel so the data callback sees an `(input, output)` pair per
//! block. The channel only ever gains or loses whole frames, so channel
//! order survives overruns and underruns.
//!
//! ## Negotiation
//!
//! - **Sample rate**: the requested rate if an `f32` config range covers it,
//!   otherwise the device default
//! - **Block size**: the request clamped into the device's buffer range
//!   (`low_latency` picks the smallest size the range allows); hosts that do
//!   not report a range keep their own buffer and deliver blocks of varying
//!   length, reported here as the requested size
//! - **Bit depth**: always 32, streams are `f32`
//!
//! ## Error Mapping
//!
//! `DeviceNotAvailable` (unplugged, lost server connection) is fatal;
//! every other cpal stream error is reported as a warning.

use cadence_config::BLOCK_SIZE_RANGE;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SupportedBufferSize, SupportedStreamConfigRange};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;

use crate::device::{
    AudioDevice, BlockInfo, DataCallback, ErrorCallback, OpenRequest, StreamError, StreamFormat,
};
use crate::devices::{device_name, find_input_device, find_output_device, resolve_host};
use crate::{Error, Result};

/// Blocks of captured input the bridge channel can hold.
const INPUT_QUEUE_BLOCKS: usize = 8;

/// Largest host block, in frames, the output callback forwards input for.
/// Frames past it reach the graph as silence.
const MAX_HOST_BLOCK: usize = *BLOCK_SIZE_RANGE.end() as usize;

/// Native device backed by a cpal host.
pub struct CpalDevice {
    backend: String,
    host: cpal::HostId,
    format: Option<StreamFormat>,
    streams: Option<Streams>,
    running: bool,
}

struct Streams {
    output: cpal::Stream,
    input: Option<cpal::Stream>,
}

/// Output-side negotiation result.
struct Negotiated {
    channels: u16,
    sample_rate: u32,
    block_size: u32,
    buffer_size: cpal::BufferSize,
}

impl CpalDevice {
    /// Create a device on the named backend (`"default"` or a cpal host name).
    ///
    /// Fails with [`Error::UnknownBackend`] for names cpal does not know and
    /// [`Error::AudioUnavailable`] for hosts not usable on this machine.
    pub fn new(backend: &str) -> Result<Self> {
        let host = resolve_host(backend)?;
        tracing::info!(host = host.id().name(), "cpal backend initialized");
        Ok(Self {
            backend: backend.to_lowercase(),
            host: host.id(),
            format: None,
            streams: None,
            running: false,
        })
    }

    fn build(&self, request: &OpenRequest, mut callback: DataCallback, errors: ErrorCallback) -> Result<(Streams, StreamFormat)> {
        let host = cpal::host_from_id(self.host).map_err(|e| Error::AudioUnavailable(e.to_string()))?;
        let output_device = find_output_device(&host, request.device.as_deref())?;
        let output_name = device_name(&output_device).unwrap_or_else(|_| "Unknown".to_string());

        let negotiated = negotiate_output(&output_device, request)?;
        log_unhonoured_options(request);

        // Error callbacks run off the real-time thread; both streams share one sink.
        let errors = Arc::new(Mutex::new(errors));

        let input = if request.enable_input {
            open_input(&host, request, &negotiated, &errors)?
        } else {
            None
        };
        let (input_stream, input_channels, capture) = match input {
            Some((stream, capture)) => (Some(stream), capture.channels(), Some(capture)),
            None => (None, 0, None),
        };

        let output_channels = usize::from(negotiated.channels);
        let output_config = cpal::StreamConfig {
            channels: negotiated.channels,
            sample_rate: negotiated.sample_rate,
            buffer_size: negotiated.buffer_size,
        };

        let mut scratch = input_scratch(negotiated.block_size, input_channels);
        let sample_rate = f64::from(negotiated.sample_rate);
        let mut frames_elapsed: u64 = 0;

        let output_errors = Arc::clone(&errors);
        let output = output_device
            .build_output_stream(
                &output_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let frames = data.len() / output_channels.max(1);
                    let needed = (frames * input_channels).min(scratch.len());
                    let input = &mut scratch[..needed];
                    match &capture {
                        Some(capture) => {
                            capture.pop_into(input);
                        }
                        None => input.fill(0.0),
                    }

                    let info = BlockInfo {
                        frames,
                        input_channels,
                        output_channels,
                        stream_time: frames_elapsed as f64 / sample_rate,
                    };
                    callback(input, data, &info);
                    frames_elapsed += frames as u64;
                },
                move |err| report(&output_errors, &err),
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;

        let streams = Streams {
            output,
            input: input_stream,
        };
        // Some hosts start streams on creation; hold them until start().
        if let Err(e) = pause_all(&streams) {
            tracing::debug!(error = %e, "host could not pause new stream");
        }

        let format = StreamFormat {
            device_name: output_name,
            bit_depth: 32,
            sample_rate: negotiated.sample_rate,
            block_size: negotiated.block_size,
            input_channels,
            output_channels,
        };
        Ok((streams, format))
    }
}

impl AudioDevice for CpalDevice {
    fn backend_name(&self) -> &str {
        &self.backend
    }

    fn open(&mut self, request: &OpenRequest, callback: DataCallback, errors: ErrorCallback) -> Result<StreamFormat> {
        self.close();

        let (streams, format) = self.build(request, callback, errors)?;
        tracing::info!(
            device = %format.device_name,
            sample_rate = format.sample_rate,
            block_size = format.block_size,
            inputs = format.input_channels,
            outputs = format.output_channels,
            "cpal stream opened"
        );
        if format.sample_rate != request.sample_rate || format.block_size != request.block_size {
            tracing::info!(
                requested_rate = request.sample_rate,
                requested_block = request.block_size,
                "device renegotiated stream format"
            );
        }

        self.streams = Some(streams);
        self.format = Some(format.clone());
        Ok(format)
    }

    fn close(&mut self) {
        // Dropping a cpal stream joins its callback thread.
        if self.streams.take().is_some() {
            tracing::info!(backend = %self.backend, "cpal stream closed");
        }
        self.format = None;
        self.running = false;
    }

    fn start(&mut self) -> Result<()> {
        let streams = self.streams.as_ref().ok_or(Error::NotOpen)?;
        if let Some(input) = &streams.input {
            input.play().map_err(|e| Error::Stream(e.to_string()))?;
        }
        streams.output.play().map_err(|e| Error::Stream(e.to_string()))?;
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let Some(streams) = &self.streams else {
            return Ok(());
        };
        pause_all(streams)?;
        self.running = false;
        Ok(())
    }

    fn format(&self) -> Option<&StreamFormat> {
        self.format.as_ref()
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

fn pause_all(streams: &Streams) -> Result<()> {
    streams.output.pause().map_err(|e| Error::Stream(e.to_string()))?;
    if let Some(input) = &streams.input {
        input.pause().map_err(|e| Error::Stream(e.to_string()))?;
    }
    Ok(())
}

fn classify(err: &cpal::StreamError) -> StreamError {
    match err {
        cpal::StreamError::DeviceNotAvailable => StreamError::fatal(err.to_string()),
        _ => StreamError::warning(err.to_string()),
    }
}

fn report(errors: &Mutex<ErrorCallback>, err: &cpal::StreamError) {
    let mut sink = errors.lock();
    (*sink)(classify(err));
}

fn f32_ranges<I>(ranges: I) -> Vec<SupportedStreamConfigRange>
where
    I: Iterator<Item = SupportedStreamConfigRange>,
{
    ranges.filter(|r| r.sample_format() == SampleFormat::F32).collect()
}

fn covers(range: &SupportedStreamConfigRange, sample_rate: u32) -> bool {
    (range.min_sample_rate()..=range.max_sample_rate()).contains(&sample_rate)
}

fn negotiate_output(device: &cpal::Device, request: &OpenRequest) -> Result<Negotiated> {
    let default = device
        .default_output_config()
        .map_err(|e| Error::Stream(e.to_string()))?;
    let ranges = f32_ranges(
        device
            .supported_output_configs()
            .map_err(|e| Error::Stream(e.to_string()))?,
    );

    // Prefer the default channel layout, then any layout, at the requested rate.
    let pick = |rate: u32| {
        ranges
            .iter()
            .find(|r| r.channels() == default.channels() && covers(r, rate))
            .or_else(|| ranges.iter().find(|r| covers(r, rate)))
    };

    let (range, sample_rate) = match pick(request.sample_rate) {
        Some(range) => (range, request.sample_rate),
        None => {
            let fallback = default.sample_rate();
            let range = pick(fallback).ok_or_else(|| {
                Error::UnsupportedFormat(format!(
                    "no f32 output config at {} Hz or {} Hz",
                    request.sample_rate, fallback
                ))
            })?;
            tracing::warn!(
                requested = request.sample_rate,
                using = fallback,
                "requested sample rate unsupported; using device default"
            );
            (range, fallback)
        }
    };

    let (block_size, buffer_size) = negotiate_block_size(request.block_size, range.buffer_size(), request.options.low_latency);
    Ok(Negotiated {
        channels: range.channels(),
        sample_rate,
        block_size,
        buffer_size,
    })
}

/// Clamp the requested block size into what the host reports.
fn negotiate_block_size(requested: u32, supported: &SupportedBufferSize, low_latency: bool) -> (u32, cpal::BufferSize) {
    match supported {
        &SupportedBufferSize::Range { min, max } => {
            let min = min.max(*BLOCK_SIZE_RANGE.start()).min(max);
            let size = if low_latency { min } else { requested.clamp(min, max) };
            (size, cpal::BufferSize::Fixed(size))
        }
        SupportedBufferSize::Unknown => {
            tracing::debug!(requested, "host does not report buffer sizes; using host default");
            (requested, cpal::BufferSize::Default)
        }
    }
}

/// Input staging buffer for the output callback, sized once at open.
///
/// Holds the larger of the negotiated block and [`MAX_HOST_BLOCK`] so the
/// callback never grows it.
fn input_scratch(block_size: u32, input_channels: usize) -> Vec<f32> {
    let frames = (block_size as usize).max(MAX_HOST_BLOCK);
    vec![0.0f32; frames * input_channels]
}

/// Producer half of the capture queue, owned by the input callback.
struct CaptureSender {
    tx: Sender<f32>,
    channels: usize,
}

/// Consumer half of the capture queue, owned by the output callback.
struct CaptureReceiver {
    rx: Receiver<f32>,
    channels: usize,
}

/// Frame-aligned single-producer single-consumer queue of interleaved input.
///
/// The producer only pushes frames that fit whole and the consumer only pops
/// whole frames, so the head of the queue is always the first channel of a
/// frame. Neither side blocks or allocates.
fn capture_queue(channels: usize, capacity_frames: usize) -> (CaptureSender, CaptureReceiver) {
    let channels = channels.max(1);
    let (tx, rx) = crossbeam_channel::bounded(capacity_frames.max(1) * channels);
    (CaptureSender { tx, channels }, CaptureReceiver { rx, channels })
}

impl CaptureSender {
    /// Queue the whole frames of `data` that fit, dropping the rest.
    ///
    /// Returns the number of frames queued.
    fn push(&self, data: &[f32]) -> usize {
        let capacity = self.tx.capacity().unwrap_or(0);
        // Only this side adds samples, so the free space can only grow.
        let free = capacity.saturating_sub(self.tx.len()) / self.channels * self.channels;
        let count = (data.len() / self.channels * self.channels).min(free);
        for &sample in &data[..count] {
            let _ = self.tx.try_send(sample);
        }
        count / self.channels
    }
}

impl CaptureReceiver {
    fn channels(&self) -> usize {
        self.channels
    }

    /// Fill `dst` with queued whole frames, zero-filling what the queue
    /// cannot supply. Returns the number of frames taken from the queue.
    fn pop_into(&self, dst: &mut [f32]) -> usize {
        let available = self.rx.len() / self.channels * self.channels;
        let count = available.min(dst.len() / self.channels * self.channels);
        for sample in &mut dst[..count] {
            *sample = self.rx.try_recv().unwrap_or(0.0);
        }
        dst[count..].fill(0.0);
        count / self.channels
    }
}

type InputBridge = (cpal::Stream, CaptureReceiver);

fn open_input(
    host: &cpal::Host,
    request: &OpenRequest,
    output: &Negotiated,
    errors: &Arc<Mutex<ErrorCallback>>,
) -> Result<Option<InputBridge>> {
    let device = match find_input_device(host, request.input_device.as_deref()) {
        Ok(device) => device,
        // No default input is common (output-only interfaces); an explicit one must exist.
        Err(Error::NoDevice) if request.input_device.is_none() => {
            tracing::warn!("no input device available; capture disabled");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };

    let ranges = f32_ranges(
        device
            .supported_input_configs()
            .map_err(|e| Error::Stream(e.to_string()))?,
    );
    let Some(range) = ranges.iter().find(|r| covers(r, output.sample_rate)) else {
        tracing::warn!(
            sample_rate = output.sample_rate,
            "input device does not support output sample rate; capture disabled"
        );
        return Ok(None);
    };

    let channels = range.channels();
    let buffer_size = match range.buffer_size() {
        SupportedBufferSize::Range { min, max } if (*min..=*max).contains(&output.block_size) => {
            cpal::BufferSize::Fixed(output.block_size)
        }
        _ => cpal::BufferSize::Default,
    };
    let config = cpal::StreamConfig {
        channels,
        sample_rate: output.sample_rate,
        buffer_size,
    };

    let (capture_tx, capture_rx) = capture_queue(
        usize::from(channels),
        output.block_size as usize * INPUT_QUEUE_BLOCKS,
    );

    let input_errors = Arc::clone(errors);
    let stream = device
        .build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                // A full queue means the output side stalled; drop newest.
                capture_tx.push(data);
            },
            move |err| report(&input_errors, &err),
            None,
        )
        .map_err(|e| Error::Stream(e.to_string()))?;

    Ok(Some((stream, capture_rx)))
}

fn log_unhonoured_options(request: &OpenRequest) {
    if request.options.exclusive {
        tracing::debug!("exclusive access is not exposed by cpal; opening shared");
    }
    if !request.options.realtime {
        tracing::debug!("cpal always runs callbacks at host audio priority");
    }
    if request.buffer_count != 2 {
        tracing::debug!(buffer_count = request.buffer_count, "buffer count is managed by the host");
    }
    if request.bit_depth != 32 {
        tracing::debug!(bit_depth = request.bit_depth, "streams are f32; bit depth reported as 32");
    }
}
