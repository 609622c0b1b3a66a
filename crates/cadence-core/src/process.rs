//! Processing-graph entry point.
//!
//! The audio system does not know what it is playing. Each hardware block it
//! hands an input [`SampleBuffer`] and an output [`SampleBuffer`] to whatever
//! implements [`AudioProcess`] (typically the active document's signal chain)
//! and copies the output back to the device.
//!
//! ## Contract
//!
//! - [`process()`](AudioProcess::process) runs on the real-time thread. It must
//!   finish within `block_size / sample_rate` seconds, must not allocate, lock,
//!   log or panic, and must write all `frames` samples of every output channel.
//! - [`prepare()`](AudioProcess::prepare) runs on the control thread after the
//!   stream format is (re)negotiated and before audio starts flowing.
//!
//! ## Object Safety
//!
//! The trait is object-safe; the audio system stores `Box<dyn AudioProcess>`
//! so the graph can be swapped at runtime.

use crate::SampleBuffer;

#[cfg(not(feature = "std"))]
use alloc::boxed::Box;

/// Negotiated stream layout handed to [`AudioProcess::prepare`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessSetup {
    /// Sample rate in Hz.
    pub sample_rate: f64,
    /// Maximum frames per [`process()`](AudioProcess::process) call.
    pub block_size: usize,
    /// Channels in the input buffer.
    pub input_channels: usize,
    /// Channels in the output buffer.
    pub output_channels: usize,
}

/// A processing graph driven by the audio callback.
///
/// # Example
///
/// ```rust
/// use cadence_core::{AudioProcess, SampleBuffer};
///
/// struct Invert;
///
/// impl AudioProcess for Invert {
///     fn process(&mut self, input: &SampleBuffer, output: &mut SampleBuffer, frames: usize, _time: f64) {
///         for (src, dst) in input.iter_channels().zip(output.iter_channels_mut()) {
///             for (s, d) in src[..frames].iter().zip(&mut dst[..frames]) {
///                 *d = -*s;
///             }
///         }
///     }
/// }
/// ```
pub trait AudioProcess: Send {
    /// Processes one block.
    ///
    /// # Arguments
    /// * `input` - Captured input, valid for `0..frames` in every channel
    /// * `output` - Output to fill for `0..frames` in every channel
    /// * `frames` - Frames in this block, at most `block_size`
    /// * `stream_time` - Stream position in seconds of the first frame
    fn process(&mut self, input: &SampleBuffer, output: &mut SampleBuffer, frames: usize, stream_time: f64);

    /// Called when the stream format is known, before the first block.
    ///
    /// Default does nothing.
    fn prepare(&mut self, setup: &ProcessSetup) {
        let _ = setup;
    }
}

impl<P: AudioProcess + ?Sized> AudioProcess for Box<P> {
    fn process(&mut self, input: &SampleBuffer, output: &mut SampleBuffer, frames: usize, stream_time: f64) {
        (**self).process(input, output, frames, stream_time);
    }

    fn prepare(&mut self, setup: &ProcessSetup) {
        (**self).prepare(setup);
    }
}

/// [`AudioProcess`] backed by a closure. Build with [`from_fn`].
pub struct ProcessFn<F> {
    f: F,
}

/// Wraps a closure as an [`AudioProcess`].
///
/// ```rust
/// use cadence_core::{from_fn, AudioProcess, SampleBuffer};
///
/// let mut silence = from_fn(|_input: &SampleBuffer, output: &mut SampleBuffer, _frames, _time| {
///     output.clear();
/// });
/// let input = SampleBuffer::with_size(1, 4);
/// let mut output = SampleBuffer::with_size(1, 4);
/// silence.process(&input, &mut output, 4, 0.0);
/// ```
pub fn from_fn<F>(f: F) -> ProcessFn<F>
where
    F: FnMut(&SampleBuffer, &mut SampleBuffer, usize, f64) + Send,
{
    ProcessFn { f }
}

impl<F> AudioProcess for ProcessFn<F>
where
    F: FnMut(&SampleBuffer, &mut SampleBuffer, usize, f64) + Send,
{
    #[inline]
    fn process(&mut self, input: &SampleBuffer, output: &mut SampleBuffer, frames: usize, stream_time: f64) {
        (self.f)(input, output, frames, stream_time);
    }
}

/// Copies input channels straight to output channels.
///
/// Output channels without a matching input are silenced.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl AudioProcess for Passthrough {
    fn process(&mut self, input: &SampleBuffer, output: &mut SampleBuffer, frames: usize, _stream_time: f64) {
        let mut inputs = input.iter_channels();
        for dst in output.iter_channels_mut() {
            let frames = frames.min(dst.len());
            match inputs.next() {
                Some(src) => {
                    let frames = frames.min(src.len());
                    dst[..frames].copy_from_slice(&src[..frames]);
                }
                None => dst[..frames].fill(0.0),
            }
        }
    }
}
