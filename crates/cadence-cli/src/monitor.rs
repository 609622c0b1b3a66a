//! Built-in monitor graph for `cadence run`.
//!
//! Plays either the captured input or a sine test tone through a smoothed
//! gain stage. The gain's [`ParameterHandle`] stays with the control thread,
//! which fades the output in on start and out before stopping.

use cadence_core::{AudioProcess, ParameterHandle, ProcessSetup, SampleBuffer, SmoothParameter};
use std::f64::consts::TAU;

/// Gain smoothing time constant in seconds.
pub const GAIN_SMOOTHING_SECS: f64 = 0.02;

/// What the monitor plays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Source {
    /// Captured input, channel `n` to output `n` (wrapping when the input has fewer).
    Input,
    /// Sine tone at the given frequency in Hz, on every output channel.
    Tone(f64),
}

/// Monitor graph.
pub struct Monitor {
    source: Source,
    gain: SmoothParameter,
    phase: f64,
    phase_inc: f64,
}

impl Monitor {
    /// Create a monitor whose gain starts at `initial_gain` (linear).
    pub fn new(source: Source, initial_gain: f64) -> Self {
        Self {
            source,
            gain: SmoothParameter::new(initial_gain, 48000.0, GAIN_SMOOTHING_SECS),
            phase: 0.0,
            phase_inc: 0.0,
        }
    }

    /// Control-thread handle for the linear gain.
    pub fn gain_handle(&self) -> ParameterHandle {
        self.gain.handle()
    }
}

impl AudioProcess for Monitor {
    fn process(&mut self, input: &SampleBuffer, output: &mut SampleBuffer, frames: usize, _stream_time: f64) {
        let in_channels = input.channels();
        let out_channels = output.channels();
        let frames = frames.min(output.block_size());

        for frame in 0..frames {
            let gain = self.gain.tick();
            match self.source {
                Source::Tone(_) => {
                    let sample = (self.phase * TAU).sin() * gain;
                    self.phase = (self.phase + self.phase_inc).fract();
                    for ch in 0..out_channels {
                        let _ = output.set_sample(ch, frame, sample);
                    }
                }
                Source::Input => {
                    for ch in 0..out_channels {
                        let sample = if in_channels == 0 {
                            0.0
                        } else {
                            input.sample(ch % in_channels, frame).unwrap_or(0.0)
                        };
                        let _ = output.set_sample(ch, frame, sample * gain);
                    }
                }
            }
        }
    }

    fn prepare(&mut self, setup: &ProcessSetup) {
        self.gain.set_sample_rate(setup.sample_rate);
        if let Source::Tone(freq) = self.source {
            self.phase_inc = if setup.sample_rate > 0.0 { freq / setup.sample_rate } else { 0.0 };
        }
    }
}
