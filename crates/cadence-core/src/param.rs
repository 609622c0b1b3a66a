//! Parameter smoothing for zipper-free changes during playback.
//!
//! Control values (gain, pan, filter cutoff) change in steps when the user
//! moves a control. Feeding those steps straight into sample computation
//! produces audible "zipper noise". [`SmoothParameter`] runs each step through
//! a one-pole lowpass so the audio thread sees a per-sample interpolated value.
//!
//! ## Thread Split
//!
//! The state is split by writer:
//!
//! - The **raw value** (target) lives in a shared atomic slot. The control
//!   thread writes it through a [`ParameterHandle`]; the audio thread reads
//!   it once per [`tick()`](SmoothParameter::tick).
//! - The **smoothed value** is owned by the [`SmoothParameter`] itself and is
//!   only ever mutated by the audio thread.
//!
//! Neither side locks. The raw value is one `f64` stored as its bit pattern in
//! an `AtomicU64`, so reads are never torn.
//!
//! ## Usage
//!
//! ```rust
//! use cadence_core::SmoothParameter;
//!
//! let mut gain = SmoothParameter::new(1.0, 48000.0, 0.010);
//! let control = gain.handle();
//!
//! // Control thread
//! control.set_value(0.5);
//!
//! // Audio thread, once per sample
//! for _ in 0..480 {
//!     let g = gain.tick();
//!     assert!(g <= 1.0 && g >= 0.5);
//! }
//! ```

#[cfg(not(feature = "std"))]
use alloc::sync::Arc;
#[cfg(feature = "std")]
use std::sync::Arc;

use core::sync::atomic::{AtomicU64, Ordering};
use libm::exp;

/// Deviation below which a parameter counts as settled.
const SETTLE_EPSILON: f64 = 1e-9;

/// Lock-free `f64` slot using bit-cast storage.
///
/// Control thread writes, audio thread reads. No locks, no allocations.
#[derive(Debug)]
struct AtomicValue(AtomicU64);

impl AtomicValue {
    fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }

    #[inline]
    fn load(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    fn store(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Control-thread handle for a [`SmoothParameter`]'s raw value.
///
/// Cheap to clone, `Send + Sync`. Setting a value never blocks and never
/// touches the smoothed state.
#[derive(Debug, Clone)]
pub struct ParameterHandle {
    raw: Arc<AtomicValue>,
}

impl ParameterHandle {
    /// Sets the target the audio thread will smooth towards.
    ///
    /// Non-finite values are ignored.
    #[inline]
    pub fn set_value(&self, value: f64) {
        if value.is_finite() {
            self.raw.store(value);
        }
    }

    /// Returns the current target.
    #[inline]
    pub fn value(&self) -> f64 {
        self.raw.load()
    }
}

/// Single-pole smoothed parameter.
///
/// Each [`tick()`](Self::tick) advances
/// `smoothed += coeff * (raw - smoothed)` with
/// `coeff = 1 - exp(-1 / (time * sample_rate))`. The smoothed value moves
/// monotonically towards the raw value without overshoot and only reaches it
/// in the limit.
///
/// # Invariants
///
/// - `coeff` is recomputed whenever the sample rate or time constant changes.
/// - `coeff` is in `(0, 1]`; a non-positive time or sample rate gives `1.0`
///   (instant response).
#[derive(Debug)]
pub struct SmoothParameter {
    raw: Arc<AtomicValue>,
    smoothed: f64,
    coeff: f64,
    sample_rate: f64,
    time: f64,
}

impl SmoothParameter {
    /// Creates a smoothed parameter starting at `initial`.
    ///
    /// Both the raw and smoothed values start at `initial`, so a stream that
    /// begins with this parameter does not ramp up from zero. A non-finite
    /// `initial` starts at `0.0` instead.
    ///
    /// # Arguments
    /// * `initial` - Initial value
    /// * `sample_rate` - Sample rate in Hz
    /// * `time` - Time constant in seconds (time to cover ~63% of a step)
    pub fn new(initial: f64, sample_rate: f64, time: f64) -> Self {
        let initial = if initial.is_finite() { initial } else { 0.0 };
        let mut param = Self {
            raw: Arc::new(AtomicValue::new(initial)),
            smoothed: initial,
            coeff: 1.0,
            sample_rate,
            time,
        };
        param.recalculate_coeff();
        param
    }

    /// Returns a handle the control thread can use to set the raw value.
    pub fn handle(&self) -> ParameterHandle {
        ParameterHandle {
            raw: Arc::clone(&self.raw),
        }
    }

    /// Sets the raw (target) value. Non-finite values are ignored.
    ///
    /// Takes `&self`: this only touches the shared atomic slot.
    #[inline]
    pub fn set_value(&self, value: f64) {
        if value.is_finite() {
            self.raw.store(value);
        }
    }

    /// Advances the filter by one sample and returns the smoothed value.
    ///
    /// Call once per sample from the audio thread.
    #[inline]
    pub fn tick(&mut self) -> f64 {
        let raw = self.raw.load();
        self.smoothed += self.coeff * (raw - self.smoothed);
        self.smoothed
    }

    /// Current smoothed value without advancing.
    #[inline]
    pub fn value(&self) -> f64 {
        self.smoothed
    }

    /// Current raw (target) value.
    #[inline]
    pub fn target(&self) -> f64 {
        self.raw.load()
    }

    /// Smoothing coefficient currently in use.
    #[inline]
    pub fn coefficient(&self) -> f64 {
        self.coeff
    }

    /// Sample rate in Hz.
    #[inline]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Time constant in seconds.
    #[inline]
    pub fn time(&self) -> f64 {
        self.time
    }

    /// True once the smoothed value is within `1e-9` of the target.
    #[inline]
    pub fn is_settled(&self) -> bool {
        (self.smoothed - self.raw.load()).abs() < SETTLE_EPSILON
    }

    /// Jumps the smoothed value to the current target.
    ///
    /// Audio-thread operation, e.g. at stream start or after a reset.
    #[inline]
    pub fn snap_to_target(&mut self) {
        self.smoothed = self.raw.load();
    }

    /// Updates the sample rate and recomputes the coefficient.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.recalculate_coeff();
    }

    /// Updates the time constant (seconds) and recomputes the coefficient.
    pub fn set_time(&mut self, time: f64) {
        self.time = time;
        self.recalculate_coeff();
    }

    /// `coeff = 1 - exp(-1 / (time * sample_rate))`
    ///
    /// `time * sample_rate` is the time constant in samples. After five time
    /// constants the value has covered 99.3% of a step.
    fn recalculate_coeff(&mut self) {
        let samples = self.time * self.sample_rate;
        self.coeff = if samples > 0.0 && samples.is_finite() {
            1.0 - exp(-1.0 / samples)
        } else {
            1.0
        };
    }
}
