//! Cadence Core - real-time audio primitives
//!
//! This crate provides the data types exchanged across the real-time boundary
//! of the cadence audio system, designed for zero allocation in the audio path.
//!
//! # Core Abstractions
//!
//! ## Buffers
//!
//! - [`SampleBuffer`] - Fixed channel count, fixed block size `f64` buffer;
//!   the unit of data exchanged between hardware and the processing graph
//!
//! ## Parameter Smoothing
//!
//! Zipper-free parameter changes with a lock-free control/audio thread split:
//!
//! - [`SmoothParameter`] - One-pole smoothing, owned by the audio thread
//! - [`ParameterHandle`] - Atomic raw-value writer for the control thread
//!
//! ## Processing Graph
//!
//! - [`AudioProcess`] - Object-safe trait the audio callback drives once per block
//! - [`Passthrough`] - Input-to-output copy
//! - [`from_fn`] - Closure adapter
//!
//! ## Utilities
//!
//! - Level conversions: [`db_to_linear`], [`linear_to_db`]
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible (with `alloc`). Disable the default `std`
//! feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! cadence-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Example
//!
//! ```rust
//! use cadence_core::{AudioProcess, SampleBuffer, SmoothParameter};
//!
//! struct Gain {
//!     gain: SmoothParameter,
//! }
//!
//! impl AudioProcess for Gain {
//!     fn process(&mut self, input: &SampleBuffer, output: &mut SampleBuffer, frames: usize, _time: f64) {
//!         for i in 0..frames {
//!             let g = self.gain.tick();
//!             for ch in 0..output.channels().min(input.channels()) {
//!                 let s = input.sample(ch, i).unwrap_or(0.0);
//!                 let _ = output.set_sample(ch, i, s * g);
//!             }
//!         }
//!     }
//! }
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: No allocations, locks or logging in per-block paths
//! - **No dependencies on std**: Pure `no_std` with `libm` for math
//! - **Single writer per field**: Shared state is either atomic or owned by one thread

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod buffer;
pub mod math;
pub mod param;
pub mod process;

// Re-export main types at crate root
pub use buffer::{BufferError, SampleBuffer};
pub use math::{SILENCE_DB, db_to_linear, linear_to_db};
pub use param::{ParameterHandle, SmoothParameter};
pub use process::{AudioProcess, Passthrough, ProcessFn, ProcessSetup, from_fn};
