//! Level conversions for control values.
//!
//! - [`db_to_linear`] / [`linear_to_db`] - Convert between dB and linear gain
//!
//! Both are allocation-free and `no_std` (via `libm`).

use libm::{exp, log};

/// Floor returned by [`linear_to_db`] for silence.
pub const SILENCE_DB: f64 = -120.0;

/// Convert decibels to linear gain.
///
/// # Arguments
/// * `db` - Value in decibels
///
/// # Returns
/// Linear gain value (e.g., 0 dB → 1.0, -6 dB → 0.5, +6 dB → 2.0)
///
/// # Example
/// ```rust
/// use cadence_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f64) -> f64 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f64 = core::f64::consts::LN_10 / 20.0;
    exp(db * FACTOR)
}

/// Convert linear gain to decibels, floored at [`SILENCE_DB`].
///
/// # Example
/// ```rust
/// use cadence_core::linear_to_db;
///
/// assert!((linear_to_db(0.5) - (-6.02)).abs() < 0.01);
/// assert_eq!(linear_to_db(0.0), -120.0);
/// ```
#[inline]
pub fn linear_to_db(linear: f64) -> f64 {
    // 20 * log10(linear) = 20 * ln(linear) / ln(10)
    const FACTOR: f64 = 20.0 / core::f64::consts::LN_10;
    if linear <= 1e-6 {
        return SILENCE_DB;
    }
    (log(linear) * FACTOR).max(SILENCE_DB)
}
