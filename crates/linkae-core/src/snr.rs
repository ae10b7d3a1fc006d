//! SNR conversions
//!
//! ```rust
//! use linkae_core::snr::ebnodb2no;
//!
//! // 64-QAM, rate 1/2, Eb/N0 = 0 dB: Es/N0 = 3, so N0 = 1/3
//! let no = ebnodb2no(0.0, 6, 0.5);
//! assert!((no - 1.0 / 3.0).abs() < 1e-12);
//! ```

/// Convert dB to a linear power ratio.
#[inline]
pub fn db_to_linear(db: f64) -> f64 {
    10f64.powf(db / 10.0)
}

/// Convert a linear power ratio to dB.
#[inline]
pub fn linear_to_db(linear: f64) -> f64 {
    10.0 * linear.log10()
}

/// Noise variance N0 for a given Eb/N0, assuming unit average symbol energy.
///
/// ```text
/// N0 = 1 / (Eb/N0 · bits_per_symbol · code_rate)
/// ```
pub fn ebnodb2no(ebno_db: f64, bits_per_symbol: usize, code_rate: f64) -> f64 {
    1.0 / (db_to_linear(ebno_db) * bits_per_symbol as f64 * code_rate)
}

/// Evenly spaced points in `[min, max)` with the given step.
pub fn ebno_range(min: f64, max: f64, step: f64) -> Vec<f64> {
    if step <= 0.0 || max <= min {
        return Vec::new();
    }
    let count = ((max - min) / step - 1e-9).ceil() as usize;
    (0..count).map(|i| min + i as f64 * step).collect()
}
