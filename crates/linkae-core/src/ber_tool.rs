//! BER/BLER Measurement Tool: bit and codeword error counting
//!
//! [`ErrorCounts`] compares one batch of reference and decoded bits;
//! [`BerTester`] accumulates batches for one Eb/N0 point until enough block
//! errors were seen. Intervals are Wilson score intervals, which stay
//! meaningful when a well-coded link shows few or no bit errors.
//!
//! ## Example
//!
//! ```rust
//! use linkae_core::ber_tool::{BerConfig, BerTester};
//!
//! let mut ber = BerTester::new(BerConfig::default());
//! let tx = vec![1, 0, 1, 1, 0, 1, 0, 0, 1, 1];
//! let rx = vec![1, 0, 0, 1, 1, 1, 0, 0, 1, 1];
//! //                  ^     ^  -- 2 errors, both in the first block
//! ber.update_blocks(&tx, &rx, 5);
//! assert_eq!(ber.counts().bit_errors, 2);
//! assert_eq!(ber.counts().block_errors, 1);
//! assert!((ber.ber() - 0.2).abs() < 1e-10);
//! assert!((ber.bler() - 0.5).abs() < 1e-10);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

/// Error tallies over some number of bits and codewords.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCounts {
    pub bits: u64,
    pub bit_errors: u64,
    pub blocks: u64,
    pub block_errors: u64,
}

impl ErrorCounts {
    /// Compare `decoded` against `reference`, split into `block_len` codewords.
    ///
    /// Only the common prefix is counted; `block_len == 0` counts bits only.
    pub fn compare(reference: &[u8], decoded: &[u8], block_len: usize) -> Self {
        let len = reference.len().min(decoded.len());
        let (reference, decoded) = (&reference[..len], &decoded[..len]);

        let mut counts = Self {
            bits: len as u64,
            bit_errors: reference.iter().zip(decoded).filter(|(a, b)| a != b).count() as u64,
            ..Default::default()
        };
        if block_len > 0 {
            for (a, b) in reference.chunks(block_len).zip(decoded.chunks(block_len)) {
                counts.blocks += 1;
                counts.block_errors += (a != b) as u64;
            }
        }
        counts
    }

    pub fn ber(&self) -> f64 {
        ratio(self.bit_errors, self.bits)
    }

    pub fn bler(&self) -> f64 {
        ratio(self.block_errors, self.blocks)
    }

    /// Wilson score interval on the BER for normal quantile `z`.
    pub fn ber_interval(&self, z: f64) -> (f64, f64) {
        if self.bits == 0 {
            return (0.0, 1.0);
        }
        let n = self.bits as f64;
        let p = self.ber();
        let z2 = z * z;
        let scale = 1.0 + z2 / n;
        let center = (p + z2 / (2.0 * n)) / scale;
        let half = z * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt() / scale;
        ((center - half).max(0.0), (center + half).min(1.0))
    }
}

impl AddAssign for ErrorCounts {
    fn add_assign(&mut self, other: Self) {
        self.bits += other.bits;
        self.bit_errors += other.bit_errors;
        self.blocks += other.blocks;
        self.block_errors += other.block_errors;
    }
}

fn ratio(errors: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        errors as f64 / total as f64
    }
}

/// Stopping rule and reporting for one Eb/N0 point.
#[derive(Debug, Clone)]
pub struct BerConfig {
    /// Stop once this many codewords were decoded wrongly.
    pub min_block_errors: u64,
    /// Normal quantile for reported intervals (1.96 ≈ 95 %).
    pub interval_z: f64,
}

impl Default for BerConfig {
    fn default() -> Self {
        Self {
            min_block_errors: 1000,
            interval_z: 1.96,
        }
    }
}

/// Running bit and block error rate for one Eb/N0 point.
#[derive(Debug, Clone)]
pub struct BerTester {
    config: BerConfig,
    counts: ErrorCounts,
}

impl BerTester {
    pub fn new(config: BerConfig) -> Self {
        Self {
            config,
            counts: ErrorCounts::default(),
        }
    }

    /// Add one batch of `block_len`-bit codewords.
    pub fn update_blocks(&mut self, reference: &[u8], decoded: &[u8], block_len: usize) {
        self.counts += ErrorCounts::compare(reference, decoded, block_len);
    }

    pub fn counts(&self) -> ErrorCounts {
        self.counts
    }

    pub fn ber(&self) -> f64 {
        self.counts.ber()
    }

    pub fn bler(&self) -> f64 {
        self.counts.bler()
    }

    pub fn has_converged(&self) -> bool {
        self.counts.block_errors >= self.config.min_block_errors
    }

    /// BER interval at the configured quantile.
    pub fn confidence_interval(&self) -> (f64, f64) {
        self.counts.ber_interval(self.config.interval_z)
    }

    pub fn reset(&mut self) {
        self.counts = ErrorCounts::default();
    }

    /// One-line summary for logs.
    pub fn summary(&self) -> String {
        let (lo, hi) = self.confidence_interval();
        let c = &self.counts;
        format!(
            "BER {:.3e} in [{:.3e}, {:.3e}] ({}/{} bits), BLER {:.3e} ({}/{} blocks){}",
            c.ber(),
            lo,
            hi,
            c.bit_errors,
            c.bits,
            c.bler(),
            c.block_errors,
            c.blocks,
            if self.has_converged() { ", converged" } else { "" },
        )
    }
}
