//! Symbol Mapper / Demapper
//!
//! Gray-coded reference constellations and the classical soft demapper.
//! The same points seed the trainable constellation, and the mapper with an
//! exact APP demapper forms the untrained baseline link.
//!
//! Bit `i` of a symbol group carries weight `2^i` in the point index.
//!
//! ## Example
//!
//! ```rust
//! use linkae_core::symbol_mapping::{SymbolMapper, Modulation, DemapMethod};
//!
//! let mapper = SymbolMapper::new(Modulation::for_bits_per_symbol(2));
//! let bits = vec![0, 1, 1, 0, 1, 1, 0, 0];
//! let symbols = mapper.map(&bits);
//! assert_eq!(symbols.len(), 4);
//! assert_eq!(mapper.demap_hard(&symbols), bits);
//!
//! let llrs = mapper.demap_soft(&symbols, 0.1, DemapMethod::App);
//! // Logit convention: positive LLR means bit 1
//! assert!(llrs[1] > 0.0 && llrs[0] < 0.0);
//! ```

use crate::types::BitStream;
use num_complex::Complex64;
use std::f64::consts::PI;

/// Modulation scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modulation {
    /// BPSK: 1 bit/symbol, {-1, +1}
    Bpsk,
    /// Gray-coded M-PSK
    Psk { bits_per_symbol: usize },
    /// Gray-coded square QAM (even bits per symbol)
    Qam { bits_per_symbol: usize },
}

impl Modulation {
    /// Square QAM for even `m`, PSK for odd `m > 1`, BPSK for `m = 1`.
    pub fn for_bits_per_symbol(bits_per_symbol: usize) -> Self {
        match bits_per_symbol {
            1 => Modulation::Bpsk,
            m if m % 2 == 0 => Modulation::Qam { bits_per_symbol: m },
            m => Modulation::Psk { bits_per_symbol: m },
        }
    }

    /// Bits per symbol for this modulation.
    pub fn bits_per_symbol(&self) -> usize {
        match *self {
            Modulation::Bpsk => 1,
            Modulation::Psk { bits_per_symbol } | Modulation::Qam { bits_per_symbol } => {
                bits_per_symbol
            }
        }
    }

    /// Number of constellation points.
    pub fn order(&self) -> usize {
        1 << self.bits_per_symbol()
    }

    /// Constellation points indexed by bit label, unit average energy.
    pub fn constellation(&self) -> Vec<Complex64> {
        match *self {
            Modulation::Bpsk => vec![Complex64::new(-1.0, 0.0), Complex64::new(1.0, 0.0)],
            Modulation::Psk { bits_per_symbol } => psk_constellation(bits_per_symbol),
            Modulation::Qam { bits_per_symbol } => qam_constellation(bits_per_symbol),
        }
    }
}

/// Soft demapping rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DemapMethod {
    /// Exact a-posteriori LLRs (log-sum-exp over all points)
    App,
    /// Max-log approximation (nearest point per hypothesis)
    MaxLog,
}

#[inline]
fn gray(p: usize) -> usize {
    p ^ (p >> 1)
}

/// Gray-coded square QAM with `2^m` points and unit average energy.
pub fn qam_constellation(bits_per_symbol: usize) -> Vec<Complex64> {
    let half = bits_per_symbol / 2;
    let levels = 1usize << half;

    // Amplitude of each per-axis Gray label.
    let mut axis = vec![0.0f64; levels];
    for p in 0..levels {
        axis[gray(p)] = (2 * p) as f64 - (levels - 1) as f64;
    }

    let norm = 1.0 / (2.0 * ((levels * levels) as f64 - 1.0) / 3.0).sqrt();
    let mut constellation = vec![Complex64::new(0.0, 0.0); levels * levels];
    for i_bits in 0..levels {
        for q_bits in 0..levels {
            let symbol_idx = i_bits | (q_bits << half);
            constellation[symbol_idx] = Complex64::new(axis[i_bits] * norm, axis[q_bits] * norm);
        }
    }
    constellation
}

/// Gray-coded M-PSK on the unit circle.
pub fn psk_constellation(bits_per_symbol: usize) -> Vec<Complex64> {
    let order = 1usize << bits_per_symbol;
    let mut constellation = vec![Complex64::new(0.0, 0.0); order];
    for p in 0..order {
        let angle = 2.0 * PI * p as f64 / order as f64;
        constellation[gray(p)] = Complex64::from_polar(1.0, angle);
    }
    constellation
}

/// Symbol mapper/demapper over a fixed constellation.
#[derive(Debug, Clone)]
pub struct SymbolMapper {
    modulation: Modulation,
    constellation: Vec<Complex64>,
    avg_energy: f64,
}

impl SymbolMapper {
    /// Create a new symbol mapper for the given modulation.
    pub fn new(modulation: Modulation) -> Self {
        let constellation = modulation.constellation();
        let avg_energy =
            constellation.iter().map(|s| s.norm_sqr()).sum::<f64>() / constellation.len() as f64;
        Self {
            modulation,
            constellation,
            avg_energy,
        }
    }

    /// Map bit sequence to constellation symbols.
    ///
    /// Bits are consumed in groups of `bits_per_symbol`; a short trailing
    /// group is zero-padded.
    pub fn map(&self, bits: &[u8]) -> Vec<Complex64> {
        let bps = self.modulation.bits_per_symbol();
        bits.chunks(bps)
            .map(|chunk| {
                let mut symbol_idx = 0usize;
                for (i, &b) in chunk.iter().enumerate() {
                    if b != 0 {
                        symbol_idx |= 1 << i;
                    }
                }
                self.constellation[symbol_idx % self.constellation.len()]
            })
            .collect()
    }

    /// Hard-decision demapping: find nearest constellation point.
    pub fn demap_hard(&self, symbols: &[Complex64]) -> BitStream {
        let bps = self.modulation.bits_per_symbol();
        let mut bits = Vec::with_capacity(symbols.len() * bps);

        for s in symbols {
            let idx = self
                .constellation
                .iter()
                .enumerate()
                .map(|(i, c)| (i, (s - c).norm_sqr()))
                .fold((0usize, f64::MAX), |best, cur| if cur.1 < best.1 { cur } else { best })
                .0;

            for i in 0..bps {
                bits.push(((idx >> i) & 1) as u8);
            }
        }

        bits
    }

    /// Soft-decision demapping: one LLR per bit, `ln P(b=1) / P(b=0)`.
    ///
    /// ```text
    /// LLR(b_k) = ln Σ_{s: b_k=1} exp(-|r-s|²/N0) − ln Σ_{s: b_k=0} exp(-|r-s|²/N0)
    /// ```
    pub fn demap_soft(&self, symbols: &[Complex64], noise_var: f64, method: DemapMethod) -> Vec<f64> {
        let bps = self.modulation.bits_per_symbol();
        let n0 = noise_var.max(1e-20);
        let mut llrs = Vec::with_capacity(symbols.len() * bps);
        let mut metrics = vec![0.0f64; self.constellation.len()];

        for s in symbols {
            for (m, c) in metrics.iter_mut().zip(&self.constellation) {
                *m = -(s - c).norm_sqr() / n0;
            }
            for bit_pos in 0..bps {
                let (l1, l0) = match method {
                    DemapMethod::App => (
                        log_sum_exp(metrics.iter().enumerate().filter(|(i, _)| (i >> bit_pos) & 1 == 1).map(|(_, &m)| m)),
                        log_sum_exp(metrics.iter().enumerate().filter(|(i, _)| (i >> bit_pos) & 1 == 0).map(|(_, &m)| m)),
                    ),
                    DemapMethod::MaxLog => (
                        max_of(metrics.iter().enumerate().filter(|(i, _)| (i >> bit_pos) & 1 == 1).map(|(_, &m)| m)),
                        max_of(metrics.iter().enumerate().filter(|(i, _)| (i >> bit_pos) & 1 == 0).map(|(_, &m)| m)),
                    ),
                };
                llrs.push(l1 - l0);
            }
        }

        llrs
    }

    /// Get the constellation points.
    pub fn constellation(&self) -> &[Complex64] {
        &self.constellation
    }

    /// Get the modulation type.
    pub fn modulation(&self) -> Modulation {
        self.modulation
    }

    /// Average constellation energy.
    pub fn avg_energy(&self) -> f64 {
        self.avg_energy
    }
}

fn max_of(values: impl Iterator<Item = f64>) -> f64 {
    values.fold(f64::NEG_INFINITY, f64::max)
}

fn log_sum_exp(values: impl Iterator<Item = f64> + Clone) -> f64 {
    let max = max_of(values.clone());
    if !max.is_finite() {
        return max;
    }
    max + values.map(|v| (v - max).exp()).sum::<f64>().ln()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_modulation_selection() {
        assert_eq!(Modulation::for_bits_per_symbol(1), Modulation::Bpsk);
        assert_eq!(Modulation::for_bits_per_symbol(3), Modulation::Psk { bits_per_symbol: 3 });
        assert_eq!(Modulation::for_bits_per_symbol(6), Modulation::Qam { bits_per_symbol: 6 });
        assert_eq!(Modulation::for_bits_per_symbol(6).order(), 64);
    }

    #[test]
    fn test_unit_energy() {
        for m in 1..=8 {
            let mapper = SymbolMapper::new(Modulation::for_bits_per_symbol(m));
            assert_eq!(mapper.constellation().len(), 1 << m);
            assert_relative_eq!(mapper.avg_energy(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_qam64_matches_gray_axis() {
        let points = qam_constellation(6);
        let norm = 1.0 / 42f64.sqrt();
        // Label 0 sits in the corner, label 2 on the inner ring of the I axis.
        assert_relative_eq!(points[0].re, -7.0 * norm, epsilon = 1e-12);
        assert_relative_eq!(points[2].re, -1.0 * norm, epsilon = 1e-12);
        assert_relative_eq!(points[4].re, 7.0 * norm, epsilon = 1e-12);
    }

    #[test]
    fn test_gray_neighbours_differ_by_one_bit() {
        let points = qam_constellation(4);
        let d_min = 2.0 / 10f64.sqrt();
        for (i, a) in points.iter().enumerate() {
            for (j, b) in points.iter().enumerate() {
                if i != j && ((a - b).norm() - d_min).abs() < 1e-9 {
                    assert_eq!((i ^ j).count_ones(), 1, "{} and {} are neighbours", i, j);
                }
            }
        }
    }

    #[test]
    fn test_qam64_roundtrip() {
        let mapper = SymbolMapper::new(Modulation::for_bits_per_symbol(6));
        let bits: Vec<u8> = (0..64 * 6).map(|i| ((i * 7 + i / 5) % 2) as u8).collect();
        let symbols = mapper.map(&bits);
        assert_eq!(symbols.len(), 64);
        assert_eq!(mapper.demap_hard(&symbols), bits);
    }

    #[test]
    fn test_8psk_roundtrip() {
        let mapper = SymbolMapper::new(Modulation::for_bits_per_symbol(3));
        let bits = vec![0, 0, 0, 1, 0, 1, 1, 1, 1, 0, 1, 0];
        let symbols = mapper.map(&bits);
        assert_eq!(mapper.demap_hard(&symbols), bits);
    }

    #[test]
    fn test_soft_llr_signs_follow_bits() {
        let mapper = SymbolMapper::new(Modulation::for_bits_per_symbol(4));
        let bits = vec![1, 0, 1, 1, 0, 0, 1, 0];
        let symbols = mapper.map(&bits);
        for method in [DemapMethod::App, DemapMethod::MaxLog] {
            let llrs = mapper.demap_soft(&symbols, 0.05, method);
            for (llr, &b) in llrs.iter().zip(&bits) {
                assert_eq!(*llr > 0.0, b == 1, "{:?}", method);
            }
        }
    }

    #[test]
    fn test_app_bpsk_closed_form() {
        // BPSK: LLR = 4 r / N0 for points ±1.
        let mapper = SymbolMapper::new(Modulation::Bpsk);
        let r = Complex64::new(0.3, 0.0);
        let llr = mapper.demap_soft(&[r], 0.5, DemapMethod::App)[0];
        assert_relative_eq!(llr, 4.0 * 0.3 / 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_max_log_agrees_with_app_near_points() {
        let mapper = SymbolMapper::new(Modulation::for_bits_per_symbol(6));
        let r = [mapper.constellation()[13] + Complex64::new(0.01, -0.02)];
        let app = mapper.demap_soft(&r, 0.05, DemapMethod::App);
        let max_log = mapper.demap_soft(&r, 0.05, DemapMethod::MaxLog);
        for (a, m) in app.iter().zip(&max_log) {
            assert_eq!(a.signum(), m.signum());
            assert!((a - m).abs() <= a.abs());
        }
    }
}
