//! AWGN channel on sample buffers
//!
//! Adds circularly-symmetric complex Gaussian noise of variance `N0`
//! (`N0 / 2` per real dimension). The tensor pipelines in `linkae-train`
//! apply the same model batch-wise; this version serves the baseline link.
//!
//! ```rust
//! use linkae_core::channel::AwgnChannel;
//! use linkae_core::source::RandomSource;
//! use num_complex::Complex64;
//!
//! let mut source = RandomSource::seeded(0);
//! let clean = vec![Complex64::new(1.0, 0.0); 1000];
//! let noisy = AwgnChannel.apply(&clean, 0.1, &mut source);
//! assert_eq!(noisy.len(), 1000);
//! ```

use crate::source::RandomSource;
use crate::types::IQSample;

/// Additive white Gaussian noise channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct AwgnChannel;

impl AwgnChannel {
    /// Pass `symbols` through the channel with noise variance `no`.
    pub fn apply(&self, symbols: &[IQSample], no: f64, source: &mut RandomSource) -> Vec<IQSample> {
        if no <= 0.0 {
            return symbols.to_vec();
        }
        let sigma = (no / 2.0).sqrt();
        let noise = source.standard_normal_f64(2 * symbols.len());
        symbols
            .iter()
            .zip(noise.chunks_exact(2))
            .map(|(&x, n)| x + IQSample::new(n[0] * sigma, n[1] * sigma))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noise_power_matches_no() {
        let mut source = RandomSource::seeded(5);
        let clean = vec![IQSample::new(0.0, 0.0); 50_000];
        let noisy = AwgnChannel.apply(&clean, 0.2, &mut source);
        let power = noisy.iter().map(|c| c.norm_sqr()).sum::<f64>() / noisy.len() as f64;
        assert!((power - 0.2).abs() < 0.01, "power = {}", power);
    }

    #[test]
    fn test_zero_noise_is_identity() {
        let mut source = RandomSource::seeded(5);
        let clean = vec![IQSample::new(0.3, -0.7); 10];
        assert_eq!(AwgnChannel.apply(&clean, 0.0, &mut source), clean);
    }
}
