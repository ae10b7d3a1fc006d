//! AWGN channel on symbol tensors
//!
//! Per-example noise variance: row `i` of the batch gets complex Gaussian
//! noise with variance `no[i]`. Noise is drawn from the pipeline's
//! [`RandomSource`] so a seeded run replays exactly.

use crate::complex::ComplexTensor;
use burn::tensor::{backend::Backend, Tensor, TensorData};
use linkae_core::source::RandomSource;
use linkae_core::types::{LinkError, LinkResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct AwgnChannel;

impl AwgnChannel {
    /// `y = x + n`, `n ~ CN(0, no[i])` for every symbol of example `i`.
    pub fn transmit<B: Backend>(
        &self,
        x: ComplexTensor<B, 2>,
        no: &[f64],
        source: &mut RandomSource,
    ) -> LinkResult<ComplexTensor<B, 2>> {
        let [batch, symbols] = x.dims();
        if no.len() != batch {
            return Err(LinkError::ShapeMismatch {
                expected: batch,
                actual: no.len(),
            });
        }
        let device = x.re.device();
        let (re, im) = gaussian_pair(batch, symbols, |row| (no[row] / 2.0).sqrt(), source);
        let noise = ComplexTensor::new(
            Tensor::from_data(TensorData::new(re, [batch, symbols]), &device),
            Tensor::from_data(TensorData::new(im, [batch, symbols]), &device),
        );
        Ok(x.add(noise))
    }
}

/// Real and imaginary Gaussian draws for a `[batch, symbols]` grid with a
/// per-row standard deviation.
pub(crate) fn gaussian_pair(
    batch: usize,
    symbols: usize,
    sigma: impl Fn(usize) -> f64,
    source: &mut RandomSource,
) -> (Vec<f32>, Vec<f32>) {
    let draws = source.standard_normal(2 * batch * symbols);
    let mut re = Vec::with_capacity(batch * symbols);
    let mut im = Vec::with_capacity(batch * symbols);
    for (idx, pair) in draws.chunks_exact(2).enumerate() {
        let s = sigma(idx / symbols) as f32;
        re.push(pair[0] * s);
        im.push(pair[1] * s);
    }
    (re, im)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::complex::tensor_to_vec;
    use crate::device::CpuBackend;

    fn zeros(batch: usize, symbols: usize) -> ComplexTensor<CpuBackend, 2> {
        let device = Default::default();
        ComplexTensor::new(
            Tensor::zeros([batch, symbols], &device),
            Tensor::zeros([batch, symbols], &device),
        )
    }

    #[test]
    fn test_per_example_noise_power() {
        let mut source = RandomSource::seeded(11);
        let y = AwgnChannel
            .transmit(zeros(2, 20_000), &[0.5, 0.05], &mut source)
            .unwrap();
        let power = tensor_to_vec(y.norm_sqr().mean_dim(1)).unwrap();
        assert!((power[0] - 0.5).abs() < 0.02, "row 0 power {}", power[0]);
        assert!((power[1] - 0.05).abs() < 0.002, "row 1 power {}", power[1]);
    }

    #[test]
    fn test_noise_vector_length_checked() {
        let mut source = RandomSource::seeded(11);
        let err = AwgnChannel.transmit(zeros(3, 4), &[0.1], &mut source);
        assert!(matches!(err, Err(LinkError::ShapeMismatch { expected: 3, actual: 1 })));
    }

    #[test]
    fn test_same_seed_same_noise() {
        let a = AwgnChannel
            .transmit(zeros(2, 8), &[0.1, 0.2], &mut RandomSource::seeded(4))
            .unwrap();
        let b = AwgnChannel
            .transmit(zeros(2, 8), &[0.1, 0.2], &mut RandomSource::seeded(4))
            .unwrap();
        assert_eq!(a.to_complex().unwrap(), b.to_complex().unwrap());
    }
}
