//! Neural demapper
//!
//! Maps each received symbol and its example's noise level to `m` LLRs
//! (logit convention, positive = bit 1).
//!
//! ```text
//! [re(y), im(y), log10(N0)] → Dense(128, relu) → Dense(128, relu) → Dense(m)
//! ```
//!
//! The log-scale noise feature keeps the input well conditioned over the
//! whole training Eb/N0 range.

use crate::complex::ComplexTensor;
use burn::config::Config;
use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::tensor::{activation::relu, backend::Backend, Tensor};
use std::f64::consts::LN_10;

#[derive(Config, Debug)]
pub struct NeuralDemapperConfig {
    /// LLRs per symbol
    pub bits_per_symbol: usize,
    #[config(default = 128)]
    pub hidden_units: usize,
}

impl NeuralDemapperConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> NeuralDemapper<B> {
        NeuralDemapper {
            dense_1: LinearConfig::new(3, self.hidden_units).init(device),
            dense_2: LinearConfig::new(self.hidden_units, self.hidden_units).init(device),
            dense_3: LinearConfig::new(self.hidden_units, self.bits_per_symbol).init(device),
        }
    }
}

#[derive(Module, Debug)]
pub struct NeuralDemapper<B: Backend> {
    dense_1: Linear<B>,
    dense_2: Linear<B>,
    dense_3: Linear<B>,
}

impl<B: Backend> NeuralDemapper<B> {
    /// `y`: `[batch, S]` received symbols, `no`: `[batch, 1]` noise variances.
    ///
    /// Returns `[batch, S, m]` LLRs.
    pub fn forward(&self, y: ComplexTensor<B, 2>, no: Tensor<B, 2>) -> Tensor<B, 3> {
        let [_, symbols] = y.dims();
        let no_db = no.log().div_scalar(LN_10).repeat_dim(1, symbols);

        let z = Tensor::stack::<3>(vec![y.re, y.im, no_db], 2);
        let z = relu(self.dense_1.forward(z));
        let z = relu(self.dense_2.forward(z));
        self.dense_3.forward(z)
    }

    pub fn bits_per_symbol(&self) -> usize {
        self.dense_3.weight.val().dims()[1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::CpuBackend;
    use burn::tensor::TensorData;

    fn received(batch: usize, symbols: usize) -> ComplexTensor<CpuBackend, 2> {
        let device = Default::default();
        ComplexTensor::new(
            Tensor::ones([batch, symbols], &device).mul_scalar(0.3),
            Tensor::ones([batch, symbols], &device).mul_scalar(-0.2),
        )
    }

    #[test]
    fn test_output_shape_for_any_batch() {
        let device = Default::default();
        let demapper = NeuralDemapperConfig::new(6).init::<CpuBackend>(&device);
        assert_eq!(demapper.bits_per_symbol(), 6);
        for batch in [1, 3, 17] {
            let no = Tensor::<CpuBackend, 2>::ones([batch, 1], &device).mul_scalar(0.1);
            let llr = demapper.forward(received(batch, 250), no);
            assert_eq!(llr.dims(), [batch, 250, 6]);
        }
    }

    #[test]
    fn test_noise_feature_changes_output() {
        let device = Default::default();
        let demapper = NeuralDemapperConfig::new(2)
            .with_hidden_units(16)
            .init::<CpuBackend>(&device);
        let no = Tensor::<CpuBackend, 2>::from_data(TensorData::new(vec![0.01f32, 1.0], [2, 1]), &device);
        let llr = demapper.forward(received(2, 1), no).into_data().to_vec::<f32>().unwrap();
        assert_ne!(&llr[0..2], &llr[2..4]);
    }
}
