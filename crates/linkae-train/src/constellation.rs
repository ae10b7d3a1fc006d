//! Trainable constellation and bit-to-symbol mapper
//!
//! `2^m` complex points stored as two parameter vectors, initialised to the
//! Gray-labelled QAM/PSK of the reference mapper. Points are re-normalised
//! to unit average energy every time they are read, so the optimiser moves
//! the geometry but never the transmit power.
//!
//! ```text
//! bits [b, n] → [b·S, m] · [1, 2, 4, …]ᵀ → labels [b·S] → points[label] → [b, S]
//! ```

use crate::complex::ComplexTensor;
use burn::config::Config;
use burn::module::{Module, Param};
use burn::tensor::{backend::Backend, Tensor, TensorData};
use linkae_core::symbol_mapping::Modulation;

#[derive(Config, Debug)]
pub struct ConstellationConfig {
    /// Bits per constellation point
    pub bits_per_symbol: usize,
}

impl ConstellationConfig {
    /// Points at the reference Gray constellation positions.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Constellation<B> {
        let points = Modulation::for_bits_per_symbol(self.bits_per_symbol).constellation();
        let re: Vec<f32> = points.iter().map(|p| p.re as f32).collect();
        let im: Vec<f32> = points.iter().map(|p| p.im as f32).collect();
        let order = points.len();
        Constellation {
            points_re: Param::from_tensor(Tensor::from_data(TensorData::new(re, [order]), device)),
            points_im: Param::from_tensor(Tensor::from_data(TensorData::new(im, [order]), device)),
            bits_per_symbol: self.bits_per_symbol,
        }
    }
}

#[derive(Module, Debug)]
pub struct Constellation<B: Backend> {
    pub points_re: Param<Tensor<B, 1>>,
    pub points_im: Param<Tensor<B, 1>>,
    bits_per_symbol: usize,
}

impl<B: Backend> Constellation<B> {
    pub fn bits_per_symbol(&self) -> usize {
        self.bits_per_symbol
    }

    pub fn order(&self) -> usize {
        1 << self.bits_per_symbol
    }

    /// Unit-energy constellation points, indexed by bit label (LSB first).
    pub fn points(&self) -> ComplexTensor<B, 1> {
        let re = self.points_re.val();
        let im = self.points_im.val();
        let energy = re.clone().powf_scalar(2.0).add(im.clone().powf_scalar(2.0)).mean();
        let scale = energy.sqrt().repeat_dim(0, self.order());
        ComplexTensor::new(re.div(scale.clone()), im.div(scale))
    }

    /// Map `[batch, n]` coded bits (0.0/1.0) to `[batch, n / m]` symbols.
    pub fn map_bits(&self, bits: Tensor<B, 2>) -> ComplexTensor<B, 2> {
        let [batch, n] = bits.dims();
        let m = self.bits_per_symbol;
        let symbols = n / m;
        let device = bits.device();

        let weights: Vec<f32> = (0..m).map(|j| (1u32 << j) as f32).collect();
        let weights = Tensor::<B, 2>::from_data(TensorData::new(weights, [m, 1]), &device);
        let labels = bits
            .detach()
            .reshape([batch * symbols, m])
            .matmul(weights)
            .reshape([batch * symbols])
            .int();

        let points = self.points();
        ComplexTensor::new(
            points.re.select(0, labels.clone()).reshape([batch, symbols]),
            points.im.select(0, labels).reshape([batch, symbols]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::complex::tensor_to_vec;
    use crate::device::{CpuBackend, TrainBackend};
    use approx::assert_relative_eq;
    use linkae_core::source::RandomSource;
    use linkae_core::symbol_mapping::SymbolMapper;

    #[test]
    fn test_unit_energy() {
        let device = Default::default();
        let c = ConstellationConfig::new(6).init::<CpuBackend>(&device);
        assert_eq!(c.order(), 64);
        let energy = tensor_to_vec(c.points().norm_sqr().mean()).unwrap()[0];
        assert_relative_eq!(energy, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_map_matches_reference_mapper() {
        let device = Default::default();
        let c = ConstellationConfig::new(4).init::<CpuBackend>(&device);
        let bits = RandomSource::seeded(9).bit_stream(2 * 16);
        let floats: Vec<f32> = bits.iter().map(|&b| b as f32).collect();
        let tensor = Tensor::<CpuBackend, 2>::from_data(TensorData::new(floats, [2, 16]), &device);

        let mapped = c.map_bits(tensor);
        assert_eq!(mapped.dims(), [2, 4]);

        let expected = SymbolMapper::new(Modulation::for_bits_per_symbol(4)).map(&bits);
        for (got, want) in mapped.to_complex().unwrap().iter().zip(&expected) {
            assert!((got - want).norm() < 1e-5);
        }
    }

    #[test]
    fn test_scaling_parameters_keeps_unit_energy() {
        let device = Default::default();
        let mut c = ConstellationConfig::new(2).init::<CpuBackend>(&device);
        c.points_re = Param::from_tensor(c.points_re.val().mul_scalar(3.0));
        c.points_im = Param::from_tensor(c.points_im.val().mul_scalar(3.0));
        let energy = tensor_to_vec(c.points().norm_sqr().mean()).unwrap()[0];
        assert_relative_eq!(energy, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_map_bits_next_to_module_methods() {
        let device = Default::default();
        let c = ConstellationConfig::new(2).init::<TrainBackend>(&device);
        assert_eq!(c.num_params(), 8);

        let bits = Tensor::<TrainBackend, 2>::from_data(
            TensorData::new(vec![1.0f32, 0.0, 0.0, 1.0], [1, 4]),
            &device,
        );
        let x = c.map_bits(bits);
        assert_eq!(x.dims(), [1, 2]);

        let grads = x.re.sum().backward();
        let grad = c.points_re.val().grad(&grads).unwrap();
        assert!(tensor_to_vec(grad).unwrap().iter().any(|g| g.abs() > 0.0));
    }
}
