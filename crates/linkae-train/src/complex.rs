//! Complex-valued tensors as real/imaginary pairs
//!
//! The backends only provide real tensors, so baseband symbols travel as two
//! tensors of identical shape. Gradients flow through both halves.

use burn::tensor::{backend::Backend, Tensor, TensorData};
use linkae_core::types::{IQSample, LinkError, LinkResult};

/// Real and imaginary parts of a complex tensor.
#[derive(Debug, Clone)]
pub struct ComplexTensor<B: Backend, const D: usize> {
    pub re: Tensor<B, D>,
    pub im: Tensor<B, D>,
}

impl<B: Backend, const D: usize> ComplexTensor<B, D> {
    pub fn new(re: Tensor<B, D>, im: Tensor<B, D>) -> Self {
        Self { re, im }
    }

    /// Element-wise sum.
    pub fn add(self, other: Self) -> Self {
        Self::new(self.re.add(other.re), self.im.add(other.im))
    }

    /// Element-wise difference.
    pub fn sub(self, other: Self) -> Self {
        Self::new(self.re.sub(other.re), self.im.sub(other.im))
    }

    /// Same values, cut from the autodiff graph.
    pub fn detach(self) -> Self {
        Self::new(self.re.detach(), self.im.detach())
    }

    /// `|z|²` per element.
    pub fn norm_sqr(self) -> Tensor<B, D> {
        self.re.powf_scalar(2.0).add(self.im.powf_scalar(2.0))
    }

    pub fn dims(&self) -> [usize; D] {
        self.re.dims()
    }

    /// Build a tensor of shape `shape` from row-major complex samples.
    pub fn from_complex(samples: &[IQSample], shape: [usize; D], device: &B::Device) -> LinkResult<Self> {
        let expected: usize = shape.iter().product();
        if samples.len() != expected {
            return Err(LinkError::ShapeMismatch {
                expected,
                actual: samples.len(),
            });
        }
        let re: Vec<f32> = samples.iter().map(|s| s.re as f32).collect();
        let im: Vec<f32> = samples.iter().map(|s| s.im as f32).collect();
        Ok(Self::new(
            Tensor::from_data(TensorData::new(re, shape), device),
            Tensor::from_data(TensorData::new(im, shape), device),
        ))
    }

    /// Row-major complex samples.
    pub fn to_complex(&self) -> LinkResult<Vec<IQSample>> {
        let re = tensor_to_vec(self.re.clone())?;
        let im = tensor_to_vec(self.im.clone())?;
        Ok(re
            .into_iter()
            .zip(im)
            .map(|(r, i)| IQSample::new(r as f64, i as f64))
            .collect())
    }
}

/// Copy a float tensor to the host.
pub fn tensor_to_vec<B: Backend, const D: usize>(tensor: Tensor<B, D>) -> LinkResult<Vec<f32>> {
    tensor
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| LinkError::Tensor(format!("{:?}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::CpuBackend;
    use approx::assert_relative_eq;

    #[test]
    fn test_roundtrip_and_norm() {
        let device = Default::default();
        let samples = vec![
            IQSample::new(1.0, 0.0),
            IQSample::new(0.0, -2.0),
            IQSample::new(3.0, 4.0),
            IQSample::new(-0.5, 0.5),
        ];
        let z = ComplexTensor::<CpuBackend, 2>::from_complex(&samples, [2, 2], &device).unwrap();
        assert_eq!(z.dims(), [2, 2]);
        assert_eq!(z.to_complex().unwrap(), samples);

        let norms = tensor_to_vec(z.norm_sqr()).unwrap();
        assert_relative_eq!(norms[2], 25.0);
        assert_relative_eq!(norms[3], 0.5);
    }

    #[test]
    fn test_sub_of_self_is_zero() {
        let device = Default::default();
        let samples = vec![IQSample::new(0.3, -0.7); 6];
        let z = ComplexTensor::<CpuBackend, 1>::from_complex(&samples, [6], &device).unwrap();
        let diff = z.clone().sub(z);
        assert!(tensor_to_vec(diff.norm_sqr()).unwrap().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_shape_mismatch() {
        let device = Default::default();
        let err = ComplexTensor::<CpuBackend, 2>::from_complex(&[IQSample::new(0.0, 0.0)], [2, 2], &device);
        assert!(matches!(err, Err(LinkError::ShapeMismatch { expected: 4, actual: 1 })));
    }
}
