//! Outer code on tensors
//!
//! Thin bridge between the batch tensors of the pipelines and the
//! plain-buffer [`OuterCode`]: bits go to the host, through the
//! (rayon-parallel) encoder/decoder, and come back as 0.0/1.0 tensors.

use crate::complex::tensor_to_vec;
use burn::tensor::{backend::Backend, Tensor, TensorData};
use linkae_core::config::LinkConfig;
use linkae_core::ldpc_codec::OuterCode;
use linkae_core::types::LinkResult;

#[derive(Debug, Clone)]
pub struct OuterCodeBridge {
    code: OuterCode,
}

impl OuterCodeBridge {
    pub fn new(config: &LinkConfig) -> LinkResult<Self> {
        Ok(Self {
            code: OuterCode::new(config.info_length(), config.codeword_length, &config.ldpc)?,
        })
    }

    pub fn k(&self) -> usize {
        self.code.k()
    }

    pub fn n(&self) -> usize {
        self.code.n()
    }

    /// `[batch, k]` information bits → `[batch, n]` codewords.
    pub fn encode<B: Backend>(&self, bits: Tensor<B, 2>) -> LinkResult<Tensor<B, 2>> {
        let [batch, _] = bits.dims();
        let device = bits.device();
        let info = to_bits(tensor_to_vec(bits)?);
        let coded = self.code.encode_batch(&info)?;
        Ok(from_bits(&coded, [batch, self.n()], &device))
    }

    /// `[batch, n]` LLRs → `[batch, k]` hard decisions.
    pub fn decode<B: Backend>(&self, llrs: Tensor<B, 2>) -> LinkResult<Tensor<B, 2>> {
        let [batch, _] = llrs.dims();
        let device = llrs.device();
        let decoded = self.code.decode_batch(&tensor_to_vec(llrs)?)?;
        Ok(from_bits(&decoded, [batch, self.k()], &device))
    }
}

fn to_bits(values: Vec<f32>) -> Vec<u8> {
    values.into_iter().map(|v| (v > 0.5) as u8).collect()
}

pub(crate) fn from_bits<B: Backend>(bits: &[u8], shape: [usize; 2], device: &B::Device) -> Tensor<B, 2> {
    let floats: Vec<f32> = bits.iter().map(|&b| b as f32).collect();
    Tensor::from_data(TensorData::new(floats, shape), device)
}
