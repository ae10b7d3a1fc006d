//! End-to-end pipelines
//!
//! Three explicitly typed passes over the same transmitter → channel →
//! receiver chain:
//!
//! | Pipeline               | Outer code | Output                                  |
//! |------------------------|------------|-----------------------------------------|
//! | [`ConventionalTraining`] | bypassed | BCE loss (differentiable end to end)    |
//! | [`RlTraining`]           | bypassed | transmitter and receiver losses         |
//! | [`Evaluation`]           | encode/decode | reference and decoded info bits   |
//!
//! Training skips the outer code: random bits are drawn directly at the
//! codeword length. All randomness comes from the caller's
//! [`RandomSource`].

use crate::channel::{gaussian_pair, AwgnChannel};
use crate::complex::{tensor_to_vec, ComplexTensor};
use crate::model::Autoencoder;
use crate::outer_code::{from_bits, OuterCodeBridge};
use burn::tensor::{backend::Backend, Tensor, TensorData};
use linkae_core::config::LinkConfig;
use linkae_core::simulation::BitBlocks;
use linkae_core::snr::ebnodb2no;
use linkae_core::source::RandomSource;
use linkae_core::types::{LinkError, LinkResult};

/// Eb/N0 of a batch, in dB.
#[derive(Debug, Clone, PartialEq)]
pub enum EbNo {
    /// Same value for every example
    Fixed(f64),
    /// One value per example
    PerExample(Vec<f64>),
}

impl EbNo {
    /// Draw one value per example uniformly from `[min, max)`.
    pub fn uniform(batch_size: usize, min: f64, max: f64, source: &mut RandomSource) -> Self {
        EbNo::PerExample(
            source
                .uniform(batch_size, min as f32, max as f32)
                .into_iter()
                .map(f64::from)
                .collect(),
        )
    }

    /// Expand to exactly `batch_size` values.
    pub fn per_example(&self, batch_size: usize) -> LinkResult<Vec<f64>> {
        match self {
            EbNo::Fixed(db) => Ok(vec![*db; batch_size]),
            EbNo::PerExample(values) if values.len() == batch_size => Ok(values.clone()),
            EbNo::PerExample(values) => Err(LinkError::ShapeMismatch {
                expected: batch_size,
                actual: values.len(),
            }),
        }
    }
}

impl From<f64> for EbNo {
    fn from(db: f64) -> Self {
        EbNo::Fixed(db)
    }
}

/// Codeword geometry shared by all pipelines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkGeometry {
    pub bits_per_symbol: usize,
    pub codeword_length: usize,
    pub code_rate: f64,
}

impl LinkGeometry {
    pub fn from_config(config: &LinkConfig) -> Self {
        Self {
            bits_per_symbol: config.bits_per_symbol,
            codeword_length: config.codeword_length,
            code_rate: config.code_rate,
        }
    }

    pub fn symbols(&self) -> usize {
        self.codeword_length / self.bits_per_symbol
    }

    /// Noise variances for one batch, per example.
    fn noise(&self, ebno: &EbNo, batch_size: usize) -> LinkResult<Vec<f64>> {
        Ok(ebno
            .per_example(batch_size)?
            .into_iter()
            .map(|db| ebnodb2no(db, self.bits_per_symbol, self.code_rate))
            .collect())
    }

    fn check_model<B: Backend>(&self, model: &Autoencoder<B>) -> LinkResult<()> {
        if model.bits_per_symbol() != self.bits_per_symbol {
            return Err(LinkError::ShapeMismatch {
                expected: self.bits_per_symbol,
                actual: model.bits_per_symbol(),
            });
        }
        Ok(())
    }
}

/// `[batch, 1]` noise tensor for the demapper.
fn noise_tensor<B: Backend>(no: &[f64], device: &B::Device) -> Tensor<B, 2> {
    let values: Vec<f32> = no.iter().map(|&v| v as f32).collect();
    Tensor::from_data(TensorData::new(values, [no.len(), 1]), device)
}

fn random_bits<B: Backend>(
    batch_size: usize,
    len: usize,
    source: &mut RandomSource,
    device: &B::Device,
) -> Tensor<B, 2> {
    Tensor::from_data(TensorData::new(source.bits(batch_size * len), [batch_size, len]), device)
}

/// Element-wise binary cross-entropy of logits against 0/1 targets.
///
/// `max(x, 0) − x·y + log(1 + e^{−|x|})`, stable for large `|x|`.
pub fn bce_with_logits<B: Backend, const D: usize>(logits: Tensor<B, D>, targets: Tensor<B, D>) -> Tensor<B, D> {
    let softplus = logits.clone().abs().neg().exp().log1p();
    logits
        .clone()
        .clamp_min(0.0)
        .sub(logits.mul(targets))
        .add(softplus)
}

/// Gradient-based end-to-end training pass.
#[derive(Debug, Clone)]
pub struct ConventionalTraining {
    geometry: LinkGeometry,
    channel: AwgnChannel,
}

impl ConventionalTraining {
    pub fn new(config: &LinkConfig) -> Self {
        Self {
            geometry: LinkGeometry::from_config(config),
            channel: AwgnChannel,
        }
    }

    /// Mean BCE between the coded bits and the demapper LLRs.
    pub fn loss<B: Backend>(
        &self,
        model: &Autoencoder<B>,
        batch_size: usize,
        ebno: &EbNo,
        source: &mut RandomSource,
    ) -> LinkResult<Tensor<B, 1>> {
        self.geometry.check_model(model)?;
        let device = model.device();
        let no = self.geometry.noise(ebno, batch_size)?;
        let n = self.geometry.codeword_length;

        let bits = random_bits::<B>(batch_size, n, source, &device);
        let x = model.constellation.map_bits(bits.clone());
        let y = self.channel.transmit(x, &no, source)?;
        let llr = model.demapper.forward(y, noise_tensor(&no, &device));

        Ok(bce_with_logits(llr.reshape([batch_size, n]), bits).mean())
    }
}

/// Transmitter and receiver losses of one RL pass.
#[derive(Debug, Clone)]
pub struct RlLosses<B: Backend> {
    /// Policy-gradient surrogate; only the constellation receives gradient
    pub transmitter: Tensor<B, 1>,
    /// Mean BCE; only the demapper receives gradient
    pub receiver: Tensor<B, 1>,
}

/// Alternating-training pass with transmitter exploration.
///
/// The mapped symbols are perturbed with `CN(0, σ²)` noise before the
/// channel. The channel output is cut from the graph, so the receiver loss
/// only reaches the demapper, and the transmitter learns from
///
/// ```text
/// p  = sg(x_p) − x
/// L_tx = mean( −sg(bce_symbol) · |p|² / σ² )
/// ```
#[derive(Debug, Clone)]
pub struct RlTraining {
    geometry: LinkGeometry,
    channel: AwgnChannel,
    perturbation_variance: f64,
}

impl RlTraining {
    pub fn new(config: &LinkConfig, perturbation_variance: f64) -> Self {
        Self {
            geometry: LinkGeometry::from_config(config),
            channel: AwgnChannel,
            perturbation_variance,
        }
    }

    pub fn perturbation_variance(&self) -> f64 {
        self.perturbation_variance
    }

    pub fn losses<B: Backend>(
        &self,
        model: &Autoencoder<B>,
        batch_size: usize,
        ebno: &EbNo,
        source: &mut RandomSource,
    ) -> LinkResult<RlLosses<B>> {
        self.geometry.check_model(model)?;
        let device = model.device();
        let no = self.geometry.noise(ebno, batch_size)?;
        let n = self.geometry.codeword_length;
        let m = self.geometry.bits_per_symbol;
        let symbols = self.geometry.symbols();
        let explore = self.perturbation_variance > 0.0;

        let bits = random_bits::<B>(batch_size, n, source, &device);
        let x = model.constellation.map_bits(bits.clone());

        let x_p = if explore {
            let sigma = (self.perturbation_variance / 2.0).sqrt();
            let (re, im) = gaussian_pair(batch_size, symbols, |_| sigma, source);
            let eps = ComplexTensor::new(
                Tensor::from_data(TensorData::new(re, [batch_size, symbols]), &device),
                Tensor::from_data(TensorData::new(im, [batch_size, symbols]), &device),
            );
            x.clone().add(eps).detach()
        } else {
            x.clone().detach()
        };

        let y = self.channel.transmit(x_p.clone(), &no, source)?.detach();
        let llr = model.demapper.forward(y, noise_tensor(&no, &device));

        let bce = bce_with_logits(llr, bits.reshape([batch_size, symbols, m]))
            .mean_dim(2)
            .reshape([batch_size, symbols]);
        let receiver = bce.clone().mean();

        let transmitter = if explore {
            let p = x_p.sub(x);
            bce.detach()
                .neg()
                .mul(p.norm_sqr())
                .div_scalar(self.perturbation_variance)
                .mean()
        } else {
            Tensor::zeros([1], &device)
        };

        Ok(RlLosses { transmitter, receiver })
    }
}

/// Reference and decoded information bits, both `[batch, k]`.
#[derive(Debug, Clone)]
pub struct EvaluationOutput<B: Backend> {
    pub bits: Tensor<B, 2>,
    pub bits_hat: Tensor<B, 2>,
}

impl<B: Backend> EvaluationOutput<B> {
    /// Host buffers for the BER tooling.
    pub fn into_bit_blocks(self) -> LinkResult<BitBlocks> {
        let [_, k] = self.bits.dims();
        let to_u8 = |v: Vec<f32>| v.into_iter().map(|b| (b > 0.5) as u8).collect::<Vec<u8>>();
        Ok(BitBlocks {
            reference: to_u8(tensor_to_vec(self.bits)?),
            decoded: to_u8(tensor_to_vec(self.bits_hat)?),
            block_len: k,
        })
    }
}

/// Inference pass with the outer code in the loop.
#[derive(Debug, Clone)]
pub struct Evaluation {
    geometry: LinkGeometry,
    channel: AwgnChannel,
    code: OuterCodeBridge,
}

impl Evaluation {
    pub fn new(config: &LinkConfig) -> LinkResult<Self> {
        Ok(Self {
            geometry: LinkGeometry::from_config(config),
            channel: AwgnChannel,
            code: OuterCodeBridge::new(config)?,
        })
    }

    pub fn info_length(&self) -> usize {
        self.code.k()
    }

    pub fn run<B: Backend>(
        &self,
        model: &Autoencoder<B>,
        batch_size: usize,
        ebno: &EbNo,
        source: &mut RandomSource,
    ) -> LinkResult<EvaluationOutput<B>> {
        self.geometry.check_model(model)?;
        let device = model.device();
        let no = self.geometry.noise(ebno, batch_size)?;
        let k = self.code.k();

        let info = source.bit_stream(batch_size * k);
        let bits = from_bits::<B>(&info, [batch_size, k], &device);
        let coded = self.code.encode(bits.clone())?;
        let x = model.constellation.map_bits(coded);
        let y = self.channel.transmit(x, &no, source)?;
        let llr = model.demapper.forward(y, noise_tensor(&no, &device));
        let bits_hat = self
            .code
            .decode(llr.reshape([batch_size, self.geometry.codeword_length]))?;

        Ok(EvaluationOutput { bits, bits_hat })
    }
}
