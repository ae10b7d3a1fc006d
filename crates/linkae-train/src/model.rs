//! The learned link: trainable constellation plus neural demapper.
//!
//! These two modules hold every trainable parameter; they are what gets
//! checkpointed after a training run.

use crate::constellation::{Constellation, ConstellationConfig};
use crate::demapper::{NeuralDemapper, NeuralDemapperConfig};
use burn::module::Module;
use burn::tensor::backend::Backend;
use linkae_core::config::LinkConfig;

#[derive(Module, Debug)]
pub struct Autoencoder<B: Backend> {
    pub constellation: Constellation<B>,
    pub demapper: NeuralDemapper<B>,
}

impl<B: Backend> Autoencoder<B> {
    /// Fresh model for the geometry of `config`.
    ///
    /// Demapper weights come from the backend RNG; seed it with `B::seed`
    /// first for a reproducible run.
    pub fn new(config: &LinkConfig, device: &B::Device) -> Self {
        Self {
            constellation: ConstellationConfig::new(config.bits_per_symbol).init(device),
            demapper: NeuralDemapperConfig::new(config.bits_per_symbol)
                .with_hidden_units(config.demapper_hidden_units)
                .init(device),
        }
    }

    pub fn bits_per_symbol(&self) -> usize {
        self.constellation.bits_per_symbol()
    }

    pub fn device(&self) -> B::Device {
        self.constellation.points_re.val().device()
    }
}
