//! Trained autoencoder as a BER-sweep target.

use crate::model::Autoencoder;
use crate::pipeline::{EbNo, Evaluation};
use burn::tensor::backend::Backend;
use linkae_core::config::LinkConfig;
use linkae_core::simulation::{BitBlocks, LinkSimulator};
use linkae_core::source::RandomSource;
use linkae_core::types::LinkResult;

/// Evaluation pipeline bound to one model and its own noise stream.
pub struct TrainedLink<B: Backend> {
    name: String,
    model: Autoencoder<B>,
    evaluation: Evaluation,
    source: RandomSource,
}

impl<B: Backend> TrainedLink<B> {
    pub fn new(name: &str, model: Autoencoder<B>, config: &LinkConfig, source: RandomSource) -> LinkResult<Self> {
        Ok(Self {
            name: name.to_string(),
            model,
            evaluation: Evaluation::new(config)?,
            source,
        })
    }
}

impl<B: Backend> LinkSimulator for TrainedLink<B> {
    fn name(&self) -> &str {
        &self.name
    }

    fn simulate(&mut self, batch_size: usize, ebno_db: f64) -> LinkResult<BitBlocks> {
        self.evaluation
            .run(&self.model, batch_size, &EbNo::Fixed(ebno_db), &mut self.source)?
            .into_bit_blocks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::CpuBackend;
    use linkae_core::simulation::{simulate_ber, SweepConfig};

    #[test]
    fn test_untrained_link_sweep() {
        let config = LinkConfig {
            bits_per_symbol: 2,
            codeword_length: 64,
            demapper_hidden_units: 8,
            ..Default::default()
        };
        let model = Autoencoder::<CpuBackend>::new(&config, &Default::default());
        let mut link = TrainedLink::new("untrained", model, &config, RandomSource::seeded(7)).unwrap();

        let sweep = SweepConfig {
            ebno_db: vec![4.0, 6.0],
            batch_size: 4,
            max_mc_iterations: 2,
            target_block_errors: 1000,
            early_stop: false,
        };
        let curve = simulate_ber(&mut link, &sweep).unwrap();
        assert_eq!(curve.name, "untrained");
        assert_eq!(curve.points.len(), 2);
        for p in &curve.points {
            assert_eq!(p.bits, 2 * 4 * 32);
            assert_eq!(p.blocks, 8);
            assert!((0.0..=1.0).contains(&p.ber));
        }
    }
}
