//! Training loops
//!
//! Both trainers run a fixed number of iterations with no convergence
//! check. Every iteration draws a fresh batch of per-example Eb/N0 values
//! uniformly from the configured range, so the model sees the whole range
//! throughout training.
//!
//! ```text
//! conventional:  repeat N:  loss → ∇(constellation, demapper) → Adam
//!
//! rl:            repeat N_alt:
//!                    repeat R:  receiver loss (σ² = 0) → ∇demapper → Adam_rx
//!                    transmitter loss (σ² > 0) → ∇constellation → Adam_tx
//!                repeat N_fine: receiver loss → ∇demapper → Adam_rx
//! ```
//!
//! The two RL optimisers keep separate moment estimates.

use crate::constellation::Constellation;
use crate::demapper::NeuralDemapper;
use crate::model::Autoencoder;
use crate::pipeline::{ConventionalTraining, EbNo, RlTraining};
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::{ElementConversion, Tensor};
use linkae_core::config::LinkConfig;
use linkae_core::source::RandomSource;
use linkae_core::types::{LinkError, LinkResult};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Losses and update counts of one training run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingHistory {
    /// Conventional BCE per iteration
    pub losses: Vec<f32>,
    /// Receiver loss per receiver update
    pub receiver_losses: Vec<f32>,
    /// Transmitter loss per transmitter update
    pub transmitter_losses: Vec<f32>,
    /// Outer iterations, all phases
    pub iterations: usize,
    pub receiver_updates: usize,
    pub transmitter_updates: usize,
    pub elapsed_sec: f64,
}

impl TrainingHistory {
    pub fn final_loss(&self) -> Option<f32> {
        self.losses.last().or(self.receiver_losses.last()).copied()
    }

    pub fn final_transmitter_loss(&self) -> Option<f32> {
        self.transmitter_losses.last().copied()
    }
}

fn scalar<B: Backend>(loss: &Tensor<B, 1>) -> LinkResult<f32> {
    let value = loss.clone().into_scalar().elem::<f32>();
    if !value.is_finite() {
        return Err(LinkError::Tensor(format!("non-finite loss {}", value)));
    }
    Ok(value)
}

fn should_report(iteration: usize, interval: usize) -> bool {
    interval > 0 && iteration % interval == 0
}

/// End-to-end gradient descent through constellation and demapper.
pub struct ConventionalTrainer {
    config: LinkConfig,
    pipeline: ConventionalTraining,
    source: RandomSource,
}

impl ConventionalTrainer {
    pub fn new(config: &LinkConfig, source: RandomSource) -> Self {
        Self {
            config: config.clone(),
            pipeline: ConventionalTraining::new(config),
            source,
        }
    }

    pub fn fit<B: AutodiffBackend>(
        &mut self,
        mut model: Autoencoder<B>,
    ) -> LinkResult<(Autoencoder<B>, TrainingHistory)> {
        let iterations = self.config.conventional_iterations;
        let batch = self.config.training_batch_size;
        let mut optimizer = AdamConfig::new().init::<B, Autoencoder<B>>();
        let mut history = TrainingHistory {
            losses: Vec::with_capacity(iterations),
            ..Default::default()
        };
        let start = Instant::now();

        tracing::info!(iterations, batch, lr = self.config.learning_rate, "conventional training");
        for i in 0..iterations {
            let ebno = EbNo::uniform(batch, self.config.ebno_db_min, self.config.ebno_db_max, &mut self.source);
            let loss = self.pipeline.loss(&model, batch, &ebno, &mut self.source)?;
            let value = scalar(&loss)?;

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optimizer.step(self.config.learning_rate, model, grads);
            history.losses.push(value);
            history.iterations += 1;
            history.receiver_updates += 1;
            history.transmitter_updates += 1;

            if should_report(i, self.config.report_interval) {
                tracing::info!(iteration = i, loss = value, "conventional");
            }
        }

        history.elapsed_sec = start.elapsed().as_secs_f64();
        tracing::info!(
            loss = ?history.final_loss(),
            elapsed_sec = history.elapsed_sec,
            "conventional training finished"
        );
        Ok((model, history))
    }
}

/// Alternating receiver/transmitter training followed by receiver finetuning.
pub struct RlTrainer {
    config: LinkConfig,
    receiver_pipeline: RlTraining,
    transmitter_pipeline: RlTraining,
    source: RandomSource,
}

impl RlTrainer {
    pub fn new(config: &LinkConfig, source: RandomSource) -> LinkResult<Self> {
        if !(config.rl_perturbation_variance > 0.0) {
            return Err(LinkError::InvalidConfig(format!(
                "rl_perturbation_variance must be positive, got {}",
                config.rl_perturbation_variance
            )));
        }
        Ok(Self {
            config: config.clone(),
            receiver_pipeline: RlTraining::new(config, 0.0),
            transmitter_pipeline: RlTraining::new(config, config.rl_perturbation_variance),
            source,
        })
    }

    fn ebno(&mut self) -> EbNo {
        EbNo::uniform(
            self.config.training_batch_size,
            self.config.ebno_db_min,
            self.config.ebno_db_max,
            &mut self.source,
        )
    }

    fn receiver_step<B, O>(
        &mut self,
        model: Autoencoder<B>,
        optimizer: &mut O,
        history: &mut TrainingHistory,
    ) -> LinkResult<(Autoencoder<B>, f32)>
    where
        B: AutodiffBackend,
        O: Optimizer<NeuralDemapper<B>, B>,
    {
        let batch = self.config.training_batch_size;
        let ebno = self.ebno();
        let losses = self.receiver_pipeline.losses(&model, batch, &ebno, &mut self.source)?;
        let value = scalar(&losses.receiver)?;

        let Autoencoder { constellation, demapper } = model;
        let mut grads = losses.receiver.backward();
        let grads = GradientsParams::from_module(&mut grads, &demapper);
        let demapper = optimizer.step(self.config.learning_rate, demapper, grads);

        history.receiver_losses.push(value);
        history.receiver_updates += 1;
        Ok((Autoencoder { constellation, demapper }, value))
    }

    fn transmitter_step<B, O>(
        &mut self,
        model: Autoencoder<B>,
        optimizer: &mut O,
        history: &mut TrainingHistory,
    ) -> LinkResult<(Autoencoder<B>, f32)>
    where
        B: AutodiffBackend,
        O: Optimizer<Constellation<B>, B>,
    {
        let batch = self.config.training_batch_size;
        let ebno = self.ebno();
        let losses = self.transmitter_pipeline.losses(&model, batch, &ebno, &mut self.source)?;
        let value = scalar(&losses.transmitter)?;

        let Autoencoder { constellation, demapper } = model;
        let mut grads = losses.transmitter.backward();
        let grads = GradientsParams::from_module(&mut grads, &constellation);
        let constellation = optimizer.step(self.config.learning_rate, constellation, grads);

        history.transmitter_losses.push(value);
        history.transmitter_updates += 1;
        Ok((Autoencoder { constellation, demapper }, value))
    }

    pub fn fit<B: AutodiffBackend>(
        &mut self,
        mut model: Autoencoder<B>,
    ) -> LinkResult<(Autoencoder<B>, TrainingHistory)> {
        let alternating = self.config.rl_alternating_iterations;
        let finetuning = self.config.rl_finetuning_iterations;
        let ratio = self.config.receiver_steps_per_transmitter_step;
        let interval = self.config.report_interval;

        let mut rx_optimizer = AdamConfig::new().init::<B, NeuralDemapper<B>>();
        let mut tx_optimizer = AdamConfig::new().init::<B, Constellation<B>>();
        let mut history = TrainingHistory {
            receiver_losses: Vec::with_capacity(alternating * ratio + finetuning),
            transmitter_losses: Vec::with_capacity(alternating),
            ..Default::default()
        };
        let start = Instant::now();

        tracing::info!(
            alternating,
            finetuning,
            ratio,
            variance = self.transmitter_pipeline.perturbation_variance(),
            "RL training"
        );
        for i in 0..alternating {
            let mut rx_loss = 0.0;
            for _ in 0..ratio {
                let (next, value) = self.receiver_step(model, &mut rx_optimizer, &mut history)?;
                model = next;
                rx_loss = value;
            }
            let (next, tx_loss) = self.transmitter_step(model, &mut tx_optimizer, &mut history)?;
            model = next;
            history.iterations += 1;

            if should_report(i, interval) {
                tracing::info!(iteration = i, rx_loss, tx_loss, "rl alternating");
            }
        }

        for i in 0..finetuning {
            let (next, rx_loss) = self.receiver_step(model, &mut rx_optimizer, &mut history)?;
            model = next;
            history.iterations += 1;
            if should_report(i, interval) {
                tracing::info!(iteration = i, rx_loss, "rl finetuning");
            }
        }

        history.elapsed_sec = start.elapsed().as_secs_f64();
        tracing::info!(
            receiver_updates = history.receiver_updates,
            transmitter_updates = history.transmitter_updates,
            elapsed_sec = history.elapsed_sec,
            "RL training finished"
        );
        Ok((model, history))
    }
}
