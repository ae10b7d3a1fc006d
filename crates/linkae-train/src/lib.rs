//! # Learned AWGN Autoencoder
//!
//! A trainable transmitter (constellation geometry) and receiver (neural
//! demapper) over an AWGN channel, built on `burn`, with the LDPC outer
//! code and BER tooling of [`linkae_core`].
//!
//! ## Training procedures
//!
//! - **Conventional**: the channel is differentiable, so one optimiser
//!   descends the bit-wise cross-entropy through demapper, channel and
//!   constellation.
//! - **RL-based alternating**: the channel is treated as a black box. The
//!   receiver learns by supervised BCE; the transmitter learns from a
//!   policy-gradient estimate using perturbed symbols, with ten receiver
//!   steps per transmitter step, then receiver-only finetuning.
//!
//! ## Example
//!
//! ```rust,no_run
//! use burn::tensor::backend::Backend;
//! use linkae_core::config::LinkConfig;
//! use linkae_core::source::RandomSource;
//! use linkae_train::device::TrainBackend;
//! use linkae_train::model::Autoencoder;
//! use linkae_train::trainer::RlTrainer;
//!
//! let config = LinkConfig::default();
//! TrainBackend::seed(config.seed);
//! let model = Autoencoder::<TrainBackend>::new(&config, &Default::default());
//! let mut trainer = RlTrainer::new(&config, RandomSource::seeded(config.seed)).unwrap();
//! let (model, history) = trainer.fit(model).unwrap();
//! ```

pub mod bench;
pub mod channel;
pub mod checkpoint;
pub mod complex;
pub mod constellation;
pub mod demapper;
pub mod device;
pub mod link;
pub mod model;
pub mod outer_code;
pub mod pipeline;
pub mod trainer;

pub use link::TrainedLink;
pub use model::Autoencoder;
pub use pipeline::{ConventionalTraining, EbNo, Evaluation, EvaluationOutput, RlLosses, RlTraining};
pub use trainer::{ConventionalTrainer, RlTrainer, TrainingHistory};
