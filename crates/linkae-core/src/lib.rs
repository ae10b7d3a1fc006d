//! # Learned-Link Core Library
//!
//! Plain-Rust building blocks around a learned physical layer: everything
//! the end-to-end autoencoder treats as a fixed collaborator.
//!
//! ## Overview
//!
//! - **Configuration**: one immutable [`config::LinkConfig`] per run
//! - **Outer code**: systematic LDPC encoder and belief-propagation decoder
//! - **Reference modulation**: Gray QAM/PSK, exact APP and max-log demapping
//! - **Channel**: AWGN on complex sample buffers
//! - **Evaluation**: BER/BLER counting and Monte-Carlo Eb/N0 sweeps
//! - **Reports & logging**: JSON/text/CSV reports, `tracing` setup
//!
//! ## Signal Flow
//!
//! ```text
//! TX: bits → LDPC encode → mapper → symbols
//! CH: symbols + N(0, N0) → received
//! RX: received → demapper (LLRs) → LDPC decode → bits
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use linkae_core::config::LinkConfig;
//! use linkae_core::simulation::{simulate_ber, BaselineLink, SweepConfig};
//! use linkae_core::source::RandomSource;
//!
//! let config = LinkConfig::default();
//! let mut baseline = BaselineLink::new(&config, RandomSource::seeded(config.seed)).unwrap();
//! let curve = simulate_ber(&mut baseline, &SweepConfig::from_link_config(&config)).unwrap();
//! println!("{}", curve.to_csv());
//! ```

pub mod ber_tool;
pub mod channel;
pub mod config;
pub mod ldpc_codec;
pub mod observe;
pub mod report;
pub mod simulation;
pub mod snr;
pub mod source;
pub mod symbol_mapping;
pub mod types;

/// Commonly used items.
pub mod prelude {
    pub use crate::config::{EvaluationConfig, LdpcConfig, LinkConfig};
    pub use crate::ldpc_codec::OuterCode;
    pub use crate::simulation::{simulate_ber, BaselineLink, BerCurve, BitBlocks, LinkSimulator, SweepConfig};
    pub use crate::snr::ebnodb2no;
    pub use crate::source::RandomSource;
    pub use crate::types::{Complex, IQSample, LinkError, LinkResult};
}
