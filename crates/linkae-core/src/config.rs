//! Link and training configuration
//!
//! One immutable set of scalars fixed before a run: modulation geometry,
//! outer code, SNR range, iteration counts and the RL exploration variance.
//! Loaded from JSON; every field has a default so partial files work.

use crate::snr::ebno_range;
use crate::types::{LinkError, LinkResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Belief-propagation variant used by the outer decoder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LdpcAlgorithm {
    /// Exact sum-product (tanh rule)
    SumProduct,
    /// Scaled min-sum approximation
    MinSum { scale: f64 },
}

/// Outer LDPC code parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LdpcConfig {
    /// Maximum belief-propagation iterations
    pub max_iterations: usize,
    /// Check-node update rule
    pub algorithm: LdpcAlgorithm,
    /// Number of checks each information bit participates in
    pub column_weight: usize,
    /// Seed for the parity-check matrix construction
    pub construction_seed: u64,
}

impl Default for LdpcConfig {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            algorithm: LdpcAlgorithm::MinSum { scale: 0.75 },
            column_weight: 3,
            construction_seed: 0x5eed_1dbc,
        }
    }
}

/// Monte-Carlo BER/BLER evaluation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Eb/N0 step between sweep points (dB)
    pub ebno_step_db: f64,
    /// Codewords per Monte-Carlo iteration
    pub batch_size: usize,
    /// Upper bound on Monte-Carlo iterations per SNR point
    pub max_mc_iterations: usize,
    /// Stop an SNR point once this many block errors were counted
    pub target_block_errors: u64,
    /// Stop the sweep after the first error-free SNR point
    pub early_stop: bool,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            ebno_step_db: 0.5,
            batch_size: 128,
            max_mc_iterations: 1000,
            target_block_errors: 1000,
            early_stop: true,
        }
    }
}

/// Complete configuration of a training/evaluation session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Bits carried by one constellation point
    pub bits_per_symbol: usize,
    /// Outer codeword length n
    pub codeword_length: usize,
    /// Outer code rate k/n
    pub code_rate: f64,
    /// Lower edge of the training/evaluation Eb/N0 range (dB)
    pub ebno_db_min: f64,
    /// Upper edge of the training/evaluation Eb/N0 range (dB)
    pub ebno_db_max: f64,
    /// Codewords per training step
    pub training_batch_size: usize,
    /// Iterations of conventional end-to-end training
    pub conventional_iterations: usize,
    /// Outer iterations of alternating RL training
    pub rl_alternating_iterations: usize,
    /// Receiver-only iterations after the alternating phase
    pub rl_finetuning_iterations: usize,
    /// Receiver steps per transmitter step during alternating training
    pub receiver_steps_per_transmitter_step: usize,
    /// Variance of the transmitter exploration perturbation
    pub rl_perturbation_variance: f64,
    /// Adam learning rate shared by all optimizers
    pub learning_rate: f64,
    /// Width of the two hidden demapper layers
    pub demapper_hidden_units: usize,
    /// Log a progress line every this many iterations
    pub report_interval: usize,
    /// Seed for parameter initialisation and every random draw
    pub seed: u64,
    /// Weights written after conventional training
    pub conventional_weights_path: PathBuf,
    /// Weights written after RL training
    pub rl_weights_path: PathBuf,
    /// Abort at startup when no accelerator is available
    pub require_accelerator: bool,
    /// Outer code parameters
    pub ldpc: LdpcConfig,
    /// BER sweep parameters
    pub evaluation: EvaluationConfig,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            bits_per_symbol: 6,
            codeword_length: 1500,
            code_rate: 0.5,
            ebno_db_min: 4.0,
            ebno_db_max: 8.0,
            training_batch_size: 128,
            conventional_iterations: 10_000,
            rl_alternating_iterations: 7_000,
            rl_finetuning_iterations: 3_000,
            receiver_steps_per_transmitter_step: 10,
            rl_perturbation_variance: 0.01,
            learning_rate: 1e-3,
            demapper_hidden_units: 128,
            report_interval: 100,
            seed: 1,
            conventional_weights_path: PathBuf::from(
                "awgn_autoencoder_weights_conventional_training",
            ),
            rl_weights_path: PathBuf::from("awgn_autoencoder_weights_rl_training"),
            require_accelerator: false,
            ldpc: LdpcConfig::default(),
            evaluation: EvaluationConfig::default(),
        }
    }
}

impl LinkConfig {
    /// Load and validate a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> LinkResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: LinkConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Pretty JSON rendering, suitable as a starting config file.
    pub fn to_json_pretty(&self) -> LinkResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Symbols per outer codeword (n / m).
    pub fn symbols_per_codeword(&self) -> usize {
        self.codeword_length / self.bits_per_symbol
    }

    /// Information bits per codeword (k = n * rate).
    pub fn info_length(&self) -> usize {
        (self.codeword_length as f64 * self.code_rate).round() as usize
    }

    /// Number of constellation points (2^m).
    pub fn modulation_order(&self) -> usize {
        1 << self.bits_per_symbol
    }

    /// Eb/N0 points of the evaluation sweep (half-open range).
    pub fn ebno_sweep(&self) -> Vec<f64> {
        ebno_range(self.ebno_db_min, self.ebno_db_max, self.evaluation.ebno_step_db)
    }

    /// Sweep points for `evaluate`; an empty sweep is a configuration error.
    pub fn evaluation_sweep(&self) -> LinkResult<Vec<f64>> {
        let points = self.ebno_sweep();
        if points.is_empty() {
            return Err(LinkError::InvalidConfig(format!(
                "Eb/N0 sweep [{}, {}) in {} dB steps has no points",
                self.ebno_db_min, self.ebno_db_max, self.evaluation.ebno_step_db
            )));
        }
        Ok(points)
    }

    /// Reject geometries that would break the codeword/symbol invariant.
    pub fn validate(&self) -> LinkResult<()> {
        if self.bits_per_symbol == 0 || self.bits_per_symbol > 12 {
            return Err(LinkError::InvalidConfig(format!(
                "bits_per_symbol must be in 1..=12, got {}",
                self.bits_per_symbol
            )));
        }
        if self.codeword_length == 0 || self.codeword_length % self.bits_per_symbol != 0 {
            return Err(LinkError::InvalidConfig(format!(
                "codeword_length {} is not a multiple of bits_per_symbol {}",
                self.codeword_length, self.bits_per_symbol
            )));
        }
        if !(self.code_rate > 0.0 && self.code_rate < 1.0) {
            return Err(LinkError::InvalidConfig(format!(
                "code_rate must be in (0, 1), got {}",
                self.code_rate
            )));
        }
        let k_exact = self.codeword_length as f64 * self.code_rate;
        if (k_exact - k_exact.round()).abs() > 1e-9 {
            return Err(LinkError::InvalidConfig(format!(
                "codeword_length * code_rate = {} is not an integer",
                k_exact
            )));
        }
        if !(self.ebno_db_min.is_finite() && self.ebno_db_max.is_finite())
            || self.ebno_db_max < self.ebno_db_min
        {
            return Err(LinkError::InvalidConfig(format!(
                "invalid Eb/N0 range [{}, {}]",
                self.ebno_db_min, self.ebno_db_max
            )));
        }
        if self.training_batch_size == 0 || self.evaluation.batch_size == 0 {
            return Err(LinkError::InvalidConfig("batch sizes must be non-zero".into()));
        }
        if self.receiver_steps_per_transmitter_step == 0 {
            return Err(LinkError::InvalidConfig(
                "receiver_steps_per_transmitter_step must be non-zero".into(),
            ));
        }
        if !(self.rl_perturbation_variance.is_finite() && self.rl_perturbation_variance > 0.0) {
            return Err(LinkError::InvalidConfig(format!(
                "rl_perturbation_variance must be positive, got {}",
                self.rl_perturbation_variance
            )));
        }
        if !(self.learning_rate > 0.0) {
            return Err(LinkError::InvalidConfig("learning_rate must be positive".into()));
        }
        if self.evaluation.ebno_step_db <= 0.0 {
            return Err(LinkError::InvalidConfig("ebno_step_db must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_geometry() {
        let cfg = LinkConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.symbols_per_codeword(), 250);
        assert_eq!(cfg.info_length(), 750);
        assert_eq!(cfg.modulation_order(), 64);
        assert_eq!(
            cfg.symbols_per_codeword() * cfg.bits_per_symbol,
            cfg.codeword_length
        );
    }

    #[test]
    fn test_geometry_invariant_for_valid_configs() {
        for m in 1..=8 {
            for symbols in [10usize, 64, 250] {
                let cfg = LinkConfig {
                    bits_per_symbol: m,
                    codeword_length: symbols * m,
                    code_rate: 0.5,
                    ..Default::default()
                };
                if cfg.validate().is_ok() {
                    assert_eq!(cfg.symbols_per_codeword() * m, cfg.codeword_length);
                }
            }
        }
    }

    #[test]
    fn test_rejects_ragged_codeword() {
        let cfg = LinkConfig {
            codeword_length: 1501,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(LinkError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_zero_perturbation() {
        let cfg = LinkConfig {
            rl_perturbation_variance: 0.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_ebno_sweep() {
        let cfg = LinkConfig::default();
        let sweep = cfg.ebno_sweep();
        assert_eq!(sweep.len(), 8);
        assert!((sweep[0] - 4.0).abs() < 1e-12);
        assert!((sweep[7] - 7.5).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_sweep_rejected_for_evaluation() {
        let cfg = LinkConfig {
            ebno_db_min: 6.0,
            ebno_db_max: 6.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_ok());
        assert!(cfg.ebno_sweep().is_empty());
        assert!(matches!(cfg.evaluation_sweep(), Err(LinkError::InvalidConfig(_))));

        assert_eq!(LinkConfig::default().evaluation_sweep().unwrap().len(), 8);
    }

    #[test]
    fn test_partial_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "training_batch_size": 32, "ldpc": {{ "max_iterations": 5 }} }}"#).unwrap();

        let cfg = LinkConfig::from_json_file(file.path()).unwrap();
        assert_eq!(cfg.training_batch_size, 32);
        assert_eq!(cfg.ldpc.max_iterations, 5);
        assert_eq!(cfg.codeword_length, 1500);
        assert_eq!(cfg.ldpc.column_weight, 3);
    }

    #[test]
    fn test_json_round_trip_preserves_algorithm() {
        let cfg = LinkConfig {
            ldpc: LdpcConfig {
                algorithm: LdpcAlgorithm::SumProduct,
                ..Default::default()
            },
            ..Default::default()
        };
        let json = cfg.to_json_pretty().unwrap();
        let back: LinkConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.ldpc.algorithm, LdpcAlgorithm::SumProduct);
    }
}
