//! Monte-Carlo BER/BLER simulation
//!
//! A [`LinkSimulator`] produces reference and decoded information bits for
//! one batch at one Eb/N0. [`simulate_ber`] sweeps Eb/N0 points, running
//! batches until enough block errors were seen or the iteration cap is hit.
//!
//! ```text
//! for ebno in sweep:
//!     repeat ≤ max_mc_iterations:
//!         (bits, bits_hat) = link.simulate(batch, ebno)
//!         count bit / block errors
//!         stop when block_errors ≥ target_block_errors
//!     early_stop && bit_errors == 0  →  end sweep
//! ```

use crate::ber_tool::{BerConfig, BerTester};
use crate::channel::AwgnChannel;
use crate::config::{EvaluationConfig, LinkConfig};
use crate::ldpc_codec::OuterCode;
use crate::snr::ebnodb2no;
use crate::source::RandomSource;
use crate::symbol_mapping::{DemapMethod, Modulation, SymbolMapper};
use crate::types::{LinkError, LinkResult};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Reference and decoded information bits of one simulated batch.
#[derive(Debug, Clone, Default)]
pub struct BitBlocks {
    /// Transmitted information bits, row-major `[batch, block_len]`
    pub reference: Vec<u8>,
    /// Decoded information bits, same layout
    pub decoded: Vec<u8>,
    /// Information bits per codeword
    pub block_len: usize,
}

/// A link that can be driven by the Monte-Carlo BER loop.
pub trait LinkSimulator {
    /// Short name used in logs and reports.
    fn name(&self) -> &str;

    /// Simulate `batch_size` codewords at `ebno_db`.
    fn simulate(&mut self, batch_size: usize, ebno_db: f64) -> LinkResult<BitBlocks>;
}

/// Parameters of one BER sweep.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub ebno_db: Vec<f64>,
    pub batch_size: usize,
    pub max_mc_iterations: usize,
    pub target_block_errors: u64,
    pub early_stop: bool,
}

impl SweepConfig {
    /// Sweep over the configured Eb/N0 range with the evaluation settings.
    pub fn from_link_config(config: &LinkConfig) -> Self {
        let EvaluationConfig {
            batch_size,
            max_mc_iterations,
            target_block_errors,
            early_stop,
            ..
        } = config.evaluation;
        Self {
            ebno_db: config.ebno_sweep(),
            batch_size,
            max_mc_iterations,
            target_block_errors,
            early_stop,
        }
    }
}

/// One measured point of a BER curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BerPoint {
    pub ebno_db: f64,
    pub ber: f64,
    pub bler: f64,
    pub bit_errors: u64,
    pub bits: u64,
    pub block_errors: u64,
    pub blocks: u64,
    pub mc_iterations: usize,
    pub elapsed_sec: f64,
}

/// BER/BLER curve of one link.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BerCurve {
    pub name: String,
    pub points: Vec<BerPoint>,
}

impl BerCurve {
    /// Export to CSV format.
    pub fn to_csv(&self) -> String {
        let mut csv = String::from("system,ebno_db,ber,bler,bit_errors,bits,block_errors,blocks\n");
        for p in &self.points {
            csv.push_str(&format!(
                "{},{:.2},{:.10},{:.10},{},{},{},{}\n",
                self.name, p.ebno_db, p.ber, p.bler, p.bit_errors, p.bits, p.block_errors, p.blocks
            ));
        }
        csv
    }
}

/// Run a Monte-Carlo BER/BLER sweep.
pub fn simulate_ber<S: LinkSimulator + ?Sized>(sim: &mut S, config: &SweepConfig) -> LinkResult<BerCurve> {
    let mut curve = BerCurve {
        name: sim.name().to_string(),
        points: Vec::with_capacity(config.ebno_db.len()),
    };

    for &ebno_db in &config.ebno_db {
        let start = Instant::now();
        let mut tester = BerTester::new(BerConfig {
            min_block_errors: config.target_block_errors,
            ..Default::default()
        });
        let mut mc_iterations = 0;

        while mc_iterations < config.max_mc_iterations {
            let blocks = sim.simulate(config.batch_size, ebno_db)?;
            if blocks.reference.len() != blocks.decoded.len() {
                return Err(LinkError::ShapeMismatch {
                    expected: blocks.reference.len(),
                    actual: blocks.decoded.len(),
                });
            }
            tester.update_blocks(&blocks.reference, &blocks.decoded, blocks.block_len);
            mc_iterations += 1;
            if tester.has_converged() {
                break;
            }
        }

        tracing::debug!(system = %curve.name, ebno_db, "{}", tester.summary());
        let counts = tester.counts();
        let point = BerPoint {
            ebno_db,
            ber: counts.ber(),
            bler: counts.bler(),
            bit_errors: counts.bit_errors,
            bits: counts.bits,
            block_errors: counts.block_errors,
            blocks: counts.blocks,
            mc_iterations,
            elapsed_sec: start.elapsed().as_secs_f64(),
        };
        tracing::info!(
            system = %curve.name,
            ebno_db,
            ber = point.ber,
            bler = point.bler,
            bit_errors = point.bit_errors,
            block_errors = point.block_errors,
            mc_iterations,
            "BER point"
        );
        curve.points.push(point);

        if config.early_stop && point.bit_errors == 0 {
            tracing::debug!(system = %curve.name, ebno_db, "no errors, stopping sweep");
            break;
        }
    }

    Ok(curve)
}

/// Untrained reference link: Gray QAM, AWGN, exact APP demapping, outer code.
pub struct BaselineLink {
    code: OuterCode,
    mapper: SymbolMapper,
    channel: AwgnChannel,
    source: RandomSource,
    bits_per_symbol: usize,
    code_rate: f64,
}

impl BaselineLink {
    /// Baseline with the geometry and outer code of `config`.
    pub fn new(config: &LinkConfig, source: RandomSource) -> LinkResult<Self> {
        let code = OuterCode::new(config.info_length(), config.codeword_length, &config.ldpc)?;
        Ok(Self {
            code,
            mapper: SymbolMapper::new(Modulation::for_bits_per_symbol(config.bits_per_symbol)),
            channel: AwgnChannel,
            source,
            bits_per_symbol: config.bits_per_symbol,
            code_rate: config.code_rate,
        })
    }
}

impl LinkSimulator for BaselineLink {
    fn name(&self) -> &str {
        "baseline"
    }

    fn simulate(&mut self, batch_size: usize, ebno_db: f64) -> LinkResult<BitBlocks> {
        let k = self.code.k();
        let no = ebnodb2no(ebno_db, self.bits_per_symbol, self.code_rate);

        let reference = self.source.bit_stream(batch_size * k);
        let coded = self.code.encode_batch(&reference)?;
        let symbols = self.mapper.map(&coded);
        let received = self.channel.apply(&symbols, no, &mut self.source);
        let llrs: Vec<f32> = self
            .mapper
            .demap_soft(&received, no, DemapMethod::App)
            .into_iter()
            .map(|l| l as f32)
            .collect();
        let decoded = self.code.decode_batch(&llrs)?;

        Ok(BitBlocks {
            reference,
            decoded,
            block_len: k,
        })
    }
}
