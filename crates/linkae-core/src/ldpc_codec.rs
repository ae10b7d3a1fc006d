//! LDPC Codec: outer forward error correction for the learned link
//!
//! The outer code is an irregular repeat-accumulate LDPC code with
//! `H = [A | B]`: `A` spreads every information bit over `column_weight`
//! checks and `B` is the dual-diagonal accumulator, so the encoder solves
//! one parity bit per check in order.
//!
//! Decoding is flooding belief propagation over an edge-indexed Tanner
//! graph, using either the exact tanh rule or scaled min-sum at the check
//! nodes, and stops as soon as the hard decision satisfies every check.
//!
//! ## Example
//!
//! ```rust
//! use linkae_core::config::LdpcConfig;
//! use linkae_core::ldpc_codec::OuterCode;
//!
//! let code = OuterCode::new(60, 120, &LdpcConfig::default()).unwrap();
//! let info: Vec<u8> = (0..60).map(|i| (i % 3 == 0) as u8).collect();
//! let codeword = code.encode(&info);
//! assert_eq!(codeword.len(), 120);
//!
//! // Logit-convention LLRs: positive means "bit is 1"
//! let llrs: Vec<f32> = codeword.iter().map(|&b| if b == 1 { 6.0 } else { -6.0 }).collect();
//! let result = code.decode(&llrs);
//! assert!(result.converged);
//! assert_eq!(result.decoded, info.iter().map(|&b| b == 1).collect::<Vec<_>>());
//! ```

use crate::config::{LdpcAlgorithm, LdpcConfig};
use crate::types::{bits_to_bools, bools_to_bits, BitStream, LinkError, LinkResult};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

/// Magnitude limit applied to channel LLRs before decoding.
pub const LLR_CLIP: f32 = 20.0;

/// Keeps `atanh` finite in the tanh rule.
const TANH_LIMIT: f64 = 1.0 - 1e-12;

/// Parity-check matrix stored as a Tanner graph.
///
/// Edges are numbered check by check, so the edges of check `c` are
/// `check_start[c]..check_start[c + 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParityCheckMatrix {
    n: usize,
    check_start: Vec<usize>,
    edge_var: Vec<usize>,
    var_edges: Vec<Vec<usize>>,
}

impl ParityCheckMatrix {
    /// Build from the variable indices of each check row.
    pub fn from_rows(n: usize, rows: &[Vec<usize>]) -> LinkResult<Self> {
        for (c, row) in rows.iter().enumerate() {
            if let Some(&v) = row.iter().find(|&&v| v >= n) {
                return Err(LinkError::InvalidConfig(format!(
                    "check {} references variable {} of a length-{} code",
                    c, v, n
                )));
            }
        }
        Ok(Self::assemble(n, rows))
    }

    fn assemble(n: usize, rows: &[Vec<usize>]) -> Self {
        let mut h = Self {
            n,
            check_start: Vec::with_capacity(rows.len() + 1),
            edge_var: Vec::new(),
            var_edges: vec![Vec::new(); n],
        };
        h.check_start.push(0);
        for row in rows {
            for &v in row {
                h.var_edges[v].push(h.edge_var.len());
                h.edge_var.push(v);
            }
            h.check_start.push(h.edge_var.len());
        }
        h
    }

    /// Irregular repeat-accumulate code with `k` information and `m` parity bits.
    ///
    /// Each of the `column_weight` passes shuffles the check rows and deals
    /// them out to the information columns, which keeps row weights even.
    /// A column drawn twice for the same row keeps a single edge.
    pub fn repeat_accumulate(k: usize, m: usize, column_weight: usize, seed: u64) -> Self {
        let mut rows: Vec<Vec<usize>> = vec![Vec::new(); m];

        if m > 0 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut order: Vec<usize> = (0..m).collect();
            for _ in 0..column_weight.clamp(1, m) {
                order.shuffle(&mut rng);
                for info_bit in 0..k {
                    let row = &mut rows[order[info_bit % m]];
                    if !row.contains(&info_bit) {
                        row.push(info_bit);
                    }
                }
            }
        }

        for (c, row) in rows.iter_mut().enumerate() {
            row.sort_unstable();
            if c > 0 {
                row.push(k + c - 1);
            }
            row.push(k + c);
        }

        Self::assemble(k + m, &rows)
    }

    /// Codeword length.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Number of checks.
    pub fn m(&self) -> usize {
        self.check_start.len() - 1
    }

    /// Information length, assuming full-rank `H`.
    pub fn k(&self) -> usize {
        self.n.saturating_sub(self.m())
    }

    pub fn rate(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.k() as f64 / self.n as f64
        }
    }

    pub fn num_edges(&self) -> usize {
        self.edge_var.len()
    }

    /// Variables taking part in check `c`.
    pub fn check(&self, c: usize) -> &[usize] {
        &self.edge_var[self.check_start[c]..self.check_start[c + 1]]
    }

    /// Number of checks variable `v` takes part in.
    pub fn column_weight(&self, v: usize) -> usize {
        self.var_edges[v].len()
    }

    fn check_parity(&self, c: usize, word: &[bool]) -> bool {
        self.check(c)
            .iter()
            .fold(false, |acc, &v| acc ^ word.get(v).copied().unwrap_or(false))
    }

    /// Number of unsatisfied checks.
    pub fn syndrome_weight(&self, word: &[bool]) -> usize {
        (0..self.m()).filter(|&c| self.check_parity(c, word)).count()
    }

    /// `H · word = 0` over GF(2). Words of the wrong length never satisfy it.
    pub fn is_codeword(&self, word: &[bool]) -> bool {
        word.len() == self.n && (0..self.m()).all(|c| !self.check_parity(c, word))
    }
}

/// LDPC decoding result.
#[derive(Debug, Clone)]
pub struct LdpcResult {
    /// Hard decision on the information part.
    pub decoded: Vec<bool>,
    /// Hard decision on the whole codeword.
    pub codeword: Vec<bool>,
    /// The hard decision satisfied every check.
    pub converged: bool,
    pub iterations: usize,
}

/// Systematic encoder producing `[info | parity]`.
///
/// Check `c` must be the first check to involve parity bit `k + c`, with
/// every other variable in it being either information or an earlier parity
/// bit. Repeat-accumulate matrices have this shape.
#[derive(Debug, Clone)]
pub struct LdpcEncoder {
    h: ParityCheckMatrix,
}

impl LdpcEncoder {
    pub fn new(h: ParityCheckMatrix) -> Self {
        Self { h }
    }

    /// Short inputs are zero-padded, long ones truncated to `k`.
    pub fn encode(&self, info: &[bool]) -> Vec<bool> {
        let k = self.h.k();
        let mut word = vec![false; self.h.n()];
        let take = info.len().min(k);
        word[..take].copy_from_slice(&info[..take]);

        for c in 0..self.h.m() {
            let target = k + c;
            word[target] = self
                .h
                .check(c)
                .iter()
                .filter(|&&v| v != target)
                .fold(false, |acc, &v| acc ^ word[v]);
        }
        word
    }
}

/// Scaled min-sum check update: each output is the product of the other
/// inputs' signs times the smallest of their magnitudes.
fn min_sum_update(incoming: &[f64], scale: f64, outgoing: &mut [f64]) {
    if incoming.len() < 2 {
        outgoing.fill(0.0);
        return;
    }

    let (mut least, mut second, mut least_at) = (f64::INFINITY, f64::INFINITY, 0);
    let mut odd_negatives = false;
    for (i, &x) in incoming.iter().enumerate() {
        odd_negatives ^= x < 0.0;
        let mag = x.abs();
        if mag < least {
            second = least;
            least = mag;
            least_at = i;
        } else if mag < second {
            second = mag;
        }
    }

    for (i, (out, &x)) in outgoing.iter_mut().zip(incoming).enumerate() {
        let mag = if i == least_at { second } else { least };
        *out = if odd_negatives ^ (x < 0.0) { -scale * mag } else { scale * mag };
    }
}

/// Exact tanh-rule check update, excluding each input with prefix and
/// suffix products instead of division.
fn tanh_rule_update(incoming: &[f64], outgoing: &mut [f64]) {
    let mut prefix = 1.0;
    for (out, &x) in outgoing.iter_mut().zip(incoming) {
        *out = prefix;
        prefix *= (0.5 * x).tanh();
    }

    let mut suffix = 1.0;
    for (out, &x) in outgoing.iter_mut().zip(incoming).rev() {
        *out = 2.0 * (*out * suffix).clamp(-TANH_LIMIT, TANH_LIMIT).atanh();
        suffix *= (0.5 * x).tanh();
    }
}

/// Flooding belief-propagation decoder.
///
/// Takes LLRs as `ln P(b=0)/P(b=1)`; [`OuterCode`] converts from the
/// link's logit convention.
#[derive(Debug, Clone)]
pub struct LdpcDecoder {
    h: ParityCheckMatrix,
    algorithm: LdpcAlgorithm,
    max_iterations: usize,
}

impl LdpcDecoder {
    pub fn new(h: ParityCheckMatrix, algorithm: LdpcAlgorithm, max_iterations: usize) -> Self {
        Self {
            h,
            algorithm,
            max_iterations: max_iterations.max(1),
        }
    }

    pub fn decode(&self, llrs: &[f64]) -> LdpcResult {
        let h = &self.h;
        let channel = |v: usize| llrs.get(v).copied().unwrap_or(0.0);

        let mut to_check: Vec<f64> = h.edge_var.iter().map(|&v| channel(v)).collect();
        let mut to_var = vec![0.0f64; h.num_edges()];
        let mut posterior = vec![0.0f64; h.n()];
        let mut hard = vec![false; h.n()];
        let mut converged = false;
        let mut iterations = 0;

        while iterations < self.max_iterations && !converged {
            iterations += 1;

            for c in 0..h.m() {
                let edges = h.check_start[c]..h.check_start[c + 1];
                let incoming = &to_check[edges.clone()];
                let outgoing = &mut to_var[edges];
                match self.algorithm {
                    LdpcAlgorithm::SumProduct => tanh_rule_update(incoming, outgoing),
                    LdpcAlgorithm::MinSum { scale } => min_sum_update(incoming, scale, outgoing),
                }
            }

            for (v, edges) in h.var_edges.iter().enumerate() {
                posterior[v] = channel(v) + edges.iter().map(|&e| to_var[e]).sum::<f64>();
                hard[v] = posterior[v] < 0.0;
            }
            for (e, &v) in h.edge_var.iter().enumerate() {
                to_check[e] = posterior[v] - to_var[e];
            }

            converged = h.is_codeword(&hard);
        }

        LdpcResult {
            decoded: hard[..h.k()].to_vec(),
            codeword: hard,
            converged,
            iterations,
        }
    }
}

/// Paired encoder/decoder of fixed dimension `k` and length `n`.
///
/// Speaks the link's LLR convention (positive = bit 1) and bit buffers of
/// 0/1 bytes; batch calls work on row-major `[batch, len]` buffers.
#[derive(Debug, Clone)]
pub struct OuterCode {
    encoder: LdpcEncoder,
    decoder: LdpcDecoder,
    k: usize,
    n: usize,
}

impl OuterCode {
    /// Build the repeat-accumulate code for `(n, k)`.
    pub fn new(k: usize, n: usize, config: &LdpcConfig) -> LinkResult<Self> {
        if k == 0 || k >= n {
            return Err(LinkError::InvalidConfig(format!(
                "outer code needs 0 < k < n, got k={} n={}",
                k, n
            )));
        }
        let h = ParityCheckMatrix::repeat_accumulate(
            k,
            n - k,
            config.column_weight,
            config.construction_seed,
        );
        tracing::debug!(k, n, edges = h.num_edges(), "built outer LDPC code");
        Ok(Self {
            encoder: LdpcEncoder::new(h.clone()),
            decoder: LdpcDecoder::new(h, config.algorithm, config.max_iterations),
            k,
            n,
        })
    }

    /// Information length k.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Codeword length n.
    pub fn n(&self) -> usize {
        self.n
    }

    /// Encode one information word.
    pub fn encode(&self, info: &[u8]) -> BitStream {
        bools_to_bits(&self.encoder.encode(&bits_to_bools(info)))
    }

    /// Decode one codeword of logit-convention LLRs.
    pub fn decode(&self, llrs: &[f32]) -> LdpcResult {
        let flipped: Vec<f64> = llrs
            .iter()
            .map(|&l| -(l.clamp(-LLR_CLIP, LLR_CLIP) as f64))
            .collect();
        self.decoder.decode(&flipped)
    }

    /// Encode a row-major `[batch, k]` buffer into `[batch, n]`.
    pub fn encode_batch(&self, info: &[u8]) -> LinkResult<BitStream> {
        if info.len() % self.k != 0 {
            return Err(LinkError::ShapeMismatch {
                expected: self.k,
                actual: info.len() % self.k,
            });
        }
        Ok(info
            .par_chunks(self.k)
            .flat_map_iter(|row| self.encode(row))
            .collect())
    }

    /// Decode a row-major `[batch, n]` LLR buffer into `[batch, k]` hard bits.
    pub fn decode_batch(&self, llrs: &[f32]) -> LinkResult<BitStream> {
        if llrs.len() % self.n != 0 {
            return Err(LinkError::ShapeMismatch {
                expected: self.n,
                actual: llrs.len() % self.n,
            });
        }
        Ok(llrs
            .par_chunks(self.n)
            .flat_map_iter(|row| self.decode(row).decoded.into_iter().map(|b| b as u8))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::RandomSource;
    use approx::assert_relative_eq;

    /// k = 3, m = 3 code in accumulator form:
    /// p3 = b0 ^ b1, p4 = b1 ^ b2 ^ p3, p5 = b0 ^ b2 ^ p4.
    fn toy_code() -> ParityCheckMatrix {
        ParityCheckMatrix::from_rows(6, &[vec![0, 1, 3], vec![1, 2, 3, 4], vec![0, 2, 4, 5]]).unwrap()
    }

    fn bpsk(word: &[bool], amplitude: f64) -> Vec<f64> {
        word.iter().map(|&b| if b { -amplitude } else { amplitude }).collect()
    }

    #[test]
    fn test_from_rows_layout() {
        let h = toy_code();
        assert_eq!((h.n(), h.m(), h.k()), (6, 3, 3));
        assert_eq!(h.num_edges(), 11);
        assert_eq!(h.check(1), &[1, 2, 3, 4]);
        assert_eq!(h.column_weight(2), 2);
        assert_eq!(h.column_weight(5), 1);
        assert!(ParityCheckMatrix::from_rows(4, &[vec![0, 4]]).is_err());
    }

    #[test]
    fn test_toy_encoding() {
        let encoder = LdpcEncoder::new(toy_code());
        let word = encoder.encode(&[true, true, false]);
        // p3 = 0, p4 = 1, p5 = 0
        assert_eq!(word, vec![true, true, false, false, true, false]);
        assert!(toy_code().is_codeword(&word));
    }

    #[test]
    fn test_repeat_accumulate_shape() {
        let h = ParityCheckMatrix::repeat_accumulate(750, 750, 3, 9);
        assert_eq!((h.n(), h.m(), h.k()), (1500, 750, 750));
        assert_relative_eq!(h.rate(), 0.5);

        for v in 0..750 {
            assert!((1..=3).contains(&h.column_weight(v)), "info column {}", v);
        }
        for v in 750..1499 {
            assert_eq!(h.column_weight(v), 2);
        }
        assert_eq!(h.column_weight(1499), 1);
        assert_eq!(h, ParityCheckMatrix::repeat_accumulate(750, 750, 3, 9));
        assert_ne!(h, ParityCheckMatrix::repeat_accumulate(750, 750, 3, 10));
    }

    #[test]
    fn test_encoder_is_systematic() {
        let h = ParityCheckMatrix::repeat_accumulate(200, 100, 3, 1);
        let encoder = LdpcEncoder::new(h.clone());
        let mut src = RandomSource::seeded(2);
        for _ in 0..10 {
            let info = bits_to_bools(&src.bit_stream(200));
            let word = encoder.encode(&info);
            assert_eq!(word.len(), 300);
            assert_eq!(&word[..200], &info[..]);
            assert!(h.is_codeword(&word));
        }
    }

    #[test]
    fn test_single_flip_breaks_checks() {
        let h = ParityCheckMatrix::repeat_accumulate(50, 50, 3, 4);
        let mut word = LdpcEncoder::new(h.clone()).encode(&[true; 50]);
        assert_eq!(h.syndrome_weight(&word), 0);
        word[70] = !word[70];
        assert_eq!(h.syndrome_weight(&word), 2);
        assert!(!h.is_codeword(&word));
        assert!(!h.is_codeword(&word[..99]));
    }

    #[test]
    fn test_min_sum_update_excludes_own_edge() {
        let mut out = [0.0; 3];
        min_sum_update(&[2.0, -1.0, 3.0], 1.0, &mut out);
        assert_eq!(out, [-1.0, 2.0, -1.0]);

        min_sum_update(&[2.0, -1.0, 3.0], 0.5, &mut out);
        assert_eq!(out, [-0.5, 1.0, -0.5]);

        let mut lone = [7.0];
        min_sum_update(&[4.0], 1.0, &mut lone);
        assert_eq!(lone, [0.0]);
    }

    #[test]
    fn test_tanh_rule_update() {
        // Degree two passes the other message through unchanged.
        let mut out = [0.0; 2];
        tanh_rule_update(&[1.5, -0.7], &mut out);
        assert_relative_eq!(out[0], -0.7, epsilon = 1e-9);
        assert_relative_eq!(out[1], 1.5, epsilon = 1e-9);

        let incoming = [0.8, -2.0, 1.1, 3.0];
        let mut out = [0.0; 4];
        tanh_rule_update(&incoming, &mut out);
        let expected = 2.0 * ((-1.0f64).tanh() * 0.55f64.tanh() * 1.5f64.tanh()).atanh();
        assert_relative_eq!(out[0], expected, epsilon = 1e-9);
        // A zero input silences every other edge.
        tanh_rule_update(&[0.0, 2.0, 3.0], &mut out[..3]);
        assert_eq!(&out[1..3], &[0.0, 0.0]);
    }

    #[test]
    fn test_clean_input_converges_in_one_iteration() {
        let h = toy_code();
        let word = LdpcEncoder::new(h.clone()).encode(&[false, true, true]);
        for algorithm in [LdpcAlgorithm::SumProduct, LdpcAlgorithm::MinSum { scale: 0.75 }] {
            let result = LdpcDecoder::new(h.clone(), algorithm, 20).decode(&bpsk(&word, 4.0));
            assert!(result.converged);
            assert_eq!(result.iterations, 1);
            assert_eq!(result.codeword, word);
            assert_eq!(result.decoded, vec![false, true, true]);
        }
    }

    #[test]
    fn test_iteration_cap() {
        let h = ParityCheckMatrix::repeat_accumulate(40, 40, 3, 3);
        let decoder = LdpcDecoder::new(h, LdpcAlgorithm::MinSum { scale: 0.75 }, 3);
        let llrs: Vec<f64> = (0..80).map(|i| if i % 3 == 0 { -0.01 } else { 0.02 }).collect();
        let result = decoder.decode(&llrs);
        assert!((1..=3).contains(&result.iterations));
        assert_eq!(result.codeword.len(), 80);
        assert_eq!(result.decoded.len(), 40);

        assert_eq!(LdpcDecoder::new(toy_code(), LdpcAlgorithm::SumProduct, 0).max_iterations, 1);
    }

    #[test]
    fn test_algorithms_agree_on_noisy_word() {
        let h = ParityCheckMatrix::repeat_accumulate(40, 40, 3, 3);
        let info: Vec<bool> = (0..40).map(|i| (i * 7) % 5 < 2).collect();
        let mut llrs = bpsk(&LdpcEncoder::new(h.clone()).encode(&info), 5.0);
        llrs[11] = -llrs[11] * 0.1;

        let exact = LdpcDecoder::new(h.clone(), LdpcAlgorithm::SumProduct, 50).decode(&llrs);
        let approx = LdpcDecoder::new(h, LdpcAlgorithm::MinSum { scale: 0.75 }, 50).decode(&llrs);
        assert!(exact.converged && approx.converged);
        assert_eq!(exact.decoded, info);
        assert_eq!(approx.decoded, info);
    }

    #[test]
    fn test_outer_code_corrects_weak_errors() {
        let config = LdpcConfig::default();
        let code = OuterCode::new(750, 1500, &config).unwrap();
        let mut src = RandomSource::seeded(21);
        let info = src.bit_stream(750);
        let codeword = code.encode(&info);

        let mut llrs: Vec<f32> = codeword.iter().map(|&b| if b == 1 { 4.0 } else { -4.0 }).collect();
        for pos in [3usize, 97, 400, 812, 1203, 1444] {
            llrs[pos] = -0.5 * llrs[pos].signum();
        }

        let result = code.decode(&llrs);
        assert!(result.converged);
        assert_eq!(bools_to_bits(&result.decoded), info);
    }

    #[test]
    fn test_outer_code_clips_llrs() {
        let code = OuterCode::new(30, 60, &LdpcConfig::default()).unwrap();
        let info = RandomSource::seeded(5).bit_stream(30);
        let llrs: Vec<f32> = code
            .encode(&info)
            .iter()
            .map(|&b| if b == 1 { 1e30 } else { f32::NEG_INFINITY })
            .collect();
        let result = code.decode(&llrs);
        assert!(result.converged);
        assert_eq!(bools_to_bits(&result.decoded), info);
    }

    #[test]
    fn test_outer_code_batches() {
        let code = OuterCode::new(30, 60, &LdpcConfig::default()).unwrap();
        let mut src = RandomSource::seeded(8);
        let info = src.bit_stream(4 * 30);

        let coded = code.encode_batch(&info).unwrap();
        assert_eq!(coded.len(), 4 * 60);

        let llrs: Vec<f32> = coded.iter().map(|&b| if b == 1 { 10.0 } else { -10.0 }).collect();
        let decoded = code.decode_batch(&llrs).unwrap();
        assert_eq!(decoded, info);

        assert!(matches!(
            code.decode_batch(&llrs[..59]),
            Err(LinkError::ShapeMismatch { expected: 60, .. })
        ));
    }

    #[test]
    fn test_outer_code_rejects_bad_dimensions() {
        assert!(OuterCode::new(0, 10, &LdpcConfig::default()).is_err());
        assert!(OuterCode::new(10, 10, &LdpcConfig::default()).is_err());
    }
}
