//! Backend throughput check
//!
//! Times square matrix products on the selected backend before a run, as a
//! quick sanity check that the device is usable and to put a number on it.

use burn::tensor::{backend::Backend, Distribution, ElementConversion, Tensor};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Timing of `repeats` products of two `size × size` matrices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatmulTiming {
    pub size: usize,
    pub repeats: usize,
    pub mean: Duration,
}

impl MatmulTiming {
    /// Achieved throughput, counting `2·n³` flops per product.
    pub fn gflops(&self) -> f64 {
        let secs = self.mean.as_secs_f64();
        if secs > 0.0 {
            2.0 * (self.size as f64).powi(3) / secs / 1e9
        } else {
            0.0
        }
    }
}

/// Run the matmul benchmark for every size in `sizes`.
///
/// One untimed warm-up product per size; each timed product is forced to
/// completion by reading a scalar back.
pub fn matmul_benchmark<B: Backend>(sizes: &[usize], repeats: usize, device: &B::Device) -> Vec<MatmulTiming> {
    let repeats = repeats.max(1);
    sizes
        .iter()
        .map(|&size| {
            let a = Tensor::<B, 2>::random([size, size], Distribution::Normal(0.0, 1.0), device);
            let b = Tensor::<B, 2>::random([size, size], Distribution::Normal(0.0, 1.0), device);
            let _ = a.clone().matmul(b.clone()).sum().into_scalar().elem::<f32>();

            let start = Instant::now();
            for _ in 0..repeats {
                let _ = a.clone().matmul(b.clone()).sum().into_scalar().elem::<f32>();
            }
            let timing = MatmulTiming {
                size,
                repeats,
                mean: start.elapsed() / repeats as u32,
            };
            tracing::info!(size, mean_ms = timing.mean.as_secs_f64() * 1e3, gflops = timing.gflops(), "matmul");
            timing
        })
        .collect()
}

/// Text table of benchmark results.
pub fn timing_table(timings: &[MatmulTiming]) -> String {
    let mut s = format!("{:>8} {:>12} {:>10}\n", "size", "mean (ms)", "GFLOP/s");
    for t in timings {
        s.push_str(&format!(
            "{:>8} {:>12.3} {:>10.2}\n",
            t.size,
            t.mean.as_secs_f64() * 1e3,
            t.gflops()
        ));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::CpuBackend;

    #[test]
    fn test_small_sizes() {
        let timings = matmul_benchmark::<CpuBackend>(&[8, 32], 2, &Default::default());
        assert_eq!(timings.len(), 2);
        assert_eq!(timings[1].size, 32);
        assert!(timings.iter().all(|t| t.gflops() >= 0.0));
        assert_eq!(timing_table(&timings).lines().count(), 3);
    }

    #[test]
    fn test_gflops() {
        let t = MatmulTiming {
            size: 1000,
            repeats: 1,
            mean: Duration::from_secs(1),
        };
        assert!((t.gflops() - 2.0).abs() < 1e-12);
    }
}
