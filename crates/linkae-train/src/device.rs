//! Backend and device selection
//!
//! Training runs on `Autodiff<NdArray>` by default. Builds with the `gpu`
//! feature add the wgpu backend; asking for an accelerator in a build
//! without it is the one startup error that aborts a run.

use burn::backend::{ndarray::NdArrayDevice, Autodiff, NdArray};
use linkae_core::types::{LinkError, LinkResult};
use std::fmt;

/// Plain CPU backend (inference, evaluation).
pub type CpuBackend = NdArray<f32>;

/// CPU backend with gradient tracking.
pub type TrainBackend = Autodiff<CpuBackend>;

#[cfg(feature = "gpu")]
pub type GpuBackend = Autodiff<burn::backend::Wgpu>;

/// Where tensors live for this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceChoice {
    Cpu,
    Gpu,
}

impl DeviceChoice {
    pub fn label(&self) -> &'static str {
        match self {
            DeviceChoice::Cpu => "ndarray-cpu",
            DeviceChoice::Gpu => "wgpu",
        }
    }

    /// Whether this build can run on an accelerator.
    pub fn gpu_available() -> bool {
        cfg!(feature = "gpu")
    }
}

impl fmt::Display for DeviceChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pick the device for a run.
///
/// Uses the accelerator whenever the build has one. Fails with
/// [`LinkError::AcceleratorUnavailable`] if one is required but absent.
pub fn select_device(require_accelerator: bool) -> LinkResult<DeviceChoice> {
    if DeviceChoice::gpu_available() {
        tracing::info!(device = "wgpu", "accelerator available");
        return Ok(DeviceChoice::Gpu);
    }
    if require_accelerator {
        return Err(LinkError::AcceleratorUnavailable(
            "built without the `gpu` feature; rebuild with --features gpu or drop --require-gpu".into(),
        ));
    }
    tracing::warn!("no accelerator in this build, running on CPU");
    Ok(DeviceChoice::Cpu)
}

pub fn cpu_device() -> NdArrayDevice {
    NdArrayDevice::Cpu
}
