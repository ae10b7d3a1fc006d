//! Weight files
//!
//! Constellation and demapper parameters are written with burn's binary
//! file recorder at full precision. The recorder appends its own `.bin`
//! extension to the configured path.

use crate::model::Autoencoder;
use burn::module::Module;
use burn::record::{BinFileRecorder, FullPrecisionSettings};
use burn::tensor::backend::Backend;
use linkae_core::types::{LinkError, LinkResult};
use std::path::{Path, PathBuf};

type Recorder = BinFileRecorder<FullPrecisionSettings>;

/// File the recorder actually reads and writes for `path`.
pub fn weights_file(path: &Path) -> PathBuf {
    path.with_extension("bin")
}

pub fn weights_exist(path: &Path) -> bool {
    weights_file(path).is_file()
}

pub fn save_weights<B: Backend>(model: &Autoencoder<B>, path: &Path) -> LinkResult<()> {
    model
        .clone()
        .save_file(path.to_path_buf(), &Recorder::default())
        .map_err(|e| LinkError::Checkpoint(format!("saving {}: {:?}", path.display(), e)))?;
    tracing::info!(path = %weights_file(path).display(), "weights saved");
    Ok(())
}

/// Load weights into a model of matching geometry.
pub fn load_weights<B: Backend>(
    model: Autoencoder<B>,
    path: &Path,
    device: &B::Device,
) -> LinkResult<Autoencoder<B>> {
    if !weights_exist(path) {
        return Err(LinkError::Checkpoint(format!(
            "no weights at {}",
            weights_file(path).display()
        )));
    }
    let model = model
        .load_file(path.to_path_buf(), &Recorder::default(), device)
        .map_err(|e| LinkError::Checkpoint(format!("loading {}: {:?}", path.display(), e)))?;
    tracing::debug!(path = %weights_file(path).display(), "weights loaded");
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::complex::{tensor_to_vec, ComplexTensor};
    use crate::device::CpuBackend;
    use burn::tensor::Tensor;
    use linkae_core::config::LinkConfig;

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("awgn_autoencoder_weights_conventional_training");
        let config = LinkConfig {
            demapper_hidden_units: 8,
            ..Default::default()
        };
        let device = Default::default();

        CpuBackend::seed(1);
        let trained = Autoencoder::<CpuBackend>::new(&config, &device);
        save_weights(&trained, &path).unwrap();
        assert!(weights_exist(&path));

        CpuBackend::seed(2);
        let fresh = Autoencoder::<CpuBackend>::new(&config, &device);
        let loaded = load_weights(fresh, &path, &device).unwrap();

        let llrs = |m: &Autoencoder<CpuBackend>| {
            let y = ComplexTensor::new(
                Tensor::ones([1, 3], &device).mul_scalar(0.2),
                Tensor::ones([1, 3], &device).mul_scalar(-0.4),
            );
            tensor_to_vec(m.demapper.forward(y, Tensor::ones([1, 1], &device).mul_scalar(0.1))).unwrap()
        };
        assert_eq!(llrs(&loaded), llrs(&trained));
        assert_eq!(loaded.num_params(), trained.num_params());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let device = Default::default();
        let model = Autoencoder::<CpuBackend>::new(&LinkConfig::default(), &device);
        let err = load_weights(model, &dir.path().join("nope"), &device);
        assert!(matches!(err, Err(LinkError::Checkpoint(_))));
    }
}
