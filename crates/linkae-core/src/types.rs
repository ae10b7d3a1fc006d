//! Core types for the learned link
//!
//! Complex baseband symbols, bit buffers and the crate-wide error type.
//!
//! ## Conventions
//!
//! - Symbols are complex baseband values with unit average energy.
//! - Bits are carried as `u8` (0/1) on the plain-Rust side and as `f32`
//!   (0.0/1.0) when they feed tensors.
//! - LLRs use the logit convention `ln P(b=1) / P(b=0)`: positive means the
//!   bit is more likely a one.

use num_complex::Complex64;

/// Type alias for complex numbers using f64 precision
pub type Complex = Complex64;

/// A single received or transmitted baseband symbol
pub type IQSample = Complex64;

/// Raw bits, one bit per byte (0 or 1)
pub type BitStream = Vec<u8>;

/// Result type for link operations
pub type LinkResult<T> = Result<T, LinkError>;

/// Errors that can occur while configuring, training or evaluating a link
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("Required accelerator unavailable: {0}")]
    AcceleratorUnavailable(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("Tensor data error: {0}")]
    Tensor(String),

    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: usize, actual: usize },
}

impl LinkError {
    /// Whether this error must abort the process before any work starts.
    pub fn is_fatal_at_startup(&self) -> bool {
        matches!(
            self,
            LinkError::AcceleratorUnavailable(_) | LinkError::InvalidConfig(_)
        )
    }
}

/// Convert 0/1 bytes into booleans.
pub fn bits_to_bools(bits: &[u8]) -> Vec<bool> {
    bits.iter().map(|&b| b != 0).collect()
}

/// Convert booleans into 0/1 bytes.
pub fn bools_to_bits(bools: &[bool]) -> BitStream {
    bools.iter().map(|&b| b as u8).collect()
}
