//! # Observability
//!
//! Structured logging for training and evaluation runs via `tracing`.
//! Loss curves and BER points are plain `tracing` events with numeric
//! fields, so `--log-format json` output can be post-processed directly.

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
