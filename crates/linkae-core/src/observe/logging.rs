//! # Logging setup
//!
//! One global `tracing` subscriber for training and evaluation runs.
//! Training loops emit an `info` event every `report_interval` iterations
//! and BER sweeps one per Eb/N0 point, so `info` is the useful default;
//! `debug` adds code construction and checkpoint I/O.
//!
//! `RUST_LOG` overrides the configured level unless an explicit filter is
//! set. Chatty GPU-stack targets are capped at `warn`.
//!
//! ```rust,ignore
//! use linkae_core::observe::{init_logging, LogConfig, LogFormat};
//!
//! init_logging(&LogConfig::from_verbosity(1, LogFormat::Json));
//! tracing::info!(iteration = 1000, loss = 0.27, "conventional");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing_subscriber::{fmt as tfmt, prelude::*, EnvFilter, Layer};

/// Targets that flood `info`/`debug` when the wgpu backend is enabled.
const NOISY_TARGETS: &[&str] = &["wgpu_core", "wgpu_hal", "naga", "cubecl"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per event, for collecting loss curves
    Json,
    /// Multi-line, coloured
    #[default]
    Pretty,
    /// One line per event
    Compact,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            other => Err(format!("unknown log format '{}' (json, pretty, compact)", other)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Print `file:line` of each event
    pub source_location: bool,
    /// Explicit `EnvFilter` directives; wins over `RUST_LOG` and `level`
    pub filter: Option<String>,
}

impl LogConfig {
    /// `0` → info, `1` → debug, `2+` → trace (with source locations).
    pub fn from_verbosity(verbose: u8, format: LogFormat) -> Self {
        let level = match verbose {
            0 => LogLevel::Info,
            1 => LogLevel::Debug,
            _ => LogLevel::Trace,
        };
        Self {
            level,
            format,
            source_location: level == LogLevel::Trace,
            filter: None,
        }
    }

    /// Errors only, e.g. for benchmarks.
    pub fn quiet() -> Self {
        Self {
            level: LogLevel::Error,
            format: LogFormat::Compact,
            ..Default::default()
        }
    }

    /// Filter directives this config resolves to, ignoring `RUST_LOG`.
    pub fn directives(&self) -> String {
        if let Some(custom) = &self.filter {
            return custom.clone();
        }
        let mut directives = self.level.to_string();
        if self.level > LogLevel::Warn {
            for target in NOISY_TARGETS {
                directives.push_str(&format!(",{}=warn", target));
            }
        }
        directives
    }

    fn env_filter(&self) -> EnvFilter {
        let fallback = || EnvFilter::try_new(self.directives()).unwrap_or_else(|_| EnvFilter::new("info"));
        match self.filter {
            Some(_) => fallback(),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback()),
        }
    }
}

/// Install the global subscriber.
///
/// Returns `false` if one was already installed (tests, repeated CLI setup).
pub fn init_logging(config: &LogConfig) -> bool {
    let located = config.source_location;
    let layer = match config.format {
        LogFormat::Json => tfmt::layer()
            .json()
            .with_current_span(false)
            .with_file(located)
            .with_line_number(located)
            .boxed(),
        LogFormat::Pretty => tfmt::layer()
            .pretty()
            .with_file(located)
            .with_line_number(located)
            .boxed(),
        LogFormat::Compact => tfmt::layer()
            .compact()
            .with_target(false)
            .with_file(located)
            .with_line_number(located)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(layer.with_filter(config.env_filter()));
    tracing::subscriber::set_global_default(subscriber).is_ok()
}
