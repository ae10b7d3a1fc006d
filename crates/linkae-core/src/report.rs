//! Run Reports
//!
//! Output formats: JSON, text, CSV

use crate::simulation::BerCurve;
use serde::{Deserialize, Serialize};

/// System information for run context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub hostname: String,
    pub os: String,
    pub arch: String,
    pub cpu_cores: usize,
    pub rust_version: String,
}

impl Default for SystemInfo {
    fn default() -> Self {
        Self::collect()
    }
}

impl SystemInfo {
    /// Collect system information
    pub fn collect() -> Self {
        Self {
            hostname: hostname::get()
                .map(|h| h.to_string_lossy().to_string())
                .unwrap_or_else(|_| "unknown".to_string()),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            cpu_cores: std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(1),
            rust_version: env!("CARGO_PKG_RUST_VERSION").to_string(),
        }
    }
}

/// Summary of one training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingReport {
    pub mode: String,
    pub backend: String,
    pub iterations: usize,
    pub receiver_updates: usize,
    pub transmitter_updates: usize,
    pub final_loss: Option<f32>,
    pub final_transmitter_loss: Option<f32>,
    pub elapsed_sec: f64,
    pub weights_path: String,
    pub system: SystemInfo,
    pub timestamp: String,
}

impl TrainingReport {
    /// Create a report stamped with the current time and host
    pub fn new(mode: &str, backend: &str, weights_path: &str) -> Self {
        Self {
            mode: mode.to_string(),
            backend: backend.to_string(),
            iterations: 0,
            receiver_updates: 0,
            transmitter_updates: 0,
            final_loss: None,
            final_transmitter_loss: None,
            elapsed_sec: 0.0,
            weights_path: weights_path.to_string(),
            system: SystemInfo::collect(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Output as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Output as human-readable text
    pub fn to_text(&self) -> String {
        let mut s = String::new();

        s.push_str("Autoencoder Training Report\n");
        s.push_str("===========================\n\n");

        s.push_str(&format!("Mode:          {}\n", self.mode));
        s.push_str(&format!("Backend:       {}\n", self.backend));
        s.push_str(&format!("Iterations:    {}\n", self.iterations));
        s.push_str(&format!("Rx updates:    {}\n", self.receiver_updates));
        s.push_str(&format!("Tx updates:    {}\n", self.transmitter_updates));
        if let Some(loss) = self.final_loss {
            s.push_str(&format!("Final loss:    {:.6}\n", loss));
        }
        if let Some(loss) = self.final_transmitter_loss {
            s.push_str(&format!("Final Tx loss: {:.6}\n", loss));
        }
        s.push_str(&format!("Duration:      {}\n", format_duration(self.elapsed_sec)));
        s.push_str(&format!("Weights:       {}\n", self.weights_path));
        s.push_str(&format!("Timestamp:     {}\n\n", self.timestamp));

        s.push_str("System\n");
        s.push_str("------\n");
        s.push_str(&format!("  Hostname:       {}\n", self.system.hostname));
        s.push_str(&format!("  OS/Arch:        {}/{}\n", self.system.os, self.system.arch));
        s.push_str(&format!("  CPU Cores:      {}\n", self.system.cpu_cores));

        s
    }
}

/// BER/BLER curves of several links at the same Eb/N0 points
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BerReport {
    pub curves: Vec<BerCurve>,
    pub system: SystemInfo,
    pub timestamp: String,
}

impl BerReport {
    pub fn new(curves: Vec<BerCurve>) -> Self {
        Self {
            curves,
            system: SystemInfo::collect(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Output as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Output as a text table, one block per curve
    pub fn to_text(&self) -> String {
        let mut s = String::new();
        s.push_str("BER / BLER\n");
        s.push_str("==========\n");
        for curve in &self.curves {
            s.push_str(&format!("\n{}\n", curve.name));
            s.push_str(&format!("{:>8} {:>12} {:>12} {:>10} {:>10}\n", "Eb/N0", "BER", "BLER", "bit err", "blk err"));
            for p in &curve.points {
                s.push_str(&format!(
                    "{:>8.2} {:>12.4e} {:>12.4e} {:>10} {:>10}\n",
                    p.ebno_db, p.ber, p.bler, p.bit_errors, p.block_errors
                ));
            }
        }
        s
    }

    /// All curves as one CSV table
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();
        for (i, curve) in self.curves.iter().enumerate() {
            let table = curve.to_csv();
            if i == 0 {
                csv.push_str(&table);
            } else {
                csv.extend(table.lines().skip(1).map(|l| format!("{}\n", l)));
            }
        }
        csv
    }
}

/// Format a duration in seconds as `1h 02m 03s` / `2m 03s` / `3.21s`
pub fn format_duration(secs: f64) -> String {
    if secs >= 3600.0 {
        let total = secs as u64;
        format!("{}h {:02}m {:02}s", total / 3600, (total % 3600) / 60, total % 60)
    } else if secs >= 60.0 {
        let total = secs as u64;
        format!("{}m {:02}s", total / 60, total % 60)
    } else {
        format!("{:.2}s", secs)
    }
}
