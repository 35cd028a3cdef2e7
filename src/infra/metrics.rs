// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records training metrics to a CSV file after each epoch.
//
// Metrics recorded per epoch:
//   - epoch:      the epoch number (1, 2, 3, ...)
//   - train_loss: mean substitution loss per sentence pair
//   - pairs:      sentence pairs seen in the epoch
//
// Output file: {dir}/metrics.csv
//
//   epoch,train_loss,pairs
//   1,0.031250,2048
//   2,0.027913,2048
//
// train_loss is 1 − cos between the substituted and the original
// sentence embeddings, averaged over pairs: 0 means the chosen
// Russian token left the meaning untouched, 2 means it inverted it.

use anyhow::Result;
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::PathBuf,
};
use serde::{Deserialize, Serialize};

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Mean loss per sentence pair. Range [0.0, 2.0].
    pub train_loss: f64,

    /// Number of sentence pairs processed
    pub pairs: usize,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, pairs: usize) -> Self {
        Self { epoch, train_loss, pairs }
    }
}

/// Logs epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create a new MetricsLogger.
    /// Writes the CSV header if the file doesn't exist yet.
    pub fn new(dir: impl Into<String>) -> Result<Self> {
        let dir = PathBuf::from(dir.into());
        fs::create_dir_all(&dir)?;

        let csv_path = dir.join("metrics.csv");

        // Appending across runs keeps one learning curve per directory
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path)?;
            writeln!(f, "epoch,train_loss,pairs")?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row in the CSV.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)?;

        writeln!(f, "{},{:.6},{}", m.epoch, m.train_loss, m.pairs)?;

        tracing::debug!(
            "Logged epoch {} metrics: train_loss={:.4}, pairs={}",
            m.epoch,
            m.train_loss,
            m.pairs,
        );

        Ok(())
    }

    pub fn csv_path(&self) -> &PathBuf {
        &self.csv_path
    }
}
