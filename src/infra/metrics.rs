// ============================================================
// Layer 6 - Metrics Logger
// ============================================================
// Records training metrics to a CSV file after each epoch.
//
// Metrics recorded per epoch:
//   - epoch:          the epoch number (1, 2, 3, ...)
//   - mean_loss:      average cross-entropy over the epoch's batches
//   - mean_grad_norm: average global gradient L2 norm after clipping
//   - batches:        number of full batches processed
//
// Output file: <logdir>/metrics.csv
//
//   epoch,mean_loss,mean_grad_norm,batches
//   1,0.693100,1.204500,31
//   2,0.651200,0.998700,31
//
// Reading it:
//   - mean_loss should fall epoch over epoch
//   - mean_grad_norm pinned at 5.0 means clipping fires on most
//     steps; the learning rate is probably too high

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::domain::error::{DetectError, DetectResult};

pub const METRICS_FILE: &str = "metrics.csv";

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    pub mean_loss: f64,

    pub mean_grad_norm: f64,

    pub batches: usize,
}

impl EpochMetrics {
    pub fn new(epoch: usize, mean_loss: f64, mean_grad_norm: f64, batches: usize) -> Self {
        Self { epoch, mean_loss, mean_grad_norm, batches }
    }
}

/// Running sums for the epoch in progress
#[derive(Debug, Default, Clone)]
pub struct EpochAccumulator {
    loss_sum: f64,
    norm_sum: f64,
    batches:  usize,
}

impl EpochAccumulator {
    pub fn push(&mut self, loss: f64, grad_norm: f64) {
        self.loss_sum += loss;
        self.norm_sum += grad_norm;
        self.batches += 1;
    }

    /// NaN means are reported for an epoch that saw no full batch
    pub fn finish(&self, epoch: usize) -> EpochMetrics {
        let mean = |sum: f64| if self.batches > 0 { sum / self.batches as f64 } else { f64::NAN };
        EpochMetrics::new(epoch, mean(self.loss_sum), mean(self.norm_sum), self.batches)
    }
}

/// Appends epoch metrics to a CSV file for later analysis.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Writes the CSV header if the file doesn't exist yet, so
    /// resumed runs append to the same file.
    pub fn new(dir: impl AsRef<Path>) -> DetectResult<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir).map_err(|e| DetectError::io(dir, e))?;

        let csv_path = dir.join(METRICS_FILE);
        if !csv_path.exists() {
            let mut f = fs::File::create(&csv_path).map_err(|e| DetectError::io(&csv_path, e))?;
            writeln!(f, "epoch,mean_loss,mean_grad_norm,batches")
                .map_err(|e| DetectError::io(&csv_path, e))?;
            tracing::debug!("Created metrics CSV: '{}'", csv_path.display());
        }

        Ok(Self { csv_path })
    }

    pub fn log(&self, m: &EpochMetrics) -> DetectResult<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .map_err(|e| DetectError::io(&self.csv_path, e))?;

        writeln!(f, "{},{:.6},{:.6},{}", m.epoch, m.mean_loss, m.mean_grad_norm, m.batches)
            .map_err(|e| DetectError::io(&self.csv_path, e))?;

        tracing::debug!("Logged epoch {} metrics: mean_loss={:.4}", m.epoch, m.mean_loss);
        Ok(())
    }
}
