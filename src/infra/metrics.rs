// ============================================================
// Layer 6 — Metrics Logger
// ============================================================
// Records one CSV row per epoch so learning curves can be plotted
// after (or during) a run.
//
// Output file: .save/metrics.csv
//
//   epoch,train_loss,val_loss,val_perplexity,checkpointed
//   1,5.123400,4.871200,130.493211,true
//   2,4.402100,4.903300,134.752870,false
//   ...
//
// Each run starts the file over: the header is rewritten and rows
// from an earlier run are discarded.
//
// Reference: Rust Book §12 (I/O and File Handling)

use anyhow::{Context, Result};
use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};
use serde::{Deserialize, Serialize};

const HEADER: &str = "epoch,train_loss,val_loss,val_perplexity,checkpointed";

/// One row of metrics data for a single training epoch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Mean masked NLL over all training batches
    pub train_loss: f64,

    /// Mean masked NLL on the validation split (greedy decoding)
    pub val_loss: f64,

    /// exp(val_loss)
    pub val_perplexity: f64,

    /// Whether this epoch wrote seq2seq_<epoch>.pt
    pub checkpointed: bool,
}

impl EpochMetrics {
    pub fn new(epoch: usize, train_loss: f64, val_loss: f64, checkpointed: bool) -> Self {
        Self {
            epoch,
            train_loss,
            val_loss,
            val_perplexity: val_loss.exp(),
            checkpointed,
        }
    }

    fn csv_row(&self) -> String {
        format!(
            "{},{:.6},{:.6},{:.6},{}",
            self.epoch, self.train_loss, self.val_loss, self.val_perplexity, self.checkpointed,
        )
    }
}

/// Writes epoch metrics to `<dir>/metrics.csv`, one row per epoch.
pub struct MetricsLogger {
    csv_path: PathBuf,
}

impl MetricsLogger {
    /// Create the directory if needed and (re)start the CSV with just
    /// the header line.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create directory '{}'", dir.display()))?;

        let csv_path = dir.join("metrics.csv");
        let mut f = fs::File::create(&csv_path)
            .with_context(|| format!("Cannot create '{}'", csv_path.display()))?;
        writeln!(f, "{HEADER}")
            .with_context(|| format!("Cannot write '{}'", csv_path.display()))?;
        tracing::debug!("Started metrics CSV: '{}'", csv_path.display());

        Ok(Self { csv_path })
    }

    /// Append one epoch's metrics as a new row.
    pub fn log(&self, m: &EpochMetrics) -> Result<()> {
        let mut f = OpenOptions::new()
            .append(true)
            .open(&self.csv_path)
            .with_context(|| format!("Cannot open '{}'", self.csv_path.display()))?;

        writeln!(f, "{}", m.csv_row())
            .with_context(|| format!("Cannot append to '{}'", self.csv_path.display()))?;
        Ok(())
    }

    pub fn csv_path(&self) -> &Path {
        &self.csv_path
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perplexity_is_exp_of_val_loss() {
        let m = EpochMetrics::new(2, 2.5, 2.0, true);
        assert!((m.val_perplexity - 2.0f64.exp()).abs() < 1e-12);
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("seq2seq-metrics-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_rows_append_under_single_header() {
        let dir    = scratch_dir("rows");
        let logger = MetricsLogger::new(&dir).unwrap();
        logger.log(&EpochMetrics::new(1, 5.0, 4.5, true)).unwrap();
        logger.log(&EpochMetrics::new(2, 4.0, 4.6, false)).unwrap();

        let text  = fs::read_to_string(logger.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], HEADER);
        assert!(lines[1].starts_with("1,5.000000,4.500000,"));
        assert!(lines[1].ends_with(",true"));
        assert!(lines[2].ends_with(",false"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_new_run_starts_a_fresh_file() {
        let dir   = scratch_dir("rerun");
        let first = MetricsLogger::new(&dir).unwrap();
        first.log(&EpochMetrics::new(1, 5.0, 4.5, true)).unwrap();
        first.log(&EpochMetrics::new(2, 4.0, 4.6, false)).unwrap();

        let second = MetricsLogger::new(&dir).unwrap();
        second.log(&EpochMetrics::new(1, 6.0, 5.5, true)).unwrap();

        let text  = fs::read_to_string(second.csv_path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec![HEADER, "1,6.000000,5.500000,244.691932,true"]);

        fs::remove_dir_all(&dir).ok();
    }
}
