// ============================================================
// Layer 3 — Running Loss
// ============================================================
// Bookkeeping for one training epoch.
//
// Two accumulators are kept side by side:
//   - the interval window: summed per-batch mean losses since the
//     last report, emptied after every LOG_INTERVAL batches
//   - the epoch totals: every batch of the epoch, used for the
//     epoch's mean training loss in metrics.csv
//
// Batches are counted from 1, so the report after batch 100k is
// the mean of exactly batches 100(k-1)+1 ..= 100k.

/// Number of batches between two training log lines.
pub const LOG_INTERVAL: usize = 100;

/// One emitted interval report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntervalReport {
    /// 1-based index of the batch that closed the interval
    pub batch: usize,
    /// Mean loss over the interval
    pub mean_loss: f64,
    /// exp(mean_loss)
    pub perplexity: f64,
}

/// Loss accumulators scoped to a single epoch.
#[derive(Debug, Clone)]
pub struct RunningLoss {
    /// Batches per report (at least 1)
    interval: usize,

    /// Sum of batch losses since the last report
    window_sum: f64,

    /// Batches in the current window
    window_len: usize,

    /// Sum of every batch loss this epoch
    epoch_sum: f64,

    /// Batches seen this epoch, 1-based once the first push lands
    batches: usize,
}

impl RunningLoss {
    pub fn new() -> Self {
        Self::with_interval(LOG_INTERVAL)
    }

    pub fn with_interval(interval: usize) -> Self {
        Self {
            interval:   interval.max(1),
            window_sum: 0.0,
            window_len: 0,
            epoch_sum:  0.0,
            batches:    0,
        }
    }

    /// Record one batch loss. Returns a report when this batch
    /// closes an interval; the window is then reset.
    pub fn push(&mut self, loss: f64) -> Option<IntervalReport> {
        self.window_sum += loss;
        self.window_len += 1;
        self.epoch_sum  += loss;
        self.batches    += 1;

        if self.batches % self.interval != 0 {
            return None;
        }

        let mean_loss = self.window_sum / self.window_len as f64;
        self.window_sum = 0.0;
        self.window_len = 0;

        Some(IntervalReport {
            batch: self.batches,
            mean_loss,
            perplexity: mean_loss.exp(),
        })
    }

    /// Batches recorded so far this epoch
    pub fn batches(&self) -> usize {
        self.batches
    }

    /// Current (not yet reported) window sum
    pub fn window_sum(&self) -> f64 {
        self.window_sum
    }

    /// Mean loss over every batch of the epoch, NaN before the first batch
    pub fn epoch_mean(&self) -> f64 {
        if self.batches > 0 {
            self.epoch_sum / self.batches as f64
        } else {
            f64::NAN
        }
    }
}

impl Default for RunningLoss {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_report_before_interval() {
        let mut rl = RunningLoss::new();
        for _ in 0..99 {
            assert!(rl.push(1.0).is_none());
        }
        assert!(rl.push(1.0).is_some());
    }

    #[test]
    fn test_report_is_windowed_not_cumulative() {
        let mut rl = RunningLoss::new();
        let mut reports = Vec::new();
        // batch n (1-based) has loss n
        for n in 1..=300 {
            if let Some(r) = rl.push(n as f64) {
                reports.push(r);
            }
        }

        assert_eq!(reports.len(), 3);
        for (k, r) in reports.iter().enumerate() {
            let first = 100 * k + 1;
            let last  = 100 * (k + 1);
            let expected = (first..=last).map(|n| n as f64).sum::<f64>() / 100.0;
            assert_eq!(r.batch, last);
            assert!((r.mean_loss - expected).abs() < 1e-9);
            assert!((r.perplexity - expected.exp()).abs() / expected.exp() < 1e-9);
        }
    }

    #[test]
    fn test_window_resets_after_report() {
        let mut rl = RunningLoss::with_interval(2);
        rl.push(3.0);
        rl.push(5.0);
        assert_eq!(rl.window_sum(), 0.0);
        rl.push(7.0);
        assert_eq!(rl.window_sum(), 7.0);
    }

    #[test]
    fn test_epoch_mean_spans_all_batches() {
        let mut rl = RunningLoss::with_interval(2);
        assert!(rl.epoch_mean().is_nan());
        for loss in [1.0, 2.0, 3.0] {
            rl.push(loss);
        }
        assert_eq!(rl.batches(), 3);
        assert!((rl.epoch_mean() - 2.0).abs() < 1e-12);
    }
}
