// ============================================================
// Layer 3 — Best-Loss Checkpoint Policy
// ============================================================
// After every epoch the validation loss is offered to the policy.
// The model is persisted when no best loss exists yet or the new
// loss is strictly lower than the recorded best. Earlier
// checkpoints are never removed.
//
// The best loss only moves after the persist step succeeded, so
// a failed write leaves the policy exactly as it was.

use anyhow::Result;

/// Tracks the best validation loss seen during one run.
#[derive(Debug, Clone, Default)]
pub struct BestLossPolicy {
    best: Option<f64>,
}

impl BestLossPolicy {
    pub fn new() -> Self {
        Self { best: None }
    }

    /// Best validation loss recorded so far.
    pub fn best(&self) -> Option<f64> {
        self.best
    }

    /// Would `val_loss` trigger a checkpoint?
    pub fn is_improvement(&self, val_loss: f64) -> bool {
        match self.best {
            None       => true,
            Some(best) => val_loss < best,
        }
    }

    /// Run `persist` if `val_loss` improves on the best so far and
    /// record the new best once it returns Ok. Returns whether a
    /// checkpoint was written.
    pub fn consider<F>(&mut self, val_loss: f64, persist: F) -> Result<bool>
    where
        F: FnOnce() -> Result<()>,
    {
        if !self.is_improvement(val_loss) {
            return Ok(false);
        }
        persist()?;
        self.best = Some(val_loss);
        Ok(true)
    }
}
