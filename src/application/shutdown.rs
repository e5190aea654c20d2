// ============================================================
// Layer 2 — Shutdown Signal
// ============================================================
// Ctrl-C only flips an atomic flag. The training and evaluation
// loops poll it before every batch and the driver between phases,
// so a stop never lands in the middle of a checkpoint write.

use anyhow::{Context, Result};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// Shared "please stop" flag set from the Ctrl-C handler.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
}

impl ShutdownSignal {
    /// A flag that nothing but `trigger()` will ever set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a flag wired to the process Ctrl-C handler.
    /// Can be called once per process.
    pub fn install() -> Result<Self> {
        let signal  = Self::new();
        let handler = signal.flag.clone();
        ctrlc::set_handler(move || {
            handler.store(true, Ordering::Relaxed);
        })
        .context("Failed to install Ctrl-C handler")?;
        Ok(signal)
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }
}
