// ============================================================
// Layer 3 — Typed Errors
// ============================================================
// Most failures travel as anyhow::Error. Interrupted is the one
// the driver must recognise (via anyhow::Error::is) so it can
// report a clean stop instead of a failure.

use std::fmt;

/// The operator cancelled the run (Ctrl-C).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

impl fmt::Display for Interrupted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("training interrupted by user")
    }
}

impl std::error::Error for Interrupted {}
