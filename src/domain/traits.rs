// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer loads data through CorpusSource only,
// so a test can hand it an in-memory corpus and the real run
// can read Multi30k files from disk.

use anyhow::Result;
use crate::domain::sentence_pair::{SentencePair, Split};

// ─── CorpusSource ─────────────────────────────────────────────────────────────
/// Anything that can produce the aligned sentence pairs of a split.
///
/// Implementations:
///   - ParallelCorpusLoader → `<dir>/<split>.<ext>` text files
pub trait CorpusSource {
    /// Load every pair of the given split, in corpus order.
    fn load_split(&self, split: Split) -> Result<Vec<SentencePair>>;
}
