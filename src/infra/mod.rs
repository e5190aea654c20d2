// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything a run leaves on disk, under the save directory:
//
//   checkpoint.rs  — model weights (seq2seq_<epoch>.pt) and
//                    train_config.json, written atomically
//
//   vocab_store.rs — vocab.<lang>.json word-level tokenizers,
//                    built from the training split
//
//   metrics.rs     — metrics.csv, one row per epoch
//
// Reference: Rust Book §9 (Error Handling with anyhow)
//            Burn Book §5 (Checkpointing)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Vocabulary building, saving, and loading
pub mod vocab_store;

/// Training metrics CSV logger
pub mod metrics;
