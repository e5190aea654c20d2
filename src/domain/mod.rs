// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types for the concepts a training run talks about.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain structs, enums, and traits
//
// Everything that must be reset between runs (the running loss
// window, the best validation loss) lives in an explicit struct
// here instead of in globals.

// A source/target sentence pair and the dataset splits
pub mod sentence_pair;

// Reserved vocabulary tokens and their fixed ids
pub mod vocabulary;

// Per-epoch running loss bookkeeping
pub mod run_state;

// Best-validation-loss checkpoint policy
pub mod checkpoint_policy;

// Typed errors the driver reacts to
pub mod errors;

// Core abstractions that other layers implement
pub mod traits;
