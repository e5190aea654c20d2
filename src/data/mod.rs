// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Raw parallel text files all the way to tensor batches.
//
//   train.de / train.en
//       │
//       ▼
//   ParallelCorpusLoader → aligned lines, one SentencePair each
//       │
//       ▼
//   Preprocessor         → lower-case, split punctuation, tidy spaces
//       │
//       ▼
//   Vocabulary           → <sos> ids.. <eos> per sentence
//       │
//       ▼
//   TranslationDataset   → implements Burn's Dataset trait
//       │
//       ▼
//   TranslationBatcher   → pads into time-major tensors
//       │
//       ▼
//   DataLoader           → feeds batches to the training loop
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads `<split>.<ext>` line-aligned corpus files
pub mod loader;

/// Cleans and tokenises raw sentences
pub mod preprocessor;

/// Word-level vocabulary backed by a tokenizers model
pub mod vocabulary;

/// Implements Burn's Dataset trait for encoded sentence pairs
pub mod dataset;

/// Implements Burn's Batcher trait to create padded tensor batches
pub mod batcher;
