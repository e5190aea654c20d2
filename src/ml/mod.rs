// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Everything that builds or drives the network lives here.
//
//   model.rs     — attention-based GRU encoder/decoder
//                  • bidirectional stacked GRU encoder
//                  • additive attention over encoder outputs
//                  • GRU decoder with teacher forcing / greedy
//
//   loss.rs      — masked negative log-likelihood
//                  (pad targets excluded, first timestep skipped)
//
//   clipping.rs  — global L2 gradient-norm clipping
//
//   trainer.rs   — one training epoch: forward, loss, backward,
//                  clip, Adam step, windowed loss logging
//
//   evaluator.rs — mean loss over a split on model.valid(),
//                  greedy decoding, no updates
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Bahdanau et al. (2015) Neural Machine Translation
//            by Jointly Learning to Align and Translate

/// Attention GRU sequence-to-sequence model
pub mod model;

/// Pad-aware NLL loss
pub mod loss;

/// Global gradient-norm clipping
pub mod clipping;

/// One epoch of training
pub mod trainer;

/// Validation / test loss
pub mod evaluator;
