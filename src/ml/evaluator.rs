// ============================================================
// Layer 5 — Evaluation Loop
// ============================================================
// Mean masked NLL over the validation or test split.
//
// Differences from training:
//   - the caller passes model.valid(), i.e. the inner backend:
//     no autodiff graph and dropout disabled
//   - decoding is Greedy: each step sees only the model's own
//     previous prediction, never the reference token
//   - nothing is updated
//
// The result is the sum of per-batch mean losses divided by the
// number of batches. Like training, the loop polls a stop check
// before every batch, so Ctrl-C during a long validation or test
// pass still aborts the run.

use anyhow::Result;
use burn::prelude::*;

use crate::data::batcher::TranslationBatch;
use crate::domain::errors::Interrupted;
use crate::ml::loss::masked_nll_loss;
use crate::ml::model::{DecodeMode, Seq2SeqForward};

/// Mean per-batch loss of `model` over `batches`; NaN when there are none.
///
/// Returns [`Interrupted`] as soon as `should_stop` answers true.
pub fn evaluate<B, M, I>(
    model:          &M,
    batches:        I,
    trg_vocab_size: usize,
    pad_id:         u32,
    should_stop:    impl Fn() -> bool,
) -> Result<f64>
where
    B: Backend,
    M: Seq2SeqForward<B>,
    I: IntoIterator<Item = TranslationBatch<B>>,
{
    let mut loss_sum = 0.0f64;
    let mut count    = 0usize;

    for batch in batches {
        if should_stop() {
            return Err(Interrupted.into());
        }

        let output = model.forward(batch.src, batch.trg.clone(), DecodeMode::Greedy);
        let loss   = masked_nll_loss(output, batch.trg, trg_vocab_size, pad_id);
        loss_sum  += loss.into_scalar().elem::<f64>();
        count     += 1;
    }

    if count > 0 {
        Ok(loss_sum / count as f64)
    } else {
        Ok(f64::NAN)
    }
}
