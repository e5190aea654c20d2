// ============================================================
// Layer 5 — Masked Negative Log-Likelihood
// ============================================================
// The model emits log-probabilities [trg_len, batch, vocab].
// The loss compares timesteps 1.. against the target tokens at
// the same timesteps (timestep 0 is the forced <sos>), flattened
// over time and batch:
//
//   loss = - Σ_{target ≠ pad} log p(target)  /  #{target ≠ pad}
//
// Padded positions are masked out before the sum, so they add
// neither loss nor gradient whatever the model predicts there.

use burn::prelude::*;

/// Mean NLL over timesteps 1.. of `output`, ignoring `pad_id` targets.
///
/// output: [trg_len, batch, vocab_size] log-probabilities
/// trg:    [trg_len, batch] token ids
pub fn masked_nll_loss<B: Backend>(
    output:     Tensor<B, 3>,
    trg:        Tensor<B, 2, Int>,
    vocab_size: usize,
    pad_id:     u32,
) -> Tensor<B, 1> {
    let [trg_len, batch_size, _] = output.dims();
    if trg_len < 2 {
        // Nothing to predict; keep the graph so backward() still works.
        return output.sum().mul_scalar(0.0);
    }
    let steps = (trg_len - 1) * batch_size;

    let log_probs = output
        .slice([1..trg_len, 0..batch_size, 0..vocab_size])
        .reshape([steps, vocab_size]);
    let targets = trg
        .slice([1..trg_len, 0..batch_size])
        .reshape([steps]);

    nll_ignoring_pad(log_probs, targets, pad_id)
}

/// Mean NLL of `targets` under `log_probs` [n, vocab], skipping `pad_id`.
/// A batch made only of padding has loss 0.
pub fn nll_ignoring_pad<B: Backend>(
    log_probs: Tensor<B, 2>,
    targets:   Tensor<B, 1, Int>,
    pad_id:    u32,
) -> Tensor<B, 1> {
    let [n] = targets.dims();

    let is_pad  = targets.clone().equal_elem(pad_id as i32);
    let counted = is_pad.clone().bool_not().float().sum().clamp_min(1.0);

    let picked = log_probs
        .gather(1, targets.reshape([n, 1]))
        .reshape([n])
        .mask_fill(is_pad, 0.0);

    picked.sum().neg() / counted
}
