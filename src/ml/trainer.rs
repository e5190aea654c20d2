// ============================================================
// Layer 5 — Training Epoch
// ============================================================
// One pass of stochastic gradient training over the train split.
//
// Per batch:
//   1. forward with teacher forcing   → [trg_len, batch, vocab]
//   2. masked NLL over timesteps 1..  → scalar loss
//   3. backward + GradientsParams::from_grads
//   4. global gradient-norm clipping  (see clipping.rs)
//   5. optimizer step
//
// The model is generic over Seq2SeqForward so the loop never
// depends on the network's internals. Training runs on the
// autodiff backend (Autodiff<Wgpu> in production); evaluation
// happens elsewhere on model.valid().

use anyhow::Result;
use burn::{
    module::AutodiffModule,
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::batcher::TranslationBatch;
use crate::domain::errors::Interrupted;
use crate::domain::run_state::{IntervalReport, RunningLoss, LOG_INTERVAL};
use crate::ml::clipping::clip_grad_norm;
use crate::ml::loss::masked_nll_loss;
use crate::ml::model::{DecodeMode, Seq2SeqForward};

/// Per-epoch knobs the loop needs besides the model and optimizer.
#[derive(Debug, Clone)]
pub struct EpochSettings {
    /// Learning rate handed to every optimizer step
    pub lr: f64,

    /// Maximum global L2 norm of the gradients; applied on every batch
    pub grad_clip: f64,

    /// Target id excluded from the loss (<pad>)
    pub pad_id: u32,

    /// Size of the model's output distribution
    pub trg_vocab_size: usize,

    /// Probability of feeding the reference token at each decoder step.
    /// 1.0 means the decoder always sees the true previous word.
    pub teacher_forcing_ratio: f64,

    /// Batches per [TRAIN] log line
    pub log_interval: usize,
}

impl EpochSettings {
    pub fn new(lr: f64, grad_clip: f64, pad_id: u32, trg_vocab_size: usize) -> Self {
        Self {
            lr,
            grad_clip,
            pad_id,
            trg_vocab_size,
            teacher_forcing_ratio: 1.0,
            log_interval:          LOG_INTERVAL,
        }
    }
}

/// What one training epoch produced.
#[derive(Debug, Clone)]
pub struct EpochSummary {
    pub batches: usize,

    /// Mean batch loss over the whole epoch (NaN for an empty epoch)
    pub mean_loss: f64,

    /// Largest gradient norm seen this epoch, measured before clipping
    pub max_grad_norm: f64,

    pub intervals: Vec<IntervalReport>,
}

/// Train `model` for one epoch over `batches` and return the updated model.
///
/// `should_stop` is polled before every batch; once it answers true the
/// epoch is abandoned with an [`Interrupted`] error.
pub fn train_epoch<B, M, O, I>(
    epoch:       usize,
    mut model:   M,
    optim:       &mut O,
    batches:     I,
    settings:    &EpochSettings,
    should_stop: impl Fn() -> bool,
) -> Result<(M, EpochSummary)>
where
    B: AutodiffBackend,
    M: AutodiffModule<B> + Seq2SeqForward<B>,
    O: Optimizer<M, B>,
    I: IntoIterator<Item = TranslationBatch<B>>,
{
    let mode        = DecodeMode::TeacherForcing(settings.teacher_forcing_ratio);
    let mut running = RunningLoss::with_interval(settings.log_interval);
    let mut reports = Vec::new();
    let mut max_norm = 0.0f64;

    for batch in batches {
        if should_stop() {
            return Err(Interrupted.into());
        }

        let output = model.forward(batch.src, batch.trg.clone(), mode);
        let loss   = masked_nll_loss(output, batch.trg, settings.trg_vocab_size, settings.pad_id);
        let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();

        // Backward pass, clip, Adam update
        let grads = GradientsParams::from_grads(loss.backward(), &model);
        let (grads, norm) = clip_grad_norm::<B, M>(&model, grads, settings.grad_clip);
        model = optim.step(settings.lr, model, grads);
        max_norm = max_norm.max(norm);

        tracing::debug!(epoch, batch = running.batches() + 1, loss = loss_val, grad_norm = norm, "step");

        if let Some(report) = running.push(loss_val) {
            tracing::info!(
                epoch,
                batch      = report.batch,
                loss       = %format!("{:.4}", report.mean_loss),
                perplexity = %format!("{:.2}", report.perplexity),
                "[TRAIN]"
            );
            reports.push(report);
        }
    }

    let summary = EpochSummary {
        batches:       running.batches(),
        mean_loss:     running.epoch_mean(),
        max_grad_norm: max_norm,
        intervals:     reports,
    };
    Ok((model, summary))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::{Autodiff, NdArray};
    use burn::data::dataloader::batcher::Batcher;
    use burn::module::{ModuleVisitor, ParamId};
    use burn::nn::{Linear, LinearConfig};
    use burn::optim::{AdamConfig, SgdConfig};
    use burn::tensor::activation::log_softmax;
    use std::cell::Cell;

    use crate::data::batcher::TranslationBatcher;
    use crate::data::dataset::TranslationItem;
    use crate::ml::model::{Seq2Seq, Seq2SeqConfig};

    type AD = Autodiff<NdArray>;

    const PAD: u32 = 1;

    fn tiny_model() -> Seq2Seq<AD> {
        Seq2SeqConfig::new(8, 8)
            .with_embed_size(8)
            .with_hidden_size(16)
            .with_encoder_layers(1)
            .with_decoder_layers(1)
            .with_dropout(0.0)
            .init(&Default::default())
    }

    fn toy_batch() -> TranslationBatch<AD> {
        TranslationBatcher::<AD>::new(Default::default(), PAD).batch(vec![
            TranslationItem { src_ids: vec![2, 4, 5, 3],    trg_ids: vec![2, 6, 7, 3] },
            TranslationItem { src_ids: vec![2, 5, 3],       trg_ids: vec![2, 7, 3] },
            TranslationItem { src_ids: vec![2, 4, 4, 5, 3], trg_ids: vec![2, 6, 6, 7, 3] },
        ])
    }

    fn settings() -> EpochSettings {
        EpochSettings::new(0.01, 10.0, PAD, 8)
    }

    #[test]
    fn test_loss_decreases_on_repeated_batch() {
        let mut model = tiny_model();
        let mut optim = AdamConfig::new().with_epsilon(1e-8).init::<AD, Seq2Seq<AD>>();

        let mut losses = Vec::new();
        for epoch in 1..=30 {
            let (next, summary) =
                train_epoch(epoch, model, &mut optim, vec![toy_batch()], &settings(), || false).unwrap();
            model = next;
            assert_eq!(summary.batches, 1);
            losses.push(summary.mean_loss);
        }

        let first = losses[0];
        let last  = *losses.last().unwrap();
        assert!(last < first, "loss went from {first} to {last}");
    }

    #[test]
    fn test_interval_reports_cover_their_window() {
        let mut optim = AdamConfig::new().init::<AD, Seq2Seq<AD>>();
        let settings  = EpochSettings { log_interval: 2, lr: 0.0, ..settings() };

        let batches = vec![toy_batch(), toy_batch(), toy_batch(), toy_batch(), toy_batch()];
        let (_, summary) = train_epoch(1, tiny_model(), &mut optim, batches, &settings, || false).unwrap();

        assert_eq!(summary.batches, 5);
        let closing: Vec<usize> = summary.intervals.iter().map(|r| r.batch).collect();
        assert_eq!(closing, vec![2, 4]);
        for report in &summary.intervals {
            assert!((report.perplexity - report.mean_loss.exp()).abs() < 1e-9);
        }
    }

    #[test]
    fn test_stop_request_interrupts_epoch() {
        let mut optim = AdamConfig::new().init::<AD, Seq2Seq<AD>>();
        let err = train_epoch(1, tiny_model(), &mut optim, vec![toy_batch()], &settings(), || true)
            .unwrap_err();
        assert!(err.is::<Interrupted>());
    }

    #[test]
    fn test_empty_epoch_has_nan_mean() {
        let mut optim = AdamConfig::new().init::<AD, Seq2Seq<AD>>();
        let (_, summary) =
            train_epoch(1, tiny_model(), &mut optim, Vec::<TranslationBatch<AD>>::new(), &settings(), || false)
                .unwrap();
        assert_eq!(summary.batches, 0);
        assert!(summary.mean_loss.is_nan());
    }

    /// Every float parameter of a module, flattened in visit order.
    struct Flatten(Vec<f32>);

    impl<B: Backend> ModuleVisitor<B> for Flatten {
        fn visit_float<const D: usize>(&mut self, _id: ParamId, tensor: &Tensor<B, D>) {
            let values: Vec<f32> = tensor.clone().into_data().convert::<f32>().to_vec().unwrap();
            self.0.extend(values);
        }
    }

    fn flat_params<M: Module<AD>>(model: &M) -> Vec<f32> {
        let mut flat = Flatten(Vec::new());
        model.visit(&mut flat);
        flat.0
    }

    /// L2 distance between the parameters before and after one SGD
    /// step (lr = 1), i.e. the norm of the applied gradient.
    fn sgd_step_size(grad_clip: f64) -> (f64, EpochSummary) {
        let model  = tiny_model();
        let before = flat_params(&model);

        let mut optim  = SgdConfig::new().init::<AD, Seq2Seq<AD>>();
        let settings   = EpochSettings { lr: 1.0, grad_clip, ..settings() };
        let (after, summary) =
            train_epoch(1, model, &mut optim, vec![toy_batch()], &settings, || false).unwrap();

        let moved = before
            .iter()
            .zip(flat_params(&after))
            .map(|(b, a)| ((a - b) as f64).powi(2))
            .sum::<f64>()
            .sqrt();
        (moved, summary)
    }

    #[test]
    fn test_every_batch_update_is_clipped() {
        let clip = 1e-3;
        let (clipped_step, summary) = sgd_step_size(clip);
        assert!(summary.max_grad_norm > clip, "fixture must exceed the clip threshold");
        assert!(clipped_step <= clip * 1.01, "step of {clipped_step} exceeds clip {clip}");

        let (free_step, _) = sgd_step_size(1e9);
        assert!(free_step > 10.0 * clip, "unclipped step {free_step} should be far larger");
    }

    thread_local! {
        static SEEN_MODE: Cell<Option<DecodeMode>> = Cell::new(None);
    }

    /// Trainable stand-in that records the decode mode it is driven with.
    #[derive(Module, Debug)]
    struct ModeRecorder<B: Backend> {
        head: Linear<B>,
    }

    impl<B: Backend> Seq2SeqForward<B> for ModeRecorder<B> {
        fn forward(&self, _src: Tensor<B, 2, Int>, trg: Tensor<B, 2, Int>, mode: DecodeMode) -> Tensor<B, 3> {
            SEEN_MODE.with(|seen| seen.set(Some(mode)));
            let [trg_len, batch_size] = trg.dims();
            let input = Tensor::<B, 3>::ones([trg_len, batch_size, 4], &trg.device());
            log_softmax(self.head.forward(input), 2)
        }
    }

    #[test]
    fn test_training_uses_full_teacher_forcing() {
        let model = ModeRecorder::<AD> { head: LinearConfig::new(4, 8).init(&Default::default()) };
        let mut optim = AdamConfig::new().init::<AD, ModeRecorder<AD>>();

        SEEN_MODE.with(|seen| seen.set(None));
        train_epoch(1, model, &mut optim, vec![toy_batch()], &settings(), || false).unwrap();

        assert_eq!(SEEN_MODE.with(|seen| seen.get()), Some(DecodeMode::TeacherForcing(1.0)));
    }
}
