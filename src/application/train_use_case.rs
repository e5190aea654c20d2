// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training run in order:
//
//   Step 1: Load train / val / test splits   (Layer 4 - data)
//   Step 2: Build source + target vocab      (Layer 6 - infra)
//   Step 3: Encode datasets                  (Layer 4 - data)
//   Step 4: Save config                      (Layer 6 - infra)
//   Step 5: Build model + Adam               (Layer 5 - ml)
//   Step 6: Epoch loop                       (Layer 5 - ml)
//             train → validate → checkpoint policy → metrics
//   Step 7: Final test-set evaluation        (Layer 5 - ml)
//
// The epochs run strictly one after another. Any error aborts the
// remaining epochs; checkpoints already written stay valid.
//
// Key Burn insight:
//   - Training uses Autodiff<Wgpu> for gradients
//   - model.valid() returns the model on the inner Wgpu backend
//     (no graph, dropout off), so val/test batchers use it too
//
// Reference: Burn Book §5 (Training)

use anyhow::Result;
use burn::{
    backend::{wgpu::WgpuDevice, Autodiff, Wgpu},
    data::dataloader::DataLoaderBuilder,
    module::{AutodiffModule, Module},
    optim::AdamConfig,
    tensor::backend::AutodiffBackend,
};
use serde::{Deserialize, Serialize};

use crate::application::shutdown::ShutdownSignal;
use crate::data::{
    batcher::TranslationBatcher,
    dataset::TranslationDataset,
    loader::ParallelCorpusLoader,
};
use crate::domain::{
    checkpoint_policy::BestLossPolicy,
    errors::Interrupted,
    sentence_pair::{SentencePair, Split},
    traits::CorpusSource,
    vocabulary::SpecialToken,
};
use crate::infra::{
    checkpoint::CheckpointManager,
    metrics::{EpochMetrics, MetricsLogger},
    vocab_store::VocabStore,
};
use crate::ml::{
    evaluator::evaluate,
    model::{Seq2Seq, Seq2SeqConfig},
    trainer::{train_epoch, EpochSettings},
};

type TrainBackend = Autodiff<Wgpu>;

// ─── Training Configuration ──────────────────────────────────────────────────
// All settings of one run. Only the first four come from the CLI;
// the rest are fixed defaults. Serialised to train_config.json so
// a checkpoint can be matched with the architecture it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    // ─── Optimisation ───
    /// Upper bound on epochs; a run may stop earlier on Ctrl-C
    pub epochs:                usize,
    /// Sentence pairs per batch (the last batch may be smaller)
    pub batch_size:            usize,
    /// Adam learning rate
    pub lr:                    f64,
    /// Maximum global gradient L2 norm, enforced on every batch
    pub grad_clip:             f64,

    // ─── Corpus ───
    /// Directory holding {train,val,test}.<ext> files
    pub data_dir:              String,
    /// Where checkpoints, vocabularies and metrics.csv are written
    pub save_dir:              String,
    pub src_ext:               String,
    pub trg_ext:               String,

    // ─── Architecture ───
    pub embed_size:            usize,
    pub hidden_size:           usize,
    /// Bidirectional GRU layers in the encoder
    pub encoder_layers:        usize,
    /// GRU layers in the decoder, capped at 2 * encoder_layers
    pub decoder_layers:        usize,
    /// Dropout probability on embeddings and between layers
    pub dropout:               f64,
    /// Chance of feeding the reference token while training
    pub teacher_forcing_ratio: f64,

    // ─── Vocabulary ───
    /// Tokens seen fewer times than this map to <unk>
    pub min_freq:              usize,
    /// Cap on regular tokens, reserved ones excluded
    pub max_vocab_size:        usize,

    /// Seed for the per-epoch shuffle of the train split
    pub shuffle_seed:          u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs:                100,
            batch_size:            32,
            lr:                    0.0001,
            grad_clip:             10.0,
            data_dir:              ".data/multi30k".to_string(),
            save_dir:              ".save".to_string(),
            src_ext:               "de".to_string(),
            trg_ext:               "en".to_string(),
            embed_size:            256,
            hidden_size:           512,
            encoder_layers:        2,
            decoder_layers:        1,
            dropout:               0.5,
            teacher_forcing_ratio: 1.0,
            min_freq:              2,
            max_vocab_size:        10_000,
            shuffle_seed:          42,
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub best_val_loss: Option<f64>,
    pub test_loss:     f64,
    /// Epochs that wrote a checkpoint, in order
    pub checkpoints:   Vec<usize>,
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Train on the on-disk corpus with the WGPU backend.
    pub fn execute(&self, shutdown: &ShutdownSignal) -> Result<RunReport> {
        let cfg    = &self.config;
        let device = WgpuDevice::default();
        tracing::info!("Using WGPU device: {:?}", device);

        let corpus = ParallelCorpusLoader::new(&cfg.data_dir, &cfg.src_ext, &cfg.trg_ext);
        run::<TrainBackend, _>(cfg, &corpus, device, shutdown)
    }
}

/// The whole run, generic over the autodiff backend and corpus.
pub fn run<B, C>(
    cfg:      &TrainConfig,
    corpus:   &C,
    device:   B::Device,
    shutdown: &ShutdownSignal,
) -> Result<RunReport>
where
    B: AutodiffBackend,
    C: CorpusSource,
{
    // ── Step 1: Load splits ──────────────────────────────────────────────────
    tracing::info!("Loading corpus from '{}'", cfg.data_dir);
    let train_pairs = load_split(corpus, Split::Train)?;
    let val_pairs   = load_split(corpus, Split::Validation)?;
    let test_pairs  = load_split(corpus, Split::Test)?;
    ensure_running(shutdown)?;

    // ── Step 2: Vocabularies (training split only) ───────────────────────────
    let store     = VocabStore::new(&cfg.save_dir);
    let src_vocab = store.build_and_save(
        &cfg.src_ext,
        train_pairs.iter().map(|p| p.source.as_str()),
        cfg.min_freq,
        cfg.max_vocab_size,
    )?;
    let trg_vocab = store.build_and_save(
        &cfg.trg_ext,
        train_pairs.iter().map(|p| p.target.as_str()),
        cfg.min_freq,
        cfg.max_vocab_size,
    )?;
    tracing::info!(
        "Vocabulary sizes: {}={} {}={}",
        cfg.src_ext, src_vocab.len(), cfg.trg_ext, trg_vocab.len()
    );
    ensure_running(shutdown)?;

    // ── Step 3: Encode datasets ──────────────────────────────────────────────
    let train_ds = TranslationDataset::encode(&train_pairs, &src_vocab, &trg_vocab)?;
    let val_ds   = TranslationDataset::encode(&val_pairs, &src_vocab, &trg_vocab)?;
    let test_ds  = TranslationDataset::encode(&test_pairs, &src_vocab, &trg_vocab)?;
    tracing::info!(
        "[TrainSet] {} (batches {}) [ValSet] {} [TestSet] {}",
        train_ds.sample_count(),
        train_ds.batch_count(cfg.batch_size),
        val_ds.sample_count(),
        test_ds.sample_count(),
    );

    // ── Step 4: Save config ──────────────────────────────────────────────────
    let ckpt = CheckpointManager::new(&cfg.save_dir);
    ckpt.save_config(cfg)?;

    // ── Step 5: Model + Adam ─────────────────────────────────────────────────
    let pad_id         = SpecialToken::Pad.id();
    let trg_vocab_size = trg_vocab.len();

    let mut model: Seq2Seq<B> = Seq2SeqConfig::new(src_vocab.len(), trg_vocab_size)
        .with_embed_size(cfg.embed_size)
        .with_hidden_size(cfg.hidden_size)
        .with_encoder_layers(cfg.encoder_layers)
        .with_decoder_layers(cfg.decoder_layers)
        .with_dropout(cfg.dropout)
        .init(&device);
    tracing::info!("Model ready: {} parameters", model.num_params());

    // m = β1*m + (1-β1)*g        (mean)
    // v = β2*v + (1-β2)*g²       (variance)
    // θ = θ - lr * m / (√v + ε)  (update)
    let mut optim = AdamConfig::new().with_epsilon(1e-8).init::<B, Seq2Seq<B>>();

    // ── Data loaders ─────────────────────────────────────────────────────────
    // Train batches live on the autodiff backend and are shuffled;
    // val/test batches live on the inner backend, in corpus order.
    let train_loader = DataLoaderBuilder::new(TranslationBatcher::<B>::new(device.clone(), pad_id))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.shuffle_seed)
        .num_workers(1)
        .build(train_ds);
    let val_loader = DataLoaderBuilder::new(TranslationBatcher::<B::InnerBackend>::new(device.clone(), pad_id))
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(val_ds);
    let test_loader = DataLoaderBuilder::new(TranslationBatcher::<B::InnerBackend>::new(device, pad_id))
        .batch_size(cfg.batch_size)
        .num_workers(1)
        .build(test_ds);

    // ── Step 6: Epoch loop ───────────────────────────────────────────────────
    let settings = EpochSettings {
        teacher_forcing_ratio: cfg.teacher_forcing_ratio,
        ..EpochSettings::new(cfg.lr, cfg.grad_clip, pad_id, trg_vocab_size)
    };
    let metrics         = MetricsLogger::new(&cfg.save_dir)?;
    let mut policy      = BestLossPolicy::new();
    let mut checkpoints = Vec::new();

    for epoch in 1..=cfg.epochs {
        ensure_running(shutdown)?;

        let (trained, summary) = train_epoch(
            epoch,
            model,
            &mut optim,
            train_loader.iter(),
            &settings,
            || shutdown.is_triggered(),
        )?;
        model = trained;

        let val_loss = evaluate(
            &model.valid(),
            val_loader.iter(),
            trg_vocab_size,
            pad_id,
            || shutdown.is_triggered(),
        )?;

        let saved = policy.consider(val_loss, || {
            let path = ckpt.save_model::<B, _>(&model, epoch)?;
            tracing::info!(path = %path.display(), "[SAVE] new best model");
            Ok(())
        })?;
        if saved {
            checkpoints.push(epoch);
        }

        tracing::info!(
            epoch,
            train_loss     = %format!("{:.3}", summary.mean_loss),
            val_loss       = %format!("{:.3}", val_loss),
            val_perplexity = %format!("{:.2}", val_loss.exp()),
            "[EPOCH]"
        );
        metrics.log(&EpochMetrics::new(epoch, summary.mean_loss, val_loss, saved))?;
    }

    // ── Step 7: Held-out test set ────────────────────────────────────────────
    ensure_running(shutdown)?;
    let test_loss = evaluate(
        &model.valid(),
        test_loader.iter(),
        trg_vocab_size,
        pad_id,
        || shutdown.is_triggered(),
    )?;
    tracing::info!(
        test_loss       = %format!("{:.3}", test_loss),
        test_perplexity = %format!("{:.2}", test_loss.exp()),
        "[TEST]"
    );

    // A stop that arrived during the last test batch still counts.
    ensure_running(shutdown)?;

    Ok(RunReport {
        best_val_loss: policy.best(),
        test_loss,
        checkpoints,
    })
}

/// `Interrupted` once Ctrl-C has been pressed.
fn ensure_running(shutdown: &ShutdownSignal) -> Result<()> {
    if shutdown.is_triggered() {
        return Err(Interrupted.into());
    }
    Ok(())
}

fn load_split<C: CorpusSource>(corpus: &C, split: Split) -> Result<Vec<SentencePair>> {
    let pairs = corpus.load_split(split)?;
    if pairs.is_empty() {
        tracing::warn!("Split '{}' has no usable sentence pairs", split);
    }
    Ok(pairs)
}
