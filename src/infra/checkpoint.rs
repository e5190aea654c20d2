// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores model weights with Burn's BinBytesRecorder.
//
// File naming convention:
//   .save/
//     seq2seq_1.pt         ← weights after epoch 1 (an improvement)
//     seq2seq_3.pt         ← weights after epoch 3 (the next one)
//     ...
//     train_config.json    ← hyperparameters of the run
//
// Every file is written atomically: the bytes go to a sibling
// `<name>.partial`, are fsync'd, then renamed over the final name.
// An interrupted or failed write can leave a `.partial` behind but
// never a truncated `seq2seq_<n>.pt`.
//
// Older checkpoints are never removed.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use burn::{
    prelude::*,
    record::{BinBytesRecorder, FullPrecisionSettings, Recorder},
};

use crate::application::train_use_case::TrainConfig;

type WeightsRecorder = BinBytesRecorder<FullPrecisionSettings>;

const CONFIG_FILE: &str = "train_config.json";

/// Manages saving and loading of model checkpoints.
/// The directory is created on the first write.
pub struct CheckpointManager {
    dir: PathBuf,
}

impl CheckpointManager {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `<dir>/seq2seq_<epoch>.pt`
    pub fn checkpoint_path(&self, epoch: usize) -> PathBuf {
        self.dir.join(format!("seq2seq_{epoch}.pt"))
    }

    /// Persist the full parameter state of `model` for `epoch`.
    /// Returns the path of the written checkpoint.
    pub fn save_model<B: Backend, M: Module<B>>(&self, model: &M, epoch: usize) -> Result<PathBuf> {
        let path  = self.checkpoint_path(epoch);
        let bytes = Recorder::<B>::record(&WeightsRecorder::default(), model.clone().into_record(), ())
            .with_context(|| format!("Failed to serialise checkpoint for epoch {epoch}"))?;

        write_atomic(&path, &bytes)?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "checkpoint written");
        Ok(path)
    }

    /// Restore the weights saved for `epoch` into `model`.
    ///
    /// `model` must have the architecture the checkpoint was taken from.
    pub fn load_model<B: Backend, M: Module<B>>(
        &self,
        model:  M,
        epoch:  usize,
        device: &B::Device,
    ) -> Result<M> {
        let path  = self.checkpoint_path(epoch);
        let bytes = fs::read(&path)
            .with_context(|| format!("Cannot read checkpoint '{}'", path.display()))?;

        let record = Recorder::<B>::load(&WeightsRecorder::default(), bytes, device)
            .with_context(|| format!("Cannot decode checkpoint '{}'", path.display()))?;

        Ok(model.load_record(record))
    }

    /// Write the run's configuration as pretty JSON.
    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path = self.dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(cfg)?;
        write_atomic(&path, json.as_bytes())?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig> {
        let path = self.dir.join(CONFIG_FILE);
        let json = fs::read_to_string(&path)
            .with_context(|| format!("Cannot read config from '{}'", path.display()))?;

        serde_json::from_str(&json)
            .with_context(|| format!("Malformed config in '{}'", path.display()))
    }
}

/// Write `bytes` to `path` via a fsync'd `.partial` sibling and a rename.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)
        .with_context(|| format!("Cannot create directory '{}'", dir.display()))?;

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".partial");
    let tmp = PathBuf::from(tmp_name);

    let mut file = fs::File::create(&tmp)
        .with_context(|| format!("Cannot create '{}'", tmp.display()))?;
    file.write_all(bytes)
        .with_context(|| format!("Cannot write '{}'", tmp.display()))?;
    file.sync_all()
        .with_context(|| format!("Cannot sync '{}'", tmp.display()))?;
    drop(file);

    fs::rename(&tmp, path)
        .with_context(|| format!("Cannot move '{}' to '{}'", tmp.display(), path.display()))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::nn::{Linear, LinearConfig};

    type TB = NdArray;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("seq2seq-ckpt-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn weights(layer: &Linear<TB>) -> Vec<f32> {
        layer.weight.val().into_data().to_vec().unwrap()
    }

    #[test]
    fn test_checkpoint_name_follows_epoch() {
        let ckpt = CheckpointManager::new("/tmp/whatever");
        assert!(ckpt.checkpoint_path(7).ends_with("seq2seq_7.pt"));
    }

    #[test]
    fn test_save_then_load_restores_weights() {
        let dir    = scratch_dir("roundtrip");
        let ckpt   = CheckpointManager::new(dir.join("nested"));
        let device = Default::default();

        let saved: Linear<TB> = LinearConfig::new(4, 3).init(&device);
        let path = ckpt.save_model::<TB, _>(&saved, 3).unwrap();
        assert!(path.exists());
        assert!(!dir.join("nested").join("seq2seq_3.pt.partial").exists());

        let fresh: Linear<TB> = LinearConfig::new(4, 3).init(&device);
        assert_ne!(weights(&fresh), weights(&saved));

        let loaded = ckpt.load_model::<TB, _>(fresh, 3, &device).unwrap();
        assert_eq!(weights(&loaded), weights(&saved));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_each_epoch_gets_its_own_file() {
        let dir  = scratch_dir("many");
        let ckpt = CheckpointManager::new(&dir);
        let layer: Linear<TB> = LinearConfig::new(2, 2).init(&Default::default());

        ckpt.save_model::<TB, _>(&layer, 1).unwrap();
        ckpt.save_model::<TB, _>(&layer, 3).unwrap();

        assert!(dir.join("seq2seq_1.pt").exists());
        assert!(dir.join("seq2seq_3.pt").exists());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_checkpoint_is_an_error() {
        let dir  = scratch_dir("missing");
        let ckpt = CheckpointManager::new(&dir);
        let layer: Linear<TB> = LinearConfig::new(2, 2).init(&Default::default());

        let err = ckpt.load_model::<TB, _>(layer, 9, &Default::default()).unwrap_err();
        assert!(format!("{err:#}").contains("seq2seq_9.pt"));
    }

    #[test]
    fn test_stale_partial_file_is_replaced() {
        let dir  = scratch_dir("stale");
        fs::create_dir_all(&dir).unwrap();
        let target = dir.join("out.bin");
        fs::write(dir.join("out.bin.partial"), b"half a write").unwrap();

        write_atomic(&target, b"complete").unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"complete");
        assert!(!dir.join("out.bin.partial").exists());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_config_roundtrip() {
        let dir  = scratch_dir("config");
        let ckpt = CheckpointManager::new(&dir);
        let cfg  = TrainConfig { epochs: 7, lr: 0.003, ..TrainConfig::default() };

        ckpt.save_config(&cfg).unwrap();
        assert_eq!(ckpt.load_config().unwrap(), cfg);
        fs::remove_dir_all(&dir).ok();
    }
}
