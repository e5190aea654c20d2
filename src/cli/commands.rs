// ============================================================
// Layer 1 — Training Arguments
// ============================================================
// The four hyperparameters an operator may change per run.
// Everything else (corpus location, model sizes, vocabulary
// limits) is fixed in TrainConfig::default().
//
// Flags are spelled the way the training scripts have always
// spelled them: -epochs, -batch_size, -lr, -grad_clip.
// See normalize_flags() in cli/mod.rs for the single-dash form.

use clap::Args;
use crate::application::train_use_case::TrainConfig;

/// Hyperparameters accepted on the command line.
#[derive(Args, Debug, Clone)]
pub struct TrainArgs {
    /// Number of epochs for training
    #[arg(long = "epochs", default_value_t = 100, value_parser = parse_positive_usize)]
    pub epochs: usize,

    /// Number of sentence pairs per batch
    #[arg(long = "batch_size", alias = "batch-size", default_value_t = 32,
          value_parser = parse_positive_usize)]
    pub batch_size: usize,

    /// Initial learning rate for Adam
    #[arg(long = "lr", default_value_t = 0.0001, value_parser = parse_positive_f64)]
    pub lr: f64,

    /// Maximum global gradient norm, guards against gradient explosion
    #[arg(long = "grad_clip", alias = "grad-clip", default_value_t = 10.0,
          value_parser = parse_positive_f64)]
    pub grad_clip: f64,
}

/// Overlay the CLI hyperparameters on the fixed run defaults.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            epochs:     a.epochs,
            batch_size: a.batch_size,
            lr:         a.lr,
            grad_clip:  a.grad_clip,
            ..TrainConfig::default()
        }
    }
}

fn parse_positive_usize(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a non-negative integer"))?;
    if value == 0 {
        return Err("must be at least 1".to_string());
    }
    Ok(value)
}

fn parse_positive_f64(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{s}' is not a number"))?;
    if !value.is_finite() || value <= 0.0 {
        return Err("must be a finite number greater than 0".to_string());
    }
    Ok(value)
}
