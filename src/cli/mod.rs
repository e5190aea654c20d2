// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses the hyperparameters with clap and hands them to the
// training use case. This layer only routes; it never computes.
//
// clap only understands long flags with two dashes, so the
// classic single-dash spelling (-epochs 10) is rewritten to
// --epochs 10 before parsing.

pub mod commands;

use std::ffi::OsString;

use anyhow::Result;
use clap::Parser;
use commands::TrainArgs;

use crate::application::shutdown::ShutdownSignal;

/// Long flag names that may be written with a single dash.
const LONG_FLAGS: [&str; 4] = ["epochs", "batch_size", "lr", "grad_clip"];

/// Command line for one training run.
#[derive(Parser, Debug)]
#[command(
    name = "seq2seq-nmt",
    version,
    about = "Train a GRU encoder-decoder with attention on a parallel corpus."
)]
pub struct Cli {
    #[command(flatten)]
    pub train: TrainArgs,
}

impl Cli {
    /// Install the interrupt handler and run one full training job.
    pub fn run(self) -> Result<()> {
        use crate::application::train_use_case::TrainUseCase;

        let shutdown = ShutdownSignal::install()?;
        let use_case = TrainUseCase::new(self.train.into());
        let report   = use_case.execute(&shutdown)?;

        match report.best_val_loss {
            Some(best) => println!(
                "Training complete. Best val_loss {:.3}, test_loss {:.3}.",
                best, report.test_loss
            ),
            None => println!("Training complete. test_loss {:.3}.", report.test_loss),
        }
        Ok(())
    }
}

/// Rewrite `-epochs 5` / `-lr=0.1` into `--epochs 5` / `--lr=0.1`.
/// Anything that is not one of LONG_FLAGS passes through unchanged.
pub fn normalize_flags<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            let Some(s) = arg.to_str() else { return arg };
            let Some(rest) = s.strip_prefix('-') else { return arg };
            if rest.starts_with('-') {
                return arg;
            }
            let name = rest.split('=').next().unwrap_or(rest);
            if LONG_FLAGS.contains(&name) {
                OsString::from(format!("-{s}"))
            } else {
                arg
            }
        })
        .collect()
}
