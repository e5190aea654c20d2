#![allow(dead_code)]
#![recursion_limit = "256"]

mod cli;
mod application;
mod domain;
mod data;
mod ml;
mod infra;

use std::process::ExitCode;

use clap::Parser;
use cli::Cli;
use domain::errors::Interrupted;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("seq2seq_nmt=info".parse().expect("static directive")),
        )
        .init();

    let cli = Cli::parse_from(cli::normalize_flags(std::env::args_os()));

    match cli.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) if err.is::<Interrupted>() => {
            println!("[STOP] {err}");
            ExitCode::from(130)
        }
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        }
    }
}
