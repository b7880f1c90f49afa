//
// main.rs
// Nifti-Rtstruct-rs
//
// Entry point: installs the log subscriber and hands off execution to the CLI layer.
//
// Thales Matheus Mendonça Santos - November 2025

use clap::Parser;
use nifti_rtstruct::cli::{self, Cli};
use tracing::Level;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    cli::run_with(cli)
}
