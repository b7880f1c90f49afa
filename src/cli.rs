//
// cli.rs
// Nifti-Rtstruct-rs
//
// Defines the CLI surface with Clap and dispatches user-selected commands to the corresponding modules.
//
// Thales Matheus Mendonça Santos - November 2025

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use crate::config::ConversionConfig;
use crate::convert;
use crate::file::MaskFile;
use crate::scan::MaskDirectory;

/// Command-line interface glue code: defines the available verbs and dispatches to modules.
#[derive(Parser)]
#[command(name = "nifti-rtstruct")]
#[command(about = "Convert NIfTI label masks into DICOM RT Structure Sets", long_about = None)]
pub struct Cli {
    /// Log at DEBUG level
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the .nii.gz files below a directory with their classification
    Scan { directory: PathBuf },
    /// Show the header summary of a NIfTI file
    Info { file: PathBuf },
    /// Convert the masks listed in a configuration file into structure sets
    Convert {
        /// Directory holding the .nii.gz masks
        #[arg(short, long)]
        source: PathBuf,
        /// Directory holding the reference DICOM series
        #[arg(long)]
        series: PathBuf,
        /// JSON conversion configuration
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output_dir: PathBuf,
        /// Overrides the configured series description
        #[arg(short, long)]
        description: Option<String>,
    },
}

pub fn run() -> anyhow::Result<()> {
    run_with(Cli::parse())
}

pub fn run_with(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Scan { directory } => {
            let mut dir = MaskDirectory::new(&directory);
            dir.scan();
            for file in dir.files() {
                let mut file = file.clone();
                match file.load_header() {
                    Ok(kind) => println!("{:<8} {}", kind.to_string(), file.path().display()),
                    Err(e) => println!("{:<8} {} ({})", "ERROR", file.path().display(), e),
                }
            }
        }
        Commands::Info { file } => {
            let mut mask = MaskFile::new(&file)?;
            mask.load_header()
                .with_context(|| format!("Failed to read header of {:?}", file))?;
            let summary = mask.summary()?;
            println!("File: {}", mask.path().display());
            println!("  Type: {}", summary.volume_type);
            println!("  Bit depth: {}", summary.bitpix);
            println!("  Datatype: {}", summary.datatype);
            println!("  Dimensions: {:?}", summary.dimensions);
            println!("  Voxel size: {:?}", summary.voxel_size);
            if !summary.description.is_empty() {
                println!("  Description: {}", summary.description);
            }
        }
        Commands::Convert {
            source,
            series,
            config,
            output_dir,
            description,
        } => {
            let config = ConversionConfig::load(&config)
                .with_context(|| format!("Failed to load configuration {:?}", config))?;
            let description = description.unwrap_or_else(|| config.series_description.clone());

            let report = convert::run_batch(&config, &source, &series, &output_dir, &description);
            for path in &report.converted {
                println!("Written: {}", path.display());
            }
            if !report.is_success() {
                bail!(
                    "{} of {} documents failed",
                    report.failed.len(),
                    config.documents.len()
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_arguments_parse() {
        let cli = Cli::try_parse_from([
            "nifti-rtstruct",
            "--verbose",
            "convert",
            "--source",
            "masks",
            "--series",
            "ct",
            "--config",
            "config.json",
            "--output-dir",
            "out",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Convert {
                source,
                description,
                ..
            } => {
                assert_eq!(source, PathBuf::from("masks"));
                assert!(description.is_none());
            }
            _ => panic!("expected convert"),
        }
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["nifti-rtstruct", "scan", "masks", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Scan { .. }));
    }
}
