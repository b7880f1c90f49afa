//
// lib.rs
// Nifti-Rtstruct-rs
//
// Exposes the crate's modules and re-exports the CLI entry point for both binary and library consumers.
//
// Thales Matheus Mendonça Santos - November 2025

// Loading and classification of NIfTI volumes, label transforms, and structure set writing.
pub mod classify;
pub mod cli;
pub mod color;
pub mod config;
pub mod contour;
pub mod convert;
pub mod dicom_access;
pub mod document;
pub mod error;
pub mod file;
pub mod models;
pub mod patch;
pub mod remap;
pub mod roi;
pub mod rtstruct;
pub mod scan;
pub mod series;
pub mod uid;

pub use cli::{run as run_cli, Cli, Commands};
pub use convert::convert_masks_to_rtstruct;
pub use error::{Error, Result};
