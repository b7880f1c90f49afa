//
// error.rs
// Nifti-Rtstruct-rs
//
// Error taxonomy shared by the loading, remapping, and structure-set layers of the library.
//
// Thales Matheus Mendonça Santos - November 2025

use std::path::PathBuf;

use thiserror::Error;

/// Boxed source for errors coming from the DICOM stack, whose concrete types vary per call site.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("Failed to load NIfTI file {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: nifti::NiftiError,
    },

    #[error("Unsupported volume shape {shape:?} in {path} (expected 3 spatial dimensions)")]
    UnsupportedShape { path: PathBuf, shape: Vec<usize> },

    #[error("Header or data of {0} has not been loaded")]
    NotLoaded(String),

    #[error("{0} is not classified as a mask volume")]
    NotAMask(String),

    #[error("Remap offset {offset} is not safe: {reason}")]
    RemapPrecondition { offset: i64, reason: String },

    #[error("Invalid reference series {path}: {reason}")]
    Series { path: PathBuf, reason: String },

    #[error("Reference series has no FrameOfReferenceUID on its first slice")]
    MissingFrameOfReference,

    #[error("Failed to read structure set {path}: {source}")]
    DocumentRead {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("Mask shape {found:?} does not match reference series shape {expected:?}")]
    MaskShape {
        expected: [usize; 3],
        found: [usize; 3],
    },

    #[error("Failed to write structure set {path}: {source}")]
    DocumentWrite {
        path: PathBuf,
        #[source]
        source: BoxError,
    },

    #[error("Invalid configuration {path}: {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
