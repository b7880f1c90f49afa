//
// models.rs
// Nifti-Rtstruct-rs
//
// Defines serializable data structures for volume classification, label metadata, and header summaries.
//
// Thales Matheus Mendonça Santos - November 2025

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// 8-bit RGB display color.
pub type Rgb = [u8; 3];

/// Old label -> new label. Entries are applied against the original labeling, never cascaded.
pub type RemapTable = BTreeMap<i64, i64>;

/// Content type of a NIfTI file, derived from its per-voxel bit depth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeType {
    Mask,
    Image,
    #[default]
    Unknown,
}

impl fmt::Display for VolumeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VolumeType::Mask => write!(f, "MASK"),
            VolumeType::Image => write!(f, "IMAGE"),
            VolumeType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Metadata for one label of a mask volume that should become an ROI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSpec {
    pub key: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub color: Option<Rgb>,
    #[serde(default)]
    pub value: Option<i64>,
}

impl LabelSpec {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            display_name: None,
            color: None,
            value: None,
        }
    }
}

/// A label with every optional field settled, ready to be submitted as an ROI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedLabel {
    pub key: String,
    pub name: String,
    pub value: i64,
    pub color: Rgb,
}

/// Header fields shown by the `info` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderSummary {
    pub bitpix: i16,
    pub datatype: i16,
    pub dimensions: Vec<u16>,
    pub voxel_size: Vec<f32>,
    pub description: String,
    pub volume_type: VolumeType,
}
