//
// config.rs
// Nifti-Rtstruct-rs
//
// JSON description of a conversion batch: which masks become which structure sets, with which labels.
//
// Thales Matheus Mendonça Santos - November 2025

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{LabelSpec, RemapTable};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Stamped on every produced document; empty keeps the copied description.
    #[serde(default)]
    pub series_description: String,
    #[serde(default)]
    pub documents: Vec<DocumentConfig>,
}

/// One output structure set built from one mask volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    /// Display name of the mask, i.e. its file name without `.nii.gz`.
    pub mask: String,
    /// Output file, relative to the output directory.
    pub output: PathBuf,
    #[serde(default)]
    pub remap: Option<RemapConfig>,
    #[serde(default)]
    pub labels: Vec<LabelSpec>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemapConfig {
    /// Temporary offset; computed from the volume when omitted.
    #[serde(default)]
    pub offset: Option<i64>,
    /// Old label -> new label. JSON object keys are the old labels as strings.
    #[serde(default)]
    pub table: RemapTable,
}

impl ConversionConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content).map_err(|source| Error::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(content: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_full_document_entry() {
        let config = ConversionConfig::from_json(
            r#"{
                "series_description": "Auto contours",
                "documents": [{
                    "mask": "patient01_labels",
                    "output": "patient01_rtstruct.dcm",
                    "remap": { "offset": 100, "table": { "1": 1, "2": 3, "3": 2 } },
                    "labels": [
                        { "key": "liver", "display_name": "Liver", "color": [255, 0, 0], "value": 1 },
                        { "key": "spleen" }
                    ]
                }]
            }"#,
        )
        .unwrap();

        assert_eq!(config.series_description, "Auto contours");
        let doc = &config.documents[0];
        assert_eq!(doc.mask, "patient01_labels");
        assert_eq!(doc.output, PathBuf::from("patient01_rtstruct.dcm"));

        let remap = doc.remap.as_ref().unwrap();
        assert_eq!(remap.offset, Some(100));
        assert_eq!(remap.table.get(&2), Some(&3));

        assert_eq!(doc.labels.len(), 2);
        assert_eq!(doc.labels[0].color, Some([255, 0, 0]));
        assert_eq!(doc.labels[1].key, "spleen");
        assert_eq!(doc.labels[1].value, None);
    }

    #[test]
    fn optional_sections_default() {
        let config =
            ConversionConfig::from_json(r#"{"documents":[{"mask":"m","output":"o.dcm"}]}"#)
                .unwrap();
        assert!(config.series_description.is_empty());
        assert!(config.documents[0].remap.is_none());
        assert!(config.documents[0].labels.is_empty());
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = ConversionConfig::load(&path).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
