//
// convert.rs
// Nifti-Rtstruct-rs
//
// Orchestrates mask loading, label remapping, ROI construction, patching, and saving, for a single
// volume or a whole configured batch.
//
// Thales Matheus Mendonça Santos - November 2025

use std::path::{Path, PathBuf};

use chrono::Local;
use ndarray::ArrayView3;
use tracing::{debug, error, info};

use crate::config::{ConversionConfig, DocumentConfig};
use crate::document::StructureSetDocument;
use crate::error::{Error, Result};
use crate::file::{MaskFile, NIFTI_SUFFIX};
use crate::models::{LabelSpec, ResolvedLabel, VolumeType};
use crate::rtstruct::RtStruct;
use crate::scan::MaskDirectory;
use crate::{patch, roi};

/// Write the labels of `volume` as ROIs of the structure set at `output_path`.
///
/// An existing file at `output_path` is extended, otherwise a new structure set referencing the
/// series at `series_path` is created. `description` replaces the series description unless empty.
pub fn convert_masks_to_rtstruct(
    volume: ArrayView3<'_, f64>,
    labels: &[LabelSpec],
    series_path: &Path,
    output_path: &Path,
    description: &str,
) -> Result<Vec<ResolvedLabel>> {
    let mut document = RtStruct::open_or_create(series_path, output_path)?;
    let resolved = roi::build(volume, labels, &mut document)?;
    patch::patch(&mut document, description, Local::now().naive_local())?;
    document.save(output_path)?;
    Ok(resolved)
}

/// Outcome of [`run_batch`]: written outputs and per-document failures.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub converted: Vec<PathBuf>,
    pub failed: Vec<(String, Error)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Convert every document of `config`. A failing document is logged and skipped.
pub fn run_batch(
    config: &ConversionConfig,
    source: &Path,
    series_path: &Path,
    output_dir: &Path,
    description: &str,
) -> BatchReport {
    let mut directory = MaskDirectory::new(source);
    directory.scan();

    let mut report = BatchReport::default();
    for document in &config.documents {
        match convert_document(&directory, document, series_path, output_dir, description) {
            Ok(path) => {
                info!("Converted {} -> {}", document.mask, path.display());
                report.converted.push(path);
            }
            Err(e) => {
                error!("Failed to convert {}: {}", document.mask, e);
                report.failed.push((document.mask.clone(), e));
            }
        }
    }

    info!(
        "Batch finished: {} converted, {} failed",
        report.converted.len(),
        report.failed.len()
    );
    report
}

/// Load, classify, and remap the configured mask, then convert it.
pub fn convert_document(
    directory: &MaskDirectory,
    document: &DocumentConfig,
    series_path: &Path,
    output_dir: &Path,
    description: &str,
) -> Result<PathBuf> {
    let found = directory.find(&document.mask).ok_or_else(|| {
        Error::PathNotFound(
            directory
                .root()
                .join(format!("{}{}", document.mask, NIFTI_SUFFIX)),
        )
    })?;

    // Fresh copy per document: remapping mutates the volume.
    let mut file = MaskFile::new(found.path())?;
    if file.load_header()? != VolumeType::Mask {
        return Err(Error::NotAMask(file.name().to_string()));
    }
    file.load_data()?;

    if let Some(remap) = &document.remap {
        match remap.offset {
            Some(offset) => file.map_values(offset, &remap.table)?,
            None => {
                let offset = file.map_values_auto(&remap.table)?;
                debug!("Remapped {} with computed offset {}", file.name(), offset);
            }
        }
    }

    let output_path = output_dir.join(&document.output);
    let labels = convert_masks_to_rtstruct(
        file.volume()?,
        &document.labels,
        series_path,
        &output_path,
        description,
    )?;
    debug!("{} ROIs written for {}", labels.len(), file.name());

    Ok(output_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RemapConfig;

    fn document(mask: &str) -> DocumentConfig {
        DocumentConfig {
            mask: mask.to_string(),
            output: PathBuf::from("out.dcm"),
            remap: Some(RemapConfig::default()),
            labels: vec![LabelSpec::new("liver")],
        }
    }

    #[test]
    fn unknown_mask_fails_the_document_only() {
        let source = tempfile::tempdir().unwrap();
        let output = tempfile::tempdir().unwrap();
        let config = ConversionConfig {
            series_description: String::new(),
            documents: vec![document("missing"), document("also_missing")],
        };

        let report = run_batch(
            &config,
            source.path(),
            Path::new("/no/series"),
            output.path(),
            "",
        );

        assert!(!report.is_success());
        assert!(report.converted.is_empty());
        assert_eq!(report.failed.len(), 2);
        assert!(matches!(report.failed[0].1, Error::PathNotFound(_)));
        assert_eq!(report.failed[1].0, "also_missing");
    }

    #[test]
    fn empty_batch_succeeds() {
        let source = tempfile::tempdir().unwrap();
        let report = run_batch(
            &ConversionConfig::default(),
            source.path(),
            Path::new("/no/series"),
            source.path(),
            "",
        );
        assert!(report.is_success());
    }
}
