//
// series.rs
// Nifti-Rtstruct-rs
//
// Loads the reference image series a structure set is anchored to, sorted along the slice normal,
// and maps pixel indices to patient coordinates.
//
// Thales Matheus Mendonça Santos - November 2025

use std::path::{Path, PathBuf};

use dicom_dictionary_std::tags;
use dicom_object::{InMemDicomObject, OpenFileOptions};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::dicom_access::ElementAccess;
use crate::error::{Error, Result};

/// Geometry and identity of one image of the reference series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSlice {
    pub path: PathBuf,
    pub sop_class_uid: String,
    pub sop_instance_uid: String,
    pub frame_of_reference_uid: Option<String>,
    pub rows: u32,
    pub columns: u32,
    /// ImagePositionPatient, the center of the first transmitted pixel.
    pub position: [f64; 3],
    /// ImageOrientationPatient: row direction cosines, then column direction cosines.
    pub orientation: [f64; 6],
    /// PixelSpacing: spacing between rows, then between columns.
    pub pixel_spacing: [f64; 2],
}

impl SeriesSlice {
    fn from_object(obj: &InMemDicomObject, path: &Path) -> Option<Self> {
        let position = fixed::<3>(obj.element_f64s(tags::IMAGE_POSITION_PATIENT)?)?;
        let orientation = obj
            .element_f64s(tags::IMAGE_ORIENTATION_PATIENT)
            .and_then(fixed::<6>)
            .unwrap_or([1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        let pixel_spacing = obj
            .element_f64s(tags::PIXEL_SPACING)
            .and_then(fixed::<2>)
            .unwrap_or([1.0, 1.0]);

        Some(Self {
            path: path.to_path_buf(),
            sop_class_uid: obj.element_str(tags::SOP_CLASS_UID)?,
            sop_instance_uid: obj.element_str(tags::SOP_INSTANCE_UID)?,
            frame_of_reference_uid: obj.element_str(tags::FRAME_OF_REFERENCE_UID),
            rows: obj.element_u32(tags::ROWS)?,
            columns: obj.element_u32(tags::COLUMNS)?,
            position,
            orientation,
            pixel_spacing,
        })
    }

    /// Unit normal of the image plane (row direction x column direction).
    pub fn normal(&self) -> [f64; 3] {
        let [rx, ry, rz, cx, cy, cz] = self.orientation;
        [ry * cz - rz * cy, rz * cx - rx * cz, rx * cy - ry * cx]
    }

    /// Position of the slice along its normal.
    pub fn location(&self) -> f64 {
        let n = self.normal();
        self.position.iter().zip(n).map(|(p, n)| p * n).sum()
    }

    /// Patient coordinates (mm) of the pixel at column `x`, row `y`.
    pub fn to_patient(&self, x: f64, y: f64) -> [f64; 3] {
        let [rx, ry, rz, cx, cy, cz] = self.orientation;
        let [row_spacing, column_spacing] = self.pixel_spacing;
        let (dx, dy) = (x * column_spacing, y * row_spacing);
        [
            self.position[0] + dx * rx + dy * cx,
            self.position[1] + dx * ry + dy * cy,
            self.position[2] + dx * rz + dy * cz,
        ]
    }
}

/// The reference image series, sorted by slice location (ascending).
#[derive(Debug, Clone)]
pub struct ReferenceSeries {
    path: PathBuf,
    slices: Vec<SeriesSlice>,
    /// Dataset of the first slice, source of patient and study attributes.
    first: InMemDicomObject,
}

impl ReferenceSeries {
    /// Read every DICOM image below `path`. Files that do not parse, or carry no image
    /// position, are skipped.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::PathNotFound(path.to_path_buf()));
        }
        info!("Loading reference series {}", path.display());

        let mut images: Vec<(SeriesSlice, InMemDicomObject)> = WalkDir::new(path)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                let obj = OpenFileOptions::new()
                    .read_until(tags::PIXEL_DATA)
                    .open_file(e.path())
                    .map_err(|err| debug!("Skipping {}: {}", e.path().display(), err))
                    .ok()?
                    .into_inner();
                let slice = SeriesSlice::from_object(&obj, e.path())?;
                Some((slice, obj))
            })
            .collect();

        if images.is_empty() {
            return Err(Error::Series {
                path: path.to_path_buf(),
                reason: "no DICOM images with an image position were found".to_string(),
            });
        }

        images.sort_by(|a, b| a.0.location().total_cmp(&b.0.location()));
        let first = images[0].1.clone();
        let slices = images.into_iter().map(|(slice, _)| slice).collect::<Vec<_>>();
        info!("Reference series has {} slices", slices.len());

        Ok(Self {
            path: path.to_path_buf(),
            slices,
            first,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn slices(&self) -> &[SeriesSlice] {
        &self.slices
    }

    pub fn first_dataset(&self) -> &InMemDicomObject {
        &self.first
    }

    /// `(rows, columns, slices)`, the shape ROI masks must have.
    pub fn mask_shape(&self) -> [usize; 3] {
        let first = &self.slices[0];
        [first.rows as usize, first.columns as usize, self.slices.len()]
    }

    pub fn frame_of_reference_uid(&self) -> Option<&str> {
        self.slices[0].frame_of_reference_uid.as_deref()
    }

    pub fn study_instance_uid(&self) -> Option<String> {
        self.first.element_str(tags::STUDY_INSTANCE_UID)
    }

    pub fn series_instance_uid(&self) -> Option<String> {
        self.first.element_str(tags::SERIES_INSTANCE_UID)
    }
}

fn fixed<const N: usize>(values: Vec<f64>) -> Option<[f64; N]> {
    values.get(..N)?.try_into().ok()
}
