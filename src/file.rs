//
// file.rs
// Nifti-Rtstruct-rs
//
// A discovered NIfTI file: lazy header loading with classification, on-demand voxel loading, and
// in-place remapping of mask labels.
//
// Thales Matheus Mendonça Santos - November 2025

use std::path::{Path, PathBuf};

use ndarray::{Array3, ArrayD, ArrayView3, Axis, Ix3};
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use tracing::info;

use crate::classify::classify_header;
use crate::error::{Error, Result};
use crate::models::{HeaderSummary, RemapTable, VolumeType};
use crate::remap;

/// Suffix of the files handled by the tool.
pub const NIFTI_SUFFIX: &str = ".nii.gz";

/// `NiftiHeader` is a large struct, keep it on the heap.
type BoxedHeader = Box<NiftiHeader>;

#[derive(Debug, Clone)]
pub struct MaskFile {
    path: PathBuf,
    name: String,
    kind: VolumeType,
    header: Option<BoxedHeader>,
    data: Option<Array3<f64>>,
}

impl MaskFile {
    /// Wrap an existing file. Fails with `PathNotFound` when nothing exists at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Err(Error::PathNotFound(path));
        }

        let name = display_name(&path);
        Ok(Self {
            path,
            name,
            kind: VolumeType::Unknown,
            header: None,
            data: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name without the `.nii.gz` suffix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `Unknown` until the header is loaded, or when the bit depth is neither 8 nor 16.
    pub fn kind(&self) -> VolumeType {
        self.kind
    }

    pub fn header(&self) -> Option<&NiftiHeader> {
        self.header.as_deref()
    }

    /// Read the header and classify the file.
    pub fn load_header(&mut self) -> Result<VolumeType> {
        info!("Loading file {}", self.path.display());

        let header = NiftiHeader::from_file(&self.path).map_err(|source| Error::Load {
            path: self.path.clone(),
            source,
        })?;
        self.kind = classify_header(&header);
        self.header = Some(Box::new(header));
        Ok(self.kind)
    }

    /// Read every voxel as `f64`, in NIfTI `(x, y, z)` order. The header must be loaded first.
    pub fn load_data(&mut self) -> Result<()> {
        if self.header.is_none() {
            return Err(Error::NotLoaded(self.name.clone()));
        }
        info!("Loading data for image {}", self.name);

        let obj = ReaderOptions::new()
            .read_file(&self.path)
            .map_err(|source| self.load_error(source))?;
        let data: ArrayD<f64> = obj
            .into_volume()
            .into_ndarray::<f64>()
            .map_err(|source| self.load_error(source))?;

        self.data = Some(into_volume3(data, &self.path)?);
        Ok(())
    }

    pub fn data(&self) -> Option<ArrayView3<'_, f64>> {
        self.data.as_ref().map(|d| d.view())
    }

    pub fn data_mut(&mut self) -> Option<&mut Array3<f64>> {
        self.data.as_mut()
    }

    /// Loaded data, or `NotLoaded`.
    pub fn volume(&self) -> Result<ArrayView3<'_, f64>> {
        self.data().ok_or_else(|| Error::NotLoaded(self.name.clone()))
    }

    /// Apply [`remap::remap`] to the loaded data.
    pub fn map_values(&mut self, offset: i64, table: &RemapTable) -> Result<()> {
        info!("Re-mapping mask values of {}", self.name);
        let name = self.name.clone();
        let data = self.data.as_mut().ok_or(Error::NotLoaded(name))?;
        remap::remap(data, offset, table)
    }

    /// Apply [`remap::remap_auto`] to the loaded data and return the offset used.
    pub fn map_values_auto(&mut self, table: &RemapTable) -> Result<i64> {
        info!("Re-mapping mask values of {}", self.name);
        let name = self.name.clone();
        let data = self.data.as_mut().ok_or(Error::NotLoaded(name))?;
        remap::remap_auto(data, table)
    }

    pub fn summary(&self) -> Result<HeaderSummary> {
        let header = self
            .header()
            .ok_or_else(|| Error::NotLoaded(self.name.clone()))?;
        let ndim = (header.dim[0] as usize).min(7);

        Ok(HeaderSummary {
            bitpix: header.bitpix,
            datatype: header.datatype,
            dimensions: header.dim[1..=ndim].to_vec(),
            voxel_size: header.pixdim[1..=ndim].to_vec(),
            description: String::from_utf8_lossy(&header.descrip)
                .trim_end_matches('\0')
                .trim()
                .to_string(),
            volume_type: self.kind,
        })
    }

    fn load_error(&self, source: nifti::NiftiError) -> Error {
        Error::Load {
            path: self.path.clone(),
            source,
        }
    }
}

fn display_name(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    file_name.replace(NIFTI_SUFFIX, "")
}

/// Drop trailing axes of length one (e.g. a `(x, y, z, 1)` volume) and require three dimensions.
fn into_volume3(data: ArrayD<f64>, path: &Path) -> Result<Array3<f64>> {
    let shape = data.shape().to_vec();
    let squeezable = shape.len() >= 3 && shape[3..].iter().all(|&len| len == 1);
    if !squeezable {
        return Err(Error::UnsupportedShape {
            path: path.to_path_buf(),
            shape,
        });
    }

    let mut data = data;
    while data.ndim() > 3 {
        let last = Axis(data.ndim() - 1);
        data = data.index_axis_move(last, 0);
    }
    data.into_dimensionality::<Ix3>().map_err(|_| Error::UnsupportedShape {
        path: path.to_path_buf(),
        shape,
    })
}
