use std::path::Path;

use ndarray::ArrayView3;

use crate::error::Result;
use crate::models::Rgb;

/// A structure-set document that accumulates ROIs for one reference image series.
///
/// ROI building and post-processing only go through this trait, so the DICOM encoding stays an
/// implementation detail of [`crate::rtstruct::RtStruct`].
pub trait StructureSetDocument {
    /// Add one ROI. `mask` is indexed `(row, column, slice)` in reference series order.
    fn add_roi(
        &mut self,
        mask: ArrayView3<'_, bool>,
        color: Rgb,
        name: &str,
        approximate_contours: bool,
    ) -> Result<()>;

    /// Frame of reference of the first slice of the reference series.
    fn reference_frame_of_reference_uid(&self) -> Option<String>;

    /// Point every frame-of-reference record and every ROI at `uid`.
    fn rebind_frame_of_reference(&mut self, uid: &str);

    fn set_series_description(&mut self, description: &str);

    /// `date` is `YYYYMMDD`, `time` is `HHMMSS`.
    fn stamp_series_datetime(&mut self, date: &str, time: &str);

    fn save(&self, path: &Path) -> Result<()>;
}
