//
// roi.rs
// Nifti-Rtstruct-rs
//
// Turns label metadata into resolved ROI records and submits one boolean region per label to a
// structure-set document.
//
// Thales Matheus Mendonça Santos - November 2025

use ndarray::{Array3, ArrayView3};

use crate::color::{self, Palette, Rainbow};
use crate::document::StructureSetDocument;
use crate::error::Result;
use crate::models::{LabelSpec, ResolvedLabel};

/// Settle name, value, and color for every spec, in order.
///
/// A spec without a value takes its position in `specs`; a spec without a display name uses its
/// key; a spec without a color gets one derived from its key.
pub fn resolve_labels(specs: &[LabelSpec], palette: &dyn Palette) -> Vec<ResolvedLabel> {
    specs
        .iter()
        .enumerate()
        .map(|(index, spec)| ResolvedLabel {
            key: spec.key.clone(),
            name: spec.display_name.clone().unwrap_or_else(|| spec.key.clone()),
            value: spec.value.unwrap_or(index as i64),
            color: color::resolve(spec.color, &spec.key, palette),
        })
        .collect()
}

/// Voxels equal to `value`, with the first two axes swapped: `(x, y, z)` becomes `(y, x, z)`.
///
/// NIfTI volumes are stored column-first; structure sets expect `(row, column, slice)`.
pub fn region_mask(volume: ArrayView3<'_, f64>, value: i64) -> Array3<bool> {
    let target = value as f64;
    volume
        .mapv(|v| v == target)
        .permuted_axes([1, 0, 2])
        .as_standard_layout()
        .into_owned()
}

/// Add one ROI per spec to `document`, in spec order, with exact contours.
pub fn build<D>(
    volume: ArrayView3<'_, f64>,
    specs: &[LabelSpec],
    document: &mut D,
) -> Result<Vec<ResolvedLabel>>
where
    D: StructureSetDocument + ?Sized,
{
    build_with_palette(volume, specs, document, &Rainbow)
}

pub fn build_with_palette<D>(
    volume: ArrayView3<'_, f64>,
    specs: &[LabelSpec],
    document: &mut D,
    palette: &dyn Palette,
) -> Result<Vec<ResolvedLabel>>
where
    D: StructureSetDocument + ?Sized,
{
    let labels = resolve_labels(specs, palette);

    for label in &labels {
        let mask = region_mask(volume, label.value);
        document.add_roi(mask.view(), label.color, &label.name, false)?;
    }

    Ok(labels)
}
