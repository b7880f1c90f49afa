//
// remap.rs
// Nifti-Rtstruct-rs
//
// Collision-safe relabeling of mask volumes: every voxel is first shifted above any remap target,
// then shifted labels are replaced by their new values.
//
// Thales Matheus Mendonça Santos - November 2025

use ndarray::{ArrayBase, DataMut, Dimension};

use crate::error::{Error, Result};
use crate::models::RemapTable;

/// Re-map mask values in place.
///
/// `offset` is added to every voxel, then voxels equal to `old + offset` become `new`.
/// Without the shift, mapping 2 -> 3 and then 3 -> 1 on `[1, 2, 3]` would give `[1, 1, 1]`
/// instead of `[1, 3, 1]`.
///
/// Voxels whose label has no entry in `table` keep `original + offset`; add identity entries to
/// restore them.
///
/// # Errors
///
/// `RemapPrecondition` when `offset` does not exceed the largest label in the volume, or when a
/// new value reaches `offset` (it could then be mistaken for a shifted label still to be mapped).
pub fn remap<S, D>(volume: &mut ArrayBase<S, D>, offset: i64, table: &RemapTable) -> Result<()>
where
    S: DataMut<Elem = f64>,
    D: Dimension,
{
    check_offset(volume, offset, table)?;

    let shift = offset as f64;
    volume.mapv_inplace(|v| v + shift);

    for (&old_value, &new_value) in table {
        let target = (old_value + offset) as f64;
        let replacement = new_value as f64;
        volume.mapv_inplace(|v| if v == target { replacement } else { v });
    }

    Ok(())
}

/// Re-map with the smallest offset that satisfies the preconditions of [`remap`].
pub fn remap_auto<S, D>(volume: &mut ArrayBase<S, D>, table: &RemapTable) -> Result<i64>
where
    S: DataMut<Elem = f64>,
    D: Dimension,
{
    let offset = auto_offset(volume, table);
    remap(volume, offset, table)?;
    Ok(offset)
}

/// One above both the largest label in the volume and the largest new value in the table.
pub fn auto_offset<S, D>(volume: &ArrayBase<S, D>, table: &RemapTable) -> i64
where
    S: ndarray::Data<Elem = f64>,
    D: Dimension,
{
    let max_label = max_label(volume).map_or(0, |m| m.floor() as i64);
    let max_target = table.values().copied().max().unwrap_or(0);
    max_label.max(max_target).max(0) + 1
}

fn max_label<S, D>(volume: &ArrayBase<S, D>) -> Option<f64>
where
    S: ndarray::Data<Elem = f64>,
    D: Dimension,
{
    volume
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
}

fn check_offset<S, D>(volume: &ArrayBase<S, D>, offset: i64, table: &RemapTable) -> Result<()>
where
    S: ndarray::Data<Elem = f64>,
    D: Dimension,
{
    if let Some(max) = max_label(volume) {
        if offset as f64 <= max {
            return Err(Error::RemapPrecondition {
                offset,
                reason: format!("the volume contains label {max}"),
            });
        }
    }

    if let Some((old, new)) = table.iter().find(|&(_, &new)| new >= offset) {
        return Err(Error::RemapPrecondition {
            offset,
            reason: format!("mapping {old} -> {new} targets a value at or above the offset"),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, Array3};

    fn table(entries: &[(i64, i64)]) -> RemapTable {
        entries.iter().copied().collect()
    }

    #[test]
    fn mappings_apply_to_original_labels_only() {
        let mut volume = arr1(&[1.0, 2.0, 3.0]);
        remap(&mut volume, 10, &table(&[(2, 3), (3, 1)])).expect("remap");

        // Label 1 has no entry and stays shifted.
        assert_eq!(volume, arr1(&[11.0, 3.0, 1.0]));
    }

    #[test]
    fn identity_entries_restore_unmapped_labels() {
        let mut volume = arr1(&[0.0, 1.0, 2.0, 3.0, 2.0]);
        remap(&mut volume, 10, &table(&[(0, 0), (1, 1), (2, 3), (3, 2)])).expect("remap");
        assert_eq!(volume, arr1(&[0.0, 1.0, 3.0, 2.0, 3.0]));
    }

    #[test]
    fn cyclic_permutation_is_simultaneous() {
        let mut volume = Array3::from_shape_fn((2, 2, 2), |(i, j, k)| ((i + j + k) % 3 + 1) as f64);
        let original = volume.clone();
        let cycle = table(&[(1, 2), (2, 3), (3, 1)]);

        remap(&mut volume, 4, &cycle).expect("remap");

        for (before, after) in original.iter().zip(volume.iter()) {
            let expected = cycle[&(*before as i64)] as f64;
            assert_eq!(*after, expected);
        }
    }

    #[test]
    fn offset_not_above_max_label_is_rejected() {
        let mut volume = arr1(&[1.0, 2.0, 7.0]);
        let err = remap(&mut volume, 7, &table(&[(1, 2)])).unwrap_err();
        assert!(matches!(err, Error::RemapPrecondition { offset: 7, .. }));
        // Nothing is written when the check fails.
        assert_eq!(volume, arr1(&[1.0, 2.0, 7.0]));
    }

    #[test]
    fn new_value_at_offset_is_rejected() {
        // 1 -> 12 would collide with label 2 shifted by 10.
        let mut volume = arr1(&[1.0, 2.0]);
        let err = remap(&mut volume, 10, &table(&[(1, 12), (2, 5)])).unwrap_err();
        assert!(matches!(err, Error::RemapPrecondition { offset: 10, .. }));
    }

    #[test]
    fn auto_offset_clears_labels_and_targets() {
        let volume = arr1(&[0.0, 4.0, 2.0]);
        assert_eq!(auto_offset(&volume, &table(&[(4, 1)])), 5);
        assert_eq!(auto_offset(&volume, &table(&[(4, 9)])), 10);
    }

    #[test]
    fn remap_auto_returns_the_offset_it_used() {
        let mut volume = arr1(&[1.0, 2.0, 3.0]);
        let offset = remap_auto(&mut volume, &table(&[(1, 1), (2, 3), (3, 2)])).expect("remap");
        assert_eq!(offset, 4);
        assert_eq!(volume, arr1(&[1.0, 3.0, 2.0]));
    }
}
