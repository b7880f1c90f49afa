use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use ndarray::{ArrayView2, ArrayView3, Axis};
use rayon::prelude::*;

/// One traced border in pixel coordinates, `(column, row)` per point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelContour {
    pub points: Vec<(u32, u32)>,
    pub is_hole: bool,
}

/// Every border (outer and hole) of the set pixels of a `(rows, columns)` slice.
///
/// Points follow the traced boundary pixel by pixel; nothing is approximated. The slice is traced
/// inside a one pixel background frame so regions touching the edge are still closed borders.
pub fn slice_contours(mask: ArrayView2<'_, bool>) -> Vec<PixelContour> {
    let (rows, columns) = mask.dim();
    if rows == 0 || columns == 0 || !mask.iter().any(|&v| v) {
        return Vec::new();
    }

    let image = GrayImage::from_fn(columns as u32 + 2, rows as u32 + 2, |x, y| {
        let inside = (1..=columns as u32).contains(&x) && (1..=rows as u32).contains(&y);
        if inside && mask[[y as usize - 1, x as usize - 1]] {
            Luma([255])
        } else {
            Luma([0])
        }
    });

    find_contours::<u32>(&image)
        .into_iter()
        .filter(|c| !c.points.is_empty())
        .map(|c| PixelContour {
            points: c.points.iter().map(|p| (p.x - 1, p.y - 1)).collect(),
            is_hole: c.border_type == BorderType::Hole,
        })
        .collect()
}

/// Contours of every slice of a `(rows, columns, slices)` mask, indexed by slice.
pub fn volume_contours(mask: ArrayView3<'_, bool>) -> Vec<Vec<PixelContour>> {
    let slices: Vec<ArrayView2<'_, bool>> = mask.axis_iter(Axis(2)).collect();
    slices.into_par_iter().map(slice_contours).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    #[test]
    fn empty_slice_has_no_contours() {
        let mask = Array2::from_elem((4, 4), false);
        assert!(slice_contours(mask.view()).is_empty());
    }

    #[test]
    fn square_traces_its_full_boundary() {
        let mut mask = Array2::from_elem((6, 6), false);
        for r in 1..4 {
            for c in 2..5 {
                mask[[r, c]] = true;
            }
        }

        let contours = slice_contours(mask.view());
        assert_eq!(contours.len(), 1);
        assert!(!contours[0].is_hole);

        // 3x3 block: every pixel but the center lies on the border.
        let mut points = contours[0].points.clone();
        points.sort_unstable();
        points.dedup();
        assert_eq!(points.len(), 8);
        assert!(points.iter().all(|&(x, y)| (2..5).contains(&x) && (1..4).contains(&y)));
        assert!(!points.contains(&(3, 2)));
    }

    #[test]
    fn ring_has_an_outer_border_and_a_hole() {
        let mut mask = Array2::from_elem((7, 7), false);
        for r in 1..6 {
            for c in 1..6 {
                mask[[r, c]] = !(r == 3 && c == 3);
            }
        }

        let contours = slice_contours(mask.view());
        assert_eq!(contours.iter().filter(|c| !c.is_hole).count(), 1);
        assert_eq!(contours.iter().filter(|c| c.is_hole).count(), 1);
    }

    #[test]
    fn rows_and_columns_are_not_swapped() {
        // A horizontal bar on row 1: all points share y == 1.
        let mut mask = Array2::from_elem((3, 5), false);
        for c in 0..5 {
            mask[[1, c]] = true;
        }

        let contours = slice_contours(mask.view());
        assert_eq!(contours.len(), 1);
        assert!(contours[0].points.iter().all(|&(_, y)| y == 1));
        assert!(contours[0].points.iter().any(|&(x, _)| x == 4));
    }

    #[test]
    fn full_slice_region_is_one_outer_border() {
        let mask = Array2::from_elem((4, 4), true);

        let contours = slice_contours(mask.view());
        assert_eq!(contours.len(), 1);
        assert!(!contours[0].is_hole);

        let mut points = contours[0].points.clone();
        points.sort_unstable();
        points.dedup();
        // The 12 edge pixels of a 4x4 slice.
        assert_eq!(points.len(), 12);
        assert!(points.contains(&(0, 0)));
        assert!(points.contains(&(3, 3)));
        assert!(!points.contains(&(1, 1)));
    }

    #[test]
    fn corner_pixel_is_an_outer_border() {
        let mut mask = Array2::from_elem((3, 3), false);
        mask[[0, 0]] = true;

        let contours = slice_contours(mask.view());
        assert_eq!(
            contours,
            vec![PixelContour {
                points: vec![(0, 0)],
                is_hole: false,
            }]
        );
    }

    #[test]
    fn filled_volume_has_a_contour_on_every_slice() {
        let mask = Array3::from_elem((4, 4, 2), true);
        let counts: Vec<usize> = volume_contours(mask.view()).iter().map(Vec::len).collect();
        assert_eq!(counts, vec![1, 1]);
    }

    #[test]
    fn volume_contours_keep_slice_order() {
        let mut mask = Array3::from_elem((3, 3, 3), false);
        mask[[1, 1, 0]] = true;
        mask[[0, 0, 2]] = true;
        mask[[2, 2, 2]] = true;

        let contours = volume_contours(mask.view());
        assert_eq!(contours.len(), 3);
        assert_eq!(contours[0].len(), 1);
        assert!(contours[1].is_empty());
        assert_eq!(contours[2].len(), 2);
        assert_eq!(contours[0][0].points, vec![(1, 1)]);
    }
}
