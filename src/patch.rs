//
// patch.rs
// Nifti-Rtstruct-rs
//
// Post-processing applied to a structure set once all ROIs are added: frame-of-reference repair
// and series-level metadata stamping.
//
// Thales Matheus Mendonça Santos - November 2025

use chrono::NaiveDateTime;

use crate::document::StructureSetDocument;
use crate::error::{Error, Result};

/// Bind every frame-of-reference record and ROI to the reference series, then stamp the series.
///
/// An empty `description` leaves the existing series description untouched.
pub fn patch<D>(document: &mut D, description: &str, now: NaiveDateTime) -> Result<()>
where
    D: StructureSetDocument + ?Sized,
{
    let uid = document
        .reference_frame_of_reference_uid()
        .ok_or(Error::MissingFrameOfReference)?;
    document.rebind_frame_of_reference(&uid);

    if !description.is_empty() {
        document.set_series_description(description);
    }

    let date = now.format("%Y%m%d").to_string();
    let time = now.format("%H%M%S").to_string();
    document.stamp_series_datetime(&date, &time);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ndarray::ArrayView3;
    use std::path::Path;

    struct FakeDocument {
        reference: Option<String>,
        frames: Vec<String>,
        rois: Vec<String>,
        description: String,
        date: String,
        time: String,
    }

    impl FakeDocument {
        fn new(reference: Option<&str>) -> Self {
            Self {
                reference: reference.map(str::to_string),
                frames: vec!["1.2.3".into(), "9.9.9".into()],
                rois: vec!["0.0".into(), "1.2.3".into(), "4.5".into()],
                description: "CT Abdomen".into(),
                date: String::new(),
                time: String::new(),
            }
        }
    }

    impl StructureSetDocument for FakeDocument {
        fn add_roi(
            &mut self,
            _mask: ArrayView3<'_, bool>,
            _color: [u8; 3],
            _name: &str,
            _approximate_contours: bool,
        ) -> Result<()> {
            Ok(())
        }

        fn reference_frame_of_reference_uid(&self) -> Option<String> {
            self.reference.clone()
        }

        fn rebind_frame_of_reference(&mut self, uid: &str) {
            self.frames.iter_mut().for_each(|f| *f = uid.to_string());
            self.rois.iter_mut().for_each(|r| *r = uid.to_string());
        }

        fn set_series_description(&mut self, description: &str) {
            self.description = description.to_string();
        }

        fn stamp_series_datetime(&mut self, date: &str, time: &str) {
            self.date = date.to_string();
            self.time = time.to_string();
        }

        fn save(&self, _path: &Path) -> Result<()> {
            Ok(())
        }
    }

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 11, 3)
            .and_then(|d| d.and_hms_opt(12, 5, 9))
            .expect("valid date")
    }

    #[test]
    fn every_binding_points_at_the_reference_series() {
        let mut doc = FakeDocument::new(Some("7.7.7"));
        patch(&mut doc, "", noon()).expect("patch");

        assert!(doc.frames.iter().all(|f| f == "7.7.7"));
        assert!(doc.rois.iter().all(|r| r == "7.7.7"));
    }

    #[test]
    fn patching_twice_matches_patching_once() {
        let mut once = FakeDocument::new(Some("7.7.7"));
        patch(&mut once, "", noon()).expect("patch");

        let mut twice = FakeDocument::new(Some("7.7.7"));
        patch(&mut twice, "", noon()).expect("patch");
        patch(&mut twice, "", noon()).expect("patch again");

        assert_eq!(once.frames, twice.frames);
        assert_eq!(once.rois, twice.rois);
    }

    #[test]
    fn empty_description_keeps_the_existing_one() {
        let mut doc = FakeDocument::new(Some("7.7.7"));
        patch(&mut doc, "", noon()).expect("patch");
        assert_eq!(doc.description, "CT Abdomen");

        patch(&mut doc, "Auto contours", noon()).expect("patch");
        assert_eq!(doc.description, "Auto contours");
    }

    #[test]
    fn series_date_and_time_use_dicom_formats() {
        let mut doc = FakeDocument::new(Some("7.7.7"));
        patch(&mut doc, "", noon()).expect("patch");
        assert_eq!(doc.date, "20251103");
        assert_eq!(doc.time, "120509");
    }

    #[test]
    fn missing_reference_frame_is_an_error() {
        let mut doc = FakeDocument::new(None);
        assert!(matches!(
            patch(&mut doc, "", noon()),
            Err(Error::MissingFrameOfReference)
        ));
        assert_eq!(doc.frames[1], "9.9.9");
    }
}
