//
// rtstruct.rs
// Nifti-Rtstruct-rs
//
// Builds, extends, and writes DICOM RT Structure Set files whose ROIs reference an image series.
//
// Thales Matheus Mendonça Santos - November 2025

use std::fs;
use std::path::Path;

use chrono::Local;
use dicom_core::value::DataSetSequence;
use dicom_core::{DataElement, PrimitiveValue, Tag, VR};
use dicom_dictionary_std::{tags, StandardDataDictionary};
use dicom_object::mem::InMemElement;
use dicom_object::{open_file, FileDicomObject, FileMetaTableBuilder, InMemDicomObject};
use dicom::transfer_syntax::entries::EXPLICIT_VR_LITTLE_ENDIAN;
use ndarray::ArrayView3;
use tracing::{info, warn};

use crate::contour::{self, PixelContour};
use crate::dicom_access::ElementAccess;
use crate::document::StructureSetDocument;
use crate::error::{BoxError, Error, Result};
use crate::models::Rgb;
use crate::series::{ReferenceSeries, SeriesSlice};
use crate::uid::generate_uid;

/// RT Structure Set Storage.
pub const RT_STRUCTURE_SET_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.481.3";
/// Detached Study Management, the class referenced by RTReferencedStudySequence items.
const DETACHED_STUDY_MANAGEMENT: &str = "1.2.840.10008.3.1.2.3.1";
const MANUFACTURER: &str = "nifti-rtstruct";

// RT Structure Set module attributes (group 3006).
pub const STRUCTURE_SET_LABEL: Tag = Tag(0x3006, 0x0002);
pub const STRUCTURE_SET_DATE: Tag = Tag(0x3006, 0x0008);
pub const STRUCTURE_SET_TIME: Tag = Tag(0x3006, 0x0009);
pub const REFERENCED_FRAME_OF_REFERENCE_SEQUENCE: Tag = Tag(0x3006, 0x0010);
pub const RT_REFERENCED_STUDY_SEQUENCE: Tag = Tag(0x3006, 0x0012);
pub const RT_REFERENCED_SERIES_SEQUENCE: Tag = Tag(0x3006, 0x0014);
pub const CONTOUR_IMAGE_SEQUENCE: Tag = Tag(0x3006, 0x0016);
pub const STRUCTURE_SET_ROI_SEQUENCE: Tag = Tag(0x3006, 0x0020);
pub const ROI_NUMBER: Tag = Tag(0x3006, 0x0022);
pub const REFERENCED_FRAME_OF_REFERENCE_UID: Tag = Tag(0x3006, 0x0024);
pub const ROI_NAME: Tag = Tag(0x3006, 0x0026);
pub const ROI_DISPLAY_COLOR: Tag = Tag(0x3006, 0x002A);
pub const ROI_GENERATION_ALGORITHM: Tag = Tag(0x3006, 0x0036);
pub const ROI_CONTOUR_SEQUENCE: Tag = Tag(0x3006, 0x0039);
pub const CONTOUR_SEQUENCE: Tag = Tag(0x3006, 0x0040);
pub const CONTOUR_GEOMETRIC_TYPE: Tag = Tag(0x3006, 0x0042);
pub const NUMBER_OF_CONTOUR_POINTS: Tag = Tag(0x3006, 0x0046);
pub const CONTOUR_DATA: Tag = Tag(0x3006, 0x0050);
pub const RT_ROI_OBSERVATIONS_SEQUENCE: Tag = Tag(0x3006, 0x0080);
pub const OBSERVATION_NUMBER: Tag = Tag(0x3006, 0x0082);
pub const REFERENCED_ROI_NUMBER: Tag = Tag(0x3006, 0x0084);
pub const RT_ROI_INTERPRETED_TYPE: Tag = Tag(0x3006, 0x00A4);
pub const ROI_INTERPRETER: Tag = Tag(0x3006, 0x00A6);

/// Patient and study attributes copied from the reference series.
const COPIED_FROM_SERIES: [Tag; 11] = [
    tags::PATIENT_NAME,
    tags::PATIENT_ID,
    tags::PATIENT_BIRTH_DATE,
    tags::PATIENT_SEX,
    tags::STUDY_INSTANCE_UID,
    tags::STUDY_DATE,
    tags::STUDY_TIME,
    tags::STUDY_ID,
    tags::ACCESSION_NUMBER,
    tags::REFERRING_PHYSICIAN_NAME,
    tags::STUDY_DESCRIPTION,
];

/// An RT Structure Set under construction.
///
/// The four ROI-related sequences are kept as item lists and only folded into the dataset on
/// [`RtStruct::save`].
#[derive(Debug, Clone)]
pub struct RtStruct {
    series: ReferenceSeries,
    dataset: InMemDicomObject,
    frames_of_reference: Vec<InMemDicomObject>,
    structure_set_rois: Vec<InMemDicomObject>,
    roi_contours: Vec<InMemDicomObject>,
    observations: Vec<InMemDicomObject>,
}

impl RtStruct {
    /// Start an empty structure set for the series at `series_path`.
    pub fn create_new(series_path: &Path) -> Result<Self> {
        let series = ReferenceSeries::load(series_path)?;
        let dataset = base_dataset(&series);
        let frames_of_reference = vec![frame_of_reference_item(&series)];

        Ok(Self {
            series,
            dataset,
            frames_of_reference,
            structure_set_rois: Vec::new(),
            roi_contours: Vec::new(),
            observations: Vec::new(),
        })
    }

    /// Continue an existing structure set file; new ROIs are appended to its sequences.
    pub fn create_from(series_path: &Path, rtstruct_path: &Path) -> Result<Self> {
        let series = ReferenceSeries::load(series_path)?;
        let read_error = |source: BoxError| Error::DocumentRead {
            path: rtstruct_path.to_path_buf(),
            source,
        };

        let mut dataset = open_file(rtstruct_path)
            .map_err(|e| read_error(Box::new(e)))?
            .into_inner();

        let sop_class = dataset.element_str(tags::SOP_CLASS_UID).unwrap_or_default();
        if sop_class != RT_STRUCTURE_SET_STORAGE {
            return Err(read_error(
                format!("SOP class {sop_class:?} is not RT Structure Set Storage").into(),
            ));
        }

        let frames_of_reference = take_sequence(&mut dataset, REFERENCED_FRAME_OF_REFERENCE_SEQUENCE);
        let structure_set_rois = take_sequence(&mut dataset, STRUCTURE_SET_ROI_SEQUENCE);
        let roi_contours = take_sequence(&mut dataset, ROI_CONTOUR_SEQUENCE);
        let observations = take_sequence(&mut dataset, RT_ROI_OBSERVATIONS_SEQUENCE);

        info!(
            "Appending to {} ({} existing ROIs)",
            rtstruct_path.display(),
            structure_set_rois.len()
        );

        Ok(Self {
            series,
            dataset,
            frames_of_reference,
            structure_set_rois,
            roi_contours,
            observations,
        })
    }

    /// `create_from` when `output_path` already exists, `create_new` otherwise.
    pub fn open_or_create(series_path: &Path, output_path: &Path) -> Result<Self> {
        if output_path.is_file() {
            Self::create_from(series_path, output_path)
        } else {
            Self::create_new(series_path)
        }
    }

    pub fn series(&self) -> &ReferenceSeries {
        &self.series
    }

    pub fn dataset(&self) -> &InMemDicomObject {
        &self.dataset
    }

    pub fn roi_names(&self) -> Vec<String> {
        self.structure_set_rois
            .iter()
            .filter_map(|item| item.element_str(ROI_NAME))
            .collect()
    }

    pub fn roi_numbers(&self) -> Vec<u32> {
        self.structure_set_rois
            .iter()
            .filter_map(|item| item.element_u32(ROI_NUMBER))
            .collect()
    }

    /// FrameOfReferenceUID of every ReferencedFrameOfReferenceSequence item.
    pub fn frame_of_reference_uids(&self) -> Vec<String> {
        self.frames_of_reference
            .iter()
            .filter_map(|item| item.element_str(tags::FRAME_OF_REFERENCE_UID))
            .collect()
    }

    /// ReferencedFrameOfReferenceUID of every StructureSetROISequence item.
    pub fn roi_frame_of_reference_uids(&self) -> Vec<String> {
        self.structure_set_rois
            .iter()
            .filter_map(|item| item.element_str(REFERENCED_FRAME_OF_REFERENCE_UID))
            .collect()
    }

    /// Number of contours stored for the ROI at `index` (in sequence order).
    pub fn contour_count(&self, index: usize) -> Option<usize> {
        self.roi_contours
            .get(index)
            .map(|item| item.sequence_items(CONTOUR_SEQUENCE).len())
    }

    /// ObservationNumber of every RTROIObservationsSequence item.
    pub fn observation_numbers(&self) -> Vec<u32> {
        self.observations
            .iter()
            .filter_map(|item| item.element_u32(OBSERVATION_NUMBER))
            .collect()
    }

    fn next_roi_number(&self) -> u32 {
        self.roi_numbers().into_iter().max().unwrap_or(0) + 1
    }

    fn next_observation_number(&self) -> u32 {
        self.observation_numbers().into_iter().max().unwrap_or(0) + 1
    }

    fn contour_items(&self, contours: Vec<Vec<PixelContour>>) -> Vec<InMemDicomObject> {
        self.series
            .slices()
            .iter()
            .zip(contours)
            .flat_map(|(slice, slice_contours)| {
                slice_contours
                    .into_iter()
                    .map(move |contour| contour_item(slice, &contour))
            })
            .collect()
    }
}

impl StructureSetDocument for RtStruct {
    fn add_roi(
        &mut self,
        mask: ArrayView3<'_, bool>,
        color: Rgb,
        name: &str,
        approximate_contours: bool,
    ) -> Result<()> {
        let expected = self.series.mask_shape();
        let (rows, columns, slices) = mask.dim();
        let found = [rows, columns, slices];
        if found != expected {
            return Err(Error::MaskShape { expected, found });
        }
        if approximate_contours {
            warn!("Contour approximation is not supported, storing exact contours for {name}");
        }

        let number = self.next_roi_number();
        let observation = self.next_observation_number();
        let frame_uid = self
            .series
            .frame_of_reference_uid()
            .unwrap_or_default()
            .to_string();

        let contours = self.contour_items(contour::volume_contours(mask));
        info!("Adding ROI {number} {name:?} with {} contours", contours.len());

        self.structure_set_rois
            .push(InMemDicomObject::from_element_iter([
                text(ROI_NUMBER, VR::IS, &number.to_string()),
                text(REFERENCED_FRAME_OF_REFERENCE_UID, VR::UI, &frame_uid),
                text(ROI_NAME, VR::LO, name),
                text(ROI_GENERATION_ALGORITHM, VR::CS, "MANUAL"),
            ]));

        self.roi_contours.push(InMemDicomObject::from_element_iter([
            texts(ROI_DISPLAY_COLOR, VR::IS, color.iter().map(|c| c.to_string()).collect()),
            sequence(CONTOUR_SEQUENCE, contours),
            text(REFERENCED_ROI_NUMBER, VR::IS, &number.to_string()),
        ]));

        self.observations.push(InMemDicomObject::from_element_iter([
            text(OBSERVATION_NUMBER, VR::IS, &observation.to_string()),
            text(REFERENCED_ROI_NUMBER, VR::IS, &number.to_string()),
            text(RT_ROI_INTERPRETED_TYPE, VR::CS, ""),
            text(ROI_INTERPRETER, VR::PN, ""),
        ]));

        Ok(())
    }

    fn reference_frame_of_reference_uid(&self) -> Option<String> {
        self.series.frame_of_reference_uid().map(str::to_string)
    }

    fn rebind_frame_of_reference(&mut self, uid: &str) {
        for item in &mut self.frames_of_reference {
            item.put(text(tags::FRAME_OF_REFERENCE_UID, VR::UI, uid));
        }
        for item in &mut self.structure_set_rois {
            item.put(text(REFERENCED_FRAME_OF_REFERENCE_UID, VR::UI, uid));
        }
    }

    fn set_series_description(&mut self, description: &str) {
        self.dataset
            .put(text(tags::SERIES_DESCRIPTION, VR::LO, description));
    }

    fn stamp_series_datetime(&mut self, date: &str, time: &str) {
        self.dataset.put(text(tags::SERIES_DATE, VR::DA, date));
        self.dataset.put(text(tags::SERIES_TIME, VR::TM, time));
    }

    fn save(&self, path: &Path) -> Result<()> {
        let write_error = |source: BoxError| Error::DocumentWrite {
            path: path.to_path_buf(),
            source,
        };

        let sop_instance_uid = self
            .dataset
            .element_str(tags::SOP_INSTANCE_UID)
            .unwrap_or_else(generate_uid);

        let meta = FileMetaTableBuilder::new()
            .transfer_syntax(EXPLICIT_VR_LITTLE_ENDIAN.uid())
            .media_storage_sop_class_uid(RT_STRUCTURE_SET_STORAGE)
            .media_storage_sop_instance_uid(sop_instance_uid.as_str())
            .build()
            .map_err(|e| write_error(Box::new(e)))?;

        let mut file_obj =
            FileDicomObject::new_empty_with_dict_and_meta(StandardDataDictionary, meta);
        for elem in self.dataset.clone() {
            file_obj.put(elem);
        }
        file_obj.put(sequence(
            REFERENCED_FRAME_OF_REFERENCE_SEQUENCE,
            self.frames_of_reference.clone(),
        ));
        file_obj.put(sequence(
            STRUCTURE_SET_ROI_SEQUENCE,
            self.structure_set_rois.clone(),
        ));
        file_obj.put(sequence(ROI_CONTOUR_SEQUENCE, self.roi_contours.clone()));
        file_obj.put(sequence(
            RT_ROI_OBSERVATIONS_SEQUENCE,
            self.observations.clone(),
        ));

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| write_error(Box::new(e)))?;
        }
        file_obj
            .write_to_file(path)
            .map_err(|e| write_error(Box::new(e)))?;

        info!("Structure set saved to {}", path.display());
        Ok(())
    }
}

fn base_dataset(series: &ReferenceSeries) -> InMemDicomObject {
    let now = Local::now();
    let date = now.format("%Y%m%d").to_string();
    let time = now.format("%H%M%S").to_string();
    let first = series.first_dataset();

    let mut obj = InMemDicomObject::new_empty();
    obj.put(text(tags::SOP_CLASS_UID, VR::UI, RT_STRUCTURE_SET_STORAGE));
    obj.put(text(tags::SOP_INSTANCE_UID, VR::UI, &generate_uid()));
    obj.put(text(tags::MODALITY, VR::CS, "RTSTRUCT"));
    obj.put(text(tags::MANUFACTURER, VR::LO, MANUFACTURER));
    obj.put(text(tags::SERIES_INSTANCE_UID, VR::UI, &generate_uid()));
    obj.put(text(tags::SERIES_NUMBER, VR::IS, "1"));
    obj.put(text(tags::INSTANCE_NUMBER, VR::IS, "1"));
    obj.put(text(tags::SERIES_DATE, VR::DA, &date));
    obj.put(text(tags::SERIES_TIME, VR::TM, &time));
    obj.put(text(
        tags::SERIES_DESCRIPTION,
        VR::LO,
        &first.element_str(tags::SERIES_DESCRIPTION).unwrap_or_default(),
    ));
    obj.put(text(STRUCTURE_SET_LABEL, VR::SH, "RTstruct"));
    obj.put(text(STRUCTURE_SET_DATE, VR::DA, &date));
    obj.put(text(STRUCTURE_SET_TIME, VR::TM, &time));

    for tag in COPIED_FROM_SERIES {
        if let Ok(elem) = first.element(tag) {
            obj.put(elem.clone());
        }
    }

    obj
}

/// ReferencedFrameOfReferenceSequence item listing every image of the series.
fn frame_of_reference_item(series: &ReferenceSeries) -> InMemDicomObject {
    let contour_images = series.slices().iter().map(image_reference).collect();

    let referenced_series = InMemDicomObject::from_element_iter([
        text(
            tags::SERIES_INSTANCE_UID,
            VR::UI,
            &series.series_instance_uid().unwrap_or_default(),
        ),
        sequence(CONTOUR_IMAGE_SEQUENCE, contour_images),
    ]);

    let referenced_study = InMemDicomObject::from_element_iter([
        text(tags::REFERENCED_SOP_CLASS_UID, VR::UI, DETACHED_STUDY_MANAGEMENT),
        text(
            tags::REFERENCED_SOP_INSTANCE_UID,
            VR::UI,
            &series.study_instance_uid().unwrap_or_default(),
        ),
        sequence(RT_REFERENCED_SERIES_SEQUENCE, vec![referenced_series]),
    ]);

    InMemDicomObject::from_element_iter([
        text(
            tags::FRAME_OF_REFERENCE_UID,
            VR::UI,
            series.frame_of_reference_uid().unwrap_or_default(),
        ),
        sequence(RT_REFERENCED_STUDY_SEQUENCE, vec![referenced_study]),
    ])
}

fn image_reference(slice: &SeriesSlice) -> InMemDicomObject {
    InMemDicomObject::from_element_iter([
        text(tags::REFERENCED_SOP_CLASS_UID, VR::UI, &slice.sop_class_uid),
        text(tags::REFERENCED_SOP_INSTANCE_UID, VR::UI, &slice.sop_instance_uid),
    ])
}

/// ContourSequence item: one closed polygon in patient coordinates on `slice`.
fn contour_item(slice: &SeriesSlice, contour: &PixelContour) -> InMemDicomObject {
    let data: Vec<String> = contour
        .points
        .iter()
        .flat_map(|&(x, y)| slice.to_patient(x as f64, y as f64))
        .map(format_ds)
        .collect();

    InMemDicomObject::from_element_iter([
        sequence(CONTOUR_IMAGE_SEQUENCE, vec![image_reference(slice)]),
        text(CONTOUR_GEOMETRIC_TYPE, VR::CS, "CLOSED_PLANAR"),
        text(
            NUMBER_OF_CONTOUR_POINTS,
            VR::IS,
            &contour.points.len().to_string(),
        ),
        texts(CONTOUR_DATA, VR::DS, data),
    ])
}

fn take_sequence(obj: &mut InMemDicomObject, tag: Tag) -> Vec<InMemDicomObject> {
    let items = obj.sequence_items(tag);
    obj.remove_element(tag);
    items
}

fn text(tag: Tag, vr: VR, value: &str) -> InMemElement {
    DataElement::new(tag, vr, PrimitiveValue::from(value))
}

fn texts(tag: Tag, vr: VR, values: Vec<String>) -> InMemElement {
    DataElement::new(tag, vr, PrimitiveValue::Strs(values.into()))
}

fn sequence(tag: Tag, items: Vec<InMemDicomObject>) -> InMemElement {
    DataElement::new(tag, VR::SQ, DataSetSequence::from(items))
}

/// Decimal String value: at most four decimals, no trailing zeros, within the 16 byte limit.
fn format_ds(value: f64) -> String {
    let formatted = format!("{value:.4}");
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    match trimmed {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}
