use dicom_core::Tag;
use dicom_dictionary_std::StandardDataDictionary;
use dicom_object::InMemDicomObject;

/// Small helper trait to pull typed values out of DICOM objects, treating any failure as absence.
pub trait ElementAccess {
    fn element_str(&self, tag: Tag) -> Option<String>;
    fn element_f64s(&self, tag: Tag) -> Option<Vec<f64>>;
    fn element_u32(&self, tag: Tag) -> Option<u32>;
    fn has_element(&self, tag: Tag) -> bool;
    /// Items of a sequence element, empty when absent.
    fn sequence_items(&self, tag: Tag) -> Vec<InMemDicomObject>;
}

impl ElementAccess for InMemDicomObject<StandardDataDictionary> {
    fn element_str(&self, tag: Tag) -> Option<String> {
        self.element(tag)
            .ok()
            .and_then(|e| e.to_str().ok())
            .map(|s| s.trim_end_matches(['\0', ' ']).to_string())
    }

    fn element_f64s(&self, tag: Tag) -> Option<Vec<f64>> {
        self.element(tag)
            .ok()
            .and_then(|e| e.to_multi_float64().ok())
    }

    fn element_u32(&self, tag: Tag) -> Option<u32> {
        self.element(tag).ok().and_then(|e| e.to_int::<u32>().ok())
    }

    fn has_element(&self, tag: Tag) -> bool {
        self.element(tag).is_ok()
    }

    fn sequence_items(&self, tag: Tag) -> Vec<InMemDicomObject> {
        self.element(tag)
            .ok()
            .and_then(|e| e.items())
            .map(|items| items.to_vec())
            .unwrap_or_default()
    }
}
