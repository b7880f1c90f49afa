use nifti::NiftiHeader;

use crate::models::VolumeType;

/// Classify a volume by its bits-per-voxel header field.
pub fn classify(bitpix: i16) -> VolumeType {
    match bitpix {
        8 => VolumeType::Mask,
        16 => VolumeType::Image,
        _ => VolumeType::Unknown,
    }
}

pub fn classify_header(header: &NiftiHeader) -> VolumeType {
    classify(header.bitpix)
}
