use dicom_core::Tag;
use dicom_object::InMemDicomObject;

use super::values::parse_decimals;

// Identification Tags
pub const MODALITY: Tag = Tag(0x0008, 0x0060);
pub const SOP_INSTANCE_UID: Tag = Tag(0x0008, 0x0018);
pub const STUDY_DATE: Tag = Tag(0x0008, 0x0020);
pub const ACQUISITION_DATE: Tag = Tag(0x0008, 0x0022);
pub const SERIES_DESCRIPTION: Tag = Tag(0x0008, 0x103E);

// Device/Site Tags
pub const MANUFACTURER: Tag = Tag(0x0008, 0x0070);
pub const MANUFACTURER_MODEL_NAME: Tag = Tag(0x0008, 0x1090);
pub const INSTITUTION_NAME: Tag = Tag(0x0008, 0x0080);
pub const STATION_NAME: Tag = Tag(0x0008, 0x1010);

// Pixel Module Tags
pub const BITS_STORED: Tag = Tag(0x0028, 0x0101);
pub const PHOTOMETRIC_INTERPRETATION: Tag = Tag(0x0028, 0x0004);
pub const PIXEL_SPACING: Tag = Tag(0x0028, 0x0030);
pub const IMAGER_PIXEL_SPACING: Tag = Tag(0x0018, 0x1164);
pub const RESCALE_INTERCEPT: Tag = Tag(0x0028, 0x1052);
pub const RESCALE_SLOPE: Tag = Tag(0x0028, 0x1053);

// Exposure Tags
pub const KVP: Tag = Tag(0x0018, 0x0060);
pub const EXPOSURE_TIME: Tag = Tag(0x0018, 0x1150);
pub const EXPOSURE: Tag = Tag(0x0018, 0x1152);
pub const FILTER_TYPE: Tag = Tag(0x0018, 0x1160);
pub const FOCAL_SPOTS: Tag = Tag(0x0018, 0x1190);
pub const ANODE_TARGET_MATERIAL: Tag = Tag(0x0018, 0x1191);
pub const GRID: Tag = Tag(0x0018, 0x1166);
pub const FILTER_MATERIAL: Tag = Tag(0x0018, 0x7050);
pub const EXPOSURE_CONTROL_MODE: Tag = Tag(0x0018, 0x7060);

// Geometry Tags
pub const DISTANCE_SOURCE_TO_DETECTOR: Tag = Tag(0x0018, 0x1110);
pub const DISTANCE_SOURCE_TO_PATIENT: Tag = Tag(0x0018, 0x1111);
pub const FIELD_OF_VIEW_SHAPE: Tag = Tag(0x0018, 0x1147);
pub const FIELD_OF_VIEW_DIMENSIONS: Tag = Tag(0x0018, 0x1149);
pub const BODY_PART_THICKNESS: Tag = Tag(0x0018, 0x11A0);

// Dose Tags
pub const ORGAN_DOSE: Tag = Tag(0x0040, 0x0316);
pub const CTDI_VOL: Tag = Tag(0x0018, 0x9345);

/// Helper to get string value from DICOM tag
///
/// Returns `None` if the tag is not present or cannot be converted to string
pub fn get_string_value(dcm: &InMemDicomObject, tag: Tag) -> Option<String> {
    dcm.element(tag)
        .ok()
        .and_then(|elem| elem.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Helper to get u16 value from DICOM tag
pub fn get_u16_value(dcm: &InMemDicomObject, tag: Tag) -> Option<u16> {
    dcm.element(tag)
        .ok()
        .and_then(|elem| elem.to_int::<u16>().ok())
}

/// Helper to get every decimal in a (possibly multi-valued) tag
///
/// Works on numeric VRs and on DS/IS strings alike, since both render to
/// text. Returns an empty vector if the tag is absent.
pub fn get_decimal_values(dcm: &InMemDicomObject, tag: Tag) -> Vec<f64> {
    dcm.element(tag)
        .ok()
        .and_then(|elem| elem.to_str().ok())
        .map(|s| parse_decimals(&s))
        .unwrap_or_default()
}

/// Helper to get the first decimal of a tag
pub fn get_f64_value(dcm: &InMemDicomObject, tag: Tag) -> Option<f64> {
    get_decimal_values(dcm, tag).into_iter().next()
}
