use chrono::NaiveDate;
use dicom_object::InMemDicomObject;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::tags::{
    get_decimal_values, get_f64_value, get_string_value, ACQUISITION_DATE,
    ANODE_TARGET_MATERIAL, BODY_PART_THICKNESS, CTDI_VOL, DISTANCE_SOURCE_TO_DETECTOR,
    DISTANCE_SOURCE_TO_PATIENT, EXPOSURE, EXPOSURE_CONTROL_MODE, EXPOSURE_TIME, FILTER_MATERIAL,
    FILTER_TYPE, FOCAL_SPOTS, GRID, IMAGER_PIXEL_SPACING, INSTITUTION_NAME, KVP, MANUFACTURER,
    MANUFACTURER_MODEL_NAME, ORGAN_DOSE, PIXEL_SPACING, SERIES_DESCRIPTION, STATION_NAME,
    STUDY_DATE,
};

/// Pixel spacing in millimeters (row, column)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelSpacing {
    pub row: f64,
    pub col: f64,
}

impl PixelSpacing {
    pub fn new(row: f64, col: f64) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for PixelSpacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {} mm", self.row, self.col)
    }
}

/// Acquisition parameters shown next to a verdict
///
/// Every field is optional: phantom images from different vendors carry
/// very different subsets of these attributes, and none of them affects the
/// quality metrics.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AcquisitionInfo {
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub institution: Option<String>,
    pub station: Option<String>,
    pub series_description: Option<String>,
    /// Acquisition Date, or Study Date when absent
    pub acquisition_date: Option<NaiveDate>,
    pub kvp: Option<f64>,
    /// Exposure in mAs
    pub exposure_mas: Option<f64>,
    /// Exposure time in ms
    pub exposure_time_ms: Option<f64>,
    pub anode_material: Option<String>,
    pub filter_material: Option<String>,
    pub filter_type: Option<String>,
    pub focal_spot_mm: Option<f64>,
    pub grid: Option<String>,
    pub exposure_control_mode: Option<String>,
    pub source_detector_distance_mm: Option<f64>,
    pub source_patient_distance_mm: Option<f64>,
    pub body_part_thickness_mm: Option<f64>,
    /// Average glandular dose in dGy (mammography)
    pub organ_dose_dgy: Option<f64>,
    /// CTDIvol in mGy (CT)
    pub ctdi_vol_mgy: Option<f64>,
    pub pixel_spacing: Option<PixelSpacing>,
}

impl AcquisitionInfo {
    /// Reads the acquisition summary; missing or malformed tags are skipped
    pub fn extract(dcm: &InMemDicomObject) -> Self {
        Self {
            manufacturer: get_string_value(dcm, MANUFACTURER),
            model: get_string_value(dcm, MANUFACTURER_MODEL_NAME),
            institution: get_string_value(dcm, INSTITUTION_NAME),
            station: get_string_value(dcm, STATION_NAME),
            series_description: get_string_value(dcm, SERIES_DESCRIPTION),
            acquisition_date: extract_date(dcm),
            kvp: get_f64_value(dcm, KVP),
            exposure_mas: get_f64_value(dcm, EXPOSURE),
            exposure_time_ms: get_f64_value(dcm, EXPOSURE_TIME),
            anode_material: get_string_value(dcm, ANODE_TARGET_MATERIAL),
            filter_material: get_string_value(dcm, FILTER_MATERIAL),
            filter_type: get_string_value(dcm, FILTER_TYPE),
            focal_spot_mm: get_f64_value(dcm, FOCAL_SPOTS),
            grid: get_string_value(dcm, GRID),
            exposure_control_mode: get_string_value(dcm, EXPOSURE_CONTROL_MODE),
            source_detector_distance_mm: get_f64_value(dcm, DISTANCE_SOURCE_TO_DETECTOR),
            source_patient_distance_mm: get_f64_value(dcm, DISTANCE_SOURCE_TO_PATIENT),
            body_part_thickness_mm: get_f64_value(dcm, BODY_PART_THICKNESS),
            organ_dose_dgy: get_f64_value(dcm, ORGAN_DOSE),
            ctdi_vol_mgy: get_f64_value(dcm, CTDI_VOL),
            pixel_spacing: extract_pixel_spacing(dcm),
        }
    }
}

/// Parses a DICOM DA value (`YYYYMMDD`)
///
/// Some writers emit the legacy `YYYY.MM.DD` form, which is accepted too.
pub fn parse_dicom_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim().trim_matches('\'');
    NaiveDate::parse_from_str(s, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y.%m.%d"))
        .ok()
}

fn extract_date(dcm: &InMemDicomObject) -> Option<NaiveDate> {
    get_string_value(dcm, ACQUISITION_DATE)
        .and_then(|s| parse_dicom_date(&s))
        .or_else(|| get_string_value(dcm, STUDY_DATE).and_then(|s| parse_dicom_date(&s)))
}

/// Pixel Spacing, falling back to Imager Pixel Spacing for projection images
fn extract_pixel_spacing(dcm: &InMemDicomObject) -> Option<PixelSpacing> {
    [PIXEL_SPACING, IMAGER_PIXEL_SPACING]
        .into_iter()
        .map(|tag| get_decimal_values(dcm, tag))
        .find(|values| values.len() >= 2)
        .map(|values| PixelSpacing::new(values[0], values[1]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dicom_core::{DataElement, PrimitiveValue, VR};

    #[test]
    fn test_parse_dicom_date() {
        assert_eq!(
            parse_dicom_date("20240314"),
            NaiveDate::from_ymd_opt(2024, 3, 14)
        );
        assert_eq!(
            parse_dicom_date("'2024.03.14'"),
            NaiveDate::from_ymd_opt(2024, 3, 14)
        );
        assert_eq!(parse_dicom_date("20241340"), None);
        assert_eq!(parse_dicom_date(""), None);
    }

    #[test]
    fn test_extract_mammography_summary() {
        let mut dcm = InMemDicomObject::new_empty();
        dcm.put(DataElement::new(KVP, VR::DS, PrimitiveValue::from("28")));
        dcm.put(DataElement::new(EXPOSURE, VR::IS, PrimitiveValue::from("63")));
        dcm.put(DataElement::new(
            ANODE_TARGET_MATERIAL,
            VR::CS,
            PrimitiveValue::from("TUNGSTEN"),
        ));
        dcm.put(DataElement::new(
            FILTER_MATERIAL,
            VR::CS,
            PrimitiveValue::from("RHODIUM"),
        ));
        dcm.put(DataElement::new(
            ORGAN_DOSE,
            VR::DS,
            PrimitiveValue::from("0.0123"),
        ));
        dcm.put(DataElement::new(
            ACQUISITION_DATE,
            VR::DA,
            PrimitiveValue::from("20240102"),
        ));
        dcm.put(DataElement::new(
            IMAGER_PIXEL_SPACING,
            VR::DS,
            PrimitiveValue::Strs(vec!["0.1".to_string(), "0.1".to_string()].into()),
        ));

        let info = AcquisitionInfo::extract(&dcm);
        assert_eq!(info.kvp, Some(28.0));
        assert_eq!(info.exposure_mas, Some(63.0));
        assert_eq!(info.anode_material.as_deref(), Some("TUNGSTEN"));
        assert_eq!(info.filter_material.as_deref(), Some("RHODIUM"));
        assert_eq!(info.organ_dose_dgy, Some(0.0123));
        assert_eq!(info.acquisition_date, NaiveDate::from_ymd_opt(2024, 1, 2));
        assert_eq!(info.pixel_spacing, Some(PixelSpacing::new(0.1, 0.1)));
        assert_eq!(info.ctdi_vol_mgy, None);
        assert_eq!(info.manufacturer, None);
    }

    #[test]
    fn test_study_date_fallback() {
        let mut dcm = InMemDicomObject::new_empty();
        dcm.put(DataElement::new(
            STUDY_DATE,
            VR::DA,
            PrimitiveValue::from("20230630"),
        ));
        let info = AcquisitionInfo::extract(&dcm);
        assert_eq!(info.acquisition_date, NaiveDate::from_ymd_opt(2023, 6, 30));
    }
}
