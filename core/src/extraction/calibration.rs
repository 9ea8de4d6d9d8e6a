use dicom_object::InMemDicomObject;

use super::tags::{
    get_f64_value, get_string_value, get_u16_value, BITS_STORED, MODALITY,
    PHOTOMETRIC_INTERPRETATION, RESCALE_INTERCEPT, RESCALE_SLOPE,
};
use crate::calibration::CalibrationParams;
use crate::error::{QcError, Result};
use crate::types::Modality;

/// Extracts the modality from the Modality (0008,0060) tag
///
/// # Errors
///
/// Returns [`QcError::TagNotFound`] if the tag is absent and
/// [`QcError::InvalidValue`] for a modality other than CT or MG.
pub fn extract_modality(dcm: &InMemDicomObject) -> Result<Modality> {
    let value = get_string_value(dcm, MODALITY)
        .ok_or_else(|| QcError::TagNotFound("Modality".to_string()))?;
    Modality::parse(&value).ok_or_else(|| {
        QcError::InvalidValue(format!("unsupported modality '{}', expected CT or MG", value))
    })
}

/// Extracts rescale and photometric parameters
///
/// A MONOCHROME1 image stores bright as low values; it is inverted so that
/// higher values always mean more signal.
///
/// # Errors
///
/// Returns [`QcError::TagNotFound`] for a MONOCHROME1 image without
/// Bits Stored.
pub fn extract_calibration(dcm: &InMemDicomObject) -> Result<CalibrationParams> {
    let mut params = CalibrationParams {
        rescale_slope: get_f64_value(dcm, RESCALE_SLOPE),
        rescale_intercept: get_f64_value(dcm, RESCALE_INTERCEPT),
        ..CalibrationParams::default()
    };

    let monochrome1 = get_string_value(dcm, PHOTOMETRIC_INTERPRETATION)
        .map(|s| s.eq_ignore_ascii_case("MONOCHROME1"))
        .unwrap_or(false);
    if monochrome1 {
        let bits = get_u16_value(dcm, BITS_STORED)
            .ok_or_else(|| QcError::TagNotFound("BitsStored".to_string()))?;
        params = params.with_inversion(bits);
    }

    Ok(params)
}
