//! Conversion of stored pixel values to physical units
//!
//! CT images are mapped to Hounsfield Units with the linear rescale
//! `value * slope + intercept`. Mammography images are used as stored,
//! optionally inverted (MONOCHROME1) and rescaled when the acquisition
//! provides rescale parameters.

use crate::error::{QcError, Result};
use crate::types::{CalibratedImage, Modality, RawImage};
use serde::{Deserialize, Serialize};

/// Calibration parameters of one acquisition
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CalibrationParams {
    /// Rescale Slope (0028,1053)
    pub rescale_slope: Option<f64>,
    /// Rescale Intercept (0028,1052)
    pub rescale_intercept: Option<f64>,
    /// Invert stored values before rescaling
    pub invert: bool,
    /// Bits Stored (0028,0101), required for inversion
    pub bits_stored: Option<u16>,
}

impl CalibrationParams {
    /// Linear rescale parameters
    pub fn rescale(slope: f64, intercept: f64) -> Self {
        Self {
            rescale_slope: Some(slope),
            rescale_intercept: Some(intercept),
            ..Self::default()
        }
    }

    /// Builder: invert stored values of the given bit depth
    pub fn with_inversion(mut self, bits_stored: u16) -> Self {
        self.invert = true;
        self.bits_stored = Some(bits_stored);
        self
    }

    fn linear(&self) -> Result<Option<(f64, f64)>> {
        match (self.rescale_slope, self.rescale_intercept) {
            (Some(slope), Some(intercept)) => {
                if !slope.is_finite() || slope == 0.0 || !intercept.is_finite() {
                    return Err(QcError::Calibration(format!(
                        "invalid rescale parameters: slope {}, intercept {}",
                        slope, intercept
                    )));
                }
                Ok(Some((slope, intercept)))
            }
            _ => Ok(None),
        }
    }

    fn inversion_max(&self) -> Result<Option<f64>> {
        if !self.invert {
            return Ok(None);
        }
        match self.bits_stored {
            Some(bits) if (1..=32).contains(&bits) => Ok(Some(((1u64 << bits) - 1) as f64)),
            Some(bits) => Err(QcError::Calibration(format!(
                "bits stored {} outside 1..=32",
                bits
            ))),
            None => Err(QcError::Calibration(
                "inversion requires bits stored".to_string(),
            )),
        }
    }
}

/// Converts raw stored values to a calibrated image
///
/// # Errors
///
/// Returns [`QcError::Calibration`] when a modality that mandates rescale
/// (CT) lacks slope or intercept, when the parameters are not finite, or when
/// inversion is requested without a valid bit depth.
///
/// # Example
///
/// ```
/// use phantomqc_core::calibration::{calibrate, CalibrationParams};
/// use phantomqc_core::{Modality, RawImage};
///
/// let raw = RawImage::new(2, 1, vec![1024, 0]).unwrap();
/// let hu = calibrate(&raw, Modality::Ct, &CalibrationParams::rescale(1.0, -1024.0)).unwrap();
/// assert_eq!(hu.data(), &[0.0, -1024.0]);
///
/// assert!(calibrate(&raw, Modality::Ct, &CalibrationParams::default()).is_err());
/// ```
pub fn calibrate(
    raw: &RawImage,
    modality: Modality,
    params: &CalibrationParams,
) -> Result<CalibratedImage> {
    let linear = params.linear()?;
    if modality.requires_rescale() && linear.is_none() {
        return Err(QcError::Calibration(format!(
            "{} images require rescale slope and intercept",
            modality
        )));
    }
    let inversion_max = params.inversion_max()?;

    let data = raw
        .pixels
        .iter()
        .map(|&stored| {
            let mut value = stored as f64;
            if let Some(max) = inversion_max {
                value = max - value;
            }
            if let Some((slope, intercept)) = linear {
                value = value * slope + intercept;
            }
            value
        })
        .collect();

    CalibratedImage::new(raw.width, raw.height, modality, data)
}
