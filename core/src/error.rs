use crate::types::{MetricKind, RoiLabel};
use thiserror::Error;

/// Result type for phantomqc operations
pub type Result<T> = std::result::Result<T, QcError>;

/// Error types for phantomqc operations
///
/// Every variant aborts the evaluation of a single image only. Detection
/// fallback is not an error; it is reported as a [`crate::QcWarning`].
#[derive(Error, Debug)]
pub enum QcError {
    /// Missing or invalid calibration parameters
    #[error("Calibration error: {0}")]
    Calibration(String),

    /// Pixel buffer inconsistent with its dimensions
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// ROI with non-positive radius or an empty mask after clipping
    #[error("Invalid ROI {roi}: {reason}")]
    InvalidRoi { roi: RoiLabel, reason: String },

    /// Statistics requested over zero pixels
    #[error("Empty region: {0}")]
    EmptyRegion(String),

    /// Missing threshold band for a required metric
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Adjustment input out of its accepted range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Metric that cannot be computed from the given statistics
    #[error("Undefined metric {metric}: {reason}")]
    UndefinedMetric { metric: MetricKind, reason: String },

    /// DICOM reading or decoding error
    #[error("DICOM error: {0}")]
    DicomError(String),

    /// Tag not found in DICOM file
    #[error("Tag not found: {0}")]
    TagNotFound(String),

    /// Invalid tag value
    #[error("Invalid tag value: {0}")]
    InvalidValue(String),

    /// I/O error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration or verdict (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<dicom_object::ReadError> for QcError {
    fn from(e: dicom_object::ReadError) -> Self {
        QcError::DicomError(format!("{}", e))
    }
}

impl From<dicom_core::value::ConvertValueError> for QcError {
    fn from(e: dicom_core::value::ConvertValueError) -> Self {
        QcError::InvalidValue(format!("{}", e))
    }
}

impl From<dicom_pixeldata::Error> for QcError {
    fn from(e: dicom_pixeldata::Error) -> Self {
        QcError::DicomError(format!("pixel data: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = QcError::InvalidRoi {
            roi: RoiLabel::North,
            reason: "mask is empty".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid ROI 12h: mask is empty");

        let err = QcError::UndefinedMetric {
            metric: MetricKind::Snr,
            reason: "background stddev is zero".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Undefined metric snr: background stddev is zero"
        );
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: QcError = io.into();
        assert!(matches!(err, QcError::IoError(_)));
    }
}
