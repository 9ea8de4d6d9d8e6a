//! Python exception types for phantomqc
//!
//! This module defines Python exception classes that map to Rust error types.

// Suppress warnings from PyO3's create_exception! macro about gil-refs feature
#![allow(unexpected_cfgs)]

use pyo3::{create_exception, exceptions::PyException, prelude::*};

use crate::error::QcError;

// Base exception
create_exception!(
    phantomqc,
    PyQcError,
    PyException,
    "Base exception for all phantomqc errors"
);

// Pipeline exceptions
create_exception!(
    phantomqc,
    PyCalibrationError,
    PyQcError,
    "Missing or invalid calibration parameters"
);

create_exception!(
    phantomqc,
    PyInvalidImageError,
    PyQcError,
    "Pixel buffer inconsistent with its dimensions"
);

create_exception!(
    phantomqc,
    PyInvalidRoiError,
    PyQcError,
    "ROI with invalid radius or no pixels inside the image"
);

create_exception!(
    phantomqc,
    PyEmptyRegionError,
    PyQcError,
    "Statistics requested over zero pixels"
);

create_exception!(
    phantomqc,
    PyConfigurationError,
    PyQcError,
    "Missing or invalid configuration"
);

create_exception!(
    phantomqc,
    PyInvalidParameterError,
    PyQcError,
    "Request parameter out of its accepted range"
);

create_exception!(
    phantomqc,
    PyUndefinedMetricError,
    PyQcError,
    "Metric that cannot be computed, e.g. SNR with a noiseless background"
);

// DICOM exceptions
create_exception!(
    phantomqc,
    PyDicomError,
    PyQcError,
    "DICOM reading or decoding error"
);

create_exception!(
    phantomqc,
    PyTagNotFoundError,
    PyQcError,
    "Required DICOM tag not found in file"
);

create_exception!(
    phantomqc,
    PyInvalidValueError,
    PyQcError,
    "Invalid DICOM tag value encountered"
);

/// Convert Rust QcError to appropriate Python exception
pub fn convert_error(err: QcError) -> PyErr {
    let msg = err.to_string();
    match err {
        QcError::Calibration(_) => PyCalibrationError::new_err(msg),
        QcError::InvalidImage(_) => PyInvalidImageError::new_err(msg),
        QcError::InvalidRoi { .. } => PyInvalidRoiError::new_err(msg),
        QcError::EmptyRegion(_) => PyEmptyRegionError::new_err(msg),
        QcError::Configuration(_) | QcError::Json(_) => PyConfigurationError::new_err(msg),
        QcError::InvalidParameter(_) => PyInvalidParameterError::new_err(msg),
        QcError::UndefinedMetric { .. } => PyUndefinedMetricError::new_err(msg),
        QcError::DicomError(_) => PyDicomError::new_err(msg),
        QcError::TagNotFound(_) => PyTagNotFoundError::new_err(msg),
        QcError::InvalidValue(_) => PyInvalidValueError::new_err(msg),
        QcError::IoError(_) => pyo3::exceptions::PyIOError::new_err(msg),
    }
}
