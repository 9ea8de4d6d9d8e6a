//! Python bindings for phantomqc
//!
//! This module provides PyO3 bindings enabling Python users to evaluate
//! phantom image quality from DICOM files or calibrated pixel arrays.

// Suppress false positive warnings from PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use pyo3::prelude::*;

mod analyzer;
mod enums;
mod errors;
#[macro_use]
mod macros;
mod utils;
mod verdict;

pub use analyzer::*;
pub use enums::*;
pub use errors::*;
pub use verdict::*;

/// Python module definition
#[pymodule]
fn _phantomqc(py: Python, m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Register exception classes
    m.add("QcError", py.get_type_bound::<errors::PyQcError>())?;
    m.add(
        "CalibrationError",
        py.get_type_bound::<errors::PyCalibrationError>(),
    )?;
    m.add(
        "InvalidImageError",
        py.get_type_bound::<errors::PyInvalidImageError>(),
    )?;
    m.add(
        "InvalidRoiError",
        py.get_type_bound::<errors::PyInvalidRoiError>(),
    )?;
    m.add(
        "EmptyRegionError",
        py.get_type_bound::<errors::PyEmptyRegionError>(),
    )?;
    m.add(
        "ConfigurationError",
        py.get_type_bound::<errors::PyConfigurationError>(),
    )?;
    m.add(
        "InvalidParameterError",
        py.get_type_bound::<errors::PyInvalidParameterError>(),
    )?;
    m.add(
        "UndefinedMetricError",
        py.get_type_bound::<errors::PyUndefinedMetricError>(),
    )?;
    m.add("DicomError", py.get_type_bound::<errors::PyDicomError>())?;
    m.add(
        "TagNotFoundError",
        py.get_type_bound::<errors::PyTagNotFoundError>(),
    )?;
    m.add(
        "InvalidValueError",
        py.get_type_bound::<errors::PyInvalidValueError>(),
    )?;

    // Register enum classes
    m.add_class::<PyModality>()?;
    m.add_class::<PyMaterial>()?;
    m.add_class::<PyWorkflow>()?;
    m.add_class::<PyOverallStatus>()?;

    // Register data structure classes
    m.add_class::<PyConformanceVerdict>()?;

    // Register main API
    m.add_class::<PyQualityAnalyzer>()?;

    // Add version
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
