//! Utility functions for Python bindings conversions

use chrono::{DateTime, Utc};
use pyo3::prelude::*;
use std::path::PathBuf;

use super::errors::PyInvalidParameterError;

/// Converts a Python path-like object (str or pathlib.Path) to PathBuf
pub fn path_to_pathbuf(path: &Bound<'_, PyAny>) -> PyResult<PathBuf> {
    // Try to convert as string first
    if let Ok(s) = path.extract::<String>() {
        return Ok(PathBuf::from(s));
    }

    // Try to call __str__() for pathlib.Path objects
    if let Ok(s) = path.str() {
        let path_str: String = s.extract()?;
        return Ok(PathBuf::from(path_str));
    }

    Err(pyo3::exceptions::PyTypeError::new_err(
        "Path must be a string or path-like object",
    ))
}

/// Parses an RFC 3339 timestamp, or returns the current time for `None`
pub fn parse_timestamp(value: Option<&str>) -> PyResult<DateTime<Utc>> {
    match value {
        Some(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| PyInvalidParameterError::new_err(format!("invalid timestamp '{}': {}", s, e))),
        None => Ok(Utc::now()),
    }
}

/// Converts an Option<f64> to Python (None or float)
pub fn option_f64_to_py(py: Python, opt: Option<f64>) -> PyObject {
    match opt {
        Some(v) => v.into_py(py),
        None => py.None(),
    }
}
