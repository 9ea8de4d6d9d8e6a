//! Python wrapper for ConformanceVerdict

use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use super::enums::{PyMaterial, PyModality, PyOverallStatus, PyWorkflow};
use super::errors::convert_error;
use super::utils::option_f64_to_py;
use crate::conformance::ConformanceVerdict;

/// Outcome of one image evaluation
#[pyclass(name = "ConformanceVerdict", module = "phantomqc")]
#[derive(Clone)]
pub struct PyConformanceVerdict {
    pub(crate) inner: ConformanceVerdict,
}

#[pymethods]
impl PyConformanceVerdict {
    #[getter]
    fn image_id(&self) -> &str {
        &self.inner.image_id
    }

    #[getter]
    fn modality(&self) -> PyModality {
        self.inner.modality.into()
    }

    #[getter]
    fn material(&self) -> PyMaterial {
        self.inner.material.into()
    }

    #[getter]
    fn workflow(&self) -> PyWorkflow {
        self.inner.workflow.into()
    }

    #[getter]
    fn status(&self) -> PyOverallStatus {
        self.inner.status.into()
    }

    /// Evaluation timestamp in RFC 3339 format
    #[getter]
    fn evaluated_at(&self) -> String {
        self.inner.evaluated_at.to_rfc3339()
    }

    fn is_pass(&self) -> bool {
        self.inner.is_pass()
    }

    /// Display names of metrics outside their band
    fn failing_metrics(&self) -> Vec<String> {
        self.inner
            .failing_metrics()
            .map(|m| m.display_name())
            .collect()
    }

    /// Warning messages, e.g. detection fallback
    #[getter]
    fn warnings(&self) -> Vec<String> {
        self.inner.warnings.iter().map(|w| w.to_string()).collect()
    }

    /// Metrics as a list of dictionaries
    fn metrics(&self, py: Python) -> PyResult<Py<PyList>> {
        let list = PyList::empty_bound(py);
        for m in &self.inner.metrics {
            let dict = PyDict::new_bound(py);
            dict.set_item("name", m.display_name())?;
            dict.set_item("kind", m.kind.simple_name())?;
            dict.set_item("roi", m.roi.map(|r| r.simple_name()))?;
            dict.set_item("value", m.value)?;
            dict.set_item("unit", m.unit.symbol())?;
            dict.set_item("min", option_f64_to_py(py, m.band.min))?;
            dict.set_item("max", option_f64_to_py(py, m.band.max))?;
            dict.set_item("status", m.status.to_string())?;
            list.append(dict)?;
        }
        Ok(list.unbind())
    }

    /// ROI statistics as a list of dictionaries
    fn roi_statistics(&self, py: Python) -> PyResult<Py<PyList>> {
        let list = PyList::empty_bound(py);
        for s in &self.inner.roi_statistics {
            let dict = PyDict::new_bound(py);
            dict.set_item("roi", s.roi.simple_name())?;
            dict.set_item("mean", s.mean)?;
            dict.set_item("stddev", s.stddev)?;
            dict.set_item("skewness", s.skewness)?;
            dict.set_item("kurtosis", s.kurtosis)?;
            dict.set_item("pixel_count", s.pixel_count)?;
            list.append(dict)?;
        }
        Ok(list.unbind())
    }

    /// Serialize the full verdict to JSON
    fn to_json(&self) -> PyResult<String> {
        self.inner.to_json().map_err(convert_error)
    }

    fn __repr__(&self) -> String {
        format!(
            "ConformanceVerdict(image_id={}, status={}, metrics={})",
            self.inner.image_id,
            self.inner.status,
            self.inner.metrics.len()
        )
    }

    fn __str__(&self) -> String {
        self.__repr__()
    }
}

impl From<ConformanceVerdict> for PyConformanceVerdict {
    fn from(inner: ConformanceVerdict) -> Self {
        Self { inner }
    }
}
