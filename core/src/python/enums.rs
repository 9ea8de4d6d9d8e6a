//! Python wrappers for phantomqc enums

use pyo3::prelude::*;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::errors::PyInvalidParameterError;
use super::macros::impl_py_from;
use crate::types::{Material, Modality, OverallStatus, Workflow};

fn hash_of<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

// ============================================================================
// Modality
// ============================================================================

#[pyclass(name = "Modality", module = "phantomqc")]
#[derive(Clone, Debug)]
pub struct PyModality {
    pub(crate) inner: Modality,
}

#[pymethods]
impl PyModality {
    #[classattr]
    const CT: Self = Self {
        inner: Modality::Ct,
    };
    #[classattr]
    const MAMMOGRAPHY: Self = Self {
        inner: Modality::Mammography,
    };

    /// Parse from a DICOM code ("CT", "MG") or display name
    #[staticmethod]
    fn parse(s: &str) -> PyResult<Self> {
        Modality::parse(s)
            .map(Into::into)
            .ok_or_else(|| PyInvalidParameterError::new_err(format!("unknown modality '{}'", s)))
    }

    pub fn simple_name(&self) -> &'static str {
        self.inner.simple_name()
    }

    fn __str__(&self) -> String {
        self.inner.simple_name().to_string()
    }

    fn __repr__(&self) -> String {
        format!("Modality.{:?}", self.inner)
    }

    fn __eq__(&self, other: &PyModality) -> bool {
        self.inner == other.inner
    }

    fn __hash__(&self) -> u64 {
        hash_of(&self.inner)
    }

    #[getter]
    fn value(&self) -> &str {
        self.inner.simple_name()
    }
}

impl_py_from!(PyModality, Modality);

// ============================================================================
// Material
// ============================================================================

#[pyclass(name = "Material", module = "phantomqc")]
#[derive(Clone, Debug)]
pub struct PyMaterial {
    pub(crate) inner: Material,
}

#[pymethods]
impl PyMaterial {
    #[classattr]
    const WATER: Self = Self {
        inner: Material::Water,
    };
    #[classattr]
    const AIR: Self = Self {
        inner: Material::Air,
    };
    #[classattr]
    const ACRYLIC: Self = Self {
        inner: Material::Acrylic,
    };

    #[staticmethod]
    fn parse(s: &str) -> PyResult<Self> {
        Material::parse(s)
            .map(Into::into)
            .ok_or_else(|| PyInvalidParameterError::new_err(format!("unknown material '{}'", s)))
    }

    pub fn simple_name(&self) -> &'static str {
        self.inner.simple_name()
    }

    fn __str__(&self) -> String {
        self.inner.simple_name().to_string()
    }

    fn __repr__(&self) -> String {
        format!("Material.{:?}", self.inner)
    }

    fn __eq__(&self, other: &PyMaterial) -> bool {
        self.inner == other.inner
    }

    fn __hash__(&self) -> u64 {
        hash_of(&self.inner)
    }

    #[getter]
    fn value(&self) -> &str {
        self.inner.simple_name()
    }
}

impl_py_from!(PyMaterial, Material);

// ============================================================================
// Workflow
// ============================================================================

#[pyclass(name = "Workflow", module = "phantomqc")]
#[derive(Clone, Debug)]
pub struct PyWorkflow {
    pub(crate) inner: Workflow,
}

#[pymethods]
impl PyWorkflow {
    #[classattr]
    const PHANTOM: Self = Self {
        inner: Workflow::Phantom,
    };
    #[classattr]
    const FIXED_CROP: Self = Self {
        inner: Workflow::FixedCrop,
    };

    pub fn simple_name(&self) -> &'static str {
        self.inner.simple_name()
    }

    fn __str__(&self) -> String {
        self.inner.simple_name().to_string()
    }

    fn __repr__(&self) -> String {
        format!("Workflow.{:?}", self.inner)
    }

    fn __eq__(&self, other: &PyWorkflow) -> bool {
        self.inner == other.inner
    }

    fn __hash__(&self) -> u64 {
        hash_of(&self.inner)
    }
}

impl_py_from!(PyWorkflow, Workflow);

// ============================================================================
// OverallStatus
// ============================================================================

#[pyclass(name = "OverallStatus", module = "phantomqc")]
#[derive(Clone, Debug)]
pub struct PyOverallStatus {
    pub(crate) inner: OverallStatus,
}

#[pymethods]
impl PyOverallStatus {
    #[classattr]
    const PASS: Self = Self {
        inner: OverallStatus::Pass,
    };
    #[classattr]
    const FAIL: Self = Self {
        inner: OverallStatus::Fail,
    };

    fn is_pass(&self) -> bool {
        self.inner.is_pass()
    }

    fn __str__(&self) -> String {
        self.inner.to_string()
    }

    fn __repr__(&self) -> String {
        format!("OverallStatus.{:?}", self.inner)
    }

    fn __eq__(&self, other: &PyOverallStatus) -> bool {
        self.inner == other.inner
    }

    fn __hash__(&self) -> u64 {
        hash_of(&self.inner)
    }

    fn __bool__(&self) -> bool {
        self.inner.is_pass()
    }
}

impl_py_from!(PyOverallStatus, OverallStatus);
