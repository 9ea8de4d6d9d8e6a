//! Python wrapper for QualityAnalyzer

use pyo3::prelude::*;

use super::enums::{PyMaterial, PyModality, PyWorkflow};
use super::errors::convert_error;
use super::utils::{parse_timestamp, path_to_pathbuf};
use super::verdict::PyConformanceVerdict;
use crate::api::{EvaluationRequest, QualityAnalyzer};
use crate::config::AnalysisConfig;
use crate::conformance::VisualReading;
use crate::scan::PhantomScan;
use crate::types::{CalibratedImage, Material, RadiusScale, Workflow};

/// Phantom image quality analyzer
///
/// Example:
///     >>> from phantomqc import QualityAnalyzer
///     >>> analyzer = QualityAnalyzer()
///     >>> verdict = analyzer.evaluate_file("water_phantom.dcm")
///     >>> print(verdict.status, verdict.failing_metrics())
#[pyclass(name = "QualityAnalyzer", module = "phantomqc")]
pub struct PyQualityAnalyzer {
    inner: QualityAnalyzer,
}

#[pymethods]
impl PyQualityAnalyzer {
    /// Create an analyzer
    ///
    /// Args:
    ///     config_path: Optional JSON configuration file
    ///
    /// Raises:
    ///     ConfigurationError: If the configuration is invalid
    #[new]
    #[pyo3(signature = (config_path=None))]
    fn new(config_path: Option<&Bound<'_, PyAny>>) -> PyResult<Self> {
        let config = match config_path {
            Some(path) => {
                AnalysisConfig::from_json_file(&path_to_pathbuf(path)?).map_err(convert_error)?
            }
            None => AnalysisConfig::default(),
        };
        let inner = QualityAnalyzer::new(config).map_err(convert_error)?;
        Ok(Self { inner })
    }

    /// Evaluate a DICOM phantom image
    ///
    /// Args:
    ///     path: Path to the DICOM file (str or pathlib.Path)
    ///     material: Phantom material (default: water for CT, acrylic for mammography)
    ///     workflow: Evaluation workflow (default: Workflow.PHANTOM)
    ///     radius_scale: Manual radius refinement in [0.5, 1.5]
    ///     evaluated_at: RFC 3339 timestamp recorded in the verdict (default: now)
    ///     visual: Optional (fibers, specks, masses) reading
    #[pyo3(signature = (path, material=None, workflow=None, radius_scale=1.0, evaluated_at=None, visual=None))]
    fn evaluate_file(
        &self,
        py: Python,
        path: &Bound<'_, PyAny>,
        material: Option<PyMaterial>,
        workflow: Option<PyWorkflow>,
        radius_scale: f64,
        evaluated_at: Option<&str>,
        visual: Option<(u32, u32, u32)>,
    ) -> PyResult<PyConformanceVerdict> {
        let path_buf = path_to_pathbuf(path)?;
        let scan = PhantomScan::from_file(&path_buf).map_err(convert_error)?;
        let material = material
            .map(Into::into)
            .unwrap_or_else(|| scan.modality().default_material());
        let request = build_request(
            scan.image_id(),
            material,
            workflow,
            radius_scale,
            evaluated_at,
            visual,
        )?;

        let verdict = py
            .allow_threads(|| self.inner.evaluate(&scan.image, &request))
            .map_err(convert_error)?;
        Ok(verdict.into())
    }

    /// Evaluate an already calibrated, row-major pixel array
    #[pyo3(signature = (pixels, width, height, modality, material, image_id="array".to_string(), workflow=None, radius_scale=1.0, evaluated_at=None, visual=None))]
    #[allow(clippy::too_many_arguments)]
    fn evaluate_pixels(
        &self,
        py: Python,
        pixels: Vec<f64>,
        width: usize,
        height: usize,
        modality: PyModality,
        material: PyMaterial,
        image_id: String,
        workflow: Option<PyWorkflow>,
        radius_scale: f64,
        evaluated_at: Option<&str>,
        visual: Option<(u32, u32, u32)>,
    ) -> PyResult<PyConformanceVerdict> {
        let image =
            CalibratedImage::new(width, height, modality.into(), pixels).map_err(convert_error)?;
        let request = build_request(
            image_id,
            material.into(),
            workflow,
            radius_scale,
            evaluated_at,
            visual,
        )?;

        let verdict = py
            .allow_threads(|| self.inner.evaluate(&image, &request))
            .map_err(convert_error)?;
        Ok(verdict.into())
    }
}

fn build_request(
    image_id: String,
    material: Material,
    workflow: Option<PyWorkflow>,
    radius_scale: f64,
    evaluated_at: Option<&str>,
    visual: Option<(u32, u32, u32)>,
) -> PyResult<EvaluationRequest> {
    let mut request = EvaluationRequest::new(image_id, material, parse_timestamp(evaluated_at)?)
        .with_workflow(workflow.map(Workflow::from).unwrap_or_default())
        .with_radius_scale(RadiusScale::new(radius_scale).map_err(convert_error)?);
    if let Some((fibers, specks, masses)) = visual {
        request = request.with_visual_reading(VisualReading::new(fibers, specks, masses));
    }
    Ok(request)
}
