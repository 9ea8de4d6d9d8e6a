use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rayon::prelude::*;

use crate::config::AnalysisConfig;
use crate::conformance::{
    evaluate_contrast, evaluate_phantom, evaluate_visual, ConformanceVerdict, GeometryReport,
    ImageSummary, QcWarning, QualityMetric, ThresholdEntry, VisualReading,
};
use crate::error::Result;
use crate::locator::PhantomLocator;
use crate::roi::RoiRegion;
use crate::stats::{DescriptiveStatistics, Histogram, RoiStatistics};
use crate::types::{
    CalibratedImage, Material, OverallStatus, PhantomGeometry, RadiusScale, Workflow,
};

/// Explicit per-image inputs of an evaluation
///
/// Nothing about an evaluation is ambient: the caller names the image,
/// chooses material and workflow, and supplies the timestamp recorded in
/// the verdict.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationRequest {
    pub image_id: String,
    pub material: Material,
    pub workflow: Workflow,
    pub radius_scale: RadiusScale,
    pub evaluated_at: DateTime<Utc>,
    pub visual_reading: Option<VisualReading>,
}

impl EvaluationRequest {
    /// Phantom workflow at scale 1.0 without a visual reading
    pub fn new(image_id: impl Into<String>, material: Material, evaluated_at: DateTime<Utc>) -> Self {
        Self {
            image_id: image_id.into(),
            material,
            workflow: Workflow::default(),
            radius_scale: RadiusScale::default(),
            evaluated_at,
            visual_reading: None,
        }
    }

    /// Builder: set the workflow
    pub fn with_workflow(mut self, workflow: Workflow) -> Self {
        self.workflow = workflow;
        self
    }

    /// Builder: set the radius refinement factor
    pub fn with_radius_scale(mut self, scale: RadiusScale) -> Self {
        self.radius_scale = scale;
        self
    }

    /// Builder: attach a visual scoring
    pub fn with_visual_reading(mut self, reading: VisualReading) -> Self {
        self.visual_reading = Some(reading);
        self
    }
}

/// Runs the quality pipeline on calibrated images
///
/// The analyzer holds only immutable configuration and can be shared across
/// threads.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use phantomqc_core::locator::LocatorConfig;
/// use phantomqc_core::{
///     AnalysisConfig, CalibratedImage, EvaluationRequest, Material, Modality, QualityAnalyzer,
/// };
///
/// let config = AnalysisConfig::default().with_locator(LocatorConfig::FixedCenter {
///     x: 128.0,
///     y: 128.0,
///     radius: 100.0,
/// });
/// let analyzer = QualityAnalyzer::new(config).unwrap();
///
/// let image = CalibratedImage::new(256, 256, Modality::Ct, vec![1.5; 256 * 256]).unwrap();
/// let request = EvaluationRequest::new(
///     "water-01",
///     Material::Water,
///     Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
/// );
///
/// let verdict = analyzer.evaluate(&image, &request).unwrap();
/// assert!(verdict.is_pass());
/// assert_eq!(verdict.roi_statistics.len(), 5);
/// ```
pub struct QualityAnalyzer {
    config: AnalysisConfig,
    locator: Box<dyn PhantomLocator>,
}

impl QualityAnalyzer {
    /// Validates the configuration and instantiates its locator
    ///
    /// # Errors
    ///
    /// Returns [`crate::QcError::Configuration`] or
    /// [`crate::QcError::InvalidParameter`] for an invalid configuration.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let locator = config.locator.build()?;
        Ok(Self { config, locator })
    }

    /// Replaces the configured locator
    pub fn with_locator(mut self, locator: Box<dyn PhantomLocator>) -> Self {
        self.locator = locator;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Locates the phantom
    pub fn locate(&self, image: &CalibratedImage) -> PhantomGeometry {
        let geometry = self.locator.locate(image);
        debug!(
            "{} locator: center {} radius {:.1} confidence {:.2}",
            self.locator.name(),
            geometry.center,
            geometry.radius,
            geometry.confidence
        );
        geometry
    }

    /// Five ROIs for a detected geometry
    ///
    /// Changing the scale only rebuilds the ROIs; detection is not re-run.
    pub fn phantom_rois(
        &self,
        geometry: &PhantomGeometry,
        scale: RadiusScale,
    ) -> Result<Vec<RoiRegion>> {
        self.config.phantom_layout.build(geometry, scale)
    }

    /// Evaluates one image
    ///
    /// Thresholds are resolved before any pixel work, so a missing
    /// configuration entry fails fast.
    ///
    /// # Errors
    ///
    /// - [`crate::QcError::Configuration`] when thresholds are missing
    /// - [`crate::QcError::InvalidRoi`] when a ROI falls outside the image
    /// - [`crate::QcError::UndefinedMetric`] for a noiseless background
    pub fn evaluate(
        &self,
        image: &CalibratedImage,
        request: &EvaluationRequest,
    ) -> Result<ConformanceVerdict> {
        let entry = self
            .config
            .thresholds
            .entry(image.modality(), request.material)?;

        let mut verdict = match request.workflow {
            Workflow::Phantom => self.evaluate_phantom_workflow(image, request, entry)?,
            Workflow::FixedCrop => self.evaluate_fixed_crop_workflow(image, request, entry)?,
        };

        verdict.status = OverallStatus::from_statuses(verdict.metrics.iter().map(|m| m.status));
        info!(
            "{}: {} ({} of {} metrics out of band)",
            verdict.image_id,
            verdict.status,
            verdict.failing_metrics().count(),
            verdict.metrics.len()
        );
        Ok(verdict)
    }

    /// Evaluates independent images in parallel
    ///
    /// Returns one result per input, in input order; a failing image does
    /// not affect the others.
    pub fn evaluate_batch(
        &self,
        inputs: &[(CalibratedImage, EvaluationRequest)],
    ) -> Vec<Result<ConformanceVerdict>> {
        inputs
            .par_iter()
            .map(|(image, request)| self.evaluate(image, request))
            .collect()
    }

    fn evaluate_phantom_workflow(
        &self,
        image: &CalibratedImage,
        request: &EvaluationRequest,
        entry: &ThresholdEntry,
    ) -> Result<ConformanceVerdict> {
        let limits = entry.phantom_limits()?;
        let visual = visual_limits(request, entry)?;

        let detected = self.locate(image);
        let mut warnings = Vec::new();
        if detected.fallback {
            warn!(
                "{}: phantom not detected, falling back to center {} radius {:.1}",
                request.image_id, detected.center, detected.radius
            );
            warnings.push(QcWarning::DetectionFallback {
                center: detected.center,
                radius: detected.radius,
            });
        }

        let rois = self.phantom_rois(&detected, request.radius_scale)?;
        let roi_statistics = roi_statistics(image, &rois)?;
        let phantom = evaluate_phantom(&roi_statistics, &limits, image.modality().intensity_unit())?;

        let mut metrics = phantom.metrics;
        if let Some((reading, minimums)) = visual {
            metrics.extend(evaluate_visual(&reading, &minimums));
        }

        Ok(ConformanceVerdict {
            image_id: request.image_id.clone(),
            modality: image.modality(),
            material: request.material,
            workflow: request.workflow,
            evaluated_at: request.evaluated_at,
            status: OverallStatus::Pass,
            metrics,
            roi_statistics,
            rois,
            geometry: Some(GeometryReport {
                locator: self.locator.name().to_string(),
                detected,
                radius_scale: request.radius_scale,
                adjusted: detected.scaled(request.radius_scale),
            }),
            peripheral_deviations: phantom.deviations,
            image_summary: None,
            warnings,
        })
    }

    fn evaluate_fixed_crop_workflow(
        &self,
        image: &CalibratedImage,
        request: &EvaluationRequest,
        entry: &ThresholdEntry,
    ) -> Result<ConformanceVerdict> {
        let limits = entry.contrast_limits()?;
        let visual = visual_limits(request, entry)?;

        let (signal, background) = self.config.fixed_crop.build()?;
        let rois = vec![signal, background];
        let roi_statistics = roi_statistics(image, &rois)?;

        let mut metrics: Vec<QualityMetric> =
            evaluate_contrast(&roi_statistics[0], &roi_statistics[1], &limits)?;
        if let Some((reading, minimums)) = visual {
            metrics.extend(evaluate_visual(&reading, &minimums));
        }

        let image_summary = ImageSummary {
            statistics: DescriptiveStatistics::of_image(image)?,
            histogram: Histogram::from_values(image.data(), self.config.histogram_bins)?,
        };

        Ok(ConformanceVerdict {
            image_id: request.image_id.clone(),
            modality: image.modality(),
            material: request.material,
            workflow: request.workflow,
            evaluated_at: request.evaluated_at,
            status: OverallStatus::Pass,
            metrics,
            roi_statistics,
            rois,
            geometry: None,
            peripheral_deviations: Vec::new(),
            image_summary: Some(image_summary),
            warnings: Vec::new(),
        })
    }
}

fn visual_limits(
    request: &EvaluationRequest,
    entry: &ThresholdEntry,
) -> Result<Option<(VisualReading, crate::conformance::VisualMinimums)>> {
    request
        .visual_reading
        .map(|reading| entry.visual_minimums().map(|minimums| (reading, minimums)))
        .transpose()
}

fn roi_statistics(image: &CalibratedImage, rois: &[RoiRegion]) -> Result<Vec<RoiStatistics>> {
    rois.iter()
        .map(|roi| {
            let mask = roi.mask(image.width(), image.height())?;
            RoiStatistics::compute(image, &mask)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conformance::ThresholdConfig;
    use crate::error::QcError;
    use crate::locator::{FixedCenterLocator, LocatorConfig};
    use crate::roi::FixedCropLayout;
    use crate::types::{MetricKind, MetricStatus, Modality, Point, RoiLabel};
    use chrono::TimeZone;

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 14, 8, 0, 0).unwrap()
    }

    /// Water disk of radius 200 (0 HU) on a 50 HU background
    fn water_phantom() -> CalibratedImage {
        CalibratedImage::from_fn(512, 512, Modality::Ct, |x, y| {
            let dx = x as f64 - 256.0;
            let dy = y as f64 - 256.0;
            if dx * dx + dy * dy <= 200.0 * 200.0 {
                0.0
            } else {
                50.0
            }
        })
        .unwrap()
    }

    #[test]
    fn test_water_phantom_passes() {
        let analyzer = QualityAnalyzer::new(AnalysisConfig::default()).unwrap();
        let request = EvaluationRequest::new("water", Material::Water, timestamp());
        let verdict = analyzer.evaluate(&water_phantom(), &request).unwrap();

        assert!(verdict.is_pass(), "failing: {:?}", verdict.failing_metrics().collect::<Vec<_>>());
        assert!(verdict.warnings.is_empty());
        let geometry = verdict.geometry.as_ref().unwrap();
        assert!(!geometry.detected.fallback);
        assert!(geometry.detected.confidence >= 0.9);
        assert!((geometry.detected.center.x - 256.0).abs() <= 2.0);
        assert!((geometry.detected.center.y - 256.0).abs() <= 2.0);

        let uniformity = verdict.metric(MetricKind::Uniformity, None).unwrap();
        assert_eq!(uniformity.value, 0.0);
        let accuracy = verdict
            .metric(MetricKind::Accuracy, Some(RoiLabel::North))
            .unwrap();
        assert_eq!(accuracy.status, MetricStatus::Ok);
    }

    #[test]
    fn test_verdict_is_deterministic() {
        let analyzer = QualityAnalyzer::new(AnalysisConfig::default()).unwrap();
        let image = water_phantom();
        let request = EvaluationRequest::new("water", Material::Water, timestamp())
            .with_radius_scale(RadiusScale::new(0.9).unwrap());

        let first = analyzer.evaluate(&image, &request).unwrap().to_json().unwrap();
        let second = analyzer.evaluate(&image, &request).unwrap().to_json().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_fallback_is_reported() {
        let analyzer = QualityAnalyzer::new(AnalysisConfig::default()).unwrap();
        let image = CalibratedImage::new(300, 200, Modality::Ct, vec![0.0; 300 * 200]).unwrap();
        let request = EvaluationRequest::new("flat", Material::Water, timestamp());
        let verdict = analyzer.evaluate(&image, &request).unwrap();

        assert_eq!(
            verdict.warnings,
            vec![QcWarning::DetectionFallback {
                center: Point::new(150.0, 100.0),
                radius: 66.0,
            }]
        );
        assert!(verdict.is_pass());
    }

    #[test]
    fn test_tiny_image_degrades_to_fallback() {
        let analyzer = QualityAnalyzer::new(AnalysisConfig::default()).unwrap();
        let image = CalibratedImage::new(2, 2, Modality::Ct, vec![0.0; 4]).unwrap();
        let request = EvaluationRequest::new("tiny", Material::Water, timestamp());
        let verdict = analyzer.evaluate(&image, &request).unwrap();

        assert_eq!(
            verdict.warnings,
            vec![QcWarning::DetectionFallback {
                center: Point::new(1.0, 1.0),
                radius: 1.0,
            }]
        );
        assert_eq!(verdict.roi_statistics.len(), 5);
    }

    #[test]
    fn test_air_reference_fails_on_water() {
        let config = AnalysisConfig::default().with_locator(LocatorConfig::FixedCenter {
            x: 256.0,
            y: 256.0,
            radius: 200.0,
        });
        let analyzer = QualityAnalyzer::new(config).unwrap();
        let request = EvaluationRequest::new("air", Material::Air, timestamp());
        let verdict = analyzer.evaluate(&water_phantom(), &request).unwrap();

        assert_eq!(verdict.status, OverallStatus::Fail);
        assert_eq!(
            verdict
                .failing_metrics()
                .filter(|m| m.kind == MetricKind::Accuracy)
                .count(),
            5
        );
    }

    #[test]
    fn test_missing_thresholds_fail_before_pixel_work() {
        let config = AnalysisConfig::default().with_thresholds(ThresholdConfig::default());
        let analyzer = QualityAnalyzer::new(config).unwrap();
        let request = EvaluationRequest::new("x", Material::Water, timestamp());
        let err = analyzer.evaluate(&water_phantom(), &request).unwrap_err();
        assert!(matches!(err, QcError::Configuration(_)));
    }

    #[test]
    fn test_with_locator_override() {
        let analyzer = QualityAnalyzer::new(AnalysisConfig::default())
            .unwrap()
            .with_locator(Box::new(
                FixedCenterLocator::new(Point::new(256.0, 256.0), 200.0).unwrap(),
            ));
        let request = EvaluationRequest::new("water", Material::Water, timestamp());
        let verdict = analyzer.evaluate(&water_phantom(), &request).unwrap();
        assert_eq!(verdict.geometry.unwrap().locator, "fixed-center");
    }

    fn mammo_phantom() -> CalibratedImage {
        // Signal disk around (150, 90) at 120, background alternating 90/110
        CalibratedImage::from_fn(400, 300, Modality::Mammography, |x, y| {
            let dx = x as f64 - 150.0;
            let dy = y as f64 - 90.0;
            if dx * dx + dy * dy <= 50.0 * 50.0 {
                120.0
            } else if (x + y) % 2 == 0 {
                90.0
            } else {
                110.0
            }
        })
        .unwrap()
    }

    fn fixed_crop_analyzer() -> QualityAnalyzer {
        let config = AnalysisConfig::default()
            .with_fixed_crop(FixedCropLayout::default().with_origin(Point::new(0.0, 0.0)))
            .with_histogram_bins(16);
        QualityAnalyzer::new(config).unwrap()
    }

    #[test]
    fn test_fixed_crop_workflow() {
        let request = EvaluationRequest::new("mammo", Material::Acrylic, timestamp())
            .with_workflow(Workflow::FixedCrop)
            .with_visual_reading(VisualReading::new(4, 3, 3));
        let verdict = fixed_crop_analyzer()
            .evaluate(&mammo_phantom(), &request)
            .unwrap();

        assert!(verdict.geometry.is_none());
        let background = verdict.roi_statistics(RoiLabel::Background).unwrap();
        assert!((background.mean - 100.0).abs() < 0.5);
        assert!((background.stddev - 10.0).abs() < 0.1);

        let snr = verdict.metric(MetricKind::Snr, None).unwrap();
        assert!((snr.value - 12.0).abs() < 0.2);
        let cnr = verdict.metric(MetricKind::Cnr, None).unwrap();
        assert!((cnr.value - 2.0).abs() < 0.1);
        assert_eq!(verdict.metrics.len(), 5);

        let summary = verdict.image_summary.unwrap();
        assert_eq!(summary.histogram.counts.len(), 16);
        assert_eq!(summary.statistics.count, 400 * 300);
    }

    #[test]
    fn test_fixed_crop_outside_image() {
        let analyzer = QualityAnalyzer::new(AnalysisConfig::default()).unwrap();
        let image = CalibratedImage::new(100, 100, Modality::Mammography, vec![1.0; 10_000]).unwrap();
        let request = EvaluationRequest::new("small", Material::Acrylic, timestamp())
            .with_workflow(Workflow::FixedCrop);
        let err = analyzer.evaluate(&image, &request).unwrap_err();
        assert!(matches!(err, QcError::InvalidRoi { .. }));
    }

    #[test]
    fn test_batch_isolates_failures() {
        let analyzer = fixed_crop_analyzer();
        let good = EvaluationRequest::new("good", Material::Acrylic, timestamp())
            .with_workflow(Workflow::FixedCrop);
        let flat = CalibratedImage::new(400, 300, Modality::Mammography, vec![7.0; 120_000]).unwrap();
        let inputs = vec![
            (mammo_phantom(), good.clone()),
            (flat, good.clone()),
            (mammo_phantom(), good),
        ];

        let results = analyzer.evaluate_batch(&inputs);
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(QcError::UndefinedMetric { metric: MetricKind::Snr, .. })
        ));
        assert!(results[2].is_ok());
    }
}
