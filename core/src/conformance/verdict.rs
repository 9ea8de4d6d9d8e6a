use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::evaluator::PeripheralDeviation;
use super::metrics::QualityMetric;
use crate::error::Result;
use crate::roi::RoiRegion;
use crate::stats::{DescriptiveStatistics, Histogram, RoiStatistics};
use crate::types::{
    Material, MetricKind, Modality, OverallStatus, PhantomGeometry, Point, RadiusScale, RoiLabel,
    Workflow,
};

/// Non-fatal conditions raised during an evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum QcWarning {
    /// The locator found no phantom and used the geometric default
    DetectionFallback { center: Point, radius: f64 },
}

impl fmt::Display for QcWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QcWarning::DetectionFallback { center, radius } => write!(
                f,
                "phantom not detected, using center {} radius {:.1}",
                center, radius
            ),
        }
    }
}

/// Detected and scale-adjusted phantom geometry of an evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryReport {
    pub locator: String,
    pub detected: PhantomGeometry,
    pub radius_scale: RadiusScale,
    pub adjusted: PhantomGeometry,
}

/// Whole-image statistics reported by the fixed-crop workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSummary {
    pub statistics: DescriptiveStatistics,
    pub histogram: Histogram,
}

/// Final, immutable outcome of one image evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConformanceVerdict {
    pub image_id: String,
    pub modality: Modality,
    pub material: Material,
    pub workflow: Workflow,
    pub evaluated_at: DateTime<Utc>,
    pub status: OverallStatus,
    pub metrics: Vec<QualityMetric>,
    pub roi_statistics: Vec<RoiStatistics>,
    pub rois: Vec<RoiRegion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry: Option<GeometryReport>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub peripheral_deviations: Vec<PeripheralDeviation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_summary: Option<ImageSummary>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub warnings: Vec<QcWarning>,
}

impl ConformanceVerdict {
    pub fn is_pass(&self) -> bool {
        self.status.is_pass()
    }

    /// Metrics whose value lies outside their band
    pub fn failing_metrics(&self) -> impl Iterator<Item = &QualityMetric> {
        self.metrics.iter().filter(|m| !m.is_ok())
    }

    /// Looks up a metric by kind and ROI
    pub fn metric(&self, kind: MetricKind, roi: Option<RoiLabel>) -> Option<&QualityMetric> {
        self.metrics.iter().find(|m| m.kind == kind && m.roi == roi)
    }

    /// Statistics of one ROI
    pub fn roi_statistics(&self, roi: RoiLabel) -> Option<&RoiStatistics> {
        self.roi_statistics.iter().find(|s| s.roi == roi)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
