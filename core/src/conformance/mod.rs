//! Quality indices, threshold classification and verdicts
//!
//! - [`ThresholdConfig`]: regulatory limits keyed by modality and material
//! - [`evaluate_phantom`] / [`evaluate_contrast`] / [`evaluate_visual`]:
//!   pure derivation of [`QualityMetric`]s from ROI statistics
//! - [`ConformanceVerdict`]: the aggregated outcome of one image

mod evaluator;
mod metrics;
mod thresholds;
mod verdict;

pub use evaluator::{
    cnr, evaluate_contrast, evaluate_phantom, evaluate_visual, noise_percent, snr,
    PeripheralDeviation, PhantomMetrics,
};
pub use metrics::{QualityMetric, ThresholdBand, VisualReading};
pub use thresholds::{
    AccuracyLimit, CeilingLimit, ContrastLimits, FloorLimit, NoiseLimit, PhantomLimits,
    ThresholdConfig, ThresholdEntry, ThresholdSet, VisualMinimums,
};
pub use verdict::{ConformanceVerdict, GeometryReport, ImageSummary, QcWarning};
