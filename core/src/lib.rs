pub mod api;
pub mod calibration;
pub mod cli;
pub mod config;
pub mod conformance;
pub mod error;
pub mod extraction;
pub mod locator;
pub mod roi;
pub mod scan;
pub mod stats;
pub mod types;

#[cfg(feature = "python")]
mod python;

pub use api::{EvaluationRequest, QualityAnalyzer};
pub use calibration::{calibrate, CalibrationParams};
pub use cli::report::TextReport;
pub use config::AnalysisConfig;
pub use conformance::{
    ConformanceVerdict, QcWarning, QualityMetric, ThresholdBand, ThresholdConfig, VisualReading,
};
pub use error::{QcError, Result};
pub use extraction::AcquisitionInfo;
pub use scan::PhantomScan;
pub use stats::{DescriptiveStatistics, Histogram, RoiStatistics};
pub use types::*;
