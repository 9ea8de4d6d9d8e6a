use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::conformance::ThresholdConfig;
use crate::error::{QcError, Result};
use crate::locator::LocatorConfig;
use crate::roi::{FixedCropLayout, PhantomRoiLayout};

/// Everything an analysis needs besides the image and the request
///
/// Missing sections in a JSON document take their defaults, and an absent
/// `thresholds` section selects the bundled threshold table.
///
/// # Example
///
/// ```
/// use phantomqc_core::AnalysisConfig;
/// use phantomqc_core::locator::LocatorConfig;
///
/// let config = AnalysisConfig::from_json_str(r#"{
///     "locator": {"kind": "fixed-center", "x": 256.0, "y": 256.0, "radius": 200.0},
///     "phantom_layout": {"roi_radius": 20.0}
/// }"#).unwrap();
///
/// assert!(matches!(config.locator, LocatorConfig::FixedCenter { .. }));
/// assert_eq!(config.phantom_layout.roi_radius, 20.0);
/// assert_eq!(config.phantom_layout.peripheral_offset_fraction, 0.75);
/// assert!(!config.thresholds.entries.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Phantom locator selection
    pub locator: LocatorConfig,

    /// Central and peripheral ROI placement
    pub phantom_layout: PhantomRoiLayout,

    /// Signal/background ROI placement for the fixed-crop workflow
    pub fixed_crop: FixedCropLayout,

    /// Bins of the whole-image histogram
    pub histogram_bins: usize,

    /// Threshold table keyed by modality and material
    pub thresholds: ThresholdConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            locator: LocatorConfig::default(),
            phantom_layout: PhantomRoiLayout::default(),
            fixed_crop: FixedCropLayout::default(),
            histogram_bins: 256,
            thresholds: ThresholdConfig::bundled().clone(),
        }
    }
}

impl AnalysisConfig {
    /// Parses a configuration document
    ///
    /// # Errors
    ///
    /// Returns [`QcError::Json`] for malformed JSON and
    /// [`QcError::Configuration`] for invalid values.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a configuration document from disk
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Checks values serde cannot constrain
    pub fn validate(&self) -> Result<()> {
        let fraction = self.phantom_layout.peripheral_offset_fraction;
        if !(fraction.is_finite() && fraction >= 0.0) {
            return Err(QcError::Configuration(format!(
                "peripheral offset fraction must be non-negative, got {}",
                fraction
            )));
        }
        self.locator.validate()?;
        if self.histogram_bins == 0 {
            return Err(QcError::Configuration(
                "histogram_bins must be at least 1".to_string(),
            ));
        }
        self.thresholds.validate()
    }

    /// Builder: set the locator
    pub fn with_locator(mut self, locator: LocatorConfig) -> Self {
        self.locator = locator;
        self
    }

    /// Builder: set the five-ROI layout
    pub fn with_phantom_layout(mut self, layout: PhantomRoiLayout) -> Self {
        self.phantom_layout = layout;
        self
    }

    /// Builder: set the signal/background layout
    pub fn with_fixed_crop(mut self, layout: FixedCropLayout) -> Self {
        self.fixed_crop = layout;
        self
    }

    /// Builder: set the histogram bin count
    pub fn with_histogram_bins(mut self, bins: usize) -> Self {
        self.histogram_bins = bins;
        self
    }

    /// Builder: replace the threshold table
    pub fn with_thresholds(mut self, thresholds: ThresholdConfig) -> Self {
        self.thresholds = thresholds;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::HoughConfig;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.locator, LocatorConfig::Hough(HoughConfig::default()));
        assert_eq!(config.histogram_bins, 256);
        assert_eq!(&config.thresholds, ThresholdConfig::bundled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_document_is_default() {
        let config = AnalysisConfig::from_json_str("{}").unwrap();
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn test_rejects_invalid_values() {
        let err = AnalysisConfig::from_json_str(r#"{"histogram_bins": 0}"#).unwrap_err();
        assert!(matches!(err, QcError::Configuration(_)));

        let err = AnalysisConfig::from_json_str(
            r#"{"phantom_layout": {"peripheral_offset_fraction": -0.5}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, QcError::Configuration(_)));
    }

    #[test]
    fn test_rejects_invalid_hough_parameters() {
        let err = AnalysisConfig::from_json_str(
            r#"{"locator": {"kind": "hough", "accum_sigma": 0.0}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, QcError::Configuration(_)));

        let config = AnalysisConfig::default().with_locator(LocatorConfig::Hough(HoughConfig {
            sectors: 0,
            ..HoughConfig::default()
        }));
        assert!(matches!(
            crate::api::QualityAnalyzer::new(config),
            Err(QcError::Configuration(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"locator": {{"kind": "hough", "min_coverage": 0.7}}, "histogram_bins": 64}}"#
        )
        .unwrap();

        let config = AnalysisConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.histogram_bins, 64);
        match config.locator {
            LocatorConfig::Hough(hough) => {
                assert_eq!(hough.min_coverage, 0.7);
                assert_eq!(hough.sectors, 72);
            }
            other => panic!("unexpected locator {:?}", other),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = AnalysisConfig::from_json_file(Path::new("/nonexistent/phantomqc.json"))
            .unwrap_err();
        assert!(matches!(err, QcError::IoError(_)));
    }
}
