use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use super::metrics::ThresholdBand;
use crate::error::{QcError, Result};
use crate::types::{Material, Modality};

/// Allowed deviation of a ROI mean from the material's reference value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracyLimit {
    pub reference: f64,
    pub tolerance: f64,
}

impl AccuracyLimit {
    /// `[reference - tolerance, reference + tolerance]`
    pub fn band(&self) -> ThresholdBand {
        ThresholdBand::between(
            self.reference - self.tolerance,
            self.reference + self.tolerance,
        )
    }
}

fn default_noise_normalization() -> f64 {
    1000.0
}

/// Ceiling on the normalized noise `stddev * 100 / normalization`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseLimit {
    pub ceiling: f64,
    #[serde(default = "default_noise_normalization")]
    pub normalization: f64,
}

/// Upper limit (inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CeilingLimit {
    pub ceiling: f64,
}

/// Lower limit (inclusive)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloorLimit {
    pub floor: f64,
}

/// Minimum counts of phantom objects a reader must see
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualMinimums {
    pub fibers: u32,
    pub specks: u32,
    pub masses: u32,
}

/// Limits configured for one (modality, material) pair
///
/// Every limit is optional in the data; the evaluation of a workflow
/// resolves the ones it needs and fails with [`QcError::Configuration`]
/// when one is missing.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<AccuracyLimit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noise: Option<NoiseLimit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uniformity: Option<CeilingLimit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snr: Option<FloorLimit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cnr: Option<FloorLimit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visual: Option<VisualMinimums>,
}

/// Limits needed by the five-ROI phantom workflow
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhantomLimits {
    pub accuracy: AccuracyLimit,
    pub noise: NoiseLimit,
    pub uniformity: CeilingLimit,
}

/// Limits needed by the signal/background workflow
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContrastLimits {
    pub snr: FloorLimit,
    pub cnr: FloorLimit,
}

/// Threshold entry keyed by modality and material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdEntry {
    pub modality: Modality,
    pub material: Material,
    #[serde(flatten)]
    pub limits: ThresholdSet,
}

impl ThresholdEntry {
    fn missing(&self, what: &str) -> QcError {
        QcError::Configuration(format!(
            "no {} threshold configured for {}/{}",
            what, self.modality, self.material
        ))
    }

    /// Resolves accuracy, noise and uniformity limits
    ///
    /// # Errors
    ///
    /// Returns [`QcError::Configuration`] naming the first missing limit.
    pub fn phantom_limits(&self) -> Result<PhantomLimits> {
        let accuracy = self.limits.accuracy.ok_or_else(|| self.missing("accuracy"))?;
        let noise = self.limits.noise.ok_or_else(|| self.missing("noise"))?;
        let uniformity = self
            .limits
            .uniformity
            .ok_or_else(|| self.missing("uniformity"))?;
        if !(noise.normalization.is_finite() && noise.normalization > 0.0) {
            return Err(QcError::Configuration(format!(
                "noise normalization for {}/{} must be positive, got {}",
                self.modality, self.material, noise.normalization
            )));
        }
        Ok(PhantomLimits {
            accuracy,
            noise,
            uniformity,
        })
    }

    /// Resolves SNR and CNR limits
    ///
    /// # Errors
    ///
    /// Returns [`QcError::Configuration`] naming the first missing limit.
    pub fn contrast_limits(&self) -> Result<ContrastLimits> {
        Ok(ContrastLimits {
            snr: self.limits.snr.ok_or_else(|| self.missing("snr"))?,
            cnr: self.limits.cnr.ok_or_else(|| self.missing("cnr"))?,
        })
    }

    /// Resolves visual scoring minimums
    ///
    /// # Errors
    ///
    /// Returns [`QcError::Configuration`] when none are configured.
    pub fn visual_minimums(&self) -> Result<VisualMinimums> {
        self.limits.visual.ok_or_else(|| self.missing("visual score"))
    }
}

static BUNDLED: OnceLock<ThresholdConfig> = OnceLock::new();

/// Threshold configuration keyed by (modality, material)
///
/// Regulatory limits live in data so that a change of regulation is a
/// configuration edit. The bundled table is `config/thresholds.json`.
///
/// # Example
///
/// ```
/// use phantomqc_core::conformance::ThresholdConfig;
/// use phantomqc_core::{Material, Modality};
///
/// let config = ThresholdConfig::from_json_str(r#"{
///     "entries": [
///         {"modality": "ct", "material": "water",
///          "accuracy": {"reference": 0.0, "tolerance": 4.0},
///          "noise": {"ceiling": 10.0},
///          "uniformity": {"ceiling": 4.0}}
///     ]
/// }"#).unwrap();
///
/// let limits = config.entry(Modality::Ct, Material::Water).unwrap().phantom_limits().unwrap();
/// assert_eq!(limits.accuracy.tolerance, 4.0);
/// assert_eq!(limits.noise.normalization, 1000.0);
/// assert!(config.entry(Modality::Ct, Material::Air).is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub entries: Vec<ThresholdEntry>,
}

impl ThresholdConfig {
    /// Thresholds shipped with the crate
    pub fn bundled() -> &'static ThresholdConfig {
        BUNDLED.get_or_init(|| {
            Self::from_json_str(include_str!("../../config/thresholds.json"))
                .expect("Failed to parse bundled thresholds")
        })
    }

    /// Parses a threshold table from JSON
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a threshold table from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Rejects duplicate keys and non-finite limits
    pub fn validate(&self) -> Result<()> {
        for (i, entry) in self.entries.iter().enumerate() {
            if self.entries[..i]
                .iter()
                .any(|e| e.modality == entry.modality && e.material == entry.material)
            {
                return Err(QcError::Configuration(format!(
                    "duplicate threshold entry for {}/{}",
                    entry.modality, entry.material
                )));
            }
            let l = &entry.limits;
            let values = [
                l.accuracy.map(|a| a.reference),
                l.accuracy.map(|a| a.tolerance),
                l.noise.map(|n| n.ceiling),
                l.noise.map(|n| n.normalization),
                l.uniformity.map(|u| u.ceiling),
                l.snr.map(|s| s.floor),
                l.cnr.map(|c| c.floor),
            ];
            if values.iter().flatten().any(|v| !v.is_finite()) {
                return Err(QcError::Configuration(format!(
                    "non-finite limit for {}/{}",
                    entry.modality, entry.material
                )));
            }
            if l.accuracy.is_some_and(|a| a.tolerance < 0.0) {
                return Err(QcError::Configuration(format!(
                    "negative accuracy tolerance for {}/{}",
                    entry.modality, entry.material
                )));
            }
        }
        Ok(())
    }

    /// Entry for a modality and material
    ///
    /// # Errors
    ///
    /// Returns [`QcError::Configuration`] if the pair is not configured.
    pub fn entry(&self, modality: Modality, material: Material) -> Result<&ThresholdEntry> {
        self.entries
            .iter()
            .find(|e| e.modality == modality && e.material == material)
            .ok_or_else(|| {
                QcError::Configuration(format!(
                    "no thresholds configured for {}/{}",
                    modality, material
                ))
            })
    }
}
