//! Phantom center and outer radius estimation
//!
//! Detection is a capability with interchangeable variants:
//! - [`HoughLocator`]: gradient-voting circular accumulator with a
//!   deterministic fallback
//! - [`FixedCenterLocator`]: returns a configured geometry, for fixed
//!   setups and reproducible tests
//!
//! [`LocatorConfig`] selects the variant from configuration.

mod hough;

pub use hough::{HoughConfig, HoughLocator};

use crate::error::{QcError, Result};
use crate::types::{CalibratedImage, PhantomGeometry, Point};
use serde::{Deserialize, Serialize};

/// Locates a circular phantom cross-section in a calibrated image
///
/// Implementations must be pure: the same image always yields the same
/// geometry, and every non-empty image yields a valid one.
pub trait PhantomLocator: Send + Sync {
    /// Estimates the phantom geometry
    fn locate(&self, image: &CalibratedImage) -> PhantomGeometry;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// Locator returning a configured geometry regardless of image content
///
/// # Example
///
/// ```
/// use phantomqc_core::locator::{FixedCenterLocator, PhantomLocator};
/// use phantomqc_core::{CalibratedImage, Modality, Point};
///
/// let locator = FixedCenterLocator::new(Point::new(32.0, 32.0), 20.0).unwrap();
/// let image = CalibratedImage::new(64, 64, Modality::Ct, vec![0.0; 64 * 64]).unwrap();
/// let geometry = locator.locate(&image);
/// assert_eq!(geometry.radius, 20.0);
/// assert!(!geometry.fallback);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FixedCenterLocator {
    center: Point,
    radius: f64,
}

impl FixedCenterLocator {
    /// # Errors
    ///
    /// Returns [`QcError::InvalidParameter`] for a non-positive radius or a
    /// non-finite coordinate.
    pub fn new(center: Point, radius: f64) -> Result<Self> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(QcError::InvalidParameter(format!(
                "fixed phantom radius must be positive, got {}",
                radius
            )));
        }
        if !(center.x.is_finite() && center.y.is_finite()) {
            return Err(QcError::InvalidParameter(format!(
                "fixed phantom center must be finite, got {}",
                center
            )));
        }
        Ok(Self { center, radius })
    }
}

impl PhantomLocator for FixedCenterLocator {
    fn locate(&self, _image: &CalibratedImage) -> PhantomGeometry {
        PhantomGeometry::fixed(self.center, self.radius)
    }

    fn name(&self) -> &'static str {
        "fixed-center"
    }
}

/// Locator selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum LocatorConfig {
    /// Circular accumulator detection
    Hough(HoughConfig),
    /// Known phantom position
    FixedCenter { x: f64, y: f64, radius: f64 },
}

impl Default for LocatorConfig {
    fn default() -> Self {
        LocatorConfig::Hough(HoughConfig::default())
    }
}

impl LocatorConfig {
    /// Checks detector parameters
    ///
    /// A fixed geometry is checked when the locator is built.
    pub fn validate(&self) -> Result<()> {
        match self {
            LocatorConfig::Hough(config) => config.validate(),
            LocatorConfig::FixedCenter { .. } => Ok(()),
        }
    }

    /// Instantiates the configured locator
    ///
    /// # Errors
    ///
    /// Returns [`QcError::InvalidParameter`] for an invalid fixed geometry.
    pub fn build(&self) -> Result<Box<dyn PhantomLocator>> {
        match self {
            LocatorConfig::Hough(config) => Ok(Box::new(HoughLocator::new(config.clone()))),
            LocatorConfig::FixedCenter { x, y, radius } => Ok(Box::new(FixedCenterLocator::new(
                Point::new(*x, *y),
                *radius,
            )?)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Modality;

    #[test]
    fn test_fixed_locator_ignores_content() {
        let locator = FixedCenterLocator::new(Point::new(5.0, 6.0), 3.0).unwrap();
        let a = CalibratedImage::new(16, 16, Modality::Ct, vec![0.0; 256]).unwrap();
        let b = CalibratedImage::from_fn(16, 16, Modality::Ct, |x, _| x as f64).unwrap();
        assert_eq!(locator.locate(&a), locator.locate(&b));
        assert_eq!(locator.locate(&a).confidence, 1.0);
    }

    #[test]
    fn test_fixed_locator_rejects_bad_radius() {
        assert!(FixedCenterLocator::new(Point::new(0.0, 0.0), 0.0).is_err());
        assert!(FixedCenterLocator::new(Point::new(0.0, 0.0), -4.0).is_err());
        assert!(FixedCenterLocator::new(Point::new(f64::NAN, 0.0), 4.0).is_err());
    }

    #[test]
    fn test_config_builds_named_locator() {
        let hough = LocatorConfig::default().build().unwrap();
        assert_eq!(hough.name(), "hough");

        let fixed = LocatorConfig::FixedCenter {
            x: 10.0,
            y: 10.0,
            radius: 4.0,
        }
        .build()
        .unwrap();
        assert_eq!(fixed.name(), "fixed-center");
    }

    #[test]
    fn test_hough_config_validation() {
        assert!(LocatorConfig::default().validate().is_ok());

        let invalid = [
            HoughConfig {
                accum_sigma: 0.0,
                ..HoughConfig::default()
            },
            HoughConfig {
                accum_sigma: f32::NAN,
                ..HoughConfig::default()
            },
            HoughConfig {
                grad_threshold: 0.0,
                ..HoughConfig::default()
            },
            HoughConfig {
                grad_threshold: 1.5,
                ..HoughConfig::default()
            },
            HoughConfig {
                min_alignment: -0.1,
                ..HoughConfig::default()
            },
            HoughConfig {
                min_coverage: f64::INFINITY,
                ..HoughConfig::default()
            },
            HoughConfig {
                sectors: 0,
                ..HoughConfig::default()
            },
        ];
        for config in invalid {
            let err = LocatorConfig::Hough(config.clone()).validate().unwrap_err();
            assert!(matches!(err, QcError::Configuration(_)), "{:?}", config);
        }
    }

    #[test]
    fn test_invalid_hough_config_falls_back() {
        let locator = HoughLocator::new(HoughConfig {
            accum_sigma: 0.0,
            ..HoughConfig::default()
        });
        let image = CalibratedImage::from_fn(128, 128, Modality::Ct, |x, y| {
            let dx = x as f64 - 64.0;
            let dy = y as f64 - 64.0;
            if dx * dx + dy * dy <= 40.0 * 40.0 {
                0.0
            } else {
                100.0
            }
        })
        .unwrap();
        assert_eq!(locator.locate(&image), PhantomGeometry::fallback_for(128, 128));
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config: LocatorConfig =
            serde_json::from_str(r#"{"kind": "fixed-center", "x": 1.0, "y": 2.0, "radius": 3.0}"#)
                .unwrap();
        assert_eq!(
            config,
            LocatorConfig::FixedCenter {
                x: 1.0,
                y: 2.0,
                radius: 3.0
            }
        );

        let config: LocatorConfig = serde_json::from_str(r#"{"kind": "hough"}"#).unwrap();
        assert_eq!(config, LocatorConfig::Hough(HoughConfig::default()));
    }
}
