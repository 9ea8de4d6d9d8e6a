use crate::error::{QcError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pixel-space position (x = column, y = row)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Returns this point shifted by `(dx, dy)`
    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Center and outer radius of a circular phantom cross-section
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhantomGeometry {
    pub center: Point,
    pub radius: f64,
    /// Fraction of the outline supported by edges, in `[0, 1]`
    pub confidence: f64,
    /// Set when detection failed and the conservative default was used
    pub fallback: bool,
}

impl PhantomGeometry {
    /// Geometry reported with full confidence, e.g. from a fixed-center locator
    pub fn fixed(center: Point, radius: f64) -> Self {
        Self {
            center,
            radius,
            confidence: 1.0,
            fallback: false,
        }
    }

    /// Conservative default for an image of the given size
    ///
    /// Center at `(width div 2, height div 2)`, radius `min(width, height) div 3`
    /// but at least 1 so images narrower than 3 pixels keep a positive radius.
    pub fn fallback_for(width: usize, height: usize) -> Self {
        Self {
            center: Point::new((width / 2) as f64, (height / 2) as f64),
            radius: (width.min(height) / 3).max(1) as f64,
            confidence: 0.0,
            fallback: true,
        }
    }

    /// Returns the geometry with its radius multiplied by `scale`
    pub fn scaled(&self, scale: RadiusScale) -> Self {
        Self {
            radius: self.radius * scale.value(),
            ..*self
        }
    }
}

/// Manual refinement factor for the detected outer boundary
///
/// # Example
///
/// ```
/// use phantomqc_core::RadiusScale;
///
/// assert!(RadiusScale::new(1.2).is_ok());
/// assert!(RadiusScale::new(1.6).is_err());
/// assert_eq!(RadiusScale::default().value(), 1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct RadiusScale(f64);

impl RadiusScale {
    pub const MIN: f64 = 0.5;
    pub const MAX: f64 = 1.5;

    /// Validates a scale factor
    ///
    /// # Errors
    ///
    /// Returns [`QcError::InvalidParameter`] outside `[0.5, 1.5]`.
    pub fn new(value: f64) -> Result<Self> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(QcError::InvalidParameter(format!(
                "radius scale {} outside [{}, {}]",
                value,
                Self::MIN,
                Self::MAX
            )));
        }
        Ok(Self(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl Default for RadiusScale {
    fn default() -> Self {
        Self(1.0)
    }
}

impl TryFrom<f64> for RadiusScale {
    type Error = QcError;

    fn try_from(value: f64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<RadiusScale> for f64 {
    fn from(scale: RadiusScale) -> f64 {
        scale.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_fallback_geometry() {
        let g = PhantomGeometry::fallback_for(512, 400);
        assert_eq!(g.center, Point::new(256.0, 200.0));
        assert_eq!(g.radius, 133.0);
        assert!(g.fallback);
        assert_eq!(g.confidence, 0.0);
    }

    #[rstest]
    #[case(2, 2)]
    #[case(1, 40)]
    #[case(5, 2)]
    fn test_fallback_radius_stays_positive(#[case] width: usize, #[case] height: usize) {
        assert_eq!(PhantomGeometry::fallback_for(width, height).radius, 1.0);
    }

    #[rstest]
    #[case(0.5, true)]
    #[case(1.0, true)]
    #[case(1.5, true)]
    #[case(0.49, false)]
    #[case(1.51, false)]
    #[case(f64::NAN, false)]
    fn test_radius_scale_bounds(#[case] value: f64, #[case] valid: bool) {
        assert_eq!(RadiusScale::new(value).is_ok(), valid);
    }

    #[test]
    fn test_scaled_keeps_center_and_flags() {
        let g = PhantomGeometry::fixed(Point::new(10.0, 20.0), 100.0);
        let scaled = g.scaled(RadiusScale::new(0.8).unwrap());
        assert_eq!(scaled.center, g.center);
        assert!((scaled.radius - 80.0).abs() < 1e-12);
        assert!(!scaled.fallback);
    }

    #[test]
    fn test_radius_scale_deserialization_validates() {
        let ok: RadiusScale = serde_json::from_str("1.25").unwrap();
        assert_eq!(ok.value(), 1.25);
        assert!(serde_json::from_str::<RadiusScale>("3.0").is_err());
    }
}
