//! Disk-shaped sampling regions and their pixel masks
//!
//! - [`RoiRegion`]: labeled disk (center + radius)
//! - [`RoiMask`]: pixel coordinates of a region clipped to image bounds
//! - [`PhantomRoiLayout`]: central + four peripheral ROIs from phantom geometry
//! - [`FixedCropLayout`]: static signal/background pair

mod layout;

pub use layout::{FixedCropLayout, PhantomRoiLayout};

use crate::error::{QcError, Result};
use crate::types::{CalibratedImage, Point, RoiLabel};
use serde::{Deserialize, Serialize};

/// Labeled disk over which statistics are computed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoiRegion {
    pub label: RoiLabel,
    pub center: Point,
    pub radius: f64,
}

impl RoiRegion {
    /// Creates a region
    ///
    /// # Errors
    ///
    /// Returns [`QcError::InvalidRoi`] for a non-positive or non-finite
    /// radius, or a non-finite center.
    pub fn new(label: RoiLabel, center: Point, radius: f64) -> Result<Self> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(QcError::InvalidRoi {
                roi: label,
                reason: format!("radius must be positive, got {}", radius),
            });
        }
        if !(center.x.is_finite() && center.y.is_finite()) {
            return Err(QcError::InvalidRoi {
                roi: label,
                reason: format!("center must be finite, got {}", center),
            });
        }
        Ok(Self {
            label,
            center,
            radius,
        })
    }

    /// Pixels within the disk, clipped to a `width` x `height` image
    ///
    /// A pixel `(x, y)` belongs to the mask iff
    /// `(x - cx)^2 + (y - cy)^2 <= r^2`.
    ///
    /// # Errors
    ///
    /// Returns [`QcError::InvalidRoi`] when no pixel of the disk lies inside
    /// the image.
    ///
    /// # Example
    ///
    /// ```
    /// use phantomqc_core::roi::RoiRegion;
    /// use phantomqc_core::{Point, RoiLabel};
    ///
    /// let roi = RoiRegion::new(RoiLabel::Center, Point::new(0.0, 0.0), 1.0).unwrap();
    /// let mask = roi.mask(10, 10).unwrap();
    /// // (0,0), (1,0), (0,1): the rest of the disk is clipped away
    /// assert_eq!(mask.len(), 3);
    /// ```
    pub fn mask(&self, width: usize, height: usize) -> Result<RoiMask> {
        let r = self.radius;
        let x_lo = (self.center.x - r).ceil().max(0.0);
        let y_lo = (self.center.y - r).ceil().max(0.0);
        let x_hi = (self.center.x + r).floor().min(width as f64 - 1.0);
        let y_hi = (self.center.y + r).floor().min(height as f64 - 1.0);

        let mut pixels = Vec::new();
        if x_lo <= x_hi && y_lo <= y_hi {
            let r_sq = r * r;
            for y in y_lo as usize..=y_hi as usize {
                let dy = y as f64 - self.center.y;
                for x in x_lo as usize..=x_hi as usize {
                    let dx = x as f64 - self.center.x;
                    if dx * dx + dy * dy <= r_sq {
                        pixels.push((x, y));
                    }
                }
            }
        }

        if pixels.is_empty() {
            return Err(QcError::InvalidRoi {
                roi: self.label,
                reason: format!(
                    "disk at {} with radius {:.1} has no pixels inside {}x{} image",
                    self.center, self.radius, width, height
                ),
            });
        }

        Ok(RoiMask {
            label: self.label,
            pixels,
        })
    }
}

/// Non-empty set of in-bounds pixel coordinates `(x, y)` in row-major order
#[derive(Debug, Clone, PartialEq)]
pub struct RoiMask {
    label: RoiLabel,
    pixels: Vec<(usize, usize)>,
}

impl RoiMask {
    pub fn label(&self) -> RoiLabel {
        self.label
    }

    pub fn pixels(&self) -> &[(usize, usize)] {
        &self.pixels
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Masked values of `image`, flattened in mask order
    pub fn values(&self, image: &CalibratedImage) -> Vec<f64> {
        self.pixels.iter().map(|&(x, y)| image.get(x, y)).collect()
    }
}
