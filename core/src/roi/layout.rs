use crate::error::Result;
use crate::roi::RoiRegion;
use crate::types::{PhantomGeometry, Point, RadiusScale, RoiLabel};
use serde::{Deserialize, Serialize};

/// Five-ROI topology anchored on the phantom geometry
///
/// The defaults (offset 0.75 of the phantom radius, ROI radius 25 px) are
/// empirical values for a particular scanner/phantom pair; sites with
/// different hardware override them through configuration.
///
/// # Example
///
/// ```
/// use phantomqc_core::roi::PhantomRoiLayout;
/// use phantomqc_core::{PhantomGeometry, Point, RadiusScale, RoiLabel};
///
/// let geometry = PhantomGeometry::fixed(Point::new(256.0, 256.0), 200.0);
/// let rois = PhantomRoiLayout::default().build(&geometry, RadiusScale::default()).unwrap();
///
/// assert_eq!(rois.len(), 5);
/// assert_eq!(rois[0].label, RoiLabel::Center);
/// assert_eq!(rois[1].center, Point::new(406.0, 256.0));
/// assert_eq!(rois[1].radius, 25.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhantomRoiLayout {
    /// Peripheral center distance as a fraction of the scaled phantom radius
    pub peripheral_offset_fraction: f64,
    /// ROI disk radius in pixels at scale 1.0
    pub roi_radius: f64,
}

impl Default for PhantomRoiLayout {
    fn default() -> Self {
        Self {
            peripheral_offset_fraction: 0.75,
            roi_radius: 25.0,
        }
    }
}

impl PhantomRoiLayout {
    /// Builder: set the peripheral offset fraction
    pub fn with_peripheral_offset_fraction(mut self, fraction: f64) -> Self {
        self.peripheral_offset_fraction = fraction;
        self
    }

    /// Builder: set the ROI radius at scale 1.0
    pub fn with_roi_radius(mut self, radius: f64) -> Self {
        self.roi_radius = radius;
        self
    }

    /// Builds center, 3h, 6h, 9h and 12h ROIs, in that order
    ///
    /// `geometry` is the detected geometry; `scale` multiplies both the
    /// phantom radius (and with it the peripheral offset) and the ROI radius.
    ///
    /// # Errors
    ///
    /// Returns [`crate::QcError::InvalidRoi`] if the scaled ROI radius is not
    /// positive.
    pub fn build(&self, geometry: &PhantomGeometry, scale: RadiusScale) -> Result<Vec<RoiRegion>> {
        let adjusted = geometry.scaled(scale);
        let offset = adjusted.radius * self.peripheral_offset_fraction;
        let radius = self.roi_radius * scale.value();
        let c = adjusted.center;

        [
            (RoiLabel::Center, c),
            (RoiLabel::East, c.offset(offset, 0.0)),
            (RoiLabel::South, c.offset(0.0, offset)),
            (RoiLabel::West, c.offset(-offset, 0.0)),
            (RoiLabel::North, c.offset(0.0, -offset)),
        ]
        .into_iter()
        .map(|(label, center)| RoiRegion::new(label, center, radius))
        .collect()
    }
}

/// Static signal/background ROI pair for fixed-crop workflows
///
/// Centers are given relative to a crop origin so that a site can move the
/// whole pair when its phantom holder shifts. The defaults locate the mass
/// and background disks of the accreditation phantom on the reference
/// mammography unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedCropLayout {
    /// Top-left corner of the crop in image pixels
    pub origin: Point,
    /// Signal ROI center relative to the origin
    pub signal_offset: Point,
    /// Background ROI center relative to the origin
    pub background_offset: Point,
    /// Radius of both ROIs in pixels
    pub radius: f64,
}

impl Default for FixedCropLayout {
    fn default() -> Self {
        Self {
            origin: Point::new(1270.0, 740.0),
            signal_offset: Point::new(150.0, 90.0),
            background_offset: Point::new(170.0, 200.0),
            radius: 40.0,
        }
    }
}

impl FixedCropLayout {
    /// Builder: set the crop origin
    pub fn with_origin(mut self, origin: Point) -> Self {
        self.origin = origin;
        self
    }

    /// Builder: set the ROI radius
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    /// Builds the `(signal, background)` pair
    ///
    /// # Errors
    ///
    /// Returns [`crate::QcError::InvalidRoi`] for a non-positive radius.
    pub fn build(&self) -> Result<(RoiRegion, RoiRegion)> {
        let signal = RoiRegion::new(
            RoiLabel::Signal,
            self.origin
                .offset(self.signal_offset.x, self.signal_offset.y),
            self.radius,
        )?;
        let background = RoiRegion::new(
            RoiLabel::Background,
            self.origin
                .offset(self.background_offset.x, self.background_offset.y),
            self.radius,
        )?;
        Ok((signal, background))
    }
}
