use crate::error::{QcError, Result};
use crate::types::Modality;

/// Stored pixel values as read from the acquisition, before calibration
///
/// Pixels are row-major: index `y * width + x`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawImage {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<i32>,
}

impl RawImage {
    /// Creates a raw image, checking that the buffer matches the dimensions
    ///
    /// # Errors
    ///
    /// Returns [`QcError::InvalidImage`] for a zero dimension or a buffer of
    /// the wrong length.
    pub fn new(width: usize, height: usize, pixels: Vec<i32>) -> Result<Self> {
        check_shape(width, height, pixels.len())?;
        Ok(Self {
            width,
            height,
            pixels,
        })
    }
}

/// 2D array of physical-unit intensities
///
/// Created once per study by [`crate::calibration::calibrate`] (or directly
/// from an already calibrated buffer) and only read afterwards.
///
/// # Example
///
/// ```
/// use phantomqc_core::{CalibratedImage, Modality};
///
/// let image = CalibratedImage::new(3, 2, Modality::Ct, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
/// assert_eq!(image.get(2, 1), 5.0);
/// assert_eq!(image.min_dimension(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CalibratedImage {
    width: usize,
    height: usize,
    modality: Modality,
    data: Vec<f64>,
}

impl CalibratedImage {
    /// Creates a calibrated image from a row-major buffer
    ///
    /// # Errors
    ///
    /// Returns [`QcError::InvalidImage`] for a zero dimension or a buffer of
    /// the wrong length.
    pub fn new(width: usize, height: usize, modality: Modality, data: Vec<f64>) -> Result<Self> {
        check_shape(width, height, data.len())?;
        Ok(Self {
            width,
            height,
            modality,
            data,
        })
    }

    /// Builds an image by evaluating `f(x, y)` for every pixel
    pub fn from_fn<F>(width: usize, height: usize, modality: Modality, mut f: F) -> Result<Self>
    where
        F: FnMut(usize, usize) -> f64,
    {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self::new(width, height, modality, data)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn modality(&self) -> Modality {
        self.modality
    }

    /// Smaller of width and height
    pub fn min_dimension(&self) -> usize {
        self.width.min(self.height)
    }

    /// Row-major pixel buffer
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Value at column `x`, row `y`
    ///
    /// # Panics
    ///
    /// Panics if the coordinate lies outside the image.
    pub fn get(&self, x: usize, y: usize) -> f64 {
        assert!(x < self.width && y < self.height, "pixel out of bounds");
        self.data[y * self.width + x]
    }

    /// Finite minimum and maximum, or `None` if no pixel is finite
    pub fn finite_range(&self) -> Option<(f64, f64)> {
        self.data
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

fn check_shape(width: usize, height: usize, len: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(QcError::InvalidImage(format!(
            "image dimensions must be non-zero, got {}x{}",
            width, height
        )));
    }
    if width.checked_mul(height) != Some(len) {
        return Err(QcError::InvalidImage(format!(
            "pixel buffer has {} values, expected {}x{}",
            len, width, height
        )));
    }
    Ok(())
}
