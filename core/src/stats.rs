//! Scalar statistics over pixel sets
//!
//! Conventions:
//! - standard deviation is the population value (divides by `n`)
//! - skewness is the biased third standardized moment `m3 / m2^1.5`
//! - kurtosis is the biased excess (Fisher) kurtosis `m4 / m2^2 - 3`
//! - a constant set has stddev, skewness and kurtosis all exactly `0`
//!
//! These match the defaults of the statistics routine used for the
//! historical results, so values remain comparable.

use crate::error::{QcError, Result};
use crate::roi::RoiMask;
use crate::types::{CalibratedImage, RoiLabel};
use serde::{Deserialize, Serialize};

/// Moments of a non-empty set of values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStatistics {
    pub mean: f64,
    pub variance: f64,
    pub stddev: f64,
    pub skewness: f64,
    pub kurtosis: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

impl DescriptiveStatistics {
    /// Computes the statistics in two passes over `values`
    ///
    /// # Errors
    ///
    /// Returns [`QcError::EmptyRegion`] for an empty slice.
    ///
    /// # Example
    ///
    /// ```
    /// use phantomqc_core::stats::DescriptiveStatistics;
    ///
    /// let stats = DescriptiveStatistics::from_values(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
    /// assert_eq!(stats.mean, 5.0);
    /// assert_eq!(stats.stddev, 2.0);
    /// ```
    pub fn from_values(values: &[f64]) -> Result<Self> {
        let first = *values
            .first()
            .ok_or_else(|| QcError::EmptyRegion("no values to summarize".to_string()))?;

        let mut min = first;
        let mut max = first;
        let mut sum = 0.0f64;
        for &v in values {
            min = min.min(v);
            max = max.max(v);
            sum += v;
        }
        let n = values.len();

        if min == max {
            return Ok(Self {
                mean: first,
                variance: 0.0,
                stddev: 0.0,
                skewness: 0.0,
                kurtosis: 0.0,
                min,
                max,
                count: n,
            });
        }

        let mean = sum / n as f64;
        let (mut m2, mut m3, mut m4) = (0.0f64, 0.0f64, 0.0f64);
        for &v in values {
            let d = v - mean;
            let d2 = d * d;
            m2 += d2;
            m3 += d2 * d;
            m4 += d2 * d2;
        }
        m2 /= n as f64;
        m3 /= n as f64;
        m4 /= n as f64;

        let (skewness, kurtosis) = if m2 > 0.0 {
            (m3 / m2.powf(1.5), m4 / (m2 * m2) - 3.0)
        } else {
            (0.0, 0.0)
        };

        Ok(Self {
            mean,
            variance: m2,
            stddev: m2.sqrt(),
            skewness,
            kurtosis,
            min,
            max,
            count: n,
        })
    }

    /// Statistics of every pixel of an image
    pub fn of_image(image: &CalibratedImage) -> Result<Self> {
        Self::from_values(image.data())
    }
}

/// Per-ROI summary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoiStatistics {
    pub roi: RoiLabel,
    pub mean: f64,
    pub stddev: f64,
    pub skewness: f64,
    pub kurtosis: f64,
    pub pixel_count: usize,
}

impl RoiStatistics {
    /// Summarizes already extracted ROI values
    ///
    /// # Errors
    ///
    /// Returns [`QcError::EmptyRegion`] for an empty slice.
    pub fn from_values(roi: RoiLabel, values: &[f64]) -> Result<Self> {
        let stats = DescriptiveStatistics::from_values(values)
            .map_err(|_| QcError::EmptyRegion(format!("ROI {} selected no pixels", roi)))?;
        Ok(Self {
            roi,
            mean: stats.mean,
            stddev: stats.stddev,
            skewness: stats.skewness,
            kurtosis: stats.kurtosis,
            pixel_count: stats.count,
        })
    }

    /// Summarizes the pixels of `image` selected by `mask`
    pub fn compute(image: &CalibratedImage, mask: &RoiMask) -> Result<Self> {
        Self::from_values(mask.label(), &mask.values(image))
    }
}

/// Intensity histogram with equal-width bins over `[min, max]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Histogram {
    pub min: f64,
    pub max: f64,
    pub counts: Vec<u64>,
}

impl Histogram {
    /// Bins finite values into `bins` buckets (at least one)
    ///
    /// The maximum value falls into the last bucket.
    ///
    /// # Errors
    ///
    /// Returns [`QcError::EmptyRegion`] when no value is finite.
    pub fn from_values(values: &[f64], bins: usize) -> Result<Self> {
        let (min, max) = values
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
            .ok_or_else(|| QcError::EmptyRegion("no finite values to bin".to_string()))?;

        let bin_count = bins.max(1);
        let mut counts = vec![0u64; bin_count];
        let range = max - min;
        for &v in values.iter().filter(|v| v.is_finite()) {
            let idx = if range == 0.0 {
                0
            } else {
                (((v - min) / range) * bin_count as f64).floor() as usize
            };
            counts[idx.min(bin_count - 1)] += 1;
        }

        Ok(Self { min, max, counts })
    }

    /// Width of one bin
    pub fn bin_width(&self) -> f64 {
        (self.max - self.min) / self.counts.len() as f64
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}
