//! Circular accumulator detection of the phantom outline.
//!
//! Each pixel with a strong gradient casts votes along its gradient
//! direction at every distance in the radius band. The outline of a
//! circular phantom makes those votes converge at its center. The radius is
//! then read from the distance histogram of edge pixels whose gradient points
//! radially from that center, and a least-squares circle fit over those edges
//! refines both before outline coverage is measured.

use std::f64::consts::PI;

use image::{GrayImage, ImageBuffer, Luma};
use imageproc::filter::{gaussian_blur_f32, median_filter};
use imageproc::gradients::{horizontal_scharr, vertical_scharr};
use log::debug;
use serde::{Deserialize, Serialize};

use super::PhantomLocator;
use crate::error::{QcError, Result};
use crate::types::{CalibratedImage, PhantomGeometry, Point};

/// Smallest image side on which detection is attempted.
const MIN_SIDE: usize = 16;

/// Circle fit passes after the accumulator peak.
const REFINE_PASSES: usize = 5;

/// Initial inlier half-width of the circle fit, as a fraction of the radius.
const REFINE_INITIAL_TOLERANCE: f64 = 0.1;

/// Half-width (pixels) of the band in which edges count toward coverage.
const COVERAGE_BAND: f64 = 1.5;

/// Configuration for the accumulator detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoughConfig {
    /// Median filter radius (pixels); 2 gives a 5x5 window.
    pub median_radius: u32,
    /// Gradient magnitude threshold (fraction of max gradient).
    pub grad_threshold: f32,
    /// Gaussian sigma for accumulator smoothing.
    pub accum_sigma: f32,
    /// Minimum |cos| between gradient and radial direction for radius support.
    pub min_alignment: f64,
    /// Number of angular sectors used to measure outline coverage.
    pub sectors: usize,
    /// Minimum fraction of supported sectors to accept a detection.
    pub min_coverage: f64,
}

impl Default for HoughConfig {
    fn default() -> Self {
        Self {
            median_radius: 2,
            grad_threshold: 0.2,
            accum_sigma: 2.0,
            min_alignment: 0.9,
            sectors: 72,
            min_coverage: 0.5,
        }
    }
}

impl HoughConfig {
    /// Checks values serde cannot constrain
    ///
    /// # Errors
    ///
    /// Returns [`QcError::Configuration`] naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if !(self.accum_sigma.is_finite() && self.accum_sigma > 0.0) {
            return Err(invalid("accum_sigma must be positive", self.accum_sigma));
        }
        if !(self.grad_threshold > 0.0 && self.grad_threshold <= 1.0) {
            return Err(invalid("grad_threshold must be in (0, 1]", self.grad_threshold));
        }
        if !(0.0..=1.0).contains(&self.min_alignment) {
            return Err(invalid("min_alignment must be in [0, 1]", self.min_alignment));
        }
        if !self.min_coverage.is_finite() {
            return Err(invalid("min_coverage must be finite", self.min_coverage));
        }
        if self.sectors == 0 {
            return Err(QcError::Configuration(
                "sectors must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn invalid(message: &str, value: impl std::fmt::Display) -> QcError {
    QcError::Configuration(format!("hough locator: {}, got {}", message, value))
}

/// Accumulator-based phantom locator
#[derive(Debug, Clone, Default)]
pub struct HoughLocator {
    config: HoughConfig,
}

impl HoughLocator {
    pub fn new(config: HoughConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HoughConfig {
        &self.config
    }

    fn detect(&self, image: &CalibratedImage) -> Option<PhantomGeometry> {
        if let Err(err) = self.config.validate() {
            debug!("detection skipped: {}", err);
            return None;
        }
        let (w, h) = (image.width(), image.height());
        if w < MIN_SIDE || h < MIN_SIDE {
            debug!("image {}x{} too small for detection", w, h);
            return None;
        }
        let min_dim = w.min(h) as f64;
        let band = RadiusBand {
            min: min_dim / 6.0,
            max: min_dim / 2.0,
        };

        let gray = normalize(image)?;
        let r = self.config.median_radius;
        let smoothed = median_filter(&gray, r, r);
        let edges = edge_samples(&smoothed, self.config.grad_threshold);
        if edges.is_empty() {
            debug!("no edge pixels above threshold");
            return None;
        }

        let peak = vote_center(&edges, w as u32, h as u32, &band, self.config.accum_sigma)?;
        let seed_radius = histogram_radius(&edges, peak, &band, self.config.min_alignment)?;
        let (center, radius) =
            refine_circle(&edges, peak, seed_radius, &band, self.config.min_alignment);
        if !(center.x >= 0.0 && center.x < w as f64 && center.y >= 0.0 && center.y < h as f64) {
            debug!("refined center {} outside the image", center);
            return None;
        }
        let coverage = outline_coverage(&edges, center, radius, &self.config);
        debug!(
            "accumulator peak at {} refined to {} radius {:.1} coverage {:.2} ({} edge pixels)",
            peak,
            center,
            radius,
            coverage,
            edges.len()
        );

        if coverage < self.config.min_coverage {
            debug!(
                "coverage {:.2} below threshold {:.2}",
                coverage, self.config.min_coverage
            );
            return None;
        }

        Some(PhantomGeometry {
            center,
            radius,
            confidence: coverage,
            fallback: false,
        })
    }
}

impl PhantomLocator for HoughLocator {
    fn locate(&self, image: &CalibratedImage) -> PhantomGeometry {
        self.detect(image)
            .unwrap_or_else(|| PhantomGeometry::fallback_for(image.width(), image.height()))
    }

    fn name(&self) -> &'static str {
        "hough"
    }
}

/// Admissible radius interval (pixels)
struct RadiusBand {
    min: f64,
    max: f64,
}

impl RadiusBand {
    fn contains(&self, r: f64) -> bool {
        r >= self.min && r <= self.max
    }
}

/// Edge pixel with unit gradient direction
#[derive(Debug, Clone, Copy)]
struct EdgeSample {
    x: f32,
    y: f32,
    dx: f32,
    dy: f32,
    mag: f32,
}

/// Maps finite intensities linearly onto `[0, 255]`.
///
/// Returns `None` for an image without contrast.
fn normalize(image: &CalibratedImage) -> Option<GrayImage> {
    let (lo, hi) = image.finite_range()?;
    let span = hi - lo;
    if span <= f64::EPSILON * hi.abs().max(1.0) {
        debug!("image has no contrast");
        return None;
    }
    let w = image.width();
    let data = image.data();
    Some(GrayImage::from_fn(w as u32, image.height() as u32, |x, y| {
        let v = data[y as usize * w + x as usize];
        let scaled = if v.is_finite() {
            ((v - lo) / span * 255.0).round().clamp(0.0, 255.0)
        } else {
            0.0
        };
        Luma([scaled as u8])
    }))
}

fn edge_samples(gray: &GrayImage, grad_threshold: f32) -> Vec<EdgeSample> {
    let (w, h) = gray.dimensions();
    let gx = horizontal_scharr(gray);
    let gy = vertical_scharr(gray);

    let mut max_mag_sq: f32 = 0.0;
    for y in 0..h {
        for x in 0..w {
            let gxv = gx.get_pixel(x, y)[0] as f32;
            let gyv = gy.get_pixel(x, y)[0] as f32;
            max_mag_sq = max_mag_sq.max(gxv * gxv + gyv * gyv);
        }
    }
    let max_mag = max_mag_sq.sqrt();
    if max_mag < 1e-6 {
        return Vec::new();
    }
    let threshold = grad_threshold * max_mag;

    let mut edges = Vec::new();
    for y in 0..h {
        for x in 0..w {
            let gxv = gx.get_pixel(x, y)[0] as f32;
            let gyv = gy.get_pixel(x, y)[0] as f32;
            let mag = (gxv * gxv + gyv * gyv).sqrt();
            if mag < threshold || mag < 1e-6 {
                continue;
            }
            edges.push(EdgeSample {
                x: x as f32,
                y: y as f32,
                dx: gxv / mag,
                dy: gyv / mag,
                mag,
            });
        }
    }
    edges
}

/// Deposit a weighted vote into the accumulator using bilinear interpolation.
#[inline]
fn bilinear_add(accum: &mut [f32], w: u32, x: f32, y: f32, weight: f32) {
    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    if x0 + 1 >= w {
        return;
    }
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;
    let stride = w as usize;
    let base = y0 as usize * stride + x0 as usize;
    accum[base] += weight * (1.0 - fx) * (1.0 - fy);
    accum[base + 1] += weight * fx * (1.0 - fy);
    accum[base + stride] += weight * (1.0 - fx) * fy;
    accum[base + stride + 1] += weight * fx * fy;
}

/// Strongest center of the smoothed vote accumulator.
fn vote_center(
    edges: &[EdgeSample],
    w: u32,
    h: u32,
    band: &RadiusBand,
    sigma: f32,
) -> Option<Point> {
    let mut accum = vec![0.0f32; (w * h) as usize];
    let r_start = band.min.ceil() as u32;
    let r_end = band.max.floor() as u32;

    for e in edges {
        for &sign in &[-1.0f32, 1.0] {
            for r in r_start..=r_end {
                let r = r as f32;
                let vx = e.x + sign * e.dx * r;
                let vy = e.y + sign * e.dy * r;
                if vx >= 0.0 && vx < (w - 1) as f32 && vy >= 0.0 && vy < (h - 1) as f32 {
                    bilinear_add(&mut accum, w, vx, vy, e.mag);
                }
            }
        }
    }

    let accum_img = ImageBuffer::<Luma<f32>, Vec<f32>>::from_raw(w, h, accum)?;
    let smoothed = gaussian_blur_f32(&accum_img, sigma);
    let data = smoothed.as_raw();

    // First index wins ties so the peak is reproducible.
    let mut best_idx = 0usize;
    let mut best_val = 0.0f32;
    for (idx, &val) in data.iter().enumerate() {
        if val > best_val {
            best_val = val;
            best_idx = idx;
        }
    }
    if best_val <= 1e-6 {
        return None;
    }

    let px = (best_idx % w as usize) as i64;
    let py = (best_idx / w as usize) as i64;
    Some(refine_peak(data, w as i64, h as i64, px, py))
}

/// Weighted centroid of the 3x3 neighborhood around an accumulator peak.
fn refine_peak(data: &[f32], w: i64, h: i64, px: i64, py: i64) -> Point {
    let mut sum = 0.0f64;
    let mut sx = 0.0f64;
    let mut sy = 0.0f64;
    for y in (py - 1).max(0)..=(py + 1).min(h - 1) {
        for x in (px - 1).max(0)..=(px + 1).min(w - 1) {
            let v = data[(y * w + x) as usize] as f64;
            sum += v;
            sx += v * x as f64;
            sy += v * y as f64;
        }
    }
    if sum <= 0.0 {
        return Point::new(px as f64, py as f64);
    }
    Point::new(sx / sum, sy / sum)
}

/// Distance to `center` and |cos| between gradient and radial direction.
#[inline]
fn radial(e: &EdgeSample, center: Point) -> Option<(f64, f64)> {
    let rx = e.x as f64 - center.x;
    let ry = e.y as f64 - center.y;
    let d = rx.hypot(ry);
    if d == 0.0 {
        return None;
    }
    Some((d, ((e.dx as f64 * rx + e.dy as f64 * ry) / d).abs()))
}

/// Best-supported distance from `center` to radially aligned edges.
fn histogram_radius(
    edges: &[EdgeSample],
    center: Point,
    band: &RadiusBand,
    min_alignment: f64,
) -> Option<f64> {
    let bins = band.max.ceil() as usize + 2;
    let mut hist = vec![0.0f64; bins];
    let mut weighted = vec![0.0f64; bins];

    for e in edges {
        let Some((d, alignment)) = radial(e, center) else {
            continue;
        };
        if !band.contains(d) || alignment < min_alignment {
            continue;
        }
        let bin = d.round() as usize;
        hist[bin] += alignment;
        weighted[bin] += alignment * d;
    }

    let first = (band.min.ceil() as usize).max(1);
    let last = (band.max.floor() as usize).min(bins - 2);
    let mut best: Option<(usize, f64)> = None;
    for b in first..=last {
        let support = hist[b - 1] + hist[b] + hist[b + 1];
        if support > best.map_or(0.0, |(_, s)| s) {
            best = Some((b, support));
        }
    }
    let (bin, support) = best?;

    let mean = (weighted[bin - 1] + weighted[bin] + weighted[bin + 1]) / support;
    Some(mean.clamp(band.min, band.max))
}

/// Iterative least-squares circle fit seeded by the accumulator peak.
///
/// Gradient directions on a pixelated outline deviate from the true radial
/// direction by a few degrees, which spreads the accumulator peak over a
/// small ring around the true center. Each pass fits a circle to the aligned
/// edges near the current outline and halves the inlier band. A pass whose
/// fit leaves the radius band keeps the previous estimate.
fn refine_circle(
    edges: &[EdgeSample],
    center: Point,
    radius: f64,
    band: &RadiusBand,
    min_alignment: f64,
) -> (Point, f64) {
    let mut center = center;
    let mut radius = radius;
    let mut tolerance = (radius * REFINE_INITIAL_TOLERANCE).max(3.0);

    for _ in 0..REFINE_PASSES {
        let inliers: Vec<(f64, f64)> = edges
            .iter()
            .filter(|e| {
                radial(e, center).is_some_and(|(d, alignment)| {
                    (d - radius).abs() <= tolerance && alignment >= min_alignment
                })
            })
            .map(|e| (e.x as f64, e.y as f64))
            .collect();

        match fit_circle(&inliers) {
            Some((c, r)) if band.contains(r) => {
                center = c;
                radius = r;
            }
            _ => break,
        }
        tolerance = (tolerance * 0.5).max(COVERAGE_BAND);
    }
    (center, radius)
}

/// Algebraic circle fit in centroid-relative coordinates.
///
/// Returns `None` for fewer than three points or collinear points.
fn fit_circle(points: &[(f64, f64)]) -> Option<(Point, f64)> {
    if points.len() < 3 {
        return None;
    }
    let n = points.len() as f64;
    let mx = points.iter().map(|p| p.0).sum::<f64>() / n;
    let my = points.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut suu, mut svv, mut suv) = (0.0, 0.0, 0.0);
    let (mut suuu, mut svvv, mut suvv, mut svuu) = (0.0, 0.0, 0.0, 0.0);
    for &(x, y) in points {
        let u = x - mx;
        let v = y - my;
        suu += u * u;
        svv += v * v;
        suv += u * v;
        suuu += u * u * u;
        svvv += v * v * v;
        suvv += u * v * v;
        svuu += v * u * u;
    }

    let det = suu * svv - suv * suv;
    if det.abs() <= f64::EPSILON * (suu * svv).max(1.0) {
        return None;
    }
    let b1 = 0.5 * (suuu + suvv);
    let b2 = 0.5 * (svvv + svuu);
    let uc = (b1 * svv - b2 * suv) / det;
    let vc = (suu * b2 - suv * b1) / det;
    let radius = (uc * uc + vc * vc + (suu + svv) / n).sqrt();
    if !(uc.is_finite() && vc.is_finite() && radius.is_finite()) {
        return None;
    }
    Some((Point::new(uc + mx, vc + my), radius))
}

/// Fraction of angular sectors carrying aligned edges on the circle.
fn outline_coverage(
    edges: &[EdgeSample],
    center: Point,
    radius: f64,
    config: &HoughConfig,
) -> f64 {
    let sectors = config.sectors.max(1);
    let mut covered = vec![false; sectors];
    for e in edges {
        let Some((d, alignment)) = radial(e, center) else {
            continue;
        };
        if (d - radius).abs() > COVERAGE_BAND || alignment < config.min_alignment {
            continue;
        }
        let angle = (e.y as f64 - center.y).atan2(e.x as f64 - center.x) + PI;
        let sector = ((angle / (2.0 * PI)) * sectors as f64) as usize % sectors;
        covered[sector] = true;
    }
    covered.iter().filter(|&&c| c).count() as f64 / sectors as f64
}
