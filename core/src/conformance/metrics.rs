use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{MetricKind, MetricStatus, RoiLabel, Unit};

/// Inclusive interval; an absent bound is unbounded
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBand {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl ThresholdBand {
    pub fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn at_most(max: f64) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    pub fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    /// Returns whether `value` lies within the band; NaN never does
    pub fn contains(&self, value: f64) -> bool {
        if value.is_nan() {
            return false;
        }
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }

    pub fn status_of(&self, value: f64) -> MetricStatus {
        if self.contains(value) {
            MetricStatus::Ok
        } else {
            MetricStatus::Out
        }
    }
}

impl fmt::Display for ThresholdBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (Some(min), Some(max)) => write!(f, "[{}, {}]", min, max),
            (None, Some(max)) => write!(f, "<= {}", max),
            (Some(min), None) => write!(f, ">= {}", min),
            (None, None) => write!(f, "any"),
        }
    }
}

/// One classified quality index
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityMetric {
    pub kind: MetricKind,
    /// ROI the value was measured on, for per-ROI metrics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roi: Option<RoiLabel>,
    pub value: f64,
    pub unit: Unit,
    pub band: ThresholdBand,
    pub status: MetricStatus,
}

impl QualityMetric {
    /// Classifies `value` against `band`
    pub fn classify(
        kind: MetricKind,
        roi: Option<RoiLabel>,
        value: f64,
        unit: Unit,
        band: ThresholdBand,
    ) -> Self {
        Self {
            kind,
            roi,
            value,
            unit,
            band,
            status: band.status_of(value),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    /// Display name, e.g. `accuracy[3h]`
    pub fn display_name(&self) -> String {
        match self.roi {
            Some(roi) => format!("{}[{}]", self.kind, roi),
            None => self.kind.to_string(),
        }
    }
}

/// Counts of phantom objects seen by a human reader
///
/// Supplied alongside an image when a visual scoring is part of the test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualReading {
    pub fibers: u32,
    pub specks: u32,
    pub masses: u32,
}

impl VisualReading {
    pub fn new(fibers: u32, specks: u32, masses: u32) -> Self {
        Self {
            fibers,
            specks,
            masses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ThresholdBand::at_most(15.0), 15.0, true)]
    #[case(ThresholdBand::at_most(15.0), 15.0000001, false)]
    #[case(ThresholdBand::at_least(2.0), 2.0, true)]
    #[case(ThresholdBand::at_least(2.0), 1.99, false)]
    #[case(ThresholdBand::between(-5.0, 5.0), -5.0, true)]
    #[case(ThresholdBand::between(-5.0, 5.0), 5.5, false)]
    #[case(ThresholdBand::between(-5.0, 5.0), f64::NAN, false)]
    fn test_band_is_inclusive(#[case] band: ThresholdBand, #[case] value: f64, #[case] inside: bool) {
        assert_eq!(band.contains(value), inside);
    }

    #[test]
    fn test_band_display() {
        assert_eq!(ThresholdBand::between(-5.0, 5.0).to_string(), "[-5, 5]");
        assert_eq!(ThresholdBand::at_most(15.0).to_string(), "<= 15");
        assert_eq!(ThresholdBand::at_least(2.5).to_string(), ">= 2.5");
    }

    #[test]
    fn test_classify() {
        let metric = QualityMetric::classify(
            MetricKind::Noise,
            Some(RoiLabel::East),
            16.0,
            Unit::Percent,
            ThresholdBand::at_most(15.0),
        );
        assert_eq!(metric.status, MetricStatus::Out);
        assert_eq!(metric.display_name(), "noise[3h]");
    }
}
