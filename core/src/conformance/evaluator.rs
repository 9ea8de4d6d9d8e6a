//! Derivation and classification of quality indices
//!
//! Every function here is pure: the same statistics and limits always give
//! the same metrics.

use serde::{Deserialize, Serialize};

use super::metrics::{QualityMetric, ThresholdBand, VisualReading};
use super::thresholds::{ContrastLimits, PhantomLimits, VisualMinimums};
use crate::error::{QcError, Result};
use crate::stats::RoiStatistics;
use crate::types::{MetricKind, RoiLabel, Unit};

/// Signed deviation of a peripheral ROI mean from the central mean
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeripheralDeviation {
    pub roi: RoiLabel,
    pub deviation: f64,
}

/// Metrics of the five-ROI phantom workflow
#[derive(Debug, Clone, PartialEq)]
pub struct PhantomMetrics {
    pub metrics: Vec<QualityMetric>,
    pub deviations: Vec<PeripheralDeviation>,
}

/// Normalized noise in percent: `stddev * 100 / normalization`
pub fn noise_percent(stddev: f64, normalization: f64) -> f64 {
    stddev * 100.0 / normalization
}

/// Signal mean over background standard deviation
///
/// # Errors
///
/// Returns [`QcError::UndefinedMetric`] when the background stddev is zero.
///
/// # Example
///
/// ```
/// use phantomqc_core::conformance::snr;
/// use phantomqc_core::stats::RoiStatistics;
/// use phantomqc_core::RoiLabel;
///
/// let signal = RoiStatistics { roi: RoiLabel::Signal, mean: 120.0, stddev: 4.0, skewness: 0.0, kurtosis: 0.0, pixel_count: 100 };
/// let background = RoiStatistics { roi: RoiLabel::Background, mean: 100.0, stddev: 10.0, skewness: 0.0, kurtosis: 0.0, pixel_count: 100 };
/// assert_eq!(snr(&signal, &background).unwrap(), 12.0);
/// ```
pub fn snr(signal: &RoiStatistics, background: &RoiStatistics) -> Result<f64> {
    let sigma = background_sigma(background, MetricKind::Snr)?;
    Ok(signal.mean / sigma)
}

/// Absolute mean difference over background standard deviation
///
/// # Errors
///
/// Returns [`QcError::UndefinedMetric`] when the background stddev is zero.
pub fn cnr(signal: &RoiStatistics, background: &RoiStatistics) -> Result<f64> {
    let sigma = background_sigma(background, MetricKind::Cnr)?;
    Ok((background.mean - signal.mean).abs() / sigma)
}

fn background_sigma(background: &RoiStatistics, metric: MetricKind) -> Result<f64> {
    if background.stddev > 0.0 && background.stddev.is_finite() {
        Ok(background.stddev)
    } else {
        Err(QcError::UndefinedMetric {
            metric,
            reason: format!(
                "background stddev is {} over {} pixels",
                background.stddev, background.pixel_count
            ),
        })
    }
}

/// Accuracy, noise and uniformity for a central + peripheral ROI set
///
/// Accuracy and noise are reported for every ROI; uniformity is the largest
/// absolute deviation of a peripheral mean from the central mean.
///
/// # Errors
///
/// Returns [`QcError::UndefinedMetric`] when the central ROI or all
/// peripheral ROIs are missing from `stats`.
pub fn evaluate_phantom(
    stats: &[RoiStatistics],
    limits: &PhantomLimits,
    unit: Unit,
) -> Result<PhantomMetrics> {
    let central = stats
        .iter()
        .find(|s| s.roi == RoiLabel::Center)
        .ok_or_else(|| QcError::UndefinedMetric {
            metric: MetricKind::Uniformity,
            reason: "central ROI statistics missing".to_string(),
        })?;

    let deviations: Vec<PeripheralDeviation> = stats
        .iter()
        .filter(|s| s.roi.is_peripheral())
        .map(|s| PeripheralDeviation {
            roi: s.roi,
            deviation: s.mean - central.mean,
        })
        .collect();
    if deviations.is_empty() {
        return Err(QcError::UndefinedMetric {
            metric: MetricKind::Uniformity,
            reason: "no peripheral ROI statistics".to_string(),
        });
    }

    let accuracy_band = limits.accuracy.band();
    let noise_band = ThresholdBand::at_most(limits.noise.ceiling);

    let mut metrics = Vec::with_capacity(stats.len() * 2 + 1);
    for s in stats {
        metrics.push(QualityMetric::classify(
            MetricKind::Accuracy,
            Some(s.roi),
            s.mean,
            unit,
            accuracy_band,
        ));
    }
    for s in stats {
        metrics.push(QualityMetric::classify(
            MetricKind::Noise,
            Some(s.roi),
            noise_percent(s.stddev, limits.noise.normalization),
            Unit::Percent,
            noise_band,
        ));
    }

    let uniformity = deviations
        .iter()
        .map(|d| d.deviation.abs())
        .fold(0.0f64, f64::max);
    metrics.push(QualityMetric::classify(
        MetricKind::Uniformity,
        None,
        uniformity,
        unit,
        ThresholdBand::at_most(limits.uniformity.ceiling),
    ));

    Ok(PhantomMetrics {
        metrics,
        deviations,
    })
}

/// SNR and CNR for a signal/background pair
///
/// # Errors
///
/// Returns [`QcError::UndefinedMetric`] when the background stddev is zero.
pub fn evaluate_contrast(
    signal: &RoiStatistics,
    background: &RoiStatistics,
    limits: &ContrastLimits,
) -> Result<Vec<QualityMetric>> {
    Ok(vec![
        QualityMetric::classify(
            MetricKind::Snr,
            None,
            snr(signal, background)?,
            Unit::Ratio,
            ThresholdBand::at_least(limits.snr.floor),
        ),
        QualityMetric::classify(
            MetricKind::Cnr,
            None,
            cnr(signal, background)?,
            Unit::Ratio,
            ThresholdBand::at_least(limits.cnr.floor),
        ),
    ])
}

/// Visual scoring counts against their minimums
pub fn evaluate_visual(reading: &VisualReading, minimums: &VisualMinimums) -> Vec<QualityMetric> {
    [
        (MetricKind::VisibleFibers, reading.fibers, minimums.fibers),
        (MetricKind::VisibleSpecks, reading.specks, minimums.specks),
        (MetricKind::VisibleMasses, reading.masses, minimums.masses),
    ]
    .into_iter()
    .map(|(kind, seen, min)| {
        QualityMetric::classify(
            kind,
            None,
            seen as f64,
            Unit::Count,
            ThresholdBand::at_least(min as f64),
        )
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conformance::thresholds::{AccuracyLimit, CeilingLimit, FloorLimit, NoiseLimit};
    use crate::types::MetricStatus;

    fn roi(roi: RoiLabel, mean: f64, stddev: f64) -> RoiStatistics {
        RoiStatistics {
            roi,
            mean,
            stddev,
            skewness: 0.0,
            kurtosis: 0.0,
            pixel_count: 1961,
        }
    }

    fn water_limits() -> PhantomLimits {
        PhantomLimits {
            accuracy: AccuracyLimit {
                reference: 0.0,
                tolerance: 5.0,
            },
            noise: NoiseLimit {
                ceiling: 15.0,
                normalization: 1000.0,
            },
            uniformity: CeilingLimit { ceiling: 5.0 },
        }
    }

    fn five(means: [f64; 5], stddevs: [f64; 5]) -> Vec<RoiStatistics> {
        [
            RoiLabel::Center,
            RoiLabel::East,
            RoiLabel::South,
            RoiLabel::West,
            RoiLabel::North,
        ]
        .into_iter()
        .enumerate()
        .map(|(i, label)| roi(label, means[i], stddevs[i]))
        .collect()
    }

    fn find(metrics: &[QualityMetric], kind: MetricKind, label: Option<RoiLabel>) -> QualityMetric {
        *metrics
            .iter()
            .find(|m| m.kind == kind && m.roi == label)
            .unwrap()
    }

    #[test]
    fn test_noise_boundary_is_inclusive() {
        let stats = five([0.0; 5], [3.0, 150.0, 3.0, 3.0, 3.0]);
        let result = evaluate_phantom(&stats, &water_limits(), Unit::Hu).unwrap();
        let noise = find(&result.metrics, MetricKind::Noise, Some(RoiLabel::East));
        assert_eq!(noise.value, 15.0);
        assert_eq!(noise.status, MetricStatus::Ok);
    }

    #[test]
    fn test_noise_above_ceiling() {
        let stats = five([0.0; 5], [3.0, 3.0, 151.0, 3.0, 3.0]);
        let result = evaluate_phantom(&stats, &water_limits(), Unit::Hu).unwrap();
        let noise = find(&result.metrics, MetricKind::Noise, Some(RoiLabel::South));
        assert_eq!(noise.status, MetricStatus::Out);
    }

    #[test]
    fn test_accuracy_and_uniformity() {
        let stats = five([1.0, 4.0, -2.0, 6.5, 0.0], [2.0; 5]);
        let result = evaluate_phantom(&stats, &water_limits(), Unit::Hu).unwrap();

        assert!(find(&result.metrics, MetricKind::Accuracy, Some(RoiLabel::Center)).is_ok());
        let west = find(&result.metrics, MetricKind::Accuracy, Some(RoiLabel::West));
        assert_eq!(west.status, MetricStatus::Out);
        assert_eq!(west.unit, Unit::Hu);

        let uniformity = find(&result.metrics, MetricKind::Uniformity, None);
        assert_eq!(uniformity.value, 5.5);
        assert_eq!(uniformity.status, MetricStatus::Out);

        let deviations: Vec<f64> = result.deviations.iter().map(|d| d.deviation).collect();
        assert_eq!(deviations, vec![3.0, -3.0, 5.5, -1.0]);
    }

    #[test]
    fn test_metric_count_and_order() {
        let stats = five([0.0; 5], [1.0; 5]);
        let result = evaluate_phantom(&stats, &water_limits(), Unit::Hu).unwrap();
        assert_eq!(result.metrics.len(), 11);
        assert_eq!(result.metrics[0].kind, MetricKind::Accuracy);
        assert_eq!(result.metrics[5].kind, MetricKind::Noise);
        assert_eq!(result.metrics[10].kind, MetricKind::Uniformity);
    }

    #[test]
    fn test_missing_central_roi() {
        let stats = vec![roi(RoiLabel::East, 0.0, 1.0)];
        let err = evaluate_phantom(&stats, &water_limits(), Unit::Hu).unwrap_err();
        assert!(matches!(err, QcError::UndefinedMetric { metric: MetricKind::Uniformity, .. }));
    }

    #[test]
    fn test_contrast_exact_arithmetic() {
        let signal = roi(RoiLabel::Signal, 120.0, 7.0);
        let background = roi(RoiLabel::Background, 100.0, 10.0);
        let limits = ContrastLimits {
            snr: FloorLimit { floor: 10.0 },
            cnr: FloorLimit { floor: 2.0 },
        };
        let metrics = evaluate_contrast(&signal, &background, &limits).unwrap();
        assert_eq!(metrics[0].kind, MetricKind::Snr);
        assert_eq!(metrics[0].value, 12.0);
        assert_eq!(metrics[1].kind, MetricKind::Cnr);
        assert_eq!(metrics[1].value, 2.0);
        assert!(metrics.iter().all(|m| m.is_ok()));
    }

    #[test]
    fn test_zero_background_noise_is_undefined() {
        let signal = roi(RoiLabel::Signal, 120.0, 7.0);
        let background = roi(RoiLabel::Background, 100.0, 0.0);
        assert!(matches!(
            snr(&signal, &background),
            Err(QcError::UndefinedMetric { metric: MetricKind::Snr, .. })
        ));
        assert!(matches!(
            cnr(&signal, &background),
            Err(QcError::UndefinedMetric { metric: MetricKind::Cnr, .. })
        ));
    }

    #[test]
    fn test_visual_scoring() {
        let minimums = VisualMinimums {
            fibers: 4,
            specks: 3,
            masses: 3,
        };
        let pass = evaluate_visual(&VisualReading::new(4, 3, 5), &minimums);
        assert!(pass.iter().all(|m| m.is_ok()));

        let fail = evaluate_visual(&VisualReading::new(5, 2, 3), &minimums);
        assert_eq!(fail[1].kind, MetricKind::VisibleSpecks);
        assert_eq!(fail[1].status, MetricStatus::Out);
        assert!(fail[0].is_ok() && fail[2].is_ok());
    }
}
