use crate::conformance::ConformanceVerdict;
use crate::extraction::AcquisitionInfo;
use std::fmt;

/// Text report formatter for a conformance verdict
pub struct TextReport<'a> {
    verdict: &'a ConformanceVerdict,
    acquisition: Option<&'a AcquisitionInfo>,
}

impl<'a> TextReport<'a> {
    /// Creates a new text report
    pub fn new(verdict: &'a ConformanceVerdict) -> Self {
        Self {
            verdict,
            acquisition: None,
        }
    }

    /// Adds the acquisition summary section
    pub fn with_acquisition(mut self, acquisition: &'a AcquisitionInfo) -> Self {
        self.acquisition = Some(acquisition);
        self
    }
}

fn or_unknown<T: fmt::Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(|v| v.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

impl<'a> fmt::Display for TextReport<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.verdict;
        writeln!(f, "Phantom Quality Report")?;
        writeln!(f, "======================")?;
        writeln!(f)?;
        writeln!(f, "Image:          {}", v.image_id)?;
        writeln!(f, "Modality:       {}", v.modality.simple_name())?;
        writeln!(f, "Material:       {}", v.material.simple_name())?;
        writeln!(f, "Workflow:       {}", v.workflow.simple_name())?;
        writeln!(f, "Evaluated At:   {}", v.evaluated_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        writeln!(f, "Status:         {}", v.status)?;

        if let Some(acq) = self.acquisition {
            writeln!(f)?;
            writeln!(f, "Acquisition")?;
            writeln!(f, "-----------")?;
            writeln!(f, "Manufacturer:   {}", or_unknown(&acq.manufacturer))?;
            writeln!(f, "Model:          {}", or_unknown(&acq.model))?;
            writeln!(f, "Institution:    {}", or_unknown(&acq.institution))?;
            writeln!(
                f,
                "Date:           {}",
                or_unknown(&acq.acquisition_date.map(|d| d.format("%d/%m/%Y")))
            )?;
            writeln!(f, "kVp:            {}", or_unknown(&acq.kvp))?;
            writeln!(f, "mAs:            {}", or_unknown(&acq.exposure_mas))?;
            if acq.anode_material.is_some() || acq.filter_material.is_some() {
                writeln!(
                    f,
                    "Anode/Filter:   {}/{}",
                    or_unknown(&acq.anode_material),
                    or_unknown(&acq.filter_material)
                )?;
            }
            if let Some(thickness) = acq.body_part_thickness_mm {
                writeln!(f, "Thickness:      {} mm", thickness)?;
            }
            if let Some(dose) = acq.organ_dose_dgy {
                writeln!(f, "Organ Dose:     {} dGy", dose)?;
            }
            if let Some(ctdi) = acq.ctdi_vol_mgy {
                writeln!(f, "CTDIvol:        {} mGy", ctdi)?;
            }
        }

        if let Some(geometry) = &v.geometry {
            writeln!(f)?;
            writeln!(f, "Phantom Geometry")?;
            writeln!(f, "----------------")?;
            writeln!(f, "Locator:        {}", geometry.locator)?;
            writeln!(
                f,
                "Detected:       center {} radius {:.1} (confidence {:.2})",
                geometry.detected.center, geometry.detected.radius, geometry.detected.confidence
            )?;
            writeln!(
                f,
                "Adjusted:       radius {:.1} (scale {})",
                geometry.adjusted.radius,
                geometry.radius_scale.value()
            )?;
        }

        writeln!(f)?;
        writeln!(f, "ROI Statistics")?;
        writeln!(f, "--------------")?;
        writeln!(
            f,
            "{:<12} {:>10} {:>10} {:>10} {:>10} {:>8}",
            "ROI", "Mean", "StdDev", "Skewness", "Kurtosis", "Pixels"
        )?;
        for s in &v.roi_statistics {
            writeln!(
                f,
                "{:<12} {:>10.2} {:>10.2} {:>10.3} {:>10.3} {:>8}",
                s.roi.simple_name(),
                s.mean,
                s.stddev,
                s.skewness,
                s.kurtosis,
                s.pixel_count
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Quality Metrics")?;
        writeln!(f, "---------------")?;
        for m in &v.metrics {
            writeln!(
                f,
                "{:<20} {:>10.2} {:<4} {:<16} {}",
                m.display_name(),
                m.value,
                m.unit.symbol(),
                m.band.to_string(),
                m.status
            )?;
        }

        if let Some(summary) = &v.image_summary {
            writeln!(f)?;
            writeln!(f, "Whole Image")?;
            writeln!(f, "-----------")?;
            let s = &summary.statistics;
            writeln!(f, "Mean:           {:.3}", s.mean)?;
            writeln!(f, "Variance:       {:.3}", s.variance)?;
            writeln!(f, "Skewness:       {:.3}", s.skewness)?;
            writeln!(f, "Kurtosis:       {:.3}", s.kurtosis)?;
            writeln!(f, "Range:          [{}, {}]", s.min, s.max)?;
        }

        if !v.warnings.is_empty() {
            writeln!(f)?;
            writeln!(f, "Warnings")?;
            writeln!(f, "--------")?;
            for w in &v.warnings {
                writeln!(f, "- {}", w)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{EvaluationRequest, QualityAnalyzer};
    use crate::config::AnalysisConfig;
    use crate::locator::LocatorConfig;
    use crate::types::{CalibratedImage, Material, Modality};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn verdict() -> ConformanceVerdict {
        let config = AnalysisConfig::default().with_locator(LocatorConfig::FixedCenter {
            x: 64.0,
            y: 64.0,
            radius: 50.0,
        });
        let analyzer = QualityAnalyzer::new(config).unwrap();
        let image = CalibratedImage::new(128, 128, Modality::Ct, vec![2.0; 128 * 128]).unwrap();
        let request = EvaluationRequest::new(
            "1.2.840.1",
            Material::Water,
            Utc.with_ymd_and_hms(2024, 2, 3, 10, 0, 0).unwrap(),
        );
        analyzer.evaluate(&image, &request).unwrap()
    }

    #[test]
    fn test_text_report_sections() {
        let verdict = verdict();
        let text = TextReport::new(&verdict).to_string();

        assert!(text.contains("Image:          1.2.840.1"));
        assert!(text.contains("Status:         pass"));
        assert!(text.contains("Locator:        fixed-center"));
        assert!(text.contains("accuracy[3h]"));
        assert!(text.contains("uniformity"));
        assert!(!text.contains("Acquisition"));
        assert!(!text.contains("Warnings"));
    }

    #[test]
    fn test_text_report_with_acquisition() {
        let verdict = verdict();
        let acquisition = AcquisitionInfo {
            kvp: Some(120.0),
            ctdi_vol_mgy: Some(14.2),
            acquisition_date: NaiveDate::from_ymd_opt(2024, 2, 3),
            ..AcquisitionInfo::default()
        };
        let text = TextReport::new(&verdict)
            .with_acquisition(&acquisition)
            .to_string();

        assert!(text.contains("kVp:            120"));
        assert!(text.contains("Date:           03/02/2024"));
        assert!(text.contains("CTDIvol:        14.2 mGy"));
        assert!(text.contains("Manufacturer:   unknown"));
    }
}
