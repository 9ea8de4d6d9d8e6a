pub mod report;

use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::api::EvaluationRequest;
use crate::config::AnalysisConfig;
use crate::conformance::VisualReading;
use crate::error::{QcError, Result};
use crate::locator::LocatorConfig;
use crate::types::{Material, Modality, RadiusScale, Workflow};

/// Command-line arguments for phantomqc
#[derive(Parser, Debug)]
#[command(name = "phantomqc")]
#[command(about = "Phantom image quality assessment for CT and mammography")]
#[command(version)]
pub struct Cli {
    /// Path to DICOM file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// JSON analysis configuration (locator, ROI layout, thresholds)
    #[arg(short, long, value_name = "CONFIG")]
    pub config: Option<PathBuf>,

    /// Evaluation workflow
    #[arg(short, long, default_value = "phantom")]
    pub workflow: WorkflowArg,

    /// Phantom material [default: water for CT, acrylic for mammography]
    #[arg(short, long)]
    pub material: Option<MaterialArg>,

    /// Manual refinement of the detected phantom radius (0.5 to 1.5)
    #[arg(short, long, default_value_t = 1.0)]
    pub radius_scale: f64,

    /// Skip detection and use a known phantom position, as X,Y,RADIUS
    #[arg(long, value_name = "X,Y,RADIUS", value_parser = parse_fixed_center)]
    pub fixed_center: Option<(f64, f64, f64)>,

    /// Visible fibers counted by the reader
    #[arg(long, requires_all = ["specks", "masses"])]
    pub fibers: Option<u32>,

    /// Visible specks counted by the reader
    #[arg(long, requires_all = ["fibers", "masses"])]
    pub specks: Option<u32>,

    /// Visible masses counted by the reader
    #[arg(long, requires_all = ["fibers", "specks"])]
    pub masses: Option<u32>,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Loads the configuration file, if any, and applies command-line overrides
    pub fn analysis_config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_json_file(path)?,
            None => AnalysisConfig::default(),
        };
        if let Some((x, y, radius)) = self.fixed_center {
            config = config.with_locator(LocatorConfig::FixedCenter { x, y, radius });
        }
        Ok(config)
    }

    /// Material given on the command line, or the modality's usual phantom
    pub fn material_for(&self, modality: Modality) -> Material {
        self.material
            .map(Material::from)
            .unwrap_or_else(|| modality.default_material())
    }

    pub fn visual_reading(&self) -> Option<VisualReading> {
        match (self.fibers, self.specks, self.masses) {
            (Some(fibers), Some(specks), Some(masses)) => {
                Some(VisualReading::new(fibers, specks, masses))
            }
            _ => None,
        }
    }

    /// Builds the evaluation request for an image
    ///
    /// # Errors
    ///
    /// Returns [`QcError::InvalidParameter`] for a radius scale outside
    /// `[0.5, 1.5]`.
    pub fn request(
        &self,
        image_id: String,
        modality: Modality,
        evaluated_at: DateTime<Utc>,
    ) -> Result<EvaluationRequest> {
        let mut request = EvaluationRequest::new(image_id, self.material_for(modality), evaluated_at)
            .with_workflow(self.workflow.into())
            .with_radius_scale(RadiusScale::new(self.radius_scale)?);
        if let Some(reading) = self.visual_reading() {
            request = request.with_visual_reading(reading);
        }
        Ok(request)
    }
}

/// Parses `X,Y,RADIUS`
pub fn parse_fixed_center(s: &str) -> std::result::Result<(f64, f64, f64), String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected X,Y,RADIUS, got '{}'", s));
    }
    let mut values = [0.0f64; 3];
    for (slot, part) in values.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .map_err(|e| format!("invalid number '{}': {}", part, e))?;
    }
    Ok((values[0], values[1], values[2]))
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    Text,
    /// JSON format
    Json,
}

/// Workflow options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WorkflowArg {
    /// Detected phantom with central and peripheral ROIs
    Phantom,
    /// Static signal and background ROIs
    FixedCrop,
}

impl From<WorkflowArg> for Workflow {
    fn from(arg: WorkflowArg) -> Self {
        match arg {
            WorkflowArg::Phantom => Workflow::Phantom,
            WorkflowArg::FixedCrop => Workflow::FixedCrop,
        }
    }
}

/// Material options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MaterialArg {
    Water,
    Air,
    Acrylic,
}

impl From<MaterialArg> for Material {
    fn from(arg: MaterialArg) -> Self {
        match arg {
            MaterialArg::Water => Material::Water,
            MaterialArg::Air => Material::Air,
            MaterialArg::Acrylic => Material::Acrylic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("phantomqc").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["scan.dcm"]);
        assert_eq!(cli.workflow, WorkflowArg::Phantom);
        assert_eq!(cli.material_for(Modality::Ct), Material::Water);
        assert_eq!(cli.material_for(Modality::Mammography), Material::Acrylic);
        assert!(cli.visual_reading().is_none());
        assert!(cli.fixed_center.is_none());
    }

    #[test]
    fn test_fixed_center_overrides_locator() {
        let cli = parse(&["scan.dcm", "--fixed-center", "256, 250.5,200"]);
        assert_eq!(cli.fixed_center, Some((256.0, 250.5, 200.0)));
        let config = cli.analysis_config().unwrap();
        assert_eq!(
            config.locator,
            LocatorConfig::FixedCenter {
                x: 256.0,
                y: 250.5,
                radius: 200.0
            }
        );
    }

    #[test]
    fn test_parse_fixed_center_errors() {
        assert!(parse_fixed_center("1,2").is_err());
        assert!(parse_fixed_center("1,2,x").is_err());
        assert!(Cli::try_parse_from(["phantomqc", "a.dcm", "--fixed-center", "1;2;3"]).is_err());
    }

    #[test]
    fn test_visual_counts_go_together() {
        assert!(Cli::try_parse_from(["phantomqc", "a.dcm", "--fibers", "4"]).is_err());

        let cli = parse(&["a.dcm", "--fibers", "4", "--specks", "3", "--masses", "2"]);
        assert_eq!(cli.visual_reading(), Some(VisualReading::new(4, 3, 2)));
    }

    #[test]
    fn test_request_validates_scale() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let cli = parse(&["a.dcm", "-w", "fixed-crop", "-m", "acrylic", "-r", "1.2"]);
        let request = cli.request("a".to_string(), Modality::Mammography, at).unwrap();
        assert_eq!(request.workflow, Workflow::FixedCrop);
        assert_eq!(request.material, Material::Acrylic);
        assert_eq!(request.radius_scale.value(), 1.2);

        let cli = parse(&["a.dcm", "--radius-scale", "2.0"]);
        assert!(matches!(
            cli.request("a".to_string(), Modality::Ct, at),
            Err(QcError::InvalidParameter(_))
        ));
    }
}
