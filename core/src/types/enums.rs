use serde::{Deserialize, Serialize};
use std::fmt;

/// Imaging modality of a phantom scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    /// Computed tomography, calibrated to Hounsfield Units
    Ct,
    /// Digital mammography
    Mammography,
}

impl Modality {
    /// Returns whether calibration parameters are mandatory for this modality
    pub fn requires_rescale(&self) -> bool {
        matches!(self, Modality::Ct)
    }

    /// Unit of the calibrated intensities
    pub fn intensity_unit(&self) -> Unit {
        match self {
            Modality::Ct => Unit::Hu,
            Modality::Mammography => Unit::PixelValue,
        }
    }

    /// Phantom material assessed when none is requested
    pub fn default_material(&self) -> Material {
        match self {
            Modality::Ct => Material::Water,
            Modality::Mammography => Material::Acrylic,
        }
    }

    /// Returns simple name for display
    pub fn simple_name(&self) -> &'static str {
        match self {
            Modality::Ct => "ct",
            Modality::Mammography => "mammography",
        }
    }

    /// Parses a modality from a DICOM Modality code or a display name
    ///
    /// Returns `None` for modalities that are not phantom-assessed here.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ct" => Some(Modality::Ct),
            "mg" | "mammo" | "mammography" => Some(Modality::Mammography),
            _ => None,
        }
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.simple_name())
    }
}

/// Calibration material of the phantom section under analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Material {
    Water,
    Air,
    /// PMMA block used by mammography accreditation phantoms
    Acrylic,
}

impl Material {
    /// Returns simple name for display
    pub fn simple_name(&self) -> &'static str {
        match self {
            Material::Water => "water",
            Material::Air => "air",
            Material::Acrylic => "acrylic",
        }
    }

    /// Parses a material from its display name
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "water" => Some(Material::Water),
            "air" => Some(Material::Air),
            "acrylic" | "pmma" => Some(Material::Acrylic),
            _ => None,
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.simple_name())
    }
}

/// ROI topology used for an evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Workflow {
    /// Detected phantom with one central and four peripheral ROIs
    #[default]
    Phantom,
    /// Static signal/background ROI pair at fixed pixel offsets
    FixedCrop,
}

impl Workflow {
    /// Returns simple name for display
    pub fn simple_name(&self) -> &'static str {
        match self {
            Workflow::Phantom => "phantom",
            Workflow::FixedCrop => "fixed-crop",
        }
    }
}

impl fmt::Display for Workflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.simple_name())
    }
}

/// Label of a sampling region
///
/// Peripheral labels follow clock positions on the displayed image,
/// where y grows downward: 3h is east, 6h south, 9h west, 12h north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoiLabel {
    Center,
    East,
    South,
    West,
    North,
    Signal,
    Background,
}

impl RoiLabel {
    /// Peripheral labels in clockwise order starting at 3 o'clock
    pub const PERIPHERAL: [RoiLabel; 4] = [
        RoiLabel::East,
        RoiLabel::South,
        RoiLabel::West,
        RoiLabel::North,
    ];

    /// Returns whether this is one of the four peripheral phantom ROIs
    pub fn is_peripheral(&self) -> bool {
        matches!(
            self,
            RoiLabel::East | RoiLabel::South | RoiLabel::West | RoiLabel::North
        )
    }

    /// Returns simple name for display
    pub fn simple_name(&self) -> &'static str {
        match self {
            RoiLabel::Center => "center",
            RoiLabel::East => "3h",
            RoiLabel::South => "6h",
            RoiLabel::West => "9h",
            RoiLabel::North => "12h",
            RoiLabel::Signal => "signal",
            RoiLabel::Background => "background",
        }
    }
}

impl fmt::Display for RoiLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.simple_name())
    }
}

/// Named quality index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetricKind {
    Accuracy,
    Noise,
    Uniformity,
    Snr,
    Cnr,
    VisibleFibers,
    VisibleSpecks,
    VisibleMasses,
}

impl MetricKind {
    /// Returns simple name for display
    pub fn simple_name(&self) -> &'static str {
        match self {
            MetricKind::Accuracy => "accuracy",
            MetricKind::Noise => "noise",
            MetricKind::Uniformity => "uniformity",
            MetricKind::Snr => "snr",
            MetricKind::Cnr => "cnr",
            MetricKind::VisibleFibers => "fibers",
            MetricKind::VisibleSpecks => "specks",
            MetricKind::VisibleMasses => "masses",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.simple_name())
    }
}

/// Unit attached to a metric value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Unit {
    Hu,
    PixelValue,
    Percent,
    Ratio,
    Count,
}

impl Unit {
    /// Short symbol used in reports
    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Hu => "HU",
            Unit::PixelValue => "PV",
            Unit::Percent => "%",
            Unit::Ratio => "",
            Unit::Count => "",
        }
    }
}

/// Conformance status of a single metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "Out")]
    Out,
}

impl MetricStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, MetricStatus::Ok)
    }
}

impl fmt::Display for MetricStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricStatus::Ok => write!(f, "OK"),
            MetricStatus::Out => write!(f, "Out"),
        }
    }
}

/// Overall conformance of an evaluated image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Pass,
    Fail,
}

impl OverallStatus {
    /// Logical AND across metric statuses
    pub fn from_statuses<I: IntoIterator<Item = MetricStatus>>(statuses: I) -> Self {
        if statuses.into_iter().all(|s| s.is_ok()) {
            OverallStatus::Pass
        } else {
            OverallStatus::Fail
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, OverallStatus::Pass)
    }
}

impl fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverallStatus::Pass => write!(f, "pass"),
            OverallStatus::Fail => write!(f, "fail"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("CT", Some(Modality::Ct))]
    #[case("MG", Some(Modality::Mammography))]
    #[case(" mammography ", Some(Modality::Mammography))]
    #[case("MR", None)]
    fn test_modality_parse(#[case] input: &str, #[case] expected: Option<Modality>) {
        assert_eq!(Modality::parse(input), expected);
    }

    #[rstest]
    #[case(Modality::Ct, Material::Water)]
    #[case(Modality::Mammography, Material::Acrylic)]
    fn test_default_material(#[case] modality: Modality, #[case] expected: Material) {
        assert_eq!(modality.default_material(), expected);
    }

    #[test]
    fn test_modality_rescale_requirement() {
        assert!(Modality::Ct.requires_rescale());
        assert!(!Modality::Mammography.requires_rescale());
        assert_eq!(Modality::Ct.intensity_unit(), Unit::Hu);
    }

    #[rstest]
    #[case("water", Some(Material::Water))]
    #[case("Air", Some(Material::Air))]
    #[case("PMMA", Some(Material::Acrylic))]
    #[case("bone", None)]
    fn test_material_parse(#[case] input: &str, #[case] expected: Option<Material>) {
        assert_eq!(Material::parse(input), expected);
    }

    #[test]
    fn test_peripheral_labels() {
        assert!(RoiLabel::PERIPHERAL.iter().all(|l| l.is_peripheral()));
        assert!(!RoiLabel::Center.is_peripheral());
        assert!(!RoiLabel::Signal.is_peripheral());
        assert_eq!(RoiLabel::East.to_string(), "3h");
        assert_eq!(RoiLabel::North.to_string(), "12h");
    }

    #[test]
    fn test_overall_status_is_logical_and() {
        let all_ok = [MetricStatus::Ok, MetricStatus::Ok];
        let one_out = [MetricStatus::Ok, MetricStatus::Out];
        assert_eq!(OverallStatus::from_statuses(all_ok), OverallStatus::Pass);
        assert_eq!(OverallStatus::from_statuses(one_out), OverallStatus::Fail);
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(serde_json::to_string(&MetricStatus::Ok).unwrap(), "\"OK\"");
        assert_eq!(serde_json::to_string(&MetricStatus::Out).unwrap(), "\"Out\"");
        assert_eq!(
            serde_json::to_string(&Workflow::FixedCrop).unwrap(),
            "\"fixed-crop\""
        );
    }
}
