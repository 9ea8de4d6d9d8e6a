use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use log::{error, info, warn};
use phantomqc_core::cli::{MaterialArg, WorkflowArg};
use phantomqc_core::{
    AnalysisConfig, ConformanceVerdict, EvaluationRequest, Material, PhantomScan,
    QualityAnalyzer, RadiusScale, Result,
};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process;

/// CLI tool for evaluating every phantom image in a directory
#[derive(Parser, Debug)]
#[command(name = "phantomqc-batch")]
#[command(about = "Evaluate phantom image quality for a directory of DICOM files")]
#[command(version)]
struct Cli {
    /// Directory containing DICOM files
    #[arg(value_name = "DIRECTORY")]
    directory: PathBuf,

    /// JSON analysis configuration (locator, ROI layout, thresholds)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Evaluation workflow
    #[arg(short, long, default_value = "phantom")]
    workflow: WorkflowArg,

    /// Phantom material [default: water for CT, acrylic for mammography]
    #[arg(short, long)]
    material: Option<MaterialArg>,

    /// Manual refinement of the detected phantom radius (0.5 to 1.5)
    #[arg(short, long, default_value_t = 1.0)]
    radius_scale: f64,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// One ';'-separated summary row per image
    Text,
    /// Full verdicts as a JSON array
    Json,
}

fn main() {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(cli.verbose);

    // Verify directory exists
    if !cli.directory.is_dir() {
        eprintln!("Error: {} is not a directory", cli.directory.display());
        process::exit(1);
    }

    let analyzer = match build_analyzer(&cli) {
        Ok(analyzer) => analyzer,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    let radius_scale = match RadiusScale::new(cli.radius_scale) {
        Ok(scale) => scale,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    info!("Processing directory: {}", cli.directory.display());

    // Collect all DICOM files
    let dicom_files = match collect_dicom_files(&cli.directory) {
        Ok(files) => files,
        Err(e) => {
            error!("Failed to read directory: {}", e);
            eprintln!("Error: Failed to read directory: {}", e);
            process::exit(1);
        }
    };

    if dicom_files.is_empty() {
        eprintln!("Error: No DICOM files (.dcm) found in directory");
        process::exit(1);
    }

    info!("Found {} DICOM files", dicom_files.len());

    // Load scans in parallel; unreadable files are skipped
    let loaded: Vec<(PathBuf, Result<PhantomScan>)> = dicom_files
        .into_par_iter()
        .map(|path| {
            let scan = PhantomScan::from_file(&path);
            (path, scan)
        })
        .collect();

    let evaluated_at = Utc::now();
    let mut rows = Vec::new();
    let mut inputs = Vec::new();
    for (path, scan) in loaded {
        match scan {
            Ok(scan) => {
                let request = build_request(&cli, &scan, radius_scale, evaluated_at);
                rows.push(path);
                inputs.push((scan.image, request));
            }
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }

    if inputs.is_empty() {
        eprintln!("Error: No valid phantom images could be loaded");
        process::exit(1);
    }

    let results = analyzer.evaluate_batch(&inputs);
    let outcomes: Vec<BatchOutcome> = rows
        .into_iter()
        .zip(results)
        .map(|(path, result)| BatchOutcome::new(path, result))
        .collect();

    match cli.format {
        OutputFormat::Text => {
            println!("{}", SUMMARY_HEADER);
            for outcome in &outcomes {
                println!("{}", summary_row(outcome));
            }
        }
        OutputFormat::Json => match serde_json::to_string_pretty(&outcomes) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to serialize to JSON: {}", e);
                eprintln!("Error: Failed to serialize to JSON: {}", e);
                process::exit(1);
            }
        },
    }

    if outcomes.iter().any(|o| !o.passed()) {
        process::exit(2);
    }
}

fn setup_logging(verbose: bool) {
    if verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }
}

fn build_analyzer(cli: &Cli) -> Result<QualityAnalyzer> {
    let config = match &cli.config {
        Some(path) => AnalysisConfig::from_json_file(path)?,
        None => AnalysisConfig::default(),
    };
    QualityAnalyzer::new(config)
}

fn build_request(
    cli: &Cli,
    scan: &PhantomScan,
    radius_scale: RadiusScale,
    evaluated_at: DateTime<Utc>,
) -> EvaluationRequest {
    let material = cli
        .material
        .map(Material::from)
        .unwrap_or_else(|| scan.modality().default_material());
    EvaluationRequest::new(scan.image_id(), material, evaluated_at)
        .with_workflow(cli.workflow.into())
        .with_radius_scale(radius_scale)
}

/// Result of one file in the batch
#[derive(Debug, Serialize)]
struct BatchOutcome {
    file_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    verdict: Option<ConformanceVerdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl BatchOutcome {
    fn new(path: PathBuf, result: Result<ConformanceVerdict>) -> Self {
        let file_path = path.display().to_string();
        match result {
            Ok(verdict) => Self {
                file_path,
                verdict: Some(verdict),
                error: None,
            },
            Err(e) => {
                warn!("Evaluation failed for {}: {}", file_path, e);
                Self {
                    file_path,
                    verdict: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    fn passed(&self) -> bool {
        self.verdict.as_ref().is_some_and(|v| v.is_pass())
    }
}

const SUMMARY_HEADER: &str = "file;image_id;modality;material;status;failing_metrics";

fn summary_row(outcome: &BatchOutcome) -> String {
    match (&outcome.verdict, &outcome.error) {
        (Some(v), _) => {
            let failing: Vec<String> = v.failing_metrics().map(|m| m.display_name()).collect();
            format!(
                "{};{};{};{};{};{}",
                outcome.file_path,
                v.image_id,
                v.modality,
                v.material,
                v.status,
                failing.join(",")
            )
        }
        (None, error) => format!(
            "{};;;;error;{}",
            outcome.file_path,
            error.as_deref().unwrap_or("unknown error")
        ),
    }
}

fn collect_dicom_files(directory: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in std::fs::read_dir(directory)? {
        let entry = entry?;
        let path = entry.path();

        if path.is_file() {
            if let Some(ext) = path.extension() {
                // Accept .dcm and .dicom extensions
                if ext.eq_ignore_ascii_case("dcm") || ext.eq_ignore_ascii_case("dicom") {
                    files.push(path);
                }
            } else if is_dicom_file(&path) {
                info!("Found headerless DICOM file: {}", path.display());
                files.push(path);
            }
        }
    }

    // Stable output order regardless of directory iteration order
    files.sort();
    Ok(files)
}

/// Checks for the 128-byte preamble followed by the "DICM" magic
fn is_dicom_file(path: &Path) -> bool {
    use std::fs::File;
    use std::io::Read;

    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return false,
    };

    let mut buffer = [0u8; 132];
    match file.read_exact(&mut buffer) {
        Ok(()) => &buffer[128..132] == b"DICM",
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use phantomqc_core::locator::LocatorConfig;
    use phantomqc_core::{CalibratedImage, Modality};
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_is_dicom_file_with_valid_header() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("test_dicom");

        let mut file = File::create(&file_path).unwrap();
        file.write_all(&[0u8; 128]).unwrap();
        file.write_all(b"DICM").unwrap();
        file.write_all(b"additional data").unwrap();

        assert!(is_dicom_file(&file_path));
    }

    #[test]
    fn test_is_dicom_file_rejects_other_content() {
        let temp_dir = TempDir::new().unwrap();

        let text = temp_dir.path().join("not_dicom");
        File::create(&text)
            .unwrap()
            .write_all(b"This is not a DICOM file")
            .unwrap();
        assert!(!is_dicom_file(&text));

        let wrong_magic = temp_dir.path().join("wrong_magic");
        let mut file = File::create(&wrong_magic).unwrap();
        file.write_all(&[0u8; 128]).unwrap();
        file.write_all(b"NOTM").unwrap();
        assert!(!is_dicom_file(&wrong_magic));
    }

    #[test]
    fn test_collect_dicom_files_sorted() {
        let temp_dir = TempDir::new().unwrap();

        File::create(temp_dir.path().join("b.dcm")).unwrap();
        File::create(temp_dir.path().join("a.DICOM")).unwrap();
        File::create(temp_dir.path().join("notes.txt")).unwrap();
        let headerless = temp_dir.path().join("c_headerless");
        let mut file = File::create(&headerless).unwrap();
        file.write_all(&[0u8; 128]).unwrap();
        file.write_all(b"DICM").unwrap();

        let files = collect_dicom_files(temp_dir.path()).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.DICOM", "b.dcm", "c_headerless"]);
    }

    #[test]
    fn test_summary_rows() {
        let config = AnalysisConfig::default().with_locator(LocatorConfig::FixedCenter {
            x: 64.0,
            y: 64.0,
            radius: 50.0,
        });
        let analyzer = QualityAnalyzer::new(config).unwrap();
        let image = CalibratedImage::new(128, 128, Modality::Ct, vec![8.0; 128 * 128]).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let request = EvaluationRequest::new("img-1", Material::Water, at);
        let verdict = analyzer.evaluate(&image, &request);

        let failed = BatchOutcome::new(PathBuf::from("/d/a.dcm"), verdict);
        assert!(!failed.passed());
        let row = summary_row(&failed);
        assert!(row.starts_with("/d/a.dcm;img-1;ct;water;fail;accuracy[center],"));

        let errored = BatchOutcome::new(
            PathBuf::from("/d/b.dcm"),
            Err(phantomqc_core::QcError::InvalidImage("empty".to_string())),
        );
        assert_eq!(
            summary_row(&errored),
            "/d/b.dcm;;;;error;Invalid image: empty"
        );
    }
}
