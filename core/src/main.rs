use chrono::Utc;
use clap::Parser;
use log::{error, info};
use phantomqc_core::cli::report::TextReport;
use phantomqc_core::cli::{Cli, OutputFormat};
use phantomqc_core::{ConformanceVerdict, PhantomScan, QualityAnalyzer, Result};
use serde::Serialize;
use std::process;

fn main() {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(cli.verbose);

    match run(&cli) {
        Ok(verdict) => {
            if !verdict.is_pass() {
                process::exit(2);
            }
        }
        Err(e) => {
            error!("Failed to evaluate {}: {}", cli.file.display(), e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

fn run(cli: &Cli) -> Result<ConformanceVerdict> {
    let config = cli.analysis_config()?;
    let analyzer = QualityAnalyzer::new(config)?;

    info!("Processing file: {}", cli.file.display());
    let scan = PhantomScan::from_file(&cli.file)?;
    let request = cli.request(scan.image_id(), scan.modality(), Utc::now())?;
    let verdict = analyzer.evaluate(&scan.image, &request)?;

    match cli.format {
        OutputFormat::Text => {
            let report = TextReport::new(&verdict).with_acquisition(&scan.acquisition);
            println!("{}", report);
        }
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct Output<'a> {
                file_path: String,
                acquisition: &'a phantomqc_core::AcquisitionInfo,
                verdict: &'a ConformanceVerdict,
            }

            let output = Output {
                file_path: scan.file_path.display().to_string(),
                acquisition: &scan.acquisition,
                verdict: &verdict,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(verdict)
}
