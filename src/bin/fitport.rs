//! fitport CLI - Convert a Fitbit Google Takeout export to Garmin Connect CSVs
//!
//! Expects the standard Takeout layout under the given directory:
//!   <fitbit_dir>/
//!     Physical Activity_GoogleData/
//!     Global Export Data/
//!     Health Fitness Data_GoogleData/
//!     Sleep Score/
//!     Oxygen Saturation (SpO2)/

use clap::Parser;
use env_logger::Env;
use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use fitport::{
    convert_takeout, ConversionManifest, ConvertConfig, ConvertError, DateWindow,
    CONVERTER_VERSION,
};

/// Garmin Connect bulk import page for the importable tables
const IMPORT_URL: &str = "https://connect.garmin.com/modern/import-data";

/// fitport - Convert Fitbit Google Takeout data to Garmin Connect CSV format
#[derive(Parser)]
#[command(name = "fitport")]
#[command(version = CONVERTER_VERSION)]
#[command(about = "Convert Fitbit Google Takeout data to Garmin Connect CSV format", long_about = None)]
#[command(after_help = "Examples:
  fitport ~/Downloads/Takeout/Fitbit
  fitport ~/Downloads/Takeout/Fitbit --start 2025-01-01 --end 2025-12-31
  fitport ~/Downloads/Takeout/Fitbit -o ./garmin_import")]
struct Cli {
    /// Path to the Fitbit folder inside your Google Takeout export
    fitbit_dir: PathBuf,

    /// Output directory for generated CSV files (default: parent of fitbit_dir)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Start date in YYYY-MM-DD format (default: all available data)
    #[arg(short, long)]
    start: Option<String>,

    /// End date in YYYY-MM-DD format (default: all available data)
    #[arg(short, long)]
    end: Option<String>,

    /// Print the conversion manifest and errors as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let json = cli.json;

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let error = CliError::from(e);
            if json {
                eprintln!(
                    "{}",
                    serde_json::to_string(&error).unwrap_or_else(|_| error.message.clone())
                );
            } else {
                eprintln!("Error: {}", error.message);
                if let Some(hint) = &error.hint {
                    eprintln!("{hint}");
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), FitportCliError> {
    let fitbit_dir = absolute(&cli.fitbit_dir)?;

    let start = cli
        .start
        .as_deref()
        .map(|s| DateWindow::parse_bound("start", s))
        .transpose()?;
    let end = cli
        .end
        .as_deref()
        .map(|s| DateWindow::parse_bound("end", s))
        .transpose()?;

    let mut config = ConvertConfig::new(fitbit_dir).with_window(DateWindow::new(start, end)?);
    if let Some(output) = &cli.output {
        config = config.with_output_dir(absolute(output)?);
    }

    let manifest = convert_takeout(&config)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&manifest)?);
    } else {
        print_summary(&manifest);
    }

    Ok(())
}

fn absolute(path: &Path) -> Result<PathBuf, FitportCliError> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(path))
    }
}

fn print_summary(manifest: &ConversionManifest) {
    let rule = "=".repeat(60);

    println!("{rule}");
    println!("Fitbit to Garmin Connect CSV Converter");
    println!("  Source:     {}", manifest.input_dir.display());
    println!("  Output:     {}", manifest.output_dir.display());
    println!("  Date range: {}", manifest.window);
    println!("{rule}");
    println!();
    println!("DONE! Generated files:");
    println!();
    println!("GARMIN CONNECT IMPORTABLE:");
    println!("  Upload at: {IMPORT_URL}");

    let mut index = 0;
    for output in manifest.outputs.iter().filter(|o| o.importable) {
        index += 1;
        println!(
            "  {index}. {:<28} ({} records, {} rows)",
            output.file_name, output.records, output.rows_written
        );
    }

    println!();
    println!("SUPPLEMENTARY DATA (for reference, not directly importable):");
    for output in manifest.outputs.iter().filter(|o| !o.importable) {
        index += 1;
        println!("  {index}. {:<40} ({} days)", output.file_name, output.records);
    }

    if !manifest.warnings.is_empty() {
        println!();
        println!("WARNINGS ({} files skipped):", manifest.warnings.len());
        for warning in &manifest.warnings {
            println!("  {}", warning.message);
        }
    }

    println!();
    println!("IMPORTANT: Do NOT open the CSV files in Excel before importing!");
    println!("Excel changes the formatting and makes them invalid for Garmin.");
    println!("{rule}");
}

// Error types

#[derive(Debug)]
enum FitportCliError {
    Io(io::Error),
    Convert(ConvertError),
    Json(serde_json::Error),
}

impl From<io::Error> for FitportCliError {
    fn from(e: io::Error) -> Self {
        FitportCliError::Io(e)
    }
}

impl From<ConvertError> for FitportCliError {
    fn from(e: ConvertError) -> Self {
        FitportCliError::Convert(e)
    }
}

impl From<serde_json::Error> for FitportCliError {
    fn from(e: serde_json::Error) -> Self {
        FitportCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<FitportCliError> for CliError {
    fn from(e: FitportCliError) -> Self {
        match e {
            FitportCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            FitportCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            FitportCliError::Convert(e) => {
                let (code, hint) = match &e {
                    ConvertError::InputDirNotFound(_) => ("INPUT_NOT_FOUND", None),
                    ConvertError::MissingSubdirectory(_) => (
                        "MISSING_SUBDIRECTORY",
                        Some("Make sure you point to the 'Fitbit' folder inside your Google Takeout export."),
                    ),
                    ConvertError::InvalidDate { .. } => ("INVALID_DATE", None),
                    ConvertError::InvalidWindow { .. } => {
                        ("INVALID_WINDOW", Some("The start date must not be after the end date."))
                    }
                    ConvertError::OutputDir { .. } | ConvertError::Write { .. } => {
                        ("WRITE_ERROR", Some("Check the output directory permissions."))
                    }
                    ConvertError::Encode { .. } => ("ENCODE_ERROR", None),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: hint.map(str::to_string),
                }
            }
        }
    }
}
