//! amsreport CLI - AWS utilization report consolidator
//!
//! Scans `MM-DD-YYYY` folders under a base path, merges each environment's
//! service exports and writes one highlighted workbook per environment.
//!
//! ## Exit Codes
//!
//! | Exit Code | Meaning |
//! |-----------|---------|
//! | 0 | Every environment was written or skipped for missing data |
//! | 1 | An environment failed, no date folders exist, or bad arguments |

mod report;
mod settings;

use amsreport_core::{Environment, FolderDiscovery, Settings};
use amsreport_engine::{configured_columns, Consolidator};
use amsreport_loader::{DateFolderScanner, XlsxReportLoader};
use amsreport_render::ExcelWorkbookWriter;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::settings::Overrides;

#[derive(Parser)]
#[command(name = "amsreport")]
#[command(author, version, about = "Consolidate AWS utilization reports per environment", long_about = None)]
struct Cli {
    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Folder holding the date folders
    #[arg(long, value_name = "DIR", global = true, env = "AMSREPORT_BASE_PATH")]
    base_path: Option<PathBuf>,

    /// Output folder, relative to the base path unless absolute
    #[arg(long, value_name = "DIR", global = true)]
    output_dir: Option<PathBuf>,

    /// Settings file (defaults to amsreport.toml in the base path)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Consolidate every environment and print a summary (default)
    Run,

    /// List the discovered date folders
    Dates,

    /// Show the highlight columns configured for an environment
    Columns {
        /// Environment name (e.g. Patikar, "Shared Services")
        #[arg(value_name = "ENV")]
        environment: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let default_level = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    let overrides = Overrides {
        config: cli.config,
        base_path: cli.base_path,
        output_dir: cli.output_dir,
    };

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let settings = settings::resolve(&overrides)?;
            cmd_run(&settings, cli.format)
        }
        Commands::Dates => {
            let settings = settings::resolve(&overrides)?;
            cmd_dates(&settings, cli.format)
        }
        Commands::Columns { environment } => cmd_columns(&environment, cli.format),
    }
}

fn scanner(settings: &Settings) -> DateFolderScanner {
    let scanner = DateFolderScanner::new();
    match settings.output_dir.file_name() {
        Some(name) => scanner.ignore(name.to_string_lossy()),
        None => scanner,
    }
}

fn cmd_run(settings: &Settings, format: OutputFormat) -> Result<ExitCode> {
    let consolidator = Consolidator::new(
        settings,
        scanner(settings),
        XlsxReportLoader::new(),
        ExcelWorkbookWriter::from_settings(settings),
    );
    let summary = consolidator.run();

    match format {
        OutputFormat::Text => print!("{}", report::render_text(&summary)),
        OutputFormat::Json => println!("{}", report::render_json(&summary)?),
    }

    if summary.has_failures() || summary.date_folders.is_empty() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn cmd_dates(settings: &Settings, format: OutputFormat) -> Result<ExitCode> {
    let folders = scanner(settings)
        .list_date_folders(&settings.base_path)
        .with_context(|| format!("failed to scan {}", settings.base_path.display()))?;

    match format {
        OutputFormat::Text => {
            if folders.is_empty() {
                println!("No date folders found in {}", settings.base_path.display());
            }
            for folder in &folders {
                println!("{}", folder.date);
            }
        }
        OutputFormat::Json => {
            let labels: Vec<&str> = folders.iter().map(|f| f.date.label.as_str()).collect();
            println!("{}", serde_json::to_string_pretty(&labels)?);
        }
    }

    if folders.is_empty() {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn cmd_columns(name: &str, format: OutputFormat) -> Result<ExitCode> {
    let Some(environment) = Environment::from_name(name) else {
        bail!(
            "unknown environment '{}' (expected one of: {})",
            name,
            Environment::ALL.map(Environment::name).join(", ")
        );
    };
    let columns = configured_columns(environment);

    match format {
        OutputFormat::Text => {
            println!("{} highlight columns:", environment.name());
            for column in columns {
                println!("  {column}");
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(columns)?),
    }
    Ok(ExitCode::SUCCESS)
}
