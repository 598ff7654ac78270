//! CLI argument definitions for civicdash.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `extract` | Run one query against an open data dataset |
//! | `run` | Run dashboard pipelines and report their results |
//! | `pipelines` | List the built-in pipelines |
//!
//! # Examples
//!
//! ```bash
//! civicdash extract wgsj-jt5f --collection state --query "SELECT * LIMIT 5" --pretty
//! civicdash extract rbed-zzin --metadata --raw
//! civicdash extract tiyn-ajjm --format csv --output organics.csv
//! civicdash run
//! civicdash run ev_fleet_count --data-dir out
//! ```

use std::path::PathBuf;

use civicdash_core::{Collection, DEFAULT_QUERY};
use civicdash_pipelines::DEFAULT_OUTPUT_DIR;
use clap::{Args, Parser, Subcommand, ValueEnum};

/// NYC and NYS open data extracts for the climate dashboard.
///
/// Reads OPEN_DATA_APP_TOKEN from the environment or a .env file.
#[derive(Debug, Parser)]
#[command(name = "civicdash", author, version, about)]
pub struct Cli {
    /// Output format for extracted data.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Directory for the Info/ and Warnings/ log files.
    #[arg(long, global = true, default_value = "Logs")]
    pub log_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON document.
    Json,
    /// Comma-separated values with a header row; metadata is not included.
    Csv,
}

/// Open data catalog selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CollectionArg {
    /// NYC Open Data.
    City,
    /// New York State Open Data.
    State,
}

impl From<CollectionArg> for Collection {
    fn from(value: CollectionArg) -> Self {
        match value {
            CollectionArg::City => Self::City,
            CollectionArg::State => Self::State,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one query against a dataset.
    ///
    /// Rows are typed from the provider's column hints unless --raw is given.
    Extract(ExtractArgs),

    /// Run dashboard pipelines (all of them when none are named).
    ///
    /// Prints a JSON run report. Exits with code 6 when any pipeline
    /// produced no result.
    Run(RunArgs),

    /// List the built-in pipelines.
    Pipelines,
}

impl Command {
    /// Stem of the info log file, `None` for commands that only log to the console.
    pub const fn log_name(&self) -> Option<&'static str> {
        match self {
            Self::Extract(_) => Some("extract"),
            Self::Run(_) => Some("run"),
            Self::Pipelines => None,
        }
    }
}

#[derive(Debug, Args)]
pub struct ExtractArgs {
    /// Dataset identifier, e.g. wgsj-jt5f.
    pub dataset_id: String,

    /// SoQL query.
    #[arg(long, default_value = DEFAULT_QUERY)]
    pub query: String,

    /// Catalog holding the dataset.
    #[arg(long, value_enum, default_value_t = CollectionArg::City)]
    pub collection: CollectionArg,

    /// Return records exactly as delivered instead of a typed table.
    #[arg(long, default_value_t = false)]
    pub raw: bool,

    /// Also fetch the dataset's catalog metadata.
    #[arg(long, default_value_t = false)]
    pub metadata: bool,

    /// Write output to a file instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Pipelines to run, in order.
    pub pipelines: Vec<String>,

    /// Directory summaries are written to.
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    pub data_dir: PathBuf,
}
