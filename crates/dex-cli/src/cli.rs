//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};

#[derive(Parser)]
#[command(
    name = "dex",
    version,
    about = "Schema-driven document extraction engine",
    long_about = "Run document extraction against a schema definition.\n\n\
                  Schemas describe a recursive field tree with optional\n\
                  computed (transformation) columns; jobs record one\n\
                  extraction per document and export as CSV."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the column projection of a schema definition.
    Inspect(InspectArgs),

    /// Process documents against a schema and report job outcomes.
    Run(RunArgs),

    /// Export a schema's jobs as CSV.
    Export(ExportArgs),
}

#[derive(Parser)]
pub struct InspectArgs {
    /// Path to the schema definition JSON file.
    #[arg(value_name = "SCHEMA")]
    pub schema: PathBuf,
}

#[derive(Parser)]
pub struct RunArgs {
    /// Path to the schema definition JSON file.
    #[arg(value_name = "SCHEMA")]
    pub schema: PathBuf,

    /// Documents to process. Each document expects a sibling `<stem>.json`
    /// fixture holding its extraction payload.
    #[arg(value_name = "DOCUMENT", required = true)]
    pub documents: Vec<PathBuf>,

    /// Write the resulting grid as CSV to this path.
    #[arg(long = "output-csv", value_name = "PATH")]
    pub output_csv: Option<PathBuf>,

    /// Write the schema (including the new jobs) back to this path.
    #[arg(long = "save", value_name = "PATH")]
    pub save: Option<PathBuf>,
}

#[derive(Parser)]
pub struct ExportArgs {
    /// Path to the schema definition JSON file.
    #[arg(value_name = "SCHEMA")]
    pub schema: PathBuf,

    /// Output CSV path.
    #[arg(value_name = "OUT")]
    pub out: PathBuf,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
