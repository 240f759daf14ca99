//! CLI argument parsing for dupgen
//!
//! Global flags: --config, --format, --quiet, --verbose, --log-level, --log-json

use std::ffi::OsString;
use std::path::PathBuf;

use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand, ValueEnum};
use dupgen_core::error::DupError;

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// Machine-readable JSON
    Json,
}

/// dupgen - export repository content as Data Update Packages
#[derive(Parser, Debug)]
#[command(name = "dupgen")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, env = "DUPGEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "human")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Log level or filter directives (e.g. "info", "dupgen_core=trace")
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a Data Update Package from an export request
    Export(ExportArgs),

    /// Generate only the import script
    Script(ScriptArgs),

    /// List configured repositories
    Repositories,

    /// Print class metadata of a repository
    Classes {
        /// Repository name or id
        #[arg(long)]
        repo: String,
    },
}

/// Where records come from and how deep references are expanded
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// Export request file (JSON, or YAML by extension)
    #[arg(long, short)]
    pub request: PathBuf,

    /// Read instances from a file instead of the repository API
    #[arg(long)]
    pub records: Option<PathBuf>,

    /// Nesting depth for reference objects
    #[arg(long)]
    pub max_depth: Option<u32>,
}

#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output file, or directory to place the package in
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Directory whose files replace the built-in support files
    #[arg(long)]
    pub support_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ScriptArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Write the script to a file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

impl Cli {
    /// Output format named in raw arguments, for errors raised before
    /// parsing succeeds
    pub fn format_in_args(args: &[OsString]) -> OutputFormat {
        let mut rest = args.iter().skip(1);
        while let Some(arg) = rest.next() {
            let json = if arg == "--format" {
                rest.next().is_some_and(|value| value == "json")
            } else {
                arg == "--format=json"
            };
            if json {
                return OutputFormat::Json;
            }
        }
        OutputFormat::Human
    }
}

/// The error reported for a failed parse; `None` when clap is displaying
/// help or version text instead
pub fn argument_error(err: &clap::Error) -> Option<DupError> {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => None,
        ErrorKind::ValueValidation
        | ErrorKind::InvalidValue
        | ErrorKind::InvalidSubcommand
        | ErrorKind::UnknownArgument
        | ErrorKind::MissingRequiredArgument
        | ErrorKind::MissingSubcommand
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            Some(DupError::UsageError(err.to_string()))
        }
        ErrorKind::ArgumentConflict => Some(DupError::DuplicateFormat),
        _ => Some(DupError::Other(err.to_string())),
    }
}
