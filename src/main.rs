//! dupgen - Data Update Package exporter
//!
//! Exports a selection of classes, instances and fields from a remote
//! modeling repository as a package another repository can re-import.

mod cli;
mod commands;

use std::env;
use std::ffi::OsString;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use cli::{Cli, OutputFormat};
use dupgen_core::error::DupError;
use dupgen_core::logging;

fn main() -> ExitCode {
    let start = Instant::now();

    let args: Vec<OsString> = env::args_os().collect();
    let cli = match Cli::try_parse_from(&args) {
        Ok(cli) => cli,
        Err(err) => return parse_failure(err, Cli::format_in_args(&args)),
    };

    if let Err(e) = logging::init_tracing(cli.verbose, cli.log_level.as_deref(), cli.log_json) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }
    tracing::debug!(elapsed = ?start.elapsed(), "parse_args");

    match commands::dispatch::run(&cli, start) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report(&e, cli.format, cli.quiet),
    }
}

/// JSON callers get the error envelope even when parsing fails; everyone
/// else gets clap's own rendering
fn parse_failure(err: clap::Error, format: OutputFormat) -> ExitCode {
    match (format, cli::argument_error(&err)) {
        (OutputFormat::Json, Some(error)) => report(&error, format, false),
        _ => err.exit(),
    }
}

fn report(error: &DupError, format: OutputFormat, quiet: bool) -> ExitCode {
    match format {
        OutputFormat::Json => eprintln!("{}", error.to_json()),
        OutputFormat::Human if !quiet => eprintln!("error: {}", error),
        OutputFormat::Human => {}
    }
    ExitCode::from(error.exit_code() as u8)
}
