//! Command dispatch logic for dupgen

use std::path::Path;
use std::time::Instant;

use crate::cli::{Cli, Commands, SourceArgs};
use crate::commands;
use dupgen_core::config::ExporterConfig;
use dupgen_core::eas::EasClient;
use dupgen_core::error::Result;
use dupgen_core::export::ExportOptions;
use dupgen_core::request::ExportRequest;
use dupgen_core::source::{FileRecordSource, RecordSource};

pub fn run(cli: &Cli, start: Instant) -> Result<()> {
    let config = ExporterConfig::resolve(cli.config.as_deref())?;
    tracing::debug!(elapsed = ?start.elapsed(), "load_config");

    match &cli.command {
        Commands::Export(args) => {
            let request = load_request(&args.source.request)?;
            let source = open_source(&config, args.source.records.as_deref())?;
            let mut options = export_options(&config, &args.source);
            if let Some(dir) = &args.support_dir {
                options.support_dir = Some(dir.clone());
            }
            commands::export::execute(cli, &*source, options, &request, args.output.as_deref())
        }

        Commands::Script(args) => {
            let request = load_request(&args.source.request)?;
            let source = open_source(&config, args.source.records.as_deref())?;
            let options = export_options(&config, &args.source);
            commands::script::execute(cli, &*source, options, &request, args.output.as_deref())
        }

        Commands::Repositories => commands::repositories::execute(cli, &config),

        Commands::Classes { repo } => commands::classes::execute(cli, &config, repo),
    }
}

fn load_request(path: &Path) -> Result<ExportRequest> {
    let request = ExportRequest::from_path(path)?;
    tracing::debug!(
        path = %path.display(),
        classes = request.class_selections.len(),
        "loaded export request"
    );
    Ok(request)
}

/// Records file when given, the repository API otherwise
fn open_source(config: &ExporterConfig, records: Option<&Path>) -> Result<Box<dyn RecordSource>> {
    match records {
        Some(path) => Ok(Box::new(FileRecordSource::open(path)?)),
        None => Ok(Box::new(EasClient::from_config(&config.source)?)),
    }
}

fn export_options(config: &ExporterConfig, args: &SourceArgs) -> ExportOptions {
    ExportOptions {
        max_depth: args.max_depth.unwrap_or(config.source.max_depth),
        support_dir: config.package.support_dir.clone(),
    }
}
