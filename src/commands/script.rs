//! `dupgen script` command - generate only the import script

use std::fs;
use std::path::Path;

use crate::cli::{Cli, OutputFormat};
use dupgen_core::error::{DupError, Result};
use dupgen_core::export::{ExportOptions, Exporter};
use dupgen_core::request::ExportRequest;
use dupgen_core::source::{FetchReport, RecordSource};

/// Execute the script command
pub fn execute(
    cli: &Cli,
    source: &dyn RecordSource,
    options: ExportOptions,
    request: &ExportRequest,
    output: Option<&Path>,
) -> Result<()> {
    let exporter = Exporter::new(source, options);
    let outcome = exporter.generate_script(request)?;
    let text = outcome.document.text();

    if let Some(path) = output {
        fs::write(path, &text)
            .map_err(|e| DupError::failed(&format!("write {}", path.display()), e))?;
    }

    match cli.format {
        OutputFormat::Json => {
            let mut value = serde_json::json!({
                "classes": outcome.stats.classes,
                "records": outcome.stats.records,
                "fields": outcome.stats.fields_emitted,
                "failures": outcome
                    .report
                    .failures()
                    .into_iter()
                    .map(|(class, reason)| serde_json::json!({"class": class, "reason": reason}))
                    .collect::<Vec<_>>(),
            });
            match output {
                Some(path) => value["path"] = serde_json::json!(path.display().to_string()),
                None => value["script"] = serde_json::json!(text),
            }
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Human => {
            report_failures(cli, &outcome.report);
            match output {
                Some(path) if !cli.quiet => {
                    println!("Wrote {} ({} records)", path.display(), outcome.stats.records)
                }
                Some(_) => {}
                None => print!("{}", text),
            }
        }
    }

    Ok(())
}

/// Warn on stderr about classes left out of the export
pub(crate) fn report_failures(cli: &Cli, report: &FetchReport) {
    if cli.quiet {
        return;
    }
    for (class, reason) in report.failures() {
        eprintln!("warning: class {} could not be fetched: {}", class, reason);
    }
}
