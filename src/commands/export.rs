//! `dupgen export` command - build a Data Update Package
//!
//! - Output defaults to `<sanitized repository name>.dup` in the current
//!   directory; an existing directory given as `--output` receives the file
//! - Classes that could not be fetched are reported, the rest is exported

use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::{Cli, OutputFormat};
use crate::commands::script::report_failures;
use dupgen_core::error::{DupError, Result};
use dupgen_core::export::{ExportOptions, Exporter};
use dupgen_core::request::ExportRequest;
use dupgen_core::source::RecordSource;

/// Execute the export command
pub fn execute(
    cli: &Cli,
    source: &dyn RecordSource,
    options: ExportOptions,
    request: &ExportRequest,
    output: Option<&Path>,
) -> Result<()> {
    let exporter = Exporter::new(source, options);
    let outcome = exporter.export(request)?;

    let path = output_path(output, &outcome.file_name);
    fs::write(&path, &outcome.archive)
        .map_err(|e| DupError::failed(&format!("write {}", path.display()), e))?;
    tracing::info!(path = %path.display(), bytes = outcome.archive.len(), "wrote package");

    let script = &outcome.script;
    match cli.format {
        OutputFormat::Json => {
            let failures: Vec<serde_json::Value> = script
                .report
                .failures()
                .into_iter()
                .map(|(class, reason)| serde_json::json!({"class": class, "reason": reason}))
                .collect();
            let output = serde_json::json!({
                "path": path.display().to_string(),
                "file_name": outcome.file_name,
                "bytes": outcome.archive.len(),
                "classes": script.stats.classes,
                "records": script.stats.records,
                "fields": script.stats.fields_emitted,
                "failures": failures,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Human => {
            report_failures(cli, &script.report);
            if !cli.quiet {
                println!(
                    "Wrote {} ({} records in {} classes)",
                    path.display(),
                    script.stats.records,
                    script.stats.classes
                );
                if cli.verbose {
                    println!("  {} fields set", script.stats.fields_emitted);
                    println!("  {} empty fields omitted", script.stats.nulls_omitted);
                    println!("  {} ids mapped", script.id_map_len);
                }
            }
        }
    }

    Ok(())
}

/// Where to write a package named `file_name`
fn output_path(output: Option<&Path>, file_name: &str) -> PathBuf {
    match output {
        Some(dir) if dir.is_dir() => dir.join(file_name),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(file_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_output_path() {
        let dir = tempdir().unwrap();
        assert_eq!(output_path(None, "a.dup"), PathBuf::from("a.dup"));
        assert_eq!(output_path(Some(dir.path()), "a.dup"), dir.path().join("a.dup"));

        let file = dir.path().join("custom.zip");
        assert_eq!(output_path(Some(&file), "a.dup"), file);
    }
}
