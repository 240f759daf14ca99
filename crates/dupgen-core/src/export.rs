//! Export orchestration: request → fetched records → script → package

use std::path::PathBuf;
use std::time::Instant;

use crate::binder::Bindings;
use crate::config::DEFAULT_MAX_DEPTH;
use crate::error::Result;
use crate::literal::RenderContext;
use crate::package::{package_file_name, PackageBuilder};
use crate::remap::IdentifierMap;
use crate::request::ExportRequest;
use crate::script::{compose, GeneratedDocument, ScriptSettings, ScriptStats};
use crate::source::{fetch_selection, FetchReport, RecordSource};
use crate::trace_time;

/// Knobs for one exporter
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Nesting depth requested for reference objects
    pub max_depth: u32,
    /// Directory replacing the built-in support files
    pub support_dir: Option<PathBuf>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            support_dir: None,
        }
    }
}

/// A generated script and how it came to be
#[derive(Debug)]
pub struct ScriptOutcome {
    pub document: GeneratedDocument,
    pub stats: ScriptStats,
    pub report: FetchReport,
    /// Number of ids in the identifier mapping
    pub id_map_len: usize,
    /// Records left out for lacking an id
    pub skipped: usize,
    /// Records left out as repeats of an already bound id
    pub duplicates: usize,
}

/// A built package
#[derive(Debug)]
pub struct ExportOutcome {
    pub archive: Vec<u8>,
    pub file_name: String,
    pub script: ScriptOutcome,
}

/// Runs exports against one record source
pub struct Exporter<'a> {
    source: &'a dyn RecordSource,
    options: ExportOptions,
}

impl<'a> Exporter<'a> {
    pub fn new(source: &'a dyn RecordSource, options: ExportOptions) -> Self {
        Self { source, options }
    }

    /// Fetch the selected records and compose the import script.
    ///
    /// Classes that fail to fetch are left out and listed in the outcome's
    /// report; everything else is exported.
    pub fn generate_script(&self, request: &ExportRequest) -> Result<ScriptOutcome> {
        request.validate()?;

        let plans = request.plan();
        if plans.is_empty() {
            tracing::warn!("no class with selected fields, generating an empty script");
        }

        let start = Instant::now();
        let report = fetch_selection(self.source, &request.repo_id, &plans, self.options.max_depth);
        trace_time!(start, "fetch_selection", classes = plans.len(), records = report.record_count());

        let records = report.records();

        let start = Instant::now();
        let ids = IdentifierMap::for_records(&records, request.prefix());
        trace_time!(start, "remap_ids", ids = ids.len());

        let bindings = Bindings::bind(&records);
        let ctx = RenderContext::new(&ids, &bindings);

        let start = Instant::now();
        let settings = ScriptSettings {
            repository_name: &request.external_repository_name,
            prefix: request.prefix(),
        };
        let (document, stats) = compose(settings, &plans, &bindings, &ctx);
        trace_time!(start, "compose_script", records = stats.records, fields = stats.fields_emitted);

        if report.is_partial() {
            tracing::warn!(
                failed = report.failures().len(),
                "export is partial, some classes could not be fetched"
            );
        }

        Ok(ScriptOutcome {
            document,
            stats,
            id_map_len: ids.len(),
            skipped: bindings.skipped,
            duplicates: bindings.duplicates,
            report,
        })
    }

    /// Generate the script and package it with the support files
    pub fn export(&self, request: &ExportRequest) -> Result<ExportOutcome> {
        let script = self.generate_script(request)?;

        let mut builder = PackageBuilder::new();
        if let Some(dir) = &self.options.support_dir {
            builder = builder.with_support_dir(dir);
        }

        let start = Instant::now();
        let archive = builder.build(&script.document.text())?;
        trace_time!(start, "build_package", bytes = archive.len());

        Ok(ExportOutcome {
            archive,
            file_name: package_file_name(&request.external_repository_name),
            script,
        })
    }
}
