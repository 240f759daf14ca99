//! Record sources and per-class fetch orchestration

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::error::{DupError, Result};
use crate::record::FetchedRecord;
use crate::request::ClassPlan;

/// Anything that can list the instances of a class.
///
/// Implementations must be shareable across threads: classes are fetched
/// in parallel.
pub trait RecordSource: Sync {
    /// Every instance of `class_name`, following pagination to the end.
    ///
    /// `slots` is the caret-separated slot list to retrieve.
    fn fetch_all(
        &self,
        repo_id: &str,
        class_name: &str,
        max_depth: u32,
        slots: &str,
    ) -> Result<Vec<serde_json::Value>>;
}

/// Result of fetching one class
#[derive(Debug)]
pub struct ClassOutcome {
    pub class_name: String,
    /// Records, or the reason the fetch failed
    pub result: std::result::Result<Vec<FetchedRecord>, String>,
}

/// Outcome of fetching every class of an export, in plan order
#[derive(Debug, Default)]
pub struct FetchReport {
    pub outcomes: Vec<ClassOutcome>,
}

impl FetchReport {
    /// Successfully fetched records, class by class in plan order
    pub fn records(&self) -> Vec<FetchedRecord> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .flat_map(|records| records.iter().cloned())
            .collect()
    }

    /// (class, reason) of every failed class
    pub fn failures(&self) -> Vec<(&str, &str)> {
        self.outcomes
            .iter()
            .filter_map(|o| match &o.result {
                Err(reason) => Some((o.class_name.as_str(), reason.as_str())),
                Ok(_) => None,
            })
            .collect()
    }

    /// Whether at least one class could not be fetched
    pub fn is_partial(&self) -> bool {
        self.outcomes.iter().any(|o| o.result.is_err())
    }

    /// Number of records fetched
    pub fn record_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .map(Vec::len)
            .sum()
    }
}

/// Fetch every planned class in parallel.
///
/// A failing class is logged and recorded in the report; the other classes
/// are unaffected.
pub fn fetch_selection<S: RecordSource + ?Sized>(
    source: &S,
    repo_id: &str,
    plans: &[ClassPlan],
    max_depth: u32,
) -> FetchReport {
    let outcomes = plans
        .par_iter()
        .map(|plan| {
            let slots = plan.slot_list();
            let result = source
                .fetch_all(repo_id, &plan.class_name, max_depth, &slots)
                .map(|raw| {
                    raw.into_iter()
                        .map(|instance| FetchedRecord::from_json(instance, &plan.class_name))
                        .collect::<Vec<_>>()
                })
                .map_err(|e| {
                    tracing::warn!(class = %plan.class_name, reason = %e, "failed to fetch class, skipping");
                    e.to_string()
                });

            if let Ok(records) = &result {
                tracing::debug!(class = %plan.class_name, count = records.len(), "fetched class");
            }

            ClassOutcome {
                class_name: plan.class_name.clone(),
                result,
            }
        })
        .collect();

    FetchReport { outcomes }
}

/// Offline source backed by a JSON or YAML document mapping class names to
/// instance arrays.
///
/// A class missing from the document has no instances. A class mapped to a
/// string fails with that string as the reason.
#[derive(Debug, Clone)]
pub struct FileRecordSource {
    path: PathBuf,
    classes: HashMap<String, serde_json::Value>,
}

impl FileRecordSource {
    pub fn open(path: &Path) -> Result<Self> {
        let invalid = |reason: String| DupError::InvalidRecords {
            path: path.to_path_buf(),
            reason,
        };

        let content = fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;

        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let document: serde_json::Value = if is_yaml {
            serde_yaml::from_str(&content).map_err(|e| invalid(e.to_string()))?
        } else {
            serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?
        };

        let serde_json::Value::Object(map) = document else {
            return Err(invalid("expected a mapping of class names to instance lists".into()));
        };

        tracing::debug!(path = %path.display(), classes = map.len(), "loaded records file");

        Ok(Self {
            path: path.to_path_buf(),
            classes: map.into_iter().collect(),
        })
    }
}

impl RecordSource for FileRecordSource {
    fn fetch_all(
        &self,
        _repo_id: &str,
        class_name: &str,
        _max_depth: u32,
        _slots: &str,
    ) -> Result<Vec<serde_json::Value>> {
        match self.classes.get(class_name) {
            None => Ok(Vec::new()),
            Some(serde_json::Value::Array(items)) => Ok(items.clone()),
            Some(serde_json::Value::String(reason)) => Err(DupError::failed(
                &format!("fetch {}", class_name),
                reason,
            )),
            Some(_) => Err(DupError::InvalidRecords {
                path: self.path.clone(),
                reason: format!("{} is not an instance list", class_name),
            }),
        }
    }
}
