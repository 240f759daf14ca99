//! Export requests: which classes and fields to export, and where to

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::bail_usage;
use crate::error::{DupError, Result};
use crate::record::{CLASS_NAME_SLOT, ID_SLOT, NAME_SLOT};

/// Separator between slot names in the `slots` query parameter
pub const SLOT_SEPARATOR: &str = "^";

/// A complete export request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    /// Repository to export from
    pub repo_id: String,

    /// Repository name the imported instances are attributed to
    pub external_repository_name: String,

    /// Optional target id namespace (`{prefix}_{n}`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_prefix: Option<String>,

    #[serde(default)]
    pub class_selections: Vec<ClassSelection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSelection {
    pub class_name: String,

    #[serde(default)]
    pub selected: bool,

    #[serde(default)]
    pub fields: Vec<FieldSelection>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSelection {
    pub field_name: String,

    #[serde(default)]
    pub selected: bool,
}

/// A class that participates in the export, with its selected fields in
/// request order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassPlan {
    pub class_name: String,
    pub fields: Vec<String>,
}

impl ClassPlan {
    /// Caret-separated slot list: `id`, `name`, `className`, then the
    /// selected fields, without duplicates
    pub fn slot_list(&self) -> String {
        let mut slots: Vec<&str> = vec![ID_SLOT, NAME_SLOT, CLASS_NAME_SLOT];
        for field in &self.fields {
            if !slots.contains(&field.as_str()) {
                slots.push(field);
            }
        }
        slots.join(SLOT_SEPARATOR)
    }
}

impl ExportRequest {
    /// Read a request from a JSON or YAML file (chosen by extension)
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| DupError::InvalidRequest {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );

        let parsed: std::result::Result<Self, String> = if is_yaml {
            serde_yaml::from_str(&content).map_err(|e| e.to_string())
        } else {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        };

        parsed.map_err(|reason| DupError::InvalidRequest {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Reject requests that cannot produce a usable package
    pub fn validate(&self) -> Result<()> {
        if self.repo_id.trim().is_empty() {
            bail_usage!("export request has no repoId");
        }
        if self.external_repository_name.trim().is_empty() {
            bail_usage!("export request has no externalRepositoryName");
        }
        Ok(())
    }

    /// Trimmed id prefix, `None` when absent or blank
    pub fn prefix(&self) -> Option<&str> {
        self.id_prefix
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }

    /// Classes to fetch, in request order.
    ///
    /// Unselected classes and classes without a selected field are dropped.
    /// A class selected twice keeps its first selection.
    pub fn plan(&self) -> Vec<ClassPlan> {
        let mut seen = HashSet::new();
        let mut plans = Vec::new();

        for selection in &self.class_selections {
            if !selection.selected {
                continue;
            }

            let fields: Vec<String> = selection
                .fields
                .iter()
                .filter(|f| f.selected)
                .map(|f| f.field_name.clone())
                .collect();

            if fields.is_empty() {
                tracing::debug!(class = %selection.class_name, "no selected fields, skipping class");
                continue;
            }

            if !seen.insert(selection.class_name.as_str()) {
                tracing::warn!(class = %selection.class_name, "class selected more than once, keeping first selection");
                continue;
            }

            plans.push(ClassPlan {
                class_name: selection.class_name.clone(),
                fields,
            });
        }

        plans
    }
}
