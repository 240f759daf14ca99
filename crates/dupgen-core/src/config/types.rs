//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default page size requested from the instances endpoint
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Default nesting depth for fetched instances
pub const DEFAULT_MAX_DEPTH: u32 = 1;

/// Default HTTP timeout
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Exporter configuration (`config.toml`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Remote repository API settings
    #[serde(default)]
    pub source: SourceConfig,

    /// Package assembly settings
    #[serde(default)]
    pub package: PackageConfig,

    /// Known repositories, selectable by name or id
    #[serde(default)]
    pub repositories: Vec<RepositoryEntry>,
}

/// Connection settings for the repository API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the API, e.g. `https://tenant.example.com/api`
    #[serde(default)]
    pub endpoint: String,

    /// Value sent in the `x-api-key` header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// User-Agent header (defaults to `dupgen/<version>`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Instances requested per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// `maxdepth` for nested reference objects
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: None,
            username: None,
            password: None,
            user_agent: None,
            timeout_seconds: default_timeout_seconds(),
            page_size: default_page_size(),
            max_depth: default_max_depth(),
        }
    }
}

/// Package assembly settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageConfig {
    /// Directory whose files replace the built-in support files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support_dir: Option<PathBuf>,
}

/// A named repository on the remote platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryEntry {
    pub name: String,
    pub repo_id: String,
}

fn default_timeout_seconds() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_max_depth() -> u32 {
    DEFAULT_MAX_DEPTH
}
