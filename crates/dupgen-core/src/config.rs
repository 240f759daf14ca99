//! Exporter configuration
//!
//! Configuration lives in `config.toml` under `$DUPGEN_CONFIG_DIR` or the
//! platform config directory (`~/.config/dupgen/config.toml` on Linux).
//! Connection secrets may instead come from environment variables, which
//! take precedence over the file.

pub mod types;

use std::fs;
use std::path::{Path, PathBuf};

use crate::bail_invalid;
use crate::error::{DupError, Result};

pub use types::{
    ExporterConfig, PackageConfig, RepositoryEntry, SourceConfig, DEFAULT_MAX_DEPTH,
    DEFAULT_PAGE_SIZE, DEFAULT_TIMEOUT_SECONDS,
};

const CONFIG_DIR: &str = "dupgen";
const CONFIG_FILE: &str = "config.toml";
const CONFIG_DIR_ENV_VAR: &str = "DUPGEN_CONFIG_DIR";

const ENDPOINT_ENV_VAR: &str = "DUPGEN_ENDPOINT";
const API_KEY_ENV_VAR: &str = "DUPGEN_API_KEY";
const USERNAME_ENV_VAR: &str = "DUPGEN_USERNAME";
const PASSWORD_ENV_VAR: &str = "DUPGEN_PASSWORD";

impl ExporterConfig {
    /// Default location of the configuration file
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if let Ok(env_dir) = std::env::var(CONFIG_DIR_ENV_VAR) {
            PathBuf::from(env_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| {
                    DupError::MissingConfig("unable to determine config directory".to_string())
                })?
                .join(CONFIG_DIR)
        };

        Ok(config_dir.join(CONFIG_FILE))
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| DupError::InvalidConfig {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: ExporterConfig =
            toml::from_str(&content).map_err(|e| DupError::InvalidConfig {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        config.validate().map_err(|e| DupError::InvalidConfig {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(config)
    }

    /// Load from an explicit path, or the default location when it exists,
    /// then apply environment overrides.
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file yields the default configuration.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::load(path)?,
            None => {
                let path = Self::default_path()?;
                if path.exists() {
                    Self::load(&path)?
                } else {
                    tracing::debug!(path = %path.display(), "no config file, using defaults");
                    Self::default()
                }
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply overrides from a key lookup (the environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(endpoint) = non_empty(ENDPOINT_ENV_VAR) {
            self.source.endpoint = endpoint;
        }
        if let Some(api_key) = non_empty(API_KEY_ENV_VAR) {
            self.source.api_key = Some(api_key);
        }
        if let Some(username) = non_empty(USERNAME_ENV_VAR) {
            self.source.username = Some(username);
        }
        if let Some(password) = non_empty(PASSWORD_ENV_VAR) {
            self.source.password = Some(password);
        }
    }

    /// Reject values the exporter cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.source.page_size == 0 {
            bail_invalid!("page size", self.source.page_size);
        }
        if self.source.timeout_seconds == 0 {
            bail_invalid!("timeout", self.source.timeout_seconds);
        }
        Ok(())
    }

    /// Find a configured repository by name or by id
    pub fn find_repository(&self, name_or_id: &str) -> Option<&RepositoryEntry> {
        self.repositories
            .iter()
            .find(|r| r.repo_id == name_or_id)
            .or_else(|| self.repositories.iter().find(|r| r.name == name_or_id))
    }

    /// Translate a repository name into its id; unknown values pass through
    /// unchanged since ids need not be registered.
    pub fn repo_id_for<'a>(&'a self, name_or_id: &'a str) -> &'a str {
        self.find_repository(name_or_id)
            .map(|r| r.repo_id.as_str())
            .unwrap_or(name_or_id)
    }
}

impl SourceConfig {
    /// Ensure everything needed to talk to the API is present
    pub fn require_connection(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(DupError::MissingConfig(format!(
                "source endpoint (set [source].endpoint or {})",
                ENDPOINT_ENV_VAR
            )));
        }
        if self.api_key.is_none() {
            return Err(DupError::MissingConfig(format!(
                "API key (set [source].api_key or {})",
                API_KEY_ENV_VAR
            )));
        }
        if self.username.is_none() || self.password.is_none() {
            return Err(DupError::MissingConfig(format!(
                "credentials (set [source].username/password or {}/{})",
                USERNAME_ENV_VAR, PASSWORD_ENV_VAR
            )));
        }
        Ok(())
    }

    /// Effective User-Agent header
    pub fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| format!("dupgen/{}", env!("CARGO_PKG_VERSION")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = ExporterConfig::default();
        assert_eq!(config.source.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(config.source.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.source.timeout_seconds, DEFAULT_TIMEOUT_SECONDS);
        assert!(config.repositories.is_empty());
        assert!(config.package.support_dir.is_none());
    }

    #[test]
    fn test_load_full_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[source]\nendpoint = \"https://eas.example.com/api\"\npage_size = 250\n\n\
             [[repositories]]\nname = \"Production\"\nrepo_id = \"repo-123\"\n",
        )
        .unwrap();

        let loaded = ExporterConfig::load(&path).unwrap();
        assert_eq!(loaded.source.endpoint, "https://eas.example.com/api");
        assert_eq!(loaded.source.page_size, 250);
        assert_eq!(
            loaded.repositories,
            vec![RepositoryEntry {
                name: "Production".to_string(),
                repo_id: "repo-123".to_string(),
            }]
        );
    }

    #[test]
    fn test_load_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[[repositories]]\nname = \"Dev\"\nrepo_id = \"dev-1\"\n",
        )
        .unwrap();

        let loaded = ExporterConfig::load(&path).unwrap();
        assert_eq!(loaded.source.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(loaded.repositories.len(), 1);
    }

    #[test]
    fn test_load_rejects_zero_page_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[source]\npage_size = 0\n").unwrap();

        let err = ExporterConfig::load(&path).unwrap_err();
        assert!(matches!(err, DupError::InvalidConfig { .. }));
        assert!(err.to_string().contains("invalid page size: 0"));

        let config = ExporterConfig {
            source: SourceConfig {
                timeout_seconds: 0,
                ..SourceConfig::default()
            },
            ..ExporterConfig::default()
        };
        assert!(matches!(config.validate(), Err(DupError::InvalidValue { .. })));
    }

    #[test]
    fn test_load_invalid_toml_is_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[source\nendpoint = ").unwrap();

        let err = ExporterConfig::load(&path).unwrap_err();
        assert!(matches!(err, DupError::InvalidConfig { .. }));
    }

    #[test]
    fn test_resolve_explicit_missing_file_fails() {
        let dir = tempdir().unwrap();
        let err = ExporterConfig::resolve(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, DupError::InvalidConfig { .. }));
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let mut config = ExporterConfig::default();
        config.source.endpoint = "https://file".to_string();

        let env: HashMap<&str, &str> = [
            ("DUPGEN_ENDPOINT", "https://env"),
            ("DUPGEN_API_KEY", "key"),
            ("DUPGEN_USERNAME", ""),
        ]
        .into_iter()
        .collect();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.source.endpoint, "https://env");
        assert_eq!(config.source.api_key.as_deref(), Some("key"));
        // Empty values are ignored
        assert!(config.source.username.is_none());
    }

    #[test]
    fn test_require_connection() {
        let mut source = SourceConfig::default();
        assert!(matches!(
            source.require_connection(),
            Err(DupError::MissingConfig(_))
        ));

        source.endpoint = "https://eas".to_string();
        source.api_key = Some("k".to_string());
        source.username = Some("u".to_string());
        source.password = Some("p".to_string());
        assert!(source.require_connection().is_ok());
    }

    #[test]
    fn test_find_repository_by_name_or_id() {
        let config = ExporterConfig {
            repositories: vec![RepositoryEntry {
                name: "Production".to_string(),
                repo_id: "repo-123".to_string(),
            }],
            ..Default::default()
        };

        assert_eq!(config.repo_id_for("Production"), "repo-123");
        assert_eq!(config.repo_id_for("repo-123"), "repo-123");
        assert_eq!(config.repo_id_for("other"), "other");
        assert!(config.find_repository("other").is_none());
    }

    #[test]
    fn test_default_user_agent() {
        let source = SourceConfig::default();
        assert!(source.user_agent().starts_with("dupgen/"));
    }
}
