//! `dupgen classes` command - print the class metadata of a repository

use crate::cli::Cli;
use dupgen_core::config::ExporterConfig;
use dupgen_core::eas::EasClient;
use dupgen_core::error::Result;

/// Execute the classes command
///
/// `repo` may be a configured repository name or a raw repository id.
pub fn execute(_cli: &Cli, config: &ExporterConfig, repo: &str) -> Result<()> {
    let repo_id = config.repo_id_for(repo);
    tracing::debug!(repo, repo_id, "fetching class metadata");

    let client = EasClient::from_config(&config.source)?;
    let metadata = client.classes_metadata(repo_id)?;
    println!("{}", serde_json::to_string_pretty(&metadata)?);
    Ok(())
}
