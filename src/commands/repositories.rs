//! `dupgen repositories` command - list configured repositories

use crate::cli::{Cli, OutputFormat};
use dupgen_core::config::ExporterConfig;
use dupgen_core::error::Result;

/// Execute the repositories command
pub fn execute(cli: &Cli, config: &ExporterConfig) -> Result<()> {
    match cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&config.repositories)?);
        }
        OutputFormat::Human => {
            if config.repositories.is_empty() {
                if !cli.quiet {
                    println!("No repositories configured");
                }
                return Ok(());
            }
            let width = config
                .repositories
                .iter()
                .map(|r| r.name.len())
                .max()
                .unwrap_or(0);
            for repo in &config.repositories {
                println!("{:width$}  {}", repo.name, repo.repo_id, width = width);
            }
        }
    }
    Ok(())
}
