// bndl/src/cli/update.rs
//! Contains the logic for the `update` command.
use bndl_common::config::Config;
use bndl_common::error::Result;
use bndl_common::manifest::Manifest;
use bndl_common::model::SourceId;
use bndl_core::source::RegistrySource;
use colored::Colorize;

#[derive(clap::Args, Debug)]
pub struct Update;

impl Update {
    pub fn run(&self, config: &Config) -> Result<()> {
        tracing::debug!("Refreshing registry indices");
        let manifest = Manifest::load(config)?;

        let mut refreshed = 0;
        for id in &manifest.sources {
            if !matches!(id, SourceId::Registry { .. }) {
                tracing::debug!("{} has no remote index to refresh", id);
                continue;
            }
            let registry = RegistrySource::new(id.clone(), config)?;
            println!("{}", format!("Fetching index from {id}...").cyan());
            match registry.refresh() {
                Ok(index) => {
                    println!("Cached {} specs from {}", index.len(), registry.url());
                    refreshed += 1;
                }
                Err(e) => {
                    tracing::error!("Failed to refresh {}: {}", id, e);
                    return Err(e);
                }
            }
        }

        if refreshed == 0 {
            println!("{}", "No registry sources to update".yellow());
        } else {
            println!("{}", format!("Updated {refreshed} registry indices").green());
        }
        Ok(())
    }
}
