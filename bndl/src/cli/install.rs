// bndl/src/cli/install.rs
use bndl_common::dependency::GreedyResolver;
use bndl_common::error::Result;
use bndl_common::Config;
use bndl_core::{InstallOptions, Installer, ManifestDefinition};
use clap::Args;
use tracing::{debug, instrument};

use crate::cli::status::ConsoleNotifier;

#[derive(Debug, Args)]
pub struct InstallArgs {
    /// Do not install packages belonging to this group (repeatable)
    #[arg(long, value_name = "GROUP")]
    pub without: Vec<String>,
}

impl InstallArgs {
    #[instrument(skip(self, config), fields(without = ?self.without))]
    pub fn run(&self, config: &Config) -> Result<()> {
        let definition = ManifestDefinition::load(config)?;
        let resolver = GreedyResolver;
        let notifier = ConsoleNotifier;
        let options = InstallOptions::without(self.without.iter().cloned());

        let report = Installer::install(config, &definition, &resolver, &notifier, &options)?;
        debug!(
            "Install finished (resolution: {:?}, installed: {}, skipped: {})",
            report.phase,
            report.installed.len(),
            report.skipped.len()
        );
        Ok(())
    }
}
