// bndl/src/cli/list.rs
use bndl_common::config::Config;
use bndl_common::error::Result;
use bndl_common::store::PackageStore;
use clap::Args;
use colored::Colorize;
use prettytable::{format, Cell, Row, Table};
use tracing::warn;

#[derive(Args, Debug)]
pub struct List {
    /// Show all installed versions, not just the latest for each name
    #[arg(long)]
    pub all: bool,
}

impl List {
    pub fn run(&self, config: &Config) -> Result<()> {
        let store = PackageStore::new(config.clone());
        let mut installed = store.list_installed()?;
        if !self.all {
            // Sorted by name then version, so the last entry per name is the latest.
            installed.reverse();
            installed.dedup_by(|a, b| a.name == b.name);
            installed.reverse();
        }

        if installed.is_empty() {
            println!("{}", "0 packages installed".yellow());
            return Ok(());
        }

        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
        table.add_row(Row::new(vec![
            Cell::new("Name").style_spec("b"),
            Cell::new("Version").style_spec("b"),
            Cell::new("Dependencies").style_spec("b"),
        ]));
        for package in &installed {
            let dependencies = match store.read_metadata(package) {
                Ok(metadata) => metadata
                    .dependencies
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
                Err(e) => {
                    warn!("No metadata for {} {}: {}", package.name, package.version, e);
                    "?".to_string()
                }
            };
            table.add_row(Row::new(vec![
                Cell::new(&package.name).style_spec("Fg"),
                Cell::new(&package.version.to_string()),
                Cell::new(&dependencies),
            ]));
        }
        table.printstd();
        println!("{} packages installed", installed.len().to_string().bold());
        Ok(())
    }
}
