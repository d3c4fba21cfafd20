// bndl/src/cli.rs
//! Defines the command-line argument structure using clap.
use std::path::PathBuf;

use bndl_common::error::Result;
use bndl_common::Config;
use clap::{ArgAction, Parser, Subcommand};

pub mod install;
pub mod list;
pub mod status;
pub mod update;

use crate::cli::install::InstallArgs;
use crate::cli::list::List;
use crate::cli::update::Update;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, name = "bndl", bin_name = "bndl")]
#[command(propagate_version = true)]
pub struct CliArgs {
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Install root; defaults to BNDL_ROOT or the current directory
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Manifest to read; defaults to BNDL_MANIFEST or Bndlfile.toml in the root
    #[arg(long, global = true, value_name = "FILE")]
    pub manifest: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Install(InstallArgs),
    List(List),
    Update(Update),
}

impl Command {
    pub fn run(&self, config: &Config) -> Result<()> {
        match self {
            Self::Install(command) => command.run(config),
            Self::List(command) => command.run(config),
            Self::Update(command) => command.run(config),
        }
    }
}
