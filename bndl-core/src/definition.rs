// bndl-core/src/definition.rs
//! What the user asked for: declared dependencies plus the sources to search, in order.
use std::sync::Arc;

use bndl_common::config::Config;
use bndl_common::dependency::Dependency;
use bndl_common::error::Result;
use bndl_common::manifest::Manifest;

use crate::source::{source_for_id, Source};

pub trait Definition {
    fn dependencies(&self) -> &[Dependency];

    /// Configured sources in declaration order; earlier sources take precedence.
    fn sources(&self) -> &[Arc<dyn Source>];
}

/// A [`Definition`] read from `Bndlfile.toml`.
#[derive(Debug)]
pub struct ManifestDefinition {
    manifest: Manifest,
    sources: Vec<Arc<dyn Source>>,
}

impl ManifestDefinition {
    pub fn load(config: &Config) -> Result<Self> {
        Self::from_manifest(Manifest::load(config)?, config)
    }

    pub fn from_manifest(manifest: Manifest, config: &Config) -> Result<Self> {
        let sources = manifest
            .sources
            .iter()
            .map(|id| source_for_id(id, config))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { manifest, sources })
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }
}

impl Definition for ManifestDefinition {
    fn dependencies(&self) -> &[Dependency] {
        &self.manifest.dependencies
    }

    fn sources(&self) -> &[Arc<dyn Source>] {
        &self.sources
    }
}
