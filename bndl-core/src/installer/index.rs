// bndl-core/src/installer/index.rs
use std::collections::HashMap;
use std::sync::Arc;

use bndl_common::error::Result;
use bndl_common::events::InstallEvent;
use bndl_common::model::Index;
use tracing::{debug, instrument};

use super::{Installer, SourceIndices};
use crate::source::Source;

fn local_index_of(source: &dyn Source) -> Result<Option<Index>> {
    match source.as_local_index() {
        Some(local) => local.local_index().map(Some),
        None => Ok(None),
    }
}

impl Installer<'_> {
    /// Everything known without network access. Built once.
    ///
    /// Precedence, highest first: the package cache, installed packages, then configured sources
    /// in declaration order. Each step merges the next source underneath what is already known.
    pub(crate) fn local_indices(&self) -> Result<&SourceIndices> {
        self.local_indices.get_or_try_init(|| self.build_local_indices())
    }

    /// The local index extended with every configured source's full index. Built once; this is
    /// the only step allowed to reach the network.
    pub(crate) fn full_indices(&self) -> Result<&SourceIndices> {
        self.full_indices.get_or_try_init(|| self.build_full_indices())
    }

    fn build_local_indices(&self) -> Result<SourceIndices> {
        let mut merged = local_index_of(self.installed.as_ref())?.unwrap_or_default();
        debug!("Installed packages contribute {} specs", merged.len());

        if let Some(cache) = &self.cache {
            if let Some(cached) = local_index_of(cache.as_ref())? {
                debug!("{} contributes {} specs", cache.id(), cached.len());
                merged = cached.merge(&merged);
            }
        }

        let mut per_source = HashMap::new();
        for source in self.definition.sources() {
            let Some(index) = local_index_of(source.as_ref())? else {
                debug!("{} has no local index", source.id());
                continue;
            };
            debug!("{} contributes {} local specs", source.id(), index.len());
            let index = Arc::new(index);
            merged = merged.merge(&index);
            per_source.insert(source.id().clone(), index);
        }

        Ok(SourceIndices {
            merged: Arc::new(merged),
            per_source,
        })
    }

    #[instrument(skip_all)]
    fn build_full_indices(&self) -> Result<SourceIndices> {
        let mut merged = Index::clone(&self.local_indices()?.merged);
        let mut per_source = HashMap::new();

        for source in self.definition.sources() {
            let name = source.id().to_string();
            self.notifier.notify(InstallEvent::IndexFetchStarted {
                source: name.clone(),
            });
            let index = Arc::new(source.full_index()?);
            self.notifier.notify(InstallEvent::IndexFetchFinished {
                source: name,
                spec_count: index.len(),
            });
            merged = merged.merge(&index);
            per_source.insert(source.id().clone(), index);
        }

        debug!("Full index holds {} specs", merged.len());
        Ok(SourceIndices {
            merged: Arc::new(merged),
            per_source,
        })
    }
}
