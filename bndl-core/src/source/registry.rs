// bndl-core/src/source/registry.rs
use std::path::PathBuf;

use bndl_common::cache::Cache;
use bndl_common::config::Config;
use bndl_common::error::{BndlError, Result};
use bndl_common::model::{Index, SourceId, Spec, SpecMetadata};
use bndl_common::store::PackageStore;
use bndl_net::{fetch_package_archive, fetch_registry_index, package_archive_url, verify_content_type};
use tracing::{debug, instrument, warn};

use super::{InstallableSource, LocalIndexSource, Source};
use crate::install::install_archive;

/// A remote registry serving `index.json` and `packages/<name>-<version>.tar.gz`.
///
/// The full index is fetched over HTTPS and kept in the index cache; the local index is whatever
/// was cached by an earlier fetch, so it never touches the network.
#[derive(Debug, Clone)]
pub struct RegistrySource {
    id: SourceId,
    url: String,
    cache: Cache,
    cache_file: String,
    store: PackageStore,
    download_dir: PathBuf,
}

impl RegistrySource {
    pub fn new(id: SourceId, config: &Config) -> Result<Self> {
        let SourceId::Registry { name, url } = &id else {
            return Err(BndlError::Config(format!("{id} is not a registry")));
        };
        let cache_file = index_cache_filename(name);
        let url = url.clone();
        Ok(Self {
            cache: Cache::new(config)?,
            cache_file,
            url,
            store: PackageStore::new(config.clone()),
            download_dir: config.download_dir(),
            id,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetches the registry index unconditionally and replaces the cached copy.
    #[instrument(skip(self), fields(registry = %self.url))]
    pub fn refresh(&self) -> Result<Index> {
        let raw = fetch_registry_index(&self.url)?;
        let index = parse_index(&raw, &self.id)?;
        self.cache.store_raw(&self.cache_file, &raw)?;
        debug!("Cached {} specs from {}", index.len(), self.url);
        Ok(index)
    }

    fn cached_index(&self) -> Result<Index> {
        let raw = self.cache.load_raw(&self.cache_file)?;
        parse_index(&raw, &self.id)
    }
}

fn index_cache_filename(registry_name: &str) -> String {
    let safe: String = registry_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{safe}.json")
}

/// Parses a registry index document: a JSON array of spec metadata.
pub(crate) fn parse_index(raw: &str, source: &SourceId) -> Result<Index> {
    let entries: Vec<SpecMetadata> = serde_json::from_str(raw)?;
    let specs = entries
        .into_iter()
        .map(|meta| meta.into_spec(source.clone()))
        .collect::<Result<Vec<_>>>()?;
    Ok(Index::from_specs(specs))
}

impl Source for RegistrySource {
    fn id(&self) -> &SourceId {
        &self.id
    }

    fn full_index(&self) -> Result<Index> {
        if self.cache.is_cache_valid(&self.cache_file)? {
            match self.cached_index() {
                Ok(index) => {
                    debug!("Using cached index for {}", self.id);
                    return Ok(index);
                }
                Err(e) => warn!("Cached index for {} is unusable ({}), refetching", self.id, e),
            }
        }
        self.refresh()
    }

    fn as_local_index(&self) -> Option<&dyn LocalIndexSource> {
        Some(self)
    }

    fn as_installable(&self) -> Option<&dyn InstallableSource> {
        Some(self)
    }
}

impl LocalIndexSource for RegistrySource {
    fn local_index(&self) -> Result<Index> {
        if !self.cache.contains(&self.cache_file) {
            debug!("No cached index for {}", self.id);
            return Ok(Index::new());
        }
        match self.cached_index() {
            Ok(index) => Ok(index),
            Err(e) => {
                warn!("Ignoring unreadable cached index for {}: {}", self.id, e);
                Ok(Index::new())
            }
        }
    }
}

impl InstallableSource for RegistrySource {
    fn install(&self, spec: &Spec) -> Result<()> {
        if self.store.is_installed(spec) {
            debug!("{} is already installed, nothing to download", spec);
            return Ok(());
        }

        let url = package_archive_url(&self.url, &spec.full_name());
        let archive = fetch_package_archive(
            &spec.name,
            &url,
            spec.sha256.as_deref(),
            &self.download_dir,
        )?;
        verify_content_type(&archive, "gz")?;
        install_archive(&self.store, spec, &archive)?;
        Ok(())
    }
}
