// bndl-core/src/source/mod.rs
//! Package sources and the capabilities they can offer to the installer.
use std::fmt;
use std::sync::Arc;

use bndl_common::config::Config;
use bndl_common::error::Result;
use bndl_common::model::{Index, SourceId, Spec};
use bndl_common::store::PackageStore;

pub mod installed;
pub mod package_dir;
pub mod registry;

pub use installed::InstalledSource;
pub use package_dir::PackageDirSource;
pub use registry::RegistrySource;

/// A provider of package metadata. Every source can produce a full index; the other
/// capabilities are optional and exposed through the `as_*` accessors.
pub trait Source: fmt::Debug {
    fn id(&self) -> &SourceId;

    /// Everything this source knows about. May perform network I/O.
    fn full_index(&self) -> Result<Index>;

    fn as_local_index(&self) -> Option<&dyn LocalIndexSource> {
        None
    }

    fn as_installable(&self) -> Option<&dyn InstallableSource> {
        None
    }
}

/// A source that can describe its packages without touching the network.
pub trait LocalIndexSource {
    fn local_index(&self) -> Result<Index>;
}

/// A source that can write a resolved spec's contents into the install root.
pub trait InstallableSource {
    fn install(&self, spec: &Spec) -> Result<()>;
}

/// Builds the concrete source for a manifest-declared id.
pub fn source_for_id(id: &SourceId, config: &Config) -> Result<Arc<dyn Source>> {
    let store = PackageStore::new(config.clone());
    let source: Arc<dyn Source> = match id {
        SourceId::Installed => Arc::new(InstalledSource::new(store)),
        SourceId::Cache { path } => Arc::new(PackageDirSource::new(id.clone(), path.clone(), store)),
        SourceId::Path { path, .. } => {
            Arc::new(PackageDirSource::new(id.clone(), path.clone(), store))
        }
        SourceId::Registry { .. } => Arc::new(RegistrySource::new(id.clone(), config)?),
    };
    Ok(source)
}
