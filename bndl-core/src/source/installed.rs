// bndl-core/src/source/installed.rs
use bndl_common::error::Result;
use bndl_common::model::{Index, SourceId};
use bndl_common::store::PackageStore;
use tracing::debug;

use super::{LocalIndexSource, Source};

/// Packages already present in the install root. Metadata only: it cannot install anything.
#[derive(Debug, Clone)]
pub struct InstalledSource {
    id: SourceId,
    store: PackageStore,
}

impl InstalledSource {
    pub fn new(store: PackageStore) -> Self {
        Self {
            id: SourceId::Installed,
            store,
        }
    }
}

impl Source for InstalledSource {
    fn id(&self) -> &SourceId {
        &self.id
    }

    fn full_index(&self) -> Result<Index> {
        self.local_index()
    }

    fn as_local_index(&self) -> Option<&dyn LocalIndexSource> {
        Some(self)
    }
}

impl LocalIndexSource for InstalledSource {
    fn local_index(&self) -> Result<Index> {
        let index = self.store.index()?;
        debug!(
            "Installed packages under {}: {} specs",
            self.store.packages_path().display(),
            index.len()
        );
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use bndl_common::config::Config;
    use bndl_common::model::Spec;
    use semver::Version;

    use super::*;

    #[test]
    fn indexes_installed_packages_and_is_not_installable() {
        let dir = tempfile::tempdir().unwrap();
        let store = PackageStore::new(Config::for_root(dir.path()));
        let spec = Spec::new("rack", Version::new(2, 0, 0), SourceId::Installed);
        store
            .write_metadata(&spec, &store.package_path("rack", &spec.version))
            .unwrap();

        let source = InstalledSource::new(store);
        assert!(source.as_installable().is_none());
        let index = source.as_local_index().unwrap().local_index().unwrap();
        assert!(index.get("rack", &Version::new(2, 0, 0)).is_some());
        assert_eq!(source.full_index().unwrap().len(), 1);
    }
}
