// bndl-core/src/source/package_dir.rs
use std::fs;
use std::path::{Path, PathBuf};

use bndl_common::error::{BndlError, Result};
use bndl_common::model::{Index, SourceId, Spec, SpecMetadata};
use bndl_common::store::PackageStore;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::{InstallableSource, LocalIndexSource, Source};
use crate::install::install_archive;

const METADATA_EXTENSION: &str = "json";
const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// A flat directory of `<name>-<version>.json` metadata files, each next to its
/// `<name>-<version>.tar.gz` archive. Backs both `vendor/cache` and manifest `path` sources.
#[derive(Debug, Clone)]
pub struct PackageDirSource {
    id: SourceId,
    dir: PathBuf,
    store: PackageStore,
}

impl PackageDirSource {
    pub fn new(id: SourceId, dir: PathBuf, store: PackageStore) -> Self {
        Self { id, dir, store }
    }

    pub fn archive_path(&self, spec: &Spec) -> PathBuf {
        self.dir.join(format!("{}{}", spec.full_name(), ARCHIVE_SUFFIX))
    }

    fn read_index(&self) -> Result<Index> {
        if !self.dir.is_dir() {
            return Err(BndlError::NotFound(format!(
                "Package directory {} for {} does not exist",
                self.dir.display(),
                self.id
            )));
        }

        let mut specs = Vec::new();
        for entry in WalkDir::new(&self.dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Error reading entry in {}: {}. Skipping.", self.dir.display(), e);
                    continue;
                }
            };
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(METADATA_EXTENSION)
            {
                continue;
            }

            match read_metadata(path).and_then(|metadata| metadata.into_spec(self.id.clone())) {
                Ok(spec) => {
                    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
                    if stem != spec.full_name() {
                        warn!(
                            "Skipping {}: it describes {} but should be named {}.json",
                            path.display(),
                            spec,
                            spec.full_name()
                        );
                        continue;
                    }
                    specs.push(spec);
                }
                Err(e) => warn!("Skipping unreadable metadata {}: {}", path.display(), e),
            }
        }

        debug!("{}: {} specs", self.id, specs.len());
        Ok(Index::from_specs(specs))
    }
}

fn read_metadata(path: &Path) -> Result<SpecMetadata> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

impl Source for PackageDirSource {
    fn id(&self) -> &SourceId {
        &self.id
    }

    fn full_index(&self) -> Result<Index> {
        self.read_index()
    }

    fn as_local_index(&self) -> Option<&dyn LocalIndexSource> {
        Some(self)
    }

    fn as_installable(&self) -> Option<&dyn InstallableSource> {
        Some(self)
    }
}

impl LocalIndexSource for PackageDirSource {
    fn local_index(&self) -> Result<Index> {
        self.read_index()
    }
}

impl InstallableSource for PackageDirSource {
    fn install(&self, spec: &Spec) -> Result<()> {
        if self.store.is_installed(spec) {
            debug!("{} is already installed, nothing to extract", spec);
            return Ok(());
        }

        let archive = self.archive_path(spec);
        if !archive.is_file() {
            return Err(BndlError::NotFound(format!(
                "Archive {} for {} is missing from {}",
                archive.display(),
                spec,
                self.id
            )));
        }
        match spec.sha256.as_deref() {
            Some(expected) => bndl_net::verify_checksum(&archive, expected)?,
            None => debug!("No checksum recorded for {}", spec),
        }

        install_archive(&self.store, spec, &archive)?;
        Ok(())
    }
}
