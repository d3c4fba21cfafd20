// bndl-common/src/store.rs
use std::fs;
use std::path::{Path, PathBuf};

use semver::Version;
use tracing::{debug, warn};

use super::config::Config;
use super::error::{BndlError, Result};
use crate::model::{Index, SourceId, Spec, SpecMetadata};

/// Metadata file written into every installed package directory.
pub const SPEC_METADATA_FILENAME: &str = ".bndl-spec.json";

/// A package directory found under `<root>/packages/<name>/<version>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    pub name: String,
    pub version: Version,
    pub path: PathBuf,
}

impl InstalledPackage {
    pub fn metadata_path(&self) -> PathBuf {
        self.path.join(SPEC_METADATA_FILENAME)
    }
}

/// Queries and records packages installed under the install root.
#[derive(Debug, Clone)]
pub struct PackageStore {
    config: Config,
}

impl PackageStore {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub fn packages_path(&self) -> PathBuf {
        self.config.packages_dir()
    }

    pub fn package_path(&self, name: &str, version: &Version) -> PathBuf {
        self.config.package_path(name, &version.to_string())
    }

    pub fn is_installed(&self, spec: &Spec) -> bool {
        self.package_path(&spec.name, &spec.version)
            .join(SPEC_METADATA_FILENAME)
            .is_file()
    }

    pub fn list_installed(&self) -> Result<Vec<InstalledPackage>> {
        let mut installed = Vec::new();
        let packages_dir = self.packages_path();
        debug!("[STORE] Scanning {}", packages_dir.display());

        if !packages_dir.is_dir() {
            debug!("[STORE] Packages directory not found. Returning empty list.");
            return Ok(installed);
        }

        for name_entry in fs::read_dir(&packages_dir)? {
            let name_entry = match name_entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("[STORE] Error reading entry in {}: {}. Skipping.", packages_dir.display(), e);
                    continue;
                }
            };
            let name_path = name_entry.path();
            let Some(name) = name_path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if !name_path.is_dir() {
                continue;
            }

            let version_entries = match fs::read_dir(&name_path) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("[STORE:{}] Failed to read {}: {}", name, name_path.display(), e);
                    continue;
                }
            };
            for version_entry in version_entries.flatten() {
                let version_path = version_entry.path();
                if !version_path.is_dir() {
                    continue;
                }
                let Some(version_str) = version_path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                match Version::parse(version_str) {
                    Ok(version) => installed.push(InstalledPackage {
                        name: name.to_string(),
                        version,
                        path: version_path.clone(),
                    }),
                    Err(e) => warn!(
                        "[STORE:{}] Ignoring directory {} with invalid version: {}",
                        name,
                        version_path.display(),
                        e
                    ),
                }
            }
        }

        installed.sort_by(|a, b| a.name.cmp(&b.name).then(a.version.cmp(&b.version)));
        debug!("[STORE] Found {} installed package versions.", installed.len());
        Ok(installed)
    }

    pub fn read_metadata(&self, package: &InstalledPackage) -> Result<SpecMetadata> {
        let path = package.metadata_path();
        let raw = fs::read_to_string(&path).map_err(|e| {
            BndlError::NotFound(format!("Spec metadata {}: {}", path.display(), e))
        })?;
        let metadata: SpecMetadata = serde_json::from_str(&raw)?;
        if metadata.name != package.name || metadata.version != package.version {
            return Err(BndlError::ValidationError(format!(
                "{} describes {} {} but is stored as {} {}",
                path.display(),
                metadata.name,
                metadata.version,
                package.name,
                package.version
            )));
        }
        Ok(metadata)
    }

    /// Records `spec` as installed at `dir`.
    pub fn write_metadata(&self, spec: &Spec, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        let json = serde_json::to_string_pretty(&SpecMetadata::from(spec))?;
        fs::write(dir.join(SPEC_METADATA_FILENAME), json)?;
        Ok(())
    }

    /// Index of everything installed. Packages without readable metadata are left out.
    pub fn index(&self) -> Result<Index> {
        let mut specs = Vec::new();
        for package in self.list_installed()? {
            match self
                .read_metadata(&package)
                .and_then(|metadata| metadata.into_spec(SourceId::Installed))
            {
                Ok(spec) => specs.push(spec),
                Err(e) => warn!(
                    "[STORE:{}] Skipping {} {}: {}",
                    package.name, package.name, package.version, e
                ),
            }
        }
        Ok(Index::from_specs(specs))
    }
}
