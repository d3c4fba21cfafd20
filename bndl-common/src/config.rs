// bndl-common/src/config.rs
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use super::error::{BndlError, Result};

const DEFAULT_MANIFEST_FILENAME: &str = "Bndlfile.toml";
const DEFAULT_INDEX_TTL_SECS: u64 = 24 * 60 * 60;
const STATE_DIR_NAME: &str = ".bndl";

#[derive(Debug, Clone)]
pub struct Config {
    pub root: PathBuf,
    pub manifest_path: PathBuf,
    pub index_ttl: Duration,
}

impl Config {
    /// Loads configuration from `BNDL_ROOT`, `BNDL_MANIFEST` and `BNDL_INDEX_TTL_SECS`.
    pub fn load() -> Result<Self> {
        debug!("Loading bndl configuration");

        let root = match env::var("BNDL_ROOT").ok().filter(|s| !s.is_empty()) {
            Some(root) => PathBuf::from(root),
            None => {
                let cwd = env::current_dir().map_err(|e| {
                    BndlError::Config(format!("Could not determine current directory: {e}"))
                })?;
                debug!(
                    "BNDL_ROOT not set or empty, falling back to current directory: {}",
                    cwd.display()
                );
                cwd
            }
        };

        let manifest_path = env::var("BNDL_MANIFEST")
            .ok()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| root.join(DEFAULT_MANIFEST_FILENAME));

        let index_ttl_secs = match env::var("BNDL_INDEX_TTL_SECS") {
            Ok(raw) => raw.parse::<u64>().map_err(|e| {
                BndlError::Config(format!("Invalid BNDL_INDEX_TTL_SECS '{raw}': {e}"))
            })?,
            Err(_) => DEFAULT_INDEX_TTL_SECS,
        };

        debug!(
            "Effective root: {}, manifest: {}",
            root.display(),
            manifest_path.display()
        );
        Ok(Self {
            root,
            manifest_path,
            index_ttl: Duration::from_secs(index_ttl_secs),
        })
    }

    /// Builds a configuration rooted at `root` with defaults for everything else.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            manifest_path: root.join(DEFAULT_MANIFEST_FILENAME),
            root,
            index_ttl: Duration::from_secs(DEFAULT_INDEX_TTL_SECS),
        }
    }

    /// Applies command-line path overrides. A new root also moves the manifest when the
    /// manifest was still the default one inside the old root.
    pub fn override_paths(&mut self, root: Option<PathBuf>, manifest: Option<PathBuf>) {
        if let Some(root) = root {
            if self.manifest_path == self.root.join(DEFAULT_MANIFEST_FILENAME) {
                self.manifest_path = root.join(DEFAULT_MANIFEST_FILENAME);
            }
            self.root = root;
        }
        if let Some(manifest) = manifest {
            self.manifest_path = manifest;
        }
        debug!(
            "Effective root: {}, manifest: {}",
            self.root.display(),
            self.manifest_path.display()
        );
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    pub fn packages_dir(&self) -> PathBuf {
        self.root.join("packages")
    }

    pub fn package_path(&self, name: &str, version_str: &str) -> PathBuf {
        self.packages_dir().join(name).join(version_str)
    }

    /// The package cache directory; only consulted when it exists.
    pub fn vendor_cache_dir(&self) -> PathBuf {
        self.root.join("vendor").join("cache")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.join(STATE_DIR_NAME)
    }

    pub fn index_cache_dir(&self) -> PathBuf {
        self.state_dir().join("index")
    }

    pub fn download_dir(&self) -> PathBuf {
        self.state_dir().join("downloads")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.state_dir().join("logs")
    }

    /// Resolves a path declared in the manifest relative to the manifest's directory.
    pub fn resolve_manifest_relative(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        self.manifest_path
            .parent()
            .map(|dir| dir.join(path))
            .unwrap_or_else(|| self.root.join(path))
    }
}
