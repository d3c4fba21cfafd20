// bndl-common/src/model/source_id.rs
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Identity of a package source: its kind plus its location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceId {
    /// Packages already present in the install root.
    Installed,
    /// The `vendor/cache` package directory under the install root.
    Cache { path: PathBuf },
    /// A package directory declared in the manifest.
    Path { name: String, path: PathBuf },
    /// A remote registry declared in the manifest.
    Registry { name: String, url: String },
}

impl SourceId {
    /// The manifest name, for sources declared in the manifest.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Path { name, .. } | Self::Registry { name, .. } => Some(name),
            Self::Installed | Self::Cache { .. } => None,
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Installed => write!(f, "installed packages"),
            Self::Cache { path } => write!(f, "package cache at {}", path.display()),
            Self::Path { name, path } => write!(f, "path source '{name}' ({})", path.display()),
            Self::Registry { name, url } => write!(f, "registry '{name}' ({url})"),
        }
    }
}
