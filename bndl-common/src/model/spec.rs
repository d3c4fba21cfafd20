// bndl-common/src/model/spec.rs
use std::collections::BTreeSet;
use std::fmt;

use semver::Version;
use serde::{Deserialize, Serialize};

use super::SourceId;
use crate::dependency::Dependency;
use crate::error::{BndlError, Result};

/// A concrete package version, its dependency edges and the source that provides it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spec {
    pub name: String,
    pub version: Version,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    pub source: SourceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    /// Groups this spec is needed for. Only ever grows.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub groups: BTreeSet<String>,
}

impl Spec {
    pub fn new(name: impl Into<String>, version: Version, source: SourceId) -> Self {
        Self {
            name: name.into(),
            version,
            dependencies: Vec::new(),
            source,
            sha256: None,
            groups: BTreeSet::new(),
        }
    }

    pub fn with_dependency(mut self, dependency: Dependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// `name-version`, the file stem used for archives and metadata.
    pub fn full_name(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }

    /// Adds `group`; returns false if it was already present.
    pub fn add_group(&mut self, group: &str) -> bool {
        if self.groups.contains(group) {
            return false;
        }
        self.groups.insert(group.to_string())
    }

    pub fn in_any_group(&self, groups: &BTreeSet<String>) -> bool {
        !self.groups.is_disjoint(groups)
    }
}

impl fmt::Display for Spec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

/// On-disk and registry form of a spec; the owning source is supplied when loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecMetadata {
    pub name: String,
    pub version: Version,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

/// Package names become a directory under the install root, so they must be a single plain
/// path component.
pub fn validate_package_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(BndlError::ValidationError(format!(
            "Invalid package name '{name}'"
        )));
    }
    Ok(())
}

impl SpecMetadata {
    /// Attaches `source`, rejecting names that are not a plain path component.
    pub fn into_spec(self, source: SourceId) -> Result<Spec> {
        validate_package_name(&self.name)?;
        Ok(Spec {
            name: self.name,
            version: self.version,
            dependencies: self.dependencies,
            source,
            sha256: self.sha256,
            groups: BTreeSet::new(),
        })
    }
}

impl From<&Spec> for SpecMetadata {
    fn from(spec: &Spec) -> Self {
        Self {
            name: spec.name.clone(),
            version: spec.version.clone(),
            dependencies: spec.dependencies.clone(),
            sha256: spec.sha256.clone(),
        }
    }
}
