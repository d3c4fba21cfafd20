// bndl-common/src/dependency/definition.rs
use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use super::requirement::Requirement;
use crate::model::SourceId;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct DependencyTag: u8 {
        const RUNTIME     = 0b00000001;
        const DEVELOPMENT = 0b00000010;
    }
}

impl Default for DependencyTag {
    fn default() -> Self {
        Self::RUNTIME
    }
}

impl fmt::Display for DependencyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A requested package: either a manifest entry or an edge of a [`crate::model::Spec`].
///
/// Manifest entries may carry an explicit source and a group. Spec edges leave both unset and
/// use `tags` to tell runtime edges from development-only ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    #[serde(default)]
    pub requirement: Requirement,
    #[serde(default)]
    pub tags: DependencyTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl Dependency {
    pub fn new_runtime(name: impl Into<String>, requirement: Requirement) -> Self {
        Self::new_with_tags(name, requirement, DependencyTag::RUNTIME)
    }

    pub fn new_development(name: impl Into<String>, requirement: Requirement) -> Self {
        Self::new_with_tags(name, requirement, DependencyTag::DEVELOPMENT)
    }

    pub fn new_with_tags(
        name: impl Into<String>,
        requirement: Requirement,
        tags: DependencyTag,
    ) -> Self {
        Self {
            name: name.into(),
            requirement,
            tags,
            source: None,
            group: None,
        }
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_source(mut self, source: SourceId) -> Self {
        self.source = Some(source);
        self
    }

    /// An edge needed only to develop its parent; groups never flow across it.
    pub fn is_development_only(&self) -> bool {
        self.tags.contains(DependencyTag::DEVELOPMENT) && !self.tags.contains(DependencyTag::RUNTIME)
    }

    pub fn is_exact(&self) -> bool {
        self.requirement.is_exact()
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.requirement)
    }
}

pub trait DependencyExt {
    /// Edges followed when resolving and propagating groups: everything not development-only.
    fn runtime(&self) -> Vec<&Dependency>;
}

impl DependencyExt for Vec<Dependency> {
    fn runtime(&self) -> Vec<&Dependency> {
        self.iter().filter(|dep| !dep.is_development_only()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_only_requires_absence_of_runtime() {
        let req = Requirement::any();
        assert!(Dependency::new_development("rspec", req.clone()).is_development_only());
        assert!(!Dependency::new_runtime("rack", req.clone()).is_development_only());
        let both = Dependency::new_with_tags(
            "json",
            req,
            DependencyTag::RUNTIME | DependencyTag::DEVELOPMENT,
        );
        assert!(!both.is_development_only());
    }

    #[test]
    fn runtime_filter_keeps_mixed_edges() {
        let req = Requirement::any();
        let deps = vec![
            Dependency::new_runtime("rack", req.clone()),
            Dependency::new_development("rspec", req.clone()),
            Dependency::new_with_tags("json", req, DependencyTag::all()),
        ];
        let names: Vec<_> = deps.runtime().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, ["rack", "json"]);
    }
}
