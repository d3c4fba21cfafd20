// bndl-common/src/model/index.rs
use std::collections::BTreeMap;
use std::sync::Arc;

use semver::Version;

use super::Spec;
use crate::dependency::Dependency;

/// Package name to the known specs for that name.
///
/// Candidates for a name are kept in precedence order: when two specs share a name and version,
/// only the one with higher precedence is kept. An index is never mutated after construction;
/// [`Index::merge`] builds a new one.
#[derive(Debug, Clone, Default)]
pub struct Index {
    specs: BTreeMap<String, Vec<Arc<Spec>>>,
}

impl Index {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index; earlier specs win over later ones with the same name and version.
    pub fn from_specs<I>(specs: I) -> Self
    where
        I: IntoIterator<Item = Spec>,
    {
        let mut index = Self::new();
        for spec in specs {
            index.insert(Arc::new(spec));
        }
        index
    }

    fn insert(&mut self, spec: Arc<Spec>) -> bool {
        let candidates = self.specs.entry(spec.name.clone()).or_default();
        if candidates.iter().any(|s| s.version == spec.version) {
            return false;
        }
        candidates.push(spec);
        true
    }

    /// Combines two indices into a new one. Entries of `self` take precedence over entries of
    /// `lower` with the same name and version; `lower` only contributes missing keys.
    pub fn merge(&self, lower: &Index) -> Index {
        let mut merged = self.clone();
        for candidates in lower.specs.values() {
            for spec in candidates {
                merged.insert(Arc::clone(spec));
            }
        }
        merged
    }

    /// All candidates for `name` in precedence order.
    pub fn search(&self, name: &str) -> &[Arc<Spec>] {
        self.specs.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Candidates satisfying `dependency`, highest version first; equal versions cannot occur,
    /// so the order is total.
    pub fn search_matching(&self, dependency: &Dependency) -> Vec<&Arc<Spec>> {
        let mut matching: Vec<&Arc<Spec>> = self
            .search(&dependency.name)
            .iter()
            .filter(|spec| dependency.requirement.matches(&spec.version))
            .collect();
        matching.sort_by(|a, b| b.version.cmp(&a.version));
        matching
    }

    pub fn get(&self, name: &str, version: &Version) -> Option<&Arc<Spec>> {
        self.search(name).iter().find(|s| &s.version == version)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Spec>> {
        self.specs.values().flatten()
    }

    /// Number of specs across all names.
    pub fn len(&self) -> usize {
        self.specs.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
