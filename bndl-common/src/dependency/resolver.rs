// bndl-common/src/dependency/resolver.rs

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, error};

use crate::dependency::{Dependency, DependencyExt};
use crate::error::{BndlError, Result};
use crate::model::{Index, ResolvedSet, Spec};

/// Per-package-name index restrictions, taken from a dependency's explicit source.
pub type SourceRequirements = HashMap<String, Arc<Index>>;

/// Turns requested dependencies plus candidate indices into a consistent resolved set.
///
/// Implementations must report a missing package as [`BndlError::PackageNotFound`]; the
/// installer treats that one condition as recoverable during local resolution.
pub trait Resolver {
    fn resolve(
        &self,
        dependencies: &[Dependency],
        index: &Index,
        source_requirements: &SourceRequirements,
    ) -> Result<ResolvedSet>;
}

/// Picks the highest matching candidate for each name and walks runtime edges.
///
/// There is no backtracking: once a version is chosen for a name, any later requirement it
/// does not satisfy is reported as a conflict.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyResolver;

impl Resolver for GreedyResolver {
    fn resolve(
        &self,
        dependencies: &[Dependency],
        index: &Index,
        source_requirements: &SourceRequirements,
    ) -> Result<ResolvedSet> {
        debug!(
            "Starting greedy resolution for {} dependencies against {} indexed specs",
            dependencies.len(),
            index.len()
        );
        let mut state = ResolutionState {
            index,
            source_requirements,
            chosen: HashMap::new(),
            visiting: HashSet::new(),
            order: Vec::new(),
        };

        for dependency in dependencies {
            state.resolve_recursive(dependency, "the manifest")?;
        }

        let specs = state
            .order
            .iter()
            .filter_map(|name| state.chosen.get(name))
            .map(|spec| {
                let mut spec = Spec::clone(spec);
                spec.groups.clear();
                spec
            })
            .collect::<Vec<_>>();

        debug!(
            "Resolved set: {:?}",
            specs.iter().map(|s| s.full_name()).collect::<Vec<_>>()
        );
        Ok(ResolvedSet::new(specs))
    }
}

struct ResolutionState<'a> {
    index: &'a Index,
    source_requirements: &'a SourceRequirements,
    chosen: HashMap<String, Arc<Spec>>,
    visiting: HashSet<String>,
    order: Vec<String>,
}

impl ResolutionState<'_> {
    fn candidates_for(&self, name: &str) -> &Index {
        match self.source_requirements.get(name) {
            Some(restricted) => {
                debug!("Resolving '{}' against its explicit source only", name);
                restricted.as_ref()
            }
            None => self.index,
        }
    }

    fn resolve_recursive(&mut self, dependency: &Dependency, required_by: &str) -> Result<()> {
        let name = dependency.name.as_str();

        // -------- already chosen: the choice must satisfy this edge too -------------------
        if let Some(existing) = self.chosen.get(name) {
            if dependency.requirement.matches(&existing.version) {
                debug!(
                    "'{}' already resolved to {} which satisfies '{}'",
                    name, existing.version, dependency.requirement
                );
                return Ok(());
            }
            error!(
                "Conflict: '{}' resolved to {} but {} requires '{}'",
                name, existing.version, required_by, dependency.requirement
            );
            return Err(BndlError::VersionConflict {
                name: name.to_string(),
                chosen: existing.version.to_string(),
                requirement: dependency.requirement.to_string(),
                required_by: required_by.to_string(),
            });
        }

        // -------- first time we see this name --------------------------------------------
        let best = self
            .candidates_for(name)
            .search_matching(dependency)
            .first()
            .map(|spec| Arc::clone(spec))
            .ok_or_else(|| {
                debug!(
                    "No candidate for '{}' matching '{}' (required by {})",
                    name, dependency.requirement, required_by
                );
                BndlError::PackageNotFound {
                    name: name.to_string(),
                    requirement: dependency.requirement.to_string(),
                }
            })?;

        debug!("Selected {} for '{}'", best.full_name(), dependency.requirement);
        self.chosen.insert(name.to_string(), Arc::clone(&best));
        self.visiting.insert(name.to_string());

        // --------------------------------------------------------------------- recurse ----
        let parent = best.full_name();
        for edge in best.dependencies.runtime() {
            if self.visiting.contains(&edge.name) {
                debug!("Edge {} -> {} closes a cycle; already being resolved", parent, edge.name);
            }
            self.resolve_recursive(edge, &parent)?;
        }

        self.visiting.remove(name);
        self.order.push(name.to_string());
        Ok(())
    }
}
