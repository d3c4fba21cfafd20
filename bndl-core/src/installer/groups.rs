// bndl-core/src/installer/groups.rs
use std::collections::HashSet;

use bndl_common::dependency::{Dependency, DependencyExt};
use bndl_common::error::{BndlError, Result};
use bndl_common::model::ResolvedSet;
use tracing::{debug, warn};

/// Attaches the group of every direct dependency to its spec and to everything that spec
/// reaches through runtime edges.
///
/// Development-only edges are not followed. Each traversal tracks visited positions, so cyclic
/// graphs terminate and every spec gets a group at most once.
pub fn propagate_groups(specs: &mut ResolvedSet, dependencies: &[Dependency]) -> Result<()> {
    for dependency in dependencies {
        let Some(group) = dependency.group.as_deref() else {
            continue;
        };
        let start = specs.position(&dependency.name).ok_or_else(|| {
            BndlError::DependencyError(format!(
                "'{}' was requested but is missing from the resolved set",
                dependency.name
            ))
        })?;

        let mut visited = HashSet::new();
        let mut worklist = vec![start];
        while let Some(position) = worklist.pop() {
            if !visited.insert(position) {
                continue;
            }
            let Some(spec) = specs.at_mut(position) else {
                continue;
            };
            if spec.add_group(group) {
                debug!("{} joins group '{}'", spec, group);
            }

            let edges: Vec<String> = spec
                .dependencies
                .runtime()
                .into_iter()
                .map(|edge| edge.name.clone())
                .collect();
            let parent = spec.to_string();

            for name in edges {
                match specs.position(&name) {
                    Some(next) if !visited.contains(&next) => worklist.push(next),
                    Some(_) => {}
                    None => warn!(
                        "{} depends on '{}', which is not in the resolved set; not propagating '{}'",
                        parent, name, group
                    ),
                }
            }
        }
    }
    Ok(())
}
