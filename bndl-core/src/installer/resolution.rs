// bndl-core/src/installer/resolution.rs
use bndl_common::dependency::{Dependency, SourceRequirements};
use bndl_common::error::{BndlError, Result};
use bndl_common::events::InstallEvent;
use bndl_common::model::ResolvedSet;
use tracing::{debug, instrument};

use super::groups::propagate_groups;
use super::{Installer, Resolution, ResolutionPhase, SourceIndices};
use crate::source::Source;

impl Installer<'_> {
    /// The accepted resolution with groups propagated. Computed once per installer.
    pub fn resolution(&self) -> Result<&Resolution> {
        self.resolution.get_or_try_init(|| self.resolve())
    }

    fn resolve(&self) -> Result<Resolution> {
        let dependencies = self.definition.dependencies();
        let (phase, mut specs) = match self.resolve_locally(dependencies)? {
            Some(specs) => (ResolutionPhase::Local, specs),
            None => (ResolutionPhase::Remote, self.resolve_remotely(dependencies)?),
        };
        propagate_groups(&mut specs, dependencies)?;
        debug!("Accepted {} resolution of {} specs", phase, specs.len());
        Ok(Resolution { phase, specs })
    }

    /// Tries to satisfy a fully pinned manifest from what is already on disk.
    ///
    /// `Ok(None)` means "try remotely": some requirement is not exact, a package is missing
    /// locally, or the result does not have one spec per declared dependency. The last check
    /// does not prove that every transitive dependency was found.
    #[instrument(skip_all)]
    fn resolve_locally(&self, dependencies: &[Dependency]) -> Result<Option<ResolvedSet>> {
        if let Some(loose) = dependencies.iter().find(|d| !d.is_exact()) {
            debug!("{} is not pinned to an exact version, skipping local resolution", loose);
            return Ok(None);
        }

        let indices = self.local_indices()?;
        let overrides = self.source_requirements(dependencies, indices, |source| {
            source.as_local_index().is_some()
        })?;

        match self.resolver.resolve(dependencies, &indices.merged, &overrides) {
            Ok(specs) if specs.len() == dependencies.len() => Ok(Some(specs)),
            Ok(specs) => {
                debug!(
                    "Local resolution produced {} specs for {} dependencies, resolving remotely",
                    specs.len(),
                    dependencies.len()
                );
                Ok(None)
            }
            Err(e) if e.is_package_not_found() => {
                debug!("Local resolution incomplete ({}), resolving remotely", e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip_all)]
    fn resolve_remotely(&self, dependencies: &[Dependency]) -> Result<ResolvedSet> {
        let indices = self.full_indices()?;
        let overrides = self.source_requirements(dependencies, indices, |_| true)?;

        self.notifier.notify(InstallEvent::ResolutionStarted);
        let specs = self
            .resolver
            .resolve(dependencies, &indices.merged, &overrides)?;
        self.notifier.notify(InstallEvent::ResolutionFinished {
            spec_count: specs.len(),
        });
        Ok(specs)
    }

    /// Restricts each dependency with an explicit source to that source's index from `indices`.
    /// Sources rejected by `eligible` are not used as restrictions.
    fn source_requirements(
        &self,
        dependencies: &[Dependency],
        indices: &SourceIndices,
        eligible: impl Fn(&dyn Source) -> bool,
    ) -> Result<SourceRequirements> {
        let mut requirements = SourceRequirements::new();
        for dependency in dependencies {
            let Some(id) = &dependency.source else {
                continue;
            };
            let source = self
                .definition
                .sources()
                .iter()
                .find(|source| source.id() == id)
                .ok_or_else(|| {
                    BndlError::Config(format!(
                        "'{}' requires {}, which is not a configured source",
                        dependency.name, id
                    ))
                })?;
            if !eligible(source.as_ref()) {
                continue;
            }
            if let Some(index) = indices.per_source.get(id) {
                requirements.insert(dependency.name.clone(), index.clone());
            }
        }
        Ok(requirements)
    }
}
