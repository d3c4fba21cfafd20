// bndl-core/src/installer/mod.rs
//! The install orchestrator: builds candidate indices, resolves (locally first, then against
//! every source's full index), propagates groups and installs what is left.
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use bndl_common::config::Config;
use bndl_common::dependency::Resolver;
use bndl_common::error::{BndlError, Result};
use bndl_common::events::{InstallEvent, Notifier, SkipReason};
use bndl_common::model::{Index, ResolvedSet, SourceId, Spec};
use bndl_common::store::PackageStore;
use once_cell::unsync::OnceCell;
use tracing::{debug, instrument};

use crate::definition::Definition;
use crate::source::{InstalledSource, PackageDirSource, Source};

pub mod groups;
mod index;
mod resolution;

pub use groups::propagate_groups;

/// Which resolution attempt produced the accepted result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionPhase {
    /// Resolved against installed packages, the package cache and cached source metadata.
    Local,
    /// Resolved against the full index of every configured source.
    Remote,
}

impl fmt::Display for ResolutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    /// Specs belonging to any of these groups are not installed.
    pub without: BTreeSet<String>,
}

impl InstallOptions {
    pub fn without<I, S>(groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            without: groups.into_iter().map(Into::into).collect(),
        }
    }
}

/// The accepted resolution with groups attached.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub phase: ResolutionPhase,
    pub specs: ResolvedSet,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    /// `None` when the manifest declared nothing and no resolution ran.
    pub phase: Option<ResolutionPhase>,
    pub installed: Vec<String>,
    pub skipped: Vec<String>,
}

/// A merged index plus the contribution of each source, kept for per-dependency overrides.
#[derive(Debug, Default)]
pub(crate) struct SourceIndices {
    pub(crate) merged: Arc<Index>,
    pub(crate) per_source: HashMap<SourceId, Arc<Index>>,
}

/// Orchestrates one install run.
///
/// Indices and the resolution are computed at most once per instance and cached in
/// single-threaded cells, so an `Installer` must not be shared between threads.
pub struct Installer<'a> {
    definition: &'a dyn Definition,
    resolver: &'a dyn Resolver,
    notifier: &'a dyn Notifier,
    installed: Arc<dyn Source>,
    cache: Option<Arc<dyn Source>>,
    local_indices: OnceCell<SourceIndices>,
    full_indices: OnceCell<SourceIndices>,
    resolution: OnceCell<Resolution>,
}

impl<'a> Installer<'a> {
    /// Creates an installer for the install root in `config`. The `vendor/cache` package
    /// directory is only used when it exists.
    pub fn new(
        config: &Config,
        definition: &'a dyn Definition,
        resolver: &'a dyn Resolver,
        notifier: &'a dyn Notifier,
    ) -> Self {
        let store = PackageStore::new(config.clone());
        let installed: Arc<dyn Source> = Arc::new(InstalledSource::new(store.clone()));
        let cache_dir = config.vendor_cache_dir();
        let cache = if cache_dir.is_dir() {
            debug!("Using package cache at {}", cache_dir.display());
            let id = SourceId::Cache {
                path: cache_dir.clone(),
            };
            Some(Arc::new(PackageDirSource::new(id, cache_dir, store)) as Arc<dyn Source>)
        } else {
            None
        };
        Self::with_sources(definition, resolver, notifier, installed, cache)
    }

    /// Creates an installer with explicit installed-package and cache sources.
    pub fn with_sources(
        definition: &'a dyn Definition,
        resolver: &'a dyn Resolver,
        notifier: &'a dyn Notifier,
        installed: Arc<dyn Source>,
        cache: Option<Arc<dyn Source>>,
    ) -> Self {
        Self {
            definition,
            resolver,
            notifier,
            installed,
            cache,
            local_indices: OnceCell::new(),
            full_indices: OnceCell::new(),
            resolution: OnceCell::new(),
        }
    }

    /// Builds an installer and runs it once.
    pub fn install(
        config: &Config,
        definition: &'a dyn Definition,
        resolver: &'a dyn Resolver,
        notifier: &'a dyn Notifier,
        options: &InstallOptions,
    ) -> Result<InstallReport> {
        Self::new(config, definition, resolver, notifier).run(options)
    }

    /// Resolves and installs every spec that is installable and not excluded.
    ///
    /// The first install failure stops the run; packages installed before it stay installed.
    #[instrument(skip_all, fields(without = ?options.without))]
    pub fn run(&self, options: &InstallOptions) -> Result<InstallReport> {
        if self.definition.dependencies().is_empty() {
            self.notifier.notify(InstallEvent::NoDependencies);
            return Ok(InstallReport::default());
        }

        let resolution = self.resolution()?;
        let mut report = InstallReport {
            phase: Some(resolution.phase),
            ..InstallReport::default()
        };

        for spec in &resolution.specs {
            let source = self.source_for(&spec.source)?;
            let Some(installable) = source.as_installable() else {
                self.skip(
                    spec,
                    SkipReason::NotInstallable {
                        source: source.id().to_string(),
                    },
                    &mut report,
                );
                continue;
            };

            if spec.in_any_group(&options.without) {
                let groups = spec
                    .groups
                    .intersection(&options.without)
                    .cloned()
                    .collect();
                self.skip(spec, SkipReason::ExcludedGroups { groups }, &mut report);
                continue;
            }

            self.notifier.notify(InstallEvent::InstallStarted {
                name: spec.name.clone(),
                version: spec.version.to_string(),
                source: source.id().to_string(),
            });
            installable.install(spec)?;
            report.installed.push(spec.full_name());
        }

        self.notifier.notify(InstallEvent::InstallFinished {
            installed: report.installed.len(),
            skipped: report.skipped.len(),
        });
        Ok(report)
    }

    fn skip(&self, spec: &Spec, reason: SkipReason, report: &mut InstallReport) {
        debug!("Skipping {}: {:?}", spec, reason);
        self.notifier.notify(InstallEvent::InstallSkipped {
            name: spec.name.clone(),
            version: spec.version.to_string(),
            reason,
        });
        report.skipped.push(spec.full_name());
    }

    /// The source that owns `id`: a configured source, the package cache or the installed store.
    fn source_for(&self, id: &SourceId) -> Result<&Arc<dyn Source>> {
        self.definition
            .sources()
            .iter()
            .chain(self.cache.iter())
            .chain(std::iter::once(&self.installed))
            .find(|source| source.id() == id)
            .ok_or_else(|| BndlError::InstallError(format!("No configured source matches {id}")))
    }
}
