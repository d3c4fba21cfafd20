// bndl-core/tests/installer.rs
use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use bndl_common::dependency::{Dependency, GreedyResolver, Requirement, Resolver, SourceRequirements};
use bndl_common::error::{BndlError, Result};
use bndl_common::events::{InstallEvent, RecordingNotifier, SkipReason};
use bndl_common::model::{Index, ResolvedSet, SourceId, Spec};
use bndl_core::{
    Definition, InstallOptions, InstallableSource, Installer, LocalIndexSource, ResolutionPhase,
    Source,
};
use semver::Version;

#[derive(Debug)]
struct MockSource {
    id: SourceId,
    local: Option<Index>,
    full: Index,
    installable: bool,
    fail_install: bool,
    local_calls: Cell<usize>,
    full_calls: Cell<usize>,
    installs: RefCell<Vec<String>>,
}

impl MockSource {
    fn new(id: SourceId) -> Self {
        Self {
            id,
            local: None,
            full: Index::new(),
            installable: true,
            fail_install: false,
            local_calls: Cell::new(0),
            full_calls: Cell::new(0),
            installs: RefCell::new(Vec::new()),
        }
    }

    fn with_local(mut self, specs: Vec<Spec>) -> Self {
        self.local = Some(Index::from_specs(specs));
        self
    }

    fn with_full(mut self, specs: Vec<Spec>) -> Self {
        self.full = Index::from_specs(specs);
        self
    }

    fn metadata_only(mut self) -> Self {
        self.installable = false;
        self
    }

    fn failing(mut self) -> Self {
        self.fail_install = true;
        self
    }

    fn installs(&self) -> Vec<String> {
        self.installs.borrow().clone()
    }
}

impl Source for MockSource {
    fn id(&self) -> &SourceId {
        &self.id
    }

    fn full_index(&self) -> Result<Index> {
        self.full_calls.set(self.full_calls.get() + 1);
        Ok(self.full.clone())
    }

    fn as_local_index(&self) -> Option<&dyn LocalIndexSource> {
        self.local.as_ref().map(|_| self as &dyn LocalIndexSource)
    }

    fn as_installable(&self) -> Option<&dyn InstallableSource> {
        self.installable.then_some(self as &dyn InstallableSource)
    }
}

impl LocalIndexSource for MockSource {
    fn local_index(&self) -> Result<Index> {
        self.local_calls.set(self.local_calls.get() + 1);
        Ok(self.local.clone().unwrap_or_default())
    }
}

impl InstallableSource for MockSource {
    fn install(&self, spec: &Spec) -> Result<()> {
        if self.fail_install {
            return Err(BndlError::InstallError(format!("cannot install {spec}")));
        }
        self.installs.borrow_mut().push(spec.full_name());
        Ok(())
    }
}

struct TestDefinition {
    dependencies: Vec<Dependency>,
    sources: Vec<Arc<dyn Source>>,
}

impl Definition for TestDefinition {
    fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    fn sources(&self) -> &[Arc<dyn Source>] {
        &self.sources
    }
}

#[derive(Default)]
struct CountingResolver {
    calls: Cell<usize>,
    inner: GreedyResolver,
}

impl Resolver for CountingResolver {
    fn resolve(
        &self,
        dependencies: &[Dependency],
        index: &Index,
        source_requirements: &SourceRequirements,
    ) -> Result<ResolvedSet> {
        self.calls.set(self.calls.get() + 1);
        self.inner.resolve(dependencies, index, source_requirements)
    }
}

fn path_source(name: &str) -> SourceId {
    SourceId::Path {
        name: name.to_string(),
        path: PathBuf::from(format!("/srv/{name}")),
    }
}

fn registry(name: &str) -> SourceId {
    SourceId::Registry {
        name: name.to_string(),
        url: format!("https://{name}.example.org"),
    }
}

fn spec(name: &str, version: &str, source: &SourceId) -> Spec {
    Spec::new(name, Version::parse(version).unwrap(), source.clone())
}

fn dep(name: &str, requirement: &str) -> Dependency {
    Dependency::new_runtime(name, Requirement::parse(requirement).unwrap()).with_group("default")
}

fn installed_store(specs: Vec<Spec>) -> Arc<MockSource> {
    Arc::new(
        MockSource::new(SourceId::Installed)
            .with_local(specs.clone())
            .with_full(specs)
            .metadata_only(),
    )
}

fn as_sources(sources: &[&Arc<MockSource>]) -> Vec<Arc<dyn Source>> {
    sources
        .iter()
        .map(|s| Arc::clone(s) as Arc<dyn Source>)
        .collect()
}

#[test]
fn empty_manifest_warns_and_touches_nothing() {
    let installed = installed_store(vec![]);
    let remote = Arc::new(MockSource::new(registry("main")));
    let definition = TestDefinition {
        dependencies: vec![],
        sources: as_sources(&[&remote]),
    };
    let resolver = CountingResolver::default();
    let notifier = RecordingNotifier::new();

    let installer =
        Installer::with_sources(&definition, &resolver, &notifier, installed.clone(), None);
    let report = installer.run(&InstallOptions::default()).unwrap();

    assert_eq!(report.phase, None);
    assert!(report.installed.is_empty());
    assert_eq!(resolver.calls.get(), 0);
    assert_eq!(installed.local_calls.get(), 0);
    assert_eq!(remote.full_calls.get(), 0);
    assert_eq!(notifier.events(), [InstallEvent::NoDependencies]);
}

#[test]
fn pinned_manifest_resolves_locally_without_full_index() {
    let installed_id = SourceId::Installed;
    let installed = installed_store(vec![spec("a", "1.0.0", &installed_id)]);
    let remote = Arc::new(
        MockSource::new(registry("main"))
            .with_local(vec![])
            .with_full(vec![spec("a", "1.0.0", &registry("main"))]),
    );
    let definition = TestDefinition {
        dependencies: vec![dep("a", "=1.0.0")],
        sources: as_sources(&[&remote]),
    };
    let resolver = CountingResolver::default();
    let notifier = RecordingNotifier::new();

    let installer = Installer::with_sources(&definition, &resolver, &notifier, installed, None);
    let report = installer.run(&InstallOptions::default()).unwrap();

    assert_eq!(report.phase, Some(ResolutionPhase::Local));
    assert_eq!(resolver.calls.get(), 1);
    assert_eq!(remote.full_calls.get(), 0);
    assert!(remote.installs().is_empty());
    assert_eq!(report.skipped, ["a-1.0.0"]);
    assert!(!notifier
        .events()
        .iter()
        .any(|e| matches!(e, InstallEvent::IndexFetchStarted { .. })));
}

#[test]
fn loose_requirement_skips_local_phase() {
    let installed = installed_store(vec![spec("a", "1.0.0", &SourceId::Installed)]);
    let remote = Arc::new(
        MockSource::new(registry("main"))
            .with_full(vec![spec("a", "1.0.0", &registry("main")), spec("a", "2.0.0", &registry("main"))]),
    );
    let definition = TestDefinition {
        dependencies: vec![dep("a", ">=1.0.0")],
        sources: as_sources(&[&remote]),
    };
    let resolver = CountingResolver::default();
    let notifier = RecordingNotifier::new();

    let installer = Installer::with_sources(&definition, &resolver, &notifier, installed, None);
    let report = installer.run(&InstallOptions::default()).unwrap();

    assert_eq!(report.phase, Some(ResolutionPhase::Remote));
    assert_eq!(resolver.calls.get(), 1);
    assert_eq!(remote.full_calls.get(), 1);
    assert_eq!(remote.installs(), ["a-2.0.0"]);

    let events = notifier.events();
    assert!(events.contains(&InstallEvent::IndexFetchStarted {
        source: registry("main").to_string()
    }));
    assert!(events.contains(&InstallEvent::ResolutionStarted));
    assert_eq!(
        events.last(),
        Some(&InstallEvent::InstallFinished {
            installed: 1,
            skipped: 0
        })
    );
}

#[test]
fn missing_local_package_falls_back_to_remote() {
    let installed = installed_store(vec![]);
    let remote = Arc::new(
        MockSource::new(registry("main"))
            .with_local(vec![])
            .with_full(vec![spec("a", "1.0.0", &registry("main"))]),
    );
    let definition = TestDefinition {
        dependencies: vec![dep("a", "=1.0.0")],
        sources: as_sources(&[&remote]),
    };
    let resolver = CountingResolver::default();
    let notifier = RecordingNotifier::new();

    let installer = Installer::with_sources(&definition, &resolver, &notifier, installed, None);
    let report = installer.run(&InstallOptions::default()).unwrap();

    assert_eq!(report.phase, Some(ResolutionPhase::Remote));
    assert_eq!(resolver.calls.get(), 2);
    assert_eq!(remote.installs(), ["a-1.0.0"]);
}

#[test]
fn local_conflict_is_not_retried_remotely() {
    let local = path_source("local");
    let source = Arc::new(
        MockSource::new(local.clone()).with_local(vec![
            spec("a", "1.0.0", &local).with_dependency(Dependency::new_runtime(
                "b",
                Requirement::parse("=1.0.0").unwrap(),
            )),
            spec("b", "1.0.0", &local),
            spec("b", "2.0.0", &local),
        ]),
    );
    let definition = TestDefinition {
        dependencies: vec![dep("a", "=1.0.0"), dep("b", "=2.0.0")],
        sources: as_sources(&[&source]),
    };
    let resolver = CountingResolver::default();
    let notifier = RecordingNotifier::new();

    let installer =
        Installer::with_sources(&definition, &resolver, &notifier, installed_store(vec![]), None);
    let err = installer.run(&InstallOptions::default()).unwrap_err();

    assert!(matches!(err, BndlError::VersionConflict { .. }));
    assert_eq!(resolver.calls.get(), 1);
    assert_eq!(source.full_calls.get(), 0);
}

#[test]
fn remote_failure_is_fatal() {
    let remote = Arc::new(MockSource::new(registry("main")));
    let definition = TestDefinition {
        dependencies: vec![dep("ghost", ">=0")],
        sources: as_sources(&[&remote]),
    };
    let resolver = CountingResolver::default();
    let notifier = RecordingNotifier::new();

    let installer =
        Installer::with_sources(&definition, &resolver, &notifier, installed_store(vec![]), None);
    let err = installer.run(&InstallOptions::default()).unwrap_err();
    assert!(err.is_package_not_found());
}

#[test]
fn excluded_group_skips_spec_even_when_another_group_is_kept() {
    let local = path_source("local");
    let source = Arc::new(MockSource::new(local.clone()).with_local(vec![
        spec("shared", "1.0.0", &local),
        spec("web", "1.0.0", &local)
            .with_dependency(Dependency::new_runtime("shared", Requirement::any())),
        spec("runner", "1.0.0", &local)
            .with_dependency(Dependency::new_runtime("shared", Requirement::any())),
        spec("linter", "1.0.0", &local),
    ]));
    let definition = TestDefinition {
        dependencies: vec![
            dep("web", "=1.0.0"),
            dep("runner", "=1.0.0").with_group("test"),
            dep("linter", "=1.0.0").with_group("lint"),
        ],
        sources: as_sources(&[&source]),
    };
    let resolver = CountingResolver::default();
    let notifier = RecordingNotifier::new();

    let installer =
        Installer::with_sources(&definition, &resolver, &notifier, installed_store(vec![]), None);
    let resolution = installer.resolution().unwrap();
    // Local acceptance compares counts, so the transitive `shared` forces a remote resolution.
    assert_eq!(resolution.phase, ResolutionPhase::Remote);
    let shared = resolution.specs.get("shared").unwrap();
    assert_eq!(
        shared.groups,
        BTreeSet::from(["default".to_string(), "test".to_string()])
    );

    let report = installer.run(&InstallOptions::without(["test"])).unwrap();
    assert_eq!(source.installs(), ["web-1.0.0", "linter-1.0.0"]);
    assert_eq!(report.skipped, ["shared-1.0.0", "runner-1.0.0"]);
    assert!(notifier.events().contains(&InstallEvent::InstallSkipped {
        name: "shared".into(),
        version: "1.0.0".into(),
        reason: SkipReason::ExcludedGroups {
            groups: vec!["test".into()]
        },
    }));
}

#[test]
fn earlier_declared_source_wins_on_collision() {
    let s1 = path_source("s1");
    let s2 = path_source("s2");
    let first = Arc::new(MockSource::new(s1.clone()).with_local(vec![spec("x", "1.0.0", &s1)]));
    let second = Arc::new(MockSource::new(s2.clone()).with_local(vec![
        spec("x", "1.0.0", &s2),
        spec("x", "0.9.0", &s2),
    ]));
    let definition = TestDefinition {
        dependencies: vec![dep("x", "=1.0.0")],
        sources: as_sources(&[&first, &second]),
    };
    let resolver = CountingResolver::default();
    let notifier = RecordingNotifier::new();

    let installer =
        Installer::with_sources(&definition, &resolver, &notifier, installed_store(vec![]), None);
    installer.run(&InstallOptions::default()).unwrap();

    assert_eq!(first.installs(), ["x-1.0.0"]);
    assert!(second.installs().is_empty());
}

#[test]
fn cache_outranks_installed_store() {
    let cache_id = SourceId::Cache {
        path: PathBuf::from("/srv/app/vendor/cache"),
    };
    let cache = Arc::new(
        MockSource::new(cache_id.clone()).with_local(vec![spec("a", "1.0.0", &cache_id)]),
    );
    let installed = installed_store(vec![spec("a", "1.0.0", &SourceId::Installed)]);
    let definition = TestDefinition {
        dependencies: vec![dep("a", "=1.0.0")],
        sources: vec![],
    };
    let resolver = CountingResolver::default();
    let notifier = RecordingNotifier::new();

    let installer = Installer::with_sources(
        &definition,
        &resolver,
        &notifier,
        installed,
        Some(cache.clone() as Arc<dyn Source>),
    );
    installer.run(&InstallOptions::default()).unwrap();
    assert_eq!(cache.installs(), ["a-1.0.0"]);
}

#[test]
fn cache_outranks_declared_source() {
    let cache_id = SourceId::Cache {
        path: PathBuf::from("/srv/app/vendor/cache"),
    };
    let cache = Arc::new(
        MockSource::new(cache_id.clone()).with_local(vec![spec("x", "1.0.0", &cache_id)]),
    );
    let s1 = path_source("s1");
    let declared = Arc::new(MockSource::new(s1.clone()).with_local(vec![spec("x", "1.0.0", &s1)]));
    let definition = TestDefinition {
        dependencies: vec![dep("x", "=1.0.0")],
        sources: as_sources(&[&declared]),
    };
    let resolver = CountingResolver::default();
    let notifier = RecordingNotifier::new();

    let installer = Installer::with_sources(
        &definition,
        &resolver,
        &notifier,
        installed_store(vec![]),
        Some(cache.clone() as Arc<dyn Source>),
    );
    installer.run(&InstallOptions::default()).unwrap();

    assert_eq!(cache.installs(), ["x-1.0.0"]);
    assert!(declared.installs().is_empty());
}

#[test]
fn explicit_source_restricts_candidates() {
    let s1 = path_source("s1");
    let s2 = path_source("s2");
    let first = Arc::new(MockSource::new(s1.clone()).with_full(vec![spec("x", "2.0.0", &s1)]));
    let second = Arc::new(MockSource::new(s2.clone()).with_full(vec![spec("x", "1.5.0", &s2)]));
    let definition = TestDefinition {
        dependencies: vec![dep("x", ">=1.0.0").with_source(s2.clone())],
        sources: as_sources(&[&first, &second]),
    };
    let resolver = CountingResolver::default();
    let notifier = RecordingNotifier::new();

    let installer =
        Installer::with_sources(&definition, &resolver, &notifier, installed_store(vec![]), None);
    installer.run(&InstallOptions::default()).unwrap();

    assert_eq!(second.installs(), ["x-1.5.0"]);
    assert!(first.installs().is_empty());
    assert_eq!(first.full_calls.get(), 1);
    assert_eq!(second.full_calls.get(), 1);
}

#[test]
fn unconfigured_explicit_source_is_a_config_error() {
    let definition = TestDefinition {
        dependencies: vec![dep("x", "=1.0.0").with_source(registry("elsewhere"))],
        sources: vec![],
    };
    let resolver = CountingResolver::default();
    let notifier = RecordingNotifier::new();

    let installer =
        Installer::with_sources(&definition, &resolver, &notifier, installed_store(vec![]), None);
    assert!(matches!(
        installer.run(&InstallOptions::default()),
        Err(BndlError::Config(_))
    ));
}

#[test]
fn first_install_failure_halts_the_loop() {
    let good_id = path_source("good");
    let bad_id = path_source("bad");
    let good = Arc::new(MockSource::new(good_id.clone()).with_local(vec![
        spec("a", "1.0.0", &good_id),
        spec("c", "1.0.0", &good_id),
    ]));
    let bad = Arc::new(
        MockSource::new(bad_id.clone())
            .with_local(vec![spec("b", "1.0.0", &bad_id)])
            .failing(),
    );
    let definition = TestDefinition {
        dependencies: vec![dep("a", "=1.0.0"), dep("b", "=1.0.0"), dep("c", "=1.0.0")],
        sources: as_sources(&[&good, &bad]),
    };
    let resolver = CountingResolver::default();
    let notifier = RecordingNotifier::new();

    let installer =
        Installer::with_sources(&definition, &resolver, &notifier, installed_store(vec![]), None);
    let err = installer.run(&InstallOptions::default()).unwrap_err();

    assert!(matches!(err, BndlError::InstallError(_)));
    assert_eq!(good.installs(), ["a-1.0.0"]);
    assert!(!notifier
        .events()
        .iter()
        .any(|e| matches!(e, InstallEvent::InstallFinished { .. })));
}

#[test]
fn resolution_is_computed_once_per_installer() {
    let remote = Arc::new(
        MockSource::new(registry("main")).with_full(vec![spec("a", "1.0.0", &registry("main"))]),
    );
    let definition = TestDefinition {
        dependencies: vec![dep("a", ">=1.0.0")],
        sources: as_sources(&[&remote]),
    };
    let resolver = CountingResolver::default();
    let notifier = RecordingNotifier::new();

    let installer =
        Installer::with_sources(&definition, &resolver, &notifier, installed_store(vec![]), None);
    installer.run(&InstallOptions::default()).unwrap();
    installer.run(&InstallOptions::default()).unwrap();

    assert_eq!(resolver.calls.get(), 1);
    assert_eq!(remote.full_calls.get(), 1);
    assert_eq!(remote.installs(), ["a-1.0.0", "a-1.0.0"]);
}

#[test]
fn pinned_package_in_local_source_is_installed_once() {
    let local = path_source("local");
    let source =
        Arc::new(MockSource::new(local.clone()).with_local(vec![spec("a", "1.0.0", &local)]));
    let definition = TestDefinition {
        dependencies: vec![dep("a", "=1.0.0")],
        sources: as_sources(&[&source]),
    };
    let resolver = CountingResolver::default();
    let notifier = RecordingNotifier::new();

    let installer =
        Installer::with_sources(&definition, &resolver, &notifier, installed_store(vec![]), None);
    let resolution = installer.resolution().unwrap();
    let names: Vec<_> = resolution.specs.iter().map(Spec::full_name).collect();
    assert_eq!(names, ["a-1.0.0"]);

    let report = installer.run(&InstallOptions::default()).unwrap();
    assert_eq!(report.phase, Some(ResolutionPhase::Local));
    assert_eq!(source.installs(), ["a-1.0.0"]);
    assert_eq!(source.full_calls.get(), 0);
}
