// bndl-common/src/manifest.rs
//! Reads the user-authored `Bndlfile.toml`.
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::dependency::{Dependency, Requirement};
use crate::error::{BndlError, Result};
use crate::model::SourceId;

/// Group assigned to dependencies that do not name one.
pub const DEFAULT_GROUP: &str = "default";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    #[serde(default, rename = "source")]
    sources: Vec<RawSource>,
    #[serde(default)]
    dependencies: toml::Table,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSource {
    name: String,
    registry: Option<String>,
    path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDependency {
    Version(String),
    Detailed {
        version: Option<String>,
        group: Option<String>,
        source: Option<String>,
    },
}

/// The parsed manifest: declared sources and dependencies, both in declaration order.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub path: PathBuf,
    pub sources: Vec<SourceId>,
    pub dependencies: Vec<Dependency>,
}

impl Manifest {
    pub fn load(config: &Config) -> Result<Self> {
        let path = config.manifest_path();
        debug!("Loading manifest from {}", path.display());
        let raw = fs::read_to_string(path).map_err(|e| {
            BndlError::Manifest(
                path.display().to_string(),
                format!("could not read manifest: {e}"),
            )
        })?;
        Self::parse(&raw, config)
    }

    pub fn parse(raw: &str, config: &Config) -> Result<Self> {
        let origin = config.manifest_path().display().to_string();
        let manifest_error = |msg: String| BndlError::Manifest(origin.clone(), msg);

        let parsed: RawManifest =
            toml::from_str(raw).map_err(|e| manifest_error(e.message().to_string()))?;

        let mut seen_names = HashSet::new();
        let mut sources = Vec::with_capacity(parsed.sources.len());
        for source in parsed.sources {
            if !seen_names.insert(source.name.clone()) {
                return Err(manifest_error(format!(
                    "source '{}' is declared more than once",
                    source.name
                )));
            }
            let id = match (source.registry, source.path) {
                (Some(url), None) => SourceId::Registry {
                    name: source.name,
                    url: url.trim_end_matches('/').to_string(),
                },
                (None, Some(path)) => SourceId::Path {
                    name: source.name,
                    path: config.resolve_manifest_relative(&path),
                },
                _ => {
                    return Err(manifest_error(format!(
                        "source '{}' must set exactly one of 'registry' or 'path'",
                        source.name
                    )))
                }
            };
            sources.push(id);
        }

        let mut dependencies = Vec::with_capacity(parsed.dependencies.len());
        for (name, value) in parsed.dependencies {
            let raw_dep: RawDependency = value
                .try_into()
                .map_err(|e: toml::de::Error| manifest_error(format!("dependency '{name}': {}", e.message())))?;
            let (version, group, source_name) = match raw_dep {
                RawDependency::Version(version) => (Some(version), None, None),
                RawDependency::Detailed {
                    version,
                    group,
                    source,
                } => (version, group, source),
            };

            let requirement = match version {
                Some(v) => Requirement::parse(&v)
                    .map_err(|e| manifest_error(format!("dependency '{name}': {e}")))?,
                None => Requirement::any(),
            };

            let mut dependency = Dependency::new_runtime(name.clone(), requirement)
                .with_group(group.unwrap_or_else(|| DEFAULT_GROUP.to_string()));

            if let Some(source_name) = source_name {
                let source = sources
                    .iter()
                    .find(|s| s.name() == Some(source_name.as_str()))
                    .ok_or_else(|| {
                        manifest_error(format!(
                            "dependency '{name}' refers to undeclared source '{source_name}'"
                        ))
                    })?;
                dependency = dependency.with_source(source.clone());
            }
            dependencies.push(dependency);
        }

        debug!(
            "Manifest declares {} sources and {} dependencies",
            sources.len(),
            dependencies.len()
        );
        Ok(Self {
            path: config.manifest_path().to_path_buf(),
            sources,
            dependencies,
        })
    }

    pub fn source_named(&self, name: &str) -> Option<&SourceId> {
        self.sources.iter().find(|s| s.name() == Some(name))
    }
}
