// bndl-common/src/lib.rs
pub mod cache;
pub mod config;
pub mod dependency;
pub mod error;
pub mod events;
pub mod manifest;
pub mod model;
pub mod store;

// Re-export key types
pub use cache::Cache;
pub use config::Config;
pub use dependency::{Dependency, DependencyTag, Requirement, Resolver};
pub use error::{BndlError, Result};
pub use events::{InstallEvent, Notifier};
pub use manifest::Manifest;
pub use model::{Index, ResolvedSet, SourceId, Spec};
pub use store::PackageStore;
