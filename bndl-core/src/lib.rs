// bndl-core/src/lib.rs
pub mod definition;
pub mod install;
pub mod installer;
pub mod source;

pub use definition::{Definition, ManifestDefinition};
pub use installer::{InstallOptions, InstallReport, Installer, Resolution, ResolutionPhase};
pub use source::{InstallableSource, LocalIndexSource, Source};
