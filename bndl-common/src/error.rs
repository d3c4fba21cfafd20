use std::sync::Arc;

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum BndlError {
    #[error("I/O Error: {0}")]
    Io(#[from] Arc<std::io::Error>),

    #[error("HTTP Request Error: {0}")]
    Http(#[from] Arc<reqwest::Error>),

    #[error("JSON Parsing Error: {0}")]
    Json(#[from] Arc<serde_json::Error>),

    #[error("TOML Parsing Error: {0}")]
    Toml(#[from] Arc<toml::de::Error>),

    #[error("Semantic Versioning Error: {0}")]
    SemVer(#[from] Arc<semver::Error>),

    #[error("Configuration Error: {0}")]
    Config(String),

    #[error("Manifest Error in {0}: {1}")]
    Manifest(String, String),

    #[error("Could not find package '{name}' matching '{requirement}' in any source")]
    PackageNotFound { name: String, requirement: String },

    #[error("Version conflict for '{name}': {chosen} was selected but '{requirement}' is required by {required_by}")]
    VersionConflict {
        name: String,
        chosen: String,
        requirement: String,
        required_by: String,
    },

    #[error("Dependency Error: {0}")]
    DependencyError(String),

    #[error("DownloadError: Failed to download '{0}' from '{1}': {2}")]
    DownloadError(String, String, String),

    #[error("HttpError: {0}")]
    HttpError(String),

    #[error("Cache Error: {0}")]
    Cache(String),

    #[error("Resource Not Found: {0}")]
    NotFound(String),

    #[error("Installation Error: {0}")]
    InstallError(String),

    #[error("Checksum Error: {0}")]
    ChecksumError(String),

    #[error("Validation Error: {0}")]
    ValidationError(String),

    #[error("Generic Error: {0}")]
    Generic(String),
}

impl BndlError {
    /// True for the one resolution failure the installer may recover from.
    pub fn is_package_not_found(&self) -> bool {
        matches!(self, BndlError::PackageNotFound { .. })
    }
}

impl From<std::io::Error> for BndlError {
    fn from(err: std::io::Error) -> Self {
        BndlError::Io(Arc::new(err))
    }
}

impl From<reqwest::Error> for BndlError {
    fn from(err: reqwest::Error) -> Self {
        BndlError::Http(Arc::new(err))
    }
}

impl From<serde_json::Error> for BndlError {
    fn from(err: serde_json::Error) -> Self {
        BndlError::Json(Arc::new(err))
    }
}

impl From<toml::de::Error> for BndlError {
    fn from(err: toml::de::Error) -> Self {
        BndlError::Toml(Arc::new(err))
    }
}

impl From<semver::Error> for BndlError {
    fn from(err: semver::Error) -> Self {
        BndlError::SemVer(Arc::new(err))
    }
}

pub type Result<T> = std::result::Result<T, BndlError>;
