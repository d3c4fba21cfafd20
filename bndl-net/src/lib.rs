// bndl-net/src/lib.rs
//! Blocking network access for bndl: registry indices and package archives.
pub mod http;
pub mod validation;

pub use http::{fetch_package_archive, fetch_registry_index, package_archive_url, registry_index_url};
pub use validation::{validate_url, verify_checksum, verify_content_type};
