use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bndl_common::error::{BndlError, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use tracing::{debug, error};

use crate::validation::{validate_url, verify_checksum};

const DOWNLOAD_TIMEOUT_SECS: u64 = 300;
const CONNECT_TIMEOUT_SECS: u64 = 30;
const USER_AGENT_STRING: &str = "bndl package installer (Rust)";

/// Name of the index document every registry serves at its root.
pub const REGISTRY_INDEX_PATH: &str = "index.json";

pub fn registry_index_url(registry_url: &str) -> String {
    format!("{}/{}", registry_url.trim_end_matches('/'), REGISTRY_INDEX_PATH)
}

pub fn package_archive_url(registry_url: &str, full_name: &str) -> String {
    format!(
        "{}/packages/{}.tar.gz",
        registry_url.trim_end_matches('/'),
        full_name
    )
}

/// Fetches the raw JSON index document of a registry. Blocks until complete.
pub fn fetch_registry_index(registry_url: &str) -> Result<String> {
    let url = registry_index_url(registry_url);
    validate_url(&url)?;
    debug!("Fetching registry index from {}", url);

    let client = build_http_client()?;
    let response = client.get(&url).send().map_err(|e| {
        debug!("HTTP request failed for {url}: {e}");
        BndlError::HttpError(format!("HTTP request failed for {url}: {e}"))
    })?;
    let status = response.status();
    if !status.is_success() {
        error!("HTTP error {} fetching index {}", status, url);
        return Err(BndlError::DownloadError(
            REGISTRY_INDEX_PATH.to_string(),
            url,
            format!("HTTP status {status}"),
        ));
    }

    let body = response
        .text()
        .map_err(|e| BndlError::HttpError(format!("Failed to read index body from {url}: {e}")))?;
    debug!("Fetched {} bytes of index data from {}", body.len(), url);
    Ok(body)
}

/// Downloads a package archive into `dest_dir`, reusing an already downloaded copy whose
/// checksum still matches.
pub fn fetch_package_archive(
    package_name: &str,
    url: &str,
    sha256_expected: Option<&str>,
    dest_dir: &Path,
) -> Result<PathBuf> {
    let filename = url
        .split('/')
        .next_back()
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("{package_name}-download"));
    let final_path = dest_dir.join(&filename);

    debug!(
        "Preparing to fetch archive for '{}' from {} into {}",
        package_name,
        url,
        final_path.display()
    );

    if final_path.is_file() {
        match sha256_expected {
            Some(expected) => match verify_checksum(&final_path, expected) {
                Ok(()) => {
                    debug!("Using valid downloaded file: {}", final_path.display());
                    return Ok(final_path);
                }
                Err(e) => {
                    debug!(
                        "Downloaded file checksum mismatch ({}): {}. Redownloading.",
                        final_path.display(),
                        e
                    );
                    if let Err(remove_err) = fs::remove_file(&final_path) {
                        debug!(
                            "Failed to remove corrupted file {}: {}",
                            final_path.display(),
                            remove_err
                        );
                    }
                }
            },
            None => {
                debug!("Using downloaded file (no checksum provided): {}", final_path.display());
                return Ok(final_path);
            }
        }
    }

    fs::create_dir_all(dest_dir)?;
    validate_url(url)?;
    let client = build_http_client()?;
    download_and_verify(&client, url, &final_path, sha256_expected).map_err(|e| {
        error!("Download failed from {}: {}", url, e);
        match e {
            BndlError::ChecksumError(_) | BndlError::DownloadError(..) => e,
            other => BndlError::DownloadError(
                package_name.to_string(),
                url.to_string(),
                other.to_string(),
            ),
        }
    })
}

fn build_http_client() -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_STRING));
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    Client::builder()
        .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| BndlError::HttpError(format!("Failed to build HTTP client: {e}")))
}

fn download_and_verify(
    client: &Client,
    url: &str,
    final_path: &Path,
    sha256_expected: Option<&str>,
) -> Result<PathBuf> {
    let dest_dir = final_path
        .parent()
        .ok_or_else(|| BndlError::Generic(format!("{} has no parent", final_path.display())))?;

    let response = client.get(url).send().map_err(|e| {
        debug!("HTTP request failed for {url}: {e}");
        BndlError::HttpError(format!("HTTP request failed for {url}: {e}"))
    })?;
    let status = response.status();
    debug!("Received HTTP status: {} for {}", status, url);

    if !status.is_success() {
        let file_name = final_path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        return Err(match status {
            StatusCode::NOT_FOUND => BndlError::DownloadError(
                file_name,
                url.to_string(),
                "Resource not found (404)".to_string(),
            ),
            StatusCode::FORBIDDEN => BndlError::DownloadError(
                file_name,
                url.to_string(),
                "Access forbidden (403)".to_string(),
            ),
            _ => BndlError::HttpError(format!("HTTP error {status} for URL {url}")),
        });
    }

    let content = response
        .bytes()
        .map_err(|e| BndlError::HttpError(format!("Failed to read response body bytes: {e}")))?;

    // Written next to the destination so the final rename stays on one filesystem.
    let mut temp_file = tempfile::NamedTempFile::new_in(dest_dir)?;
    temp_file.write_all(&content)?;
    temp_file.flush()?;
    debug!("Wrote {} bytes to {}", content.len(), temp_file.path().display());

    match sha256_expected {
        Some(expected) => {
            verify_checksum(temp_file.path(), expected)?;
            debug!("Checksum verified for {}", url);
        }
        None => tracing::warn!("Skipping checksum verification for {} - none provided.", url),
    }

    temp_file.persist(final_path).map_err(|e| {
        BndlError::Io(std::sync::Arc::new(std::io::Error::new(
            e.error.kind(),
            format!("Failed to move download to {}: {}", final_path.display(), e.error),
        )))
    })?;
    debug!("Moved verified file to final location: {}", final_path.display());
    Ok(final_path.to_path_buf())
}
