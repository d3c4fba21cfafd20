// Path: bndl-core/src/install/extract.rs
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use bndl_common::error::{BndlError, Result};
use flate2::read::GzDecoder;
use tar::{Archive, EntryType};
use tracing::{debug, error, warn};

fn open_archive(archive_path: &Path) -> Result<File> {
    File::open(archive_path).map_err(|e| {
        BndlError::Io(Arc::new(io::Error::new(
            e.kind(),
            format!("Failed to open archive {}: {}", archive_path.display(), e),
        )))
    })
}

/// The single top-level directory of a `.tar.gz`, if the archive has exactly one.
pub(crate) fn infer_archive_root_dir(archive_path: &Path) -> Result<Option<PathBuf>> {
    debug!(
        "Inferring root directory for archive: {}",
        archive_path.display()
    );
    let file = open_archive(archive_path)?;
    infer_tar_root(GzDecoder::new(file), archive_path)
}

fn infer_tar_root<R: Read>(reader: R, archive_path_for_log: &Path) -> Result<Option<PathBuf>> {
    let mut archive = Archive::new(reader);
    let mut unique_roots = HashSet::new();
    let mut has_nested_entries = false;

    for entry_result in archive.entries()? {
        let entry = entry_result.map_err(|e| {
            BndlError::InstallError(format!(
                "Error reading TAR entry from {}: {}",
                archive_path_for_log.display(),
                e
            ))
        })?;
        let path = entry
            .path()
            .map_err(|e| {
                BndlError::InstallError(format!(
                    "Invalid path in TAR entry from {}: {}",
                    archive_path_for_log.display(),
                    e
                ))
            })?
            .into_owned();

        let mut components = path
            .components()
            .filter(|c| !matches!(c, Component::CurDir));
        match components.next() {
            Some(Component::Normal(name)) => {
                unique_roots.insert(PathBuf::from(name));
                if components.next().is_some() {
                    has_nested_entries = true;
                }
                if unique_roots.len() > 1 {
                    debug!(
                        "Multiple top-level items found in TAR {}, cannot infer single root.",
                        archive_path_for_log.display()
                    );
                    return Ok(None);
                }
            }
            Some(other) => {
                debug!(
                    "Non-standard top-level component ({:?}) in TAR {}, cannot infer single root.",
                    other,
                    archive_path_for_log.display()
                );
                return Ok(None);
            }
            None => continue,
        }
    }

    // A lone top-level file is content, not a wrapper directory.
    if unique_roots.len() == 1 && has_nested_entries {
        let root = unique_roots.into_iter().next();
        debug!(
            "Inferred single root directory in TAR {}: {:?}",
            archive_path_for_log.display(),
            root
        );
        Ok(root)
    } else {
        if unique_roots.is_empty() {
            warn!(
                "TAR archive {} appears to be empty.",
                archive_path_for_log.display()
            );
        }
        Ok(None)
    }
}

/// Unpacks a `.tar.gz` into `target_dir`, dropping the first `strip_components` path
/// components of every entry. Entries escaping `target_dir` are refused.
pub fn extract_archive(archive_path: &Path, target_dir: &Path, strip_components: usize) -> Result<()> {
    debug!(
        "Extracting archive '{}' to '{}' (strip_components={})",
        archive_path.display(),
        target_dir.display(),
        strip_components
    );

    fs::create_dir_all(target_dir).map_err(|e| {
        BndlError::Io(Arc::new(io::Error::new(
            e.kind(),
            format!(
                "Failed to create target directory {}: {}",
                target_dir.display(),
                e
            ),
        )))
    })?;

    let file = open_archive(archive_path)?;
    extract_tar_archive(GzDecoder::new(file), target_dir, strip_components, archive_path)
}

fn extract_tar_archive<R: Read>(
    reader: R,
    target_dir: &Path,
    strip_components: usize,
    archive_path_for_log: &Path,
) -> Result<()> {
    let mut archive = Archive::new(reader);
    archive.set_preserve_permissions(true);
    archive.set_overwrite(true);

    let mut errors: Vec<String> = Vec::new();

    for entry_result in archive.entries()? {
        let mut entry = entry_result.map_err(|e| {
            BndlError::InstallError(format!(
                "Error reading TAR entry from {}: {}",
                archive_path_for_log.display(),
                e
            ))
        })?;

        let original_path_in_archive: PathBuf = entry
            .path()
            .map_err(|e| {
                BndlError::InstallError(format!(
                    "Invalid path in TAR entry from {}: {}",
                    archive_path_for_log.display(),
                    e
                ))
            })?
            .into_owned();

        let stripped: Vec<Component<'_>> = original_path_in_archive
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .skip(strip_components)
            .collect();

        if stripped.is_empty() {
            debug!(
                "Skipping entry due to strip_components: {:?}",
                original_path_in_archive
            );
            continue;
        }

        let mut final_target_path_on_disk = target_dir.to_path_buf();
        let mut unsafe_component = None;
        for comp in stripped {
            match comp {
                Component::Normal(p) => final_target_path_on_disk.push(p),
                other => {
                    unsafe_component = Some(other);
                    break;
                }
            }
        }
        if let Some(comp) = unsafe_component {
            let msg = format!(
                "Disallowed component {:?} in TAR path {} from {}",
                comp,
                original_path_in_archive.display(),
                archive_path_for_log.display()
            );
            error!("{}", msg);
            errors.push(msg);
            continue;
        }

        if entry.header().entry_type() == EntryType::Link {
            let msg = format!(
                "Hard link entry '{}' in {} is not supported",
                original_path_in_archive.display(),
                archive_path_for_log.display()
            );
            warn!("{}", msg);
            errors.push(msg);
            continue;
        }

        if let Some(parent) = final_target_path_on_disk.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    BndlError::Io(Arc::new(io::Error::new(
                        e.kind(),
                        format!("Failed create parent dir {}: {}", parent.display(), e),
                    )))
                })?;
            }
        }

        match entry.unpack(&final_target_path_on_disk) {
            Ok(_) => debug!(
                "Unpacked TAR entry to: {}",
                final_target_path_on_disk.display()
            ),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => debug!(
                "Entry already exists at {}, skipping unpack.",
                final_target_path_on_disk.display()
            ),
            Err(e) => {
                let msg = format!(
                    "Failed to unpack entry {:?} to {}: {}. Entry type: {:?}",
                    original_path_in_archive,
                    final_target_path_on_disk.display(),
                    e,
                    entry.header().entry_type()
                );
                error!("{}", msg);
                errors.push(msg);
            }
        }
    }

    if !errors.is_empty() {
        return Err(BndlError::InstallError(format!(
            "Failed during TAR extraction for {} with {} error(s): {}",
            archive_path_for_log.display(),
            errors.len(),
            errors.join("; ")
        )));
    }

    debug!(
        "Finished TAR extraction for {}",
        archive_path_for_log.display()
    );
    Ok(())
}
