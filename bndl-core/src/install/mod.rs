// bndl-core/src/install/mod.rs
//! Unpacking package archives into the install root.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bndl_common::error::{BndlError, Result};
use bndl_common::model::spec::validate_package_name;
use bndl_common::model::Spec;
use bndl_common::store::PackageStore;
use tracing::debug;

pub mod extract;

pub use extract::extract_archive;

/// Extracts `archive_path` into the store directory of `spec` and records its metadata.
///
/// The archive is unpacked into a staging directory next to the final location and renamed
/// into place, so an interrupted extraction never leaves a package that looks installed.
pub fn install_archive(store: &PackageStore, spec: &Spec, archive_path: &Path) -> Result<PathBuf> {
    validate_package_name(&spec.name)?;
    let install_dir = store.package_path(&spec.name, &spec.version);
    let parent_dir = install_dir.parent().ok_or_else(|| {
        BndlError::InstallError(format!(
            "Could not determine parent directory for install path: {}",
            install_dir.display()
        ))
    })?;
    fs::create_dir_all(parent_dir).map_err(|e| {
        BndlError::Io(Arc::new(io::Error::new(
            e.kind(),
            format!(
                "Failed to create parent dir {}: {}",
                parent_dir.display(),
                e
            ),
        )))
    })?;

    let staging = tempfile::Builder::new()
        .prefix(&format!(".{}-", spec.full_name()))
        .tempdir_in(parent_dir)?;

    let strip_components = match extract::infer_archive_root_dir(archive_path)? {
        Some(root) => {
            debug!("Stripping archive root '{}' for {}", root.display(), spec);
            1
        }
        None => 0,
    };
    extract_archive(archive_path, staging.path(), strip_components)?;
    store.write_metadata(spec, staging.path())?;

    if install_dir.exists() {
        debug!(
            "Removing existing package directory before installing: {}",
            install_dir.display()
        );
        fs::remove_dir_all(&install_dir).map_err(|e| {
            BndlError::InstallError(format!(
                "Failed to remove existing package {}: {}",
                install_dir.display(),
                e
            ))
        })?;
    }
    let staged = staging.keep();
    if let Err(e) = fs::rename(&staged, &install_dir) {
        let _ = fs::remove_dir_all(&staged);
        return Err(BndlError::InstallError(format!(
            "Failed to move {} into {}: {}",
            spec,
            install_dir.display(),
            e
        )));
    }

    debug!("Installed {} at {}", spec, install_dir.display());
    Ok(install_dir)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::fs::File;

    use bndl_common::config::Config;
    use bndl_common::model::SourceId;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use semver::Version;

    use super::*;

    pub(crate) fn write_tar_gz(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        for (name, contents) in entries {
            let mut header = tar::Header::new_gnu();
            header.set_size(contents.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, name, contents.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn archive_lands_in_store_with_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let store = PackageStore::new(Config::for_root(dir.path()));
        let spec = Spec::new("rack", Version::new(1, 0, 0), SourceId::Installed);
        let archive = dir.path().join("rack-1.0.0.tar.gz");
        write_tar_gz(&archive, &[("rack-1.0.0/lib/rack.rb", "module Rack; end")]);

        let installed = install_archive(&store, &spec, &archive).unwrap();
        assert_eq!(installed, store.package_path("rack", &spec.version));
        assert!(installed.join("lib/rack.rb").is_file());
        assert!(store.is_installed(&spec));

        let leftovers: Vec<_> = fs::read_dir(installed.parent().unwrap())
            .unwrap()
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().starts_with('.'))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn reinstall_replaces_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let store = PackageStore::new(Config::for_root(dir.path()));
        let spec = Spec::new("rack", Version::new(1, 0, 0), SourceId::Installed);
        let target = store.package_path("rack", &spec.version);
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("stale.txt"), "old").unwrap();

        let archive = dir.path().join("rack.tar.gz");
        write_tar_gz(&archive, &[("fresh.txt", "new")]);
        install_archive(&store, &spec, &archive).unwrap();

        assert!(!target.join("stale.txt").exists());
        assert_eq!(fs::read_to_string(target.join("fresh.txt")).unwrap(), "new");
    }

    #[test]
    fn failed_extraction_leaves_no_staging_dir() {
        let dir = tempfile::tempdir().unwrap();
        let store = PackageStore::new(Config::for_root(dir.path()));
        let spec = Spec::new("rack", Version::new(1, 0, 0), SourceId::Installed);
        let archive = dir.path().join("rack.tar.gz");
        fs::write(&archive, "not a gzip stream").unwrap();

        assert!(install_archive(&store, &spec, &archive).is_err());
        let parent = store.package_path("rack", &spec.version);
        let parent = parent.parent().unwrap();
        assert_eq!(fs::read_dir(parent).unwrap().count(), 0);
    }

    #[test]
    fn path_like_names_never_touch_the_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        let store = PackageStore::new(Config::for_root(&root));
        let spec = Spec::new("../../escaped", Version::new(1, 0, 0), SourceId::Installed);
        let archive = dir.path().join("escaped.tar.gz");
        write_tar_gz(&archive, &[("lib/escaped.txt", "x")]);

        assert!(matches!(
            install_archive(&store, &spec, &archive),
            Err(BndlError::ValidationError(_))
        ));
        assert!(!dir.path().join("escaped").exists());
        assert!(!root.exists());
    }
}
