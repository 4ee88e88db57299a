use std::path::Path;

use crate::core::error::{InstallerError, InstallerResult};

/// Unpack every entry of `zip_path` below `dest`, keeping the archive's
/// directory structure. Entries that would escape `dest` are rejected.
pub fn extract_zip_file(zip_path: &Path, dest: &Path) -> InstallerResult<usize> {
    let zip_file = std::fs::File::open(zip_path).map_err(|source| InstallerError::Io {
        path: zip_path.to_path_buf(),
        source,
    })?;
    let mut archive = zip::ZipArchive::new(zip_file)?;

    std::fs::create_dir_all(dest).map_err(|source| InstallerError::Io {
        path: dest.to_path_buf(),
        source,
    })?;

    let mut written = 0;
    for index in 0..archive.len() {
        let mut zipped = archive.by_index(index)?;
        let rel_path = zipped.enclosed_name().ok_or_else(|| {
            InstallerError::Extraction(format!("unsafe entry path {:?}", zipped.name()))
        })?;

        if rel_path.as_os_str().is_empty() {
            continue;
        }

        let out_path = dest.join(rel_path);
        if zipped.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(|source| InstallerError::Io {
                path: out_path,
                source,
            })?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| InstallerError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let mut out = std::fs::File::create(&out_path).map_err(|source| InstallerError::Io {
            path: out_path.clone(),
            source,
        })?;
        std::io::copy(&mut zipped, &mut out).map_err(|source| InstallerError::Io {
            path: out_path.clone(),
            source,
        })?;

        #[cfg(unix)]
        if let Some(mode) = zipped.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&out_path, std::fs::Permissions::from_mode(mode & 0o777))
                .map_err(|source| InstallerError::Io {
                    path: out_path.clone(),
                    source,
                })?;
        }

        written += 1;
    }

    Ok(written)
}
