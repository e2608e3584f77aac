//! # Archive Reader
//!
//! Estrae un container zip in una directory temporanea nuova.
//! La directory è un `TempDir`: viene rimossa quando il valore esce dallo scope,
//! anche se l'estrazione fallisce a metà.

use super::{ArchiveEntry, StorageMode};
use crate::error::ShrinkError;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

const SCRATCH_PREFIX: &str = "epub_temp_";

/// Extract every entry of `archive_path` into a fresh scratch directory.
///
/// The directory is created under `scratch_root`, or the system temp directory
/// when `None`. Parent directories are created before file contents are written
/// and unix permission bits stored in the container are applied.
///
/// # Errors
/// - `Zip` if the container is missing, malformed, or an entry cannot be read
/// - `UnsafeEntry` if a member name points outside the scratch directory
/// - `Io` on disk full, permission denied or path collisions
///
/// Any error aborts the whole extraction and removes the scratch directory.
pub fn extract_archive(archive_path: &Path, scratch_root: Option<&Path>) -> Result<TempDir, ShrinkError> {
    let file = File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    let mut builder = tempfile::Builder::new();
    builder.prefix(SCRATCH_PREFIX);
    let scratch = match scratch_root {
        Some(root) => builder.tempdir_in(root)?,
        None => builder.tempdir()?,
    };
    debug!("Extracting {} entries into {}", archive.len(), scratch.path().display());

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;

        let relative: PathBuf = match entry.enclosed_name() {
            Some(p) => p.to_path_buf(),
            None => return Err(ShrinkError::UnsafeEntry(entry.name().to_string())),
        };
        let output_path = scratch.path().join(&relative);

        if entry.is_dir() {
            fs::create_dir_all(&output_path)?;
            apply_dir_mode(&output_path, entry.unix_mode())?;
            continue;
        }

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut outfile = File::create(&output_path)?;
        io::copy(&mut entry, &mut outfile)?;
        apply_file_mode(&output_path, entry.unix_mode())?;
    }

    Ok(scratch)
}

/// List the members of a container in central-directory order
pub fn list_entries(archive_path: &Path) -> Result<Vec<ArchiveEntry>, ShrinkError> {
    let file = File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let entry = archive.by_index_raw(i)?;
        if entry.is_dir() {
            continue;
        }
        entries.push(ArchiveEntry {
            path: entry.name().to_string(),
            size: entry.size(),
            mode: StorageMode::from(entry.compression()),
        });
    }

    Ok(entries)
}

// Owner keeps rw on files and rwx on directories so the tree can still be
// rewritten, repackaged and removed.
#[cfg(unix)]
fn apply_file_mode(path: &Path, mode: Option<u32>) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    if let Some(mode) = mode {
        fs::set_permissions(path, fs::Permissions::from_mode((mode & 0o777) | 0o600))?;
    }
    Ok(())
}

#[cfg(unix)]
fn apply_dir_mode(path: &Path, mode: Option<u32>) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    if let Some(mode) = mode {
        fs::set_permissions(path, fs::Permissions::from_mode((mode & 0o777) | 0o700))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn apply_file_mode(_path: &Path, _mode: Option<u32>) -> io::Result<()> {
    Ok(())
}

#[cfg(not(unix))]
fn apply_dir_mode(_path: &Path, _mode: Option<u32>) -> io::Result<()> {
    Ok(())
}
