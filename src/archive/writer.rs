//! # Archive Writer
//!
//! Ricostruisce un container EPUB da una directory estratta.
//!
//! ## Regole:
//! - `mimetype` nella root, se presente, è sempre la prima entry ed è `Stored`
//! - tutti gli altri file sono compressi con deflate
//! - le directory non vengono scritte come entry: sono implicite nei path
//! - l'ordine di visita è per nome file, quindi l'output è deterministico

use super::MIMETYPE;
use crate::error::ShrinkError;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Serialize every regular file under `source_dir` into a new container at `output_path`.
///
/// Returns the number of entries written. On error the output file may be left
/// half-written; removing it is up to the caller.
pub fn create_archive(source_dir: &Path, output_path: &Path) -> Result<usize, ShrinkError> {
    let file = File::create(output_path)?;
    let mut writer = ZipWriter::new(file);
    let mut written = 0;

    let mimetype_path = source_dir.join(MIMETYPE);
    if mimetype_path.is_file() {
        let content = fs::read(&mimetype_path)?;
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        writer.start_file(MIMETYPE, options)?;
        writer.write_all(&content)?;
        written += 1;
    }

    for entry in WalkDir::new(source_dir).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() || entry.path() == mimetype_path {
            continue;
        }

        let name = entry_name(source_dir, entry.path())?;
        let options = deflated_options(&entry)?;

        writer.start_file(name.as_str(), options)?;
        let mut member = File::open(entry.path())?;
        io::copy(&mut member, &mut writer)?;
        debug!("Added {}", name);
        written += 1;
    }

    writer.finish()?;
    Ok(written)
}

/// Container-relative, `/`-separated name of `path` below `root`
fn entry_name(root: &Path, path: &Path) -> Result<String, ShrinkError> {
    let relative = path.strip_prefix(root).map_err(|_| {
        ShrinkError::Validation(format!("{} is not below {}", path.display(), root.display()))
    })?;

    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    Ok(parts.join("/"))
}

#[cfg(unix)]
fn deflated_options(entry: &walkdir::DirEntry) -> Result<SimpleFileOptions, ShrinkError> {
    use std::os::unix::fs::PermissionsExt;
    let mode = entry.metadata()?.permissions().mode();
    Ok(SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(mode & 0o777))
}

#[cfg(not(unix))]
fn deflated_options(_entry: &walkdir::DirEntry) -> Result<SimpleFileOptions, ShrinkError> {
    Ok(SimpleFileOptions::default().compression_method(CompressionMethod::Deflated))
}
