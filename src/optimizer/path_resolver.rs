//! # Path Resolution Module
//!
//! Centralizza il calcolo del path di output e l'espansione dei pattern glob.

use crate::error::ShrinkError;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Suffix inserted before the extension of every output file
pub const OUTPUT_SUFFIX: &str = "_compressed";

/// Utility per calcolare i path in modo centralizzato
pub struct PathResolver;

impl PathResolver {
    /// `dir/book.epub` → `dir/book_compressed.epub`
    pub fn compressed_output_path(input_path: &Path) -> Result<PathBuf> {
        let file_stem = input_path
            .file_stem()
            .ok_or_else(|| anyhow::anyhow!("Invalid file name: {}", input_path.display()))?
            .to_string_lossy();

        let filename = match input_path.extension() {
            Some(ext) => format!("{}{}.{}", file_stem, OUTPUT_SUFFIX, ext.to_string_lossy()),
            None => format!("{}{}", file_stem, OUTPUT_SUFFIX),
        };

        let output = input_path.with_file_name(filename);
        debug!("Resolved output path: {} -> {}", input_path.display(), output.display());
        Ok(output)
    }

    /// Whether the command-line input should be treated as a glob pattern
    pub fn is_pattern(input: &str) -> bool {
        input.contains('*') || input.contains('?')
    }

    /// Expand a glob pattern into the regular files it matches, in glob order
    pub fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>, ShrinkError> {
        let mut files = Vec::new();

        for entry in glob::glob(pattern)? {
            match entry {
                Ok(path) if path.is_file() => files.push(path),
                Ok(path) => debug!("Skipping non-file match: {}", path.display()),
                Err(e) => warn!("Skipping unreadable match: {}", e),
            }
        }

        Ok(files)
    }
}
