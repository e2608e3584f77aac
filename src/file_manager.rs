//! # File Management Module
//!
//! Questo modulo gestisce le operazioni sui file e la discovery delle immagini
//! dentro un EPUB estratto.
//!
//! ## Responsabilità:
//! - Discovery ricorsiva delle immagini in una directory
//! - Classificazione per estensione (case-insensitive)
//! - Lettura dimensioni file
//! - Formattazione delle dimensioni e calcolo delle percentuali di riduzione
//!
//! ## Formati riconosciuti:
//! JPG, JPEG, PNG, GIF, BMP, TIFF, WebP
//!
//! ## Esempio:
//! ```ignore
//! let images = FileManager::find_image_files(scratch.path())?;
//! for image in images {
//!     // shrink image
//! }
//! ```

use crate::error::ShrinkError;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions treated as raster images, lowercase
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp"];

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// Size of a file in bytes
    pub async fn get_file_size(path: &Path) -> Result<u64, ShrinkError> {
        Ok(tokio::fs::metadata(path).await?.len())
    }

    /// Find all image files below `root`, in walk order.
    ///
    /// Unreadable entries abort the walk: a partially listed book would be
    /// repackaged with some images silently left untouched.
    pub fn find_image_files(root: &Path) -> Result<Vec<PathBuf>, ShrinkError> {
        let mut files = Vec::new();

        for entry in WalkDir::new(root) {
            let entry = entry?;
            if entry.file_type().is_file() && Self::is_image(entry.path()) {
                files.push(entry.into_path());
            }
        }

        Ok(files)
    }

    /// Check if a file is an image
    pub fn is_image(path: &Path) -> bool {
        if let Some(ext) = path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            IMAGE_EXTENSIONS.contains(&ext_lower.as_str())
        } else {
            false
        }
    }

    /// Size in megabytes with two decimals, e.g. `"1.50 MB"`
    pub fn format_megabytes(size: u64) -> String {
        format!("{:.2} MB", size as f64 / BYTES_PER_MB)
    }

    /// Calculate percentage reduction
    pub fn calculate_reduction(original_size: u64, new_size: u64) -> f64 {
        if original_size == 0 {
            0.0
        } else {
            (1.0 - new_size as f64 / original_size as f64) * 100.0
        }
    }
}
