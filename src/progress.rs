//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce il feedback visuale e le statistiche di un run.
//!
//! ## Componenti principali:
//! - `ProgressManager`: Spinner `indicatif` per le fasi lunghe (estrazione, ricompressione)
//! - `ProcessingStats`: Contatori delle immagini e dimensioni dell'archivio
//!
//! ## Statistiche tracciate:
//! - **total_images**: Immagini trovate nell'EPUB
//! - **processed_images**: Immagini ridotte con successo
//! - **failed_images**: Immagini fallite (il run continua)
//! - **original_size** / **new_size**: Dimensione dell'EPUB prima e dopo
//!
//! Un `ProcessingStats` nuovo viene creato per ogni file EPUB.

use crate::file_manager::FileManager;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner helpers for indeterminate phases
pub struct ProgressManager;

impl ProgressManager {
    /// Create a spinner for indeterminate progress
    pub fn spinner(message: &str) -> ProgressBar {
        let spinner = ProgressBar::new_spinner();

        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );

        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));

        spinner
    }
}

/// Statistics for one EPUB run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingStats {
    pub total_images: usize,
    pub processed_images: usize,
    pub failed_images: usize,
    pub original_size: u64,
    pub new_size: u64,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_processed(&mut self) {
        self.processed_images += 1;
    }

    pub fn add_failed(&mut self) {
        self.failed_images += 1;
    }

    pub fn reduction_percent(&self) -> f64 {
        FileManager::calculate_reduction(self.original_size, self.new_size)
    }

    /// Summary block printed after each EPUB
    pub fn format_summary(&self) -> String {
        let mut lines = vec![format!(
            "Images processed: {}/{}",
            self.processed_images, self.total_images
        )];
        if self.failed_images > 0 {
            lines.push(format!("Failed: {}", self.failed_images));
        }
        lines.push(format!(
            "Original EPUB size: {}",
            FileManager::format_megabytes(self.original_size)
        ));
        lines.push(format!(
            "New EPUB size: {}",
            FileManager::format_megabytes(self.new_size)
        ));
        lines.push(format!("Size reduction: {:.1}%", self.reduction_percent()));
        lines.join("\n")
    }
}
