//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con i parametri di resize
//! - Fornisce validazione dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce valori di default sensati per tutti i parametri
//!
//! ## Parametri di configurazione:
//! - `resize_percent`: Scala delle dimensioni (1-100, default: 50)
//! - `quality`: Qualità dell'encoder (1-100, default: 85)
//! - `backup_dir`: Nome riservato per i backup (default: `originals_<timestamp>`)
//! - `magick_path`: Path esplicito del binario ImageMagick (default: None = cerca nel PATH)
//! - `scratch_root`: Directory che ospita le directory temporanee (default: None = temp di sistema)
//!
//! ## Esempio:
//! ```ignore
//! let config = Config {
//!     resize_percent: 40,
//!     quality: 80,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Configuration for EPUB image shrinking
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Target dimension scale (1-100)
    pub resize_percent: u8,
    /// Encoder quality (1-100)
    pub quality: u8,
    /// Reserved backup directory name, namespaced by start time
    pub backup_dir: String,
    /// Explicit path to the ImageMagick binary
    pub magick_path: Option<PathBuf>,
    /// Parent directory for scratch trees (None = system temp directory)
    pub scratch_root: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resize_percent: 50,
            quality: 85,
            backup_dir: default_backup_dir(),
            magick_path: None,
            scratch_root: None,
        }
    }
}

fn default_backup_dir() -> String {
    format!("originals_{}", chrono::Local::now().format("%Y%m%d_%H%M%S"))
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.resize_percent == 0 || self.resize_percent > 100 {
            return Err(anyhow::anyhow!("Resize percentage must be between 1 and 100"));
        }

        if self.quality == 0 || self.quality > 100 {
            return Err(anyhow::anyhow!("Quality must be between 1 and 100"));
        }

        if self.backup_dir.trim().is_empty() {
            return Err(anyhow::anyhow!("Backup directory name must not be empty"));
        }

        if let Some(ref scratch_root) = self.scratch_root {
            if !scratch_root.is_dir() {
                return Err(anyhow::anyhow!("Scratch directory does not exist: {}", scratch_root.display()));
            }
        }

        Ok(())
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!("Config file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}
