//! # Image Transcoder Module
//!
//! Questo modulo riduce le immagini di un EPUB estratto delegando tutto il lavoro
//! a ImageMagick. Non c'è elaborazione in memoria: ogni immagine costa tre
//! processi esterni.
//!
//! ## Pipeline per immagine
//!
//! 1. **Probe**: `magick identify -format "%wx%h %B\n" <img>` → dimensioni e byte
//! 2. **Transform**: `magick <img> -resize N% -quality Q <tmp>`
//! 3. **Probe** del file temporaneo
//! 4. **Rename** del temporaneo sopra l'originale
//!
//! Il file temporaneo è un sibling `<stem>.<random>.<ext>` creato in modo
//! esclusivo con `tempfile`: non può sovrascrivere un altro membro dell'EPUB e
//! l'estensione resta quella originale così ImageMagick sceglie lo stesso encoder.
//!
//! ## Error Handling
//!
//! - **Pre-flight** (`verify`): eseguito una volta per processo, errore fatale
//! - **Errori per immagine**: il temporaneo viene rimosso e l'errore ritorna al
//!   chiamante, che lo conta senza interrompere il run
//!
//! ## Astrazione
//!
//! `ImageTool` isola tutto il parsing specifico di ImageMagick dietro tre
//! operazioni, così i test usano un tool finto e un'eventuale libreria in-process
//! può sostituire il processo esterno.

use crate::args;
use crate::config::Config;
use crate::error::ShrinkError;
use crate::tool_resolver::{install_instructions, ToolPathResolver};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tempfile::TempPath;
use tokio::process::Command;
use tracing::debug;

/// Dimensions and byte size reported by a probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageProbe {
    pub width: u32,
    pub height: u32,
    pub bytes: u64,
}

impl ImageProbe {
    /// Parse `"<width>x<height> <bytes>"`; tokens after the second are ignored
    /// (multi-frame images report one pair per frame).
    pub fn parse(output: &str) -> Result<Self, ShrinkError> {
        let mut tokens = output.split_whitespace();

        let dimensions = tokens
            .next()
            .ok_or_else(|| ShrinkError::Probe("empty identify output".to_string()))?;
        let (width, height) = dimensions
            .split_once('x')
            .and_then(|(w, h)| Some((w.parse::<u32>().ok()?, h.parse::<u32>().ok()?)))
            .ok_or_else(|| ShrinkError::Probe(format!("unexpected dimensions: {:?}", dimensions)))?;

        let size = tokens
            .next()
            .ok_or_else(|| ShrinkError::Probe(format!("missing byte size in {:?}", output.trim())))?;
        let bytes = size
            .trim_end_matches('B')
            .parse::<u64>()
            .map_err(|_| ShrinkError::Probe(format!("unexpected byte size: {:?}", size)))?;

        Ok(Self { width, height, bytes })
    }
}

impl fmt::Display for ImageProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} ({} bytes)", self.width, self.height, self.bytes)
    }
}

/// Before/after probes of a successfully shrunk image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageOutcome {
    pub before: ImageProbe,
    pub after: ImageProbe,
}

/// Capability interface over the external image tool
#[allow(async_fn_in_trait)]
pub trait ImageTool {
    /// Check once per process that the tool can be run at all
    async fn verify(&self) -> Result<(), ShrinkError>;

    /// Current dimensions and byte size of `path`
    async fn probe(&self, path: &Path) -> Result<ImageProbe, ShrinkError>;

    /// Write a resized and requantized copy of `source` to `dest`
    async fn transform(
        &self,
        source: &Path,
        dest: &Path,
        resize_percent: u8,
        quality: u8,
    ) -> Result<(), ShrinkError>;
}

/// ImageMagick 7 driven through the `magick` entry point
#[derive(Debug, Clone)]
pub struct MagickTool {
    program: PathBuf,
}

impl MagickTool {
    pub fn new(program: PathBuf) -> Self {
        Self { program }
    }

    /// Resolve the binary from the configuration, environment and `PATH`
    pub fn from_config(config: &Config) -> Self {
        Self::new(ToolPathResolver::new(config.magick_path.clone()).resolve())
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl ImageTool for MagickTool {
    async fn verify(&self) -> Result<(), ShrinkError> {
        let status = Command::new(&self.program)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) if status.success() => {
                debug!("{} is available", self.program.display());
                Ok(())
            }
            Ok(status) => {
                debug!("{} -version exited with {}", self.program.display(), status);
                Err(ShrinkError::MissingDependency(install_instructions(&self.program)))
            }
            Err(e) => {
                debug!("Failed to spawn {}: {}", self.program.display(), e);
                Err(ShrinkError::MissingDependency(install_instructions(&self.program)))
            }
        }
    }

    async fn probe(&self, path: &Path) -> Result<ImageProbe, ShrinkError> {
        let output = Command::new(&self.program)
            .args(probe_args(path))
            .output()
            .await
            .map_err(|e| ShrinkError::Probe(format!("{}: {}", self.program.display(), e)))?;

        if !output.status.success() {
            return Err(ShrinkError::Probe(format!(
                "identify exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        ImageProbe::parse(&String::from_utf8_lossy(&output.stdout))
    }

    async fn transform(
        &self,
        source: &Path,
        dest: &Path,
        resize_percent: u8,
        quality: u8,
    ) -> Result<(), ShrinkError> {
        let start_time = std::time::Instant::now();
        let output = Command::new(&self.program)
            .args(transform_args(source, dest, resize_percent, quality))
            .output()
            .await
            .map_err(|e| ShrinkError::Transcode(format!("{}: {}", self.program.display(), e)))?;
        let elapsed = start_time.elapsed();

        if output.status.success() {
            debug!("magick completed successfully in {:?}", elapsed);
            Ok(())
        } else {
            Err(ShrinkError::Transcode(format!(
                "magick exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }
}

/// `identify -format "%wx%h %B\n" <path>`
fn probe_args(path: &Path) -> Vec<OsString> {
    args!["identify", "-format", "%wx%h %B\n", path]
}

/// `<source> -resize N% -quality Q <dest>`
fn transform_args(source: &Path, dest: &Path, resize_percent: u8, quality: u8) -> Vec<OsString> {
    args![
        source,
        "-resize",
        format!("{}%", resize_percent),
        "-quality",
        quality.to_string(),
        dest,
    ]
}

/// Create a fresh, empty sibling of `image_path` with the same extension.
///
/// The file is created exclusively and removed when the returned path drops.
pub fn temp_sibling(image_path: &Path) -> Result<TempPath, ShrinkError> {
    let parent = match image_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let stem = image_path.file_stem().unwrap_or_default().to_string_lossy();
    let suffix = match image_path.extension() {
        Some(ext) => format!(".{}", ext.to_string_lossy()),
        None => String::new(),
    };

    let file = tempfile::Builder::new()
        .prefix(&format!("{}.", stem))
        .suffix(&suffix)
        .tempfile_in(parent)
        .map_err(|e| ShrinkError::Transcode(format!("failed to create temp file: {}", e)))?;
    Ok(file.into_temp_path())
}

/// Probe, resize into a sibling temp file, probe again, then replace the original.
///
/// Prints the before/after lines as it goes. On any failure the temp file is
/// removed, the original is left untouched, and a `Probe` or `Transcode` error
/// is returned for this image only.
pub async fn shrink_image<T: ImageTool>(
    tool: &T,
    image_path: &Path,
    config: &Config,
) -> Result<ImageOutcome, ShrinkError> {
    let before = tool.probe(image_path).await?;
    println!("  Original: {}", before);

    let temp_path = temp_sibling(image_path)?;
    debug!("Resizing {} into {}", image_path.display(), temp_path.display());
    let after = replace_with_resized(tool, image_path, temp_path, config).await?;

    Ok(ImageOutcome { before, after })
}

async fn replace_with_resized<T: ImageTool>(
    tool: &T,
    image_path: &Path,
    temp_path: TempPath,
    config: &Config,
) -> Result<ImageProbe, ShrinkError> {
    tool.transform(image_path, &temp_path, config.resize_percent, config.quality)
        .await?;

    let after = tool
        .probe(&temp_path)
        .await
        .map_err(|e| ShrinkError::Probe(format!("failed to get new image info: {}", e)))?;
    println!("  New: {}", after);

    temp_path
        .persist(image_path)
        .map_err(|e| ShrinkError::Transcode(format!("failed to replace original: {}", e.error)))?;

    Ok(after)
}
