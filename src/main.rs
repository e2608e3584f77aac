//! # EPUB Shrinker - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Creazione della configurazione (file JSON opzionale + flag CLI)
//! - Pre-flight di ImageMagick e avvio del processore
//!
//! ## Esempio di utilizzo:
//! ```bash
//! epub-shrink book.epub --resize 40 --quality 80
//! epub-shrink 'books/*.epub'
//! ```
//!
//! ## Exit code:
//! Un singolo file che fallisce termina con errore. In modalità pattern i file
//! falliti vengono segnalati ma il processo termina con successo.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use epub_shrinker::optimizer::PathResolver;
use epub_shrinker::{Config, EpubProcessor};

#[derive(Parser)]
#[command(name = "epub-shrink")]
#[command(about = "Shrink the images inside EPUB files with ImageMagick")]
#[command(after_help = "Examples:\n  \
    epub-shrink book.epub           # Process single file\n  \
    epub-shrink '*.epub'            # Process all EPUB files\n  \
    epub-shrink 'books/*.epub'      # Process EPUB files in books directory")]
struct Args {
    /// EPUB file, or a quoted glob pattern such as '*.epub'
    input: String,

    /// Resize percentage applied to both dimensions (1-100)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
    resize: Option<u8>,

    /// Encoder quality (1-100)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: Option<u8>,

    /// Path to the ImageMagick `magick` binary
    #[arg(long)]
    magick: Option<PathBuf>,

    /// JSON configuration file; command-line flags take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory for temporary extraction trees (default: system temp dir)
    #[arg(long)]
    scratch_dir: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "warn" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match args.config {
        Some(ref path) => Config::from_file(path).await?,
        None => Config::default(),
    };
    if let Some(resize) = args.resize {
        config.resize_percent = resize;
    }
    if let Some(quality) = args.quality {
        config.quality = quality;
    }
    if args.magick.is_some() {
        config.magick_path = args.magick;
    }
    if args.scratch_dir.is_some() {
        config.scratch_root = args.scratch_dir;
    }

    let processor = EpubProcessor::with_magick(config).await?;

    if PathResolver::is_pattern(&args.input) {
        let report = processor.process_pattern(&args.input).await?;
        info!(
            "{} file(s) compressed, {} failed",
            report.succeeded.len(),
            report.failed.len()
        );
    } else {
        processor.process_file(&PathBuf::from(&args.input)).await?;
    }

    Ok(())
}
