//! # EPUB Shrinker Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Architettura dei moduli:
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tipi di errore custom
//! - `archive`: Estrazione e ricostruzione del container zip
//! - `file_manager`: Discovery delle immagini e utilità sulle dimensioni
//! - `transcoder`: Probe e resize delle immagini via ImageMagick
//! - `tool_resolver`: Ricerca del binario ImageMagick
//! - `optimizer`: Orchestratore principale del processo
//! - `progress`: Spinner e statistiche
//!
//! ## Utilizzo:
//! ```ignore
//! use epub_shrinker::{Config, EpubProcessor};
//!
//! let processor = EpubProcessor::with_magick(Config::default()).await?;
//! processor.process_file(Path::new("book.epub")).await?;
//! ```

pub mod archive;
pub mod config;
pub mod error;
pub mod file_manager;
pub mod optimizer;
pub mod progress;
pub mod tool_resolver;
pub mod transcoder;
pub mod utils;

pub use config::Config;
pub use error::ShrinkError;
pub use optimizer::{BatchReport, EpubProcessor, FileReport};
pub use progress::ProcessingStats;
pub use transcoder::{ImageProbe, ImageTool, MagickTool};
