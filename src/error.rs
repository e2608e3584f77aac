//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom dell'applicazione.
//!
//! ## Categorie di errori:
//! - `Io`: Errori di I/O (file non trovati, permessi, disco pieno)
//! - `Zip`: Container EPUB malformato o entry illeggibile
//! - `Walk`: Errori durante la visita ricorsiva di una directory
//! - `Pattern`: Pattern glob non valido
//! - `MissingDependency`: ImageMagick non installato o non eseguibile
//! - `Probe`: Output di `identify` non interpretabile
//! - `Transcode`: Resize fallito per una singola immagine
//! - `UnsafeEntry`: Entry dell'archivio che esce dalla directory di estrazione
//! - `NoMatches`: Nessun file corrisponde al pattern
//! - `Validation`: Errori di validazione input
//!
//! Gli errori `Probe` e `Transcode` riguardano una sola immagine: l'orchestratore
//! li conta e passa all'immagine successiva. Tutti gli altri interrompono
//! l'elaborazione del file EPUB corrente.

/// Custom error types for EPUB image shrinking
#[derive(thiserror::Error, Debug)]
pub enum ShrinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Dependency missing: {0}")]
    MissingDependency(String),

    #[error("Failed to get image info: {0}")]
    Probe(String),

    #[error("Failed to resize image: {0}")]
    Transcode(String),

    #[error("Archive entry escapes the extraction directory: {0}")]
    UnsafeEntry(String),

    #[error("No EPUB files found matching pattern: {0}")]
    NoMatches(String),

    #[error("Validation error: {0}")]
    Validation(String),
}
