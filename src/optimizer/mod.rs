//! # Optimizer Module
//!
//! Separa le responsabilità dell'orchestrazione in sottomoduli:
//! - `epub_processor`: Orchestratore principale (estrazione → immagini → ricompressione)
//! - `path_resolver`: Path di output ed espansione dei pattern glob

pub mod epub_processor;
pub mod path_resolver;

pub use epub_processor::{BatchReport, EpubProcessor, FileReport, RunStage};
pub use path_resolver::PathResolver;
