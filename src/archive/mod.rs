//! # Archive Module
//!
//! Lettura e scrittura dei container EPUB (zip):
//! - `reader`: estrae tutte le entry in una directory temporanea
//! - `writer`: ricostruisce il container, con `mimetype` prima e non compresso

pub mod reader;
pub mod writer;

pub use reader::{extract_archive, list_entries};
pub use writer::create_archive;

/// Name of the entry that must open every EPUB container, stored uncompressed
pub const MIMETYPE: &str = "mimetype";

/// How an entry's payload is stored in the container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Stored,
    Compressed,
}

impl From<zip::CompressionMethod> for StorageMode {
    fn from(method: zip::CompressionMethod) -> Self {
        match method {
            zip::CompressionMethod::Stored => StorageMode::Stored,
            _ => StorageMode::Compressed,
        }
    }
}

/// One member of a container, as listed from its central directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Container-relative path, `/`-separated
    pub path: String,
    /// Uncompressed payload size in bytes
    pub size: u64,
    pub mode: StorageMode,
}
