//! # EPUB Processor
//!
//! Orchestratore principale: per ogni EPUB esegue in sequenza
//! estrazione → riduzione immagini → ricompressione → report.
//!
//! ## Stati per file:
//! `Init → Extracted → ImagesProcessed → Repackaged → Reported`, oppure `Failed`
//! da qualunque fase
//!
//! Un errore in qualunque fase interrompe il file corrente. La directory
//! temporanea è un `TempDir` posseduto dal run: viene rimossa sia in caso di
//! successo che di errore.
//!
//! ## Errori:
//! - Errori per singola immagine: contati in `ProcessingStats`, il run continua
//! - Errori di estrazione/scrittura: il file fallisce, il batch continua
//! - Tool mancante: verificato una sola volta in `EpubProcessor::new`, fatale

use crate::{
    archive::{create_archive, extract_archive, list_entries, MIMETYPE},
    config::Config,
    file_manager::FileManager,
    optimizer::path_resolver::PathResolver,
    progress::{ProcessingStats, ProgressManager},
    transcoder::{shrink_image, ImageTool, MagickTool},
    error::ShrinkError,
};
use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Where a single EPUB run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    Init,
    Extracted,
    ImagesProcessed,
    Repackaged,
    Reported,
    Failed,
}

impl fmt::Display for RunStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunStage::Init => "init",
            RunStage::Extracted => "extracted",
            RunStage::ImagesProcessed => "images processed",
            RunStage::Repackaged => "repackaged",
            RunStage::Reported => "reported",
            RunStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Result of one successful EPUB run
#[derive(Debug, Clone)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub entries: usize,
    pub stats: ProcessingStats,
}

/// Result of a glob-driven batch
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<FileReport>,
    /// Inputs whose run failed, with the rendered error chain
    pub failed: Vec<(PathBuf, String)>,
}

/// Main EPUB orchestrator
pub struct EpubProcessor<T: ImageTool = MagickTool> {
    config: Config,
    tool: T,
}

impl EpubProcessor<MagickTool> {
    /// Processor backed by the ImageMagick binary resolved from `config`
    pub async fn with_magick(config: Config) -> Result<Self> {
        let tool = MagickTool::from_config(&config);
        Self::new(config, tool).await
    }
}

impl<T: ImageTool> EpubProcessor<T> {
    /// Validate the configuration and run the tool pre-flight check.
    ///
    /// This is the only place the external tool's availability is checked; a
    /// failure here happens before any archive is touched.
    pub async fn new(config: Config, tool: T) -> Result<Self> {
        config.validate()?;
        tool.verify().await?;

        info!(
            "Resize: {}% | Quality: {} | Backup namespace: {}",
            config.resize_percent, config.quality, config.backup_dir
        );

        Ok(Self { config, tool })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tool(&self) -> &T {
        &self.tool
    }

    /// Shrink the images of one EPUB and write `<stem>_compressed<ext>` next to it
    pub async fn process_file(&self, epub_path: &Path) -> Result<FileReport> {
        println!("Processing EPUB: {}", epub_path.display());
        println!("{}", "-".repeat(50));

        self.run_file(epub_path).await.1
    }

    /// Drive one file through its stages and return where it ended
    async fn run_file(&self, epub_path: &Path) -> (RunStage, Result<FileReport>) {
        let mut stage = RunStage::Init;
        let result = self.run_stages(epub_path, &mut stage).await;
        if let Err(ref e) = result {
            debug!("{} failed after stage '{}': {:#}", epub_path.display(), stage, e);
            stage = RunStage::Failed;
        }
        (stage, result)
    }

    async fn run_stages(&self, epub_path: &Path, stage: &mut RunStage) -> Result<FileReport> {
        let spinner = ProgressManager::spinner("Extracting EPUB...");
        let archive = epub_path.to_path_buf();
        let scratch_root = self.config.scratch_root.clone();
        let extracted =
            tokio::task::spawn_blocking(move || extract_archive(&archive, scratch_root.as_deref()))
                .await;
        spinner.finish_and_clear();
        let scratch = extracted?.context("extraction failed")?;
        *stage = RunStage::Extracted;
        debug!("Scratch directory: {}", scratch.path().display());

        println!("Processing images...");
        let mut stats = self
            .process_images(scratch.path())
            .await
            .context("image processing failed")?;
        *stage = RunStage::ImagesProcessed;

        let output_path = PathResolver::compressed_output_path(epub_path)?;

        let spinner = ProgressManager::spinner("Creating compressed EPUB...");
        let source = scratch.path().to_path_buf();
        let output = output_path.clone();
        let written = tokio::task::spawn_blocking(move || create_archive(&source, &output)).await;
        spinner.finish_and_clear();
        let entries = match written {
            Ok(Ok(entries)) => entries,
            Ok(Err(e)) => {
                discard_partial_output(&output_path).await;
                return Err(anyhow::Error::new(e).context("EPUB creation failed"));
            }
            Err(e) => {
                discard_partial_output(&output_path).await;
                return Err(anyhow::Error::new(e).context("EPUB creation failed"));
            }
        };
        *stage = RunStage::Repackaged;
        println!("Created compressed EPUB with {} entries", entries);
        self.check_output(&output_path, entries)?;

        if let Err(e) = scratch.close() {
            warn!("Failed to remove scratch directory: {}", e);
        }

        stats.original_size = FileManager::get_file_size(epub_path).await?;
        stats.new_size = FileManager::get_file_size(&output_path).await?;

        println!("{}", "-".repeat(50));
        println!("PROCESSING COMPLETE!");
        println!("{}", stats.format_summary());
        println!("Output: {}", output_path.display());
        *stage = RunStage::Reported;

        Ok(FileReport {
            input: epub_path.to_path_buf(),
            output: output_path,
            entries,
            stats,
        })
    }

    /// Locate and shrink every image under `root`, one at a time.
    ///
    /// Individual image failures are counted, never returned.
    pub async fn process_images(&self, root: &Path) -> Result<ProcessingStats, ShrinkError> {
        let images = FileManager::find_image_files(root)?;

        let mut stats = ProcessingStats::new();
        stats.total_images = images.len();

        if images.is_empty() {
            println!("No images found to process");
            return Ok(stats);
        }

        println!("\nFound {} image(s) to process\n", images.len());

        for (i, image_path) in images.iter().enumerate() {
            let relative = image_path.strip_prefix(root).unwrap_or(image_path);
            println!("[{}/{}] Processing: {}", i + 1, images.len(), relative.display());

            match shrink_image(&self.tool, image_path, &self.config).await {
                Ok(outcome) => {
                    debug!("{}: {} -> {}", relative.display(), outcome.before, outcome.after);
                    println!("  ✓ Success");
                    stats.add_processed();
                }
                Err(e) => {
                    println!("  ✗ Failed: {}", e);
                    stats.add_failed();
                }
            }
            println!();
        }

        Ok(stats)
    }

    /// Process every file matching `pattern`, continuing past failed files.
    ///
    /// Returns an error only when the pattern is invalid or matches nothing.
    pub async fn process_pattern(&self, pattern: &str) -> Result<BatchReport> {
        let files = PathResolver::expand_pattern(pattern)?;
        if files.is_empty() {
            return Err(ShrinkError::NoMatches(pattern.to_string()).into());
        }

        println!("Found {} EPUB file(s) to process\n", files.len());

        let mut report = BatchReport::default();
        for (i, file) in files.iter().enumerate() {
            println!("\n[{}/{}] ", i + 1, files.len());

            match self.process_file(file).await {
                Ok(file_report) => report.succeeded.push(file_report),
                Err(e) => {
                    eprintln!("Error processing {}: {:#}", file.display(), e);
                    report.failed.push((file.clone(), format!("{:#}", e)));
                }
            }

            if i < files.len() - 1 {
                println!("\n{}", "=".repeat(50));
            }
        }

        info!(
            "Batch complete: {} succeeded, {} failed",
            report.succeeded.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Re-open the written container and check the reserved entry leads it
    fn check_output(&self, output_path: &Path, expected: usize) -> Result<()> {
        let listed = list_entries(output_path).context("written EPUB cannot be read back")?;
        if listed.len() != expected {
            warn!("Expected {} entries in {}, found {}", expected, output_path.display(), listed.len());
        }
        if let Some(pos) = listed.iter().position(|e| e.path == MIMETYPE) {
            if pos != 0 {
                warn!("{} is entry #{} in {}", MIMETYPE, pos + 1, output_path.display());
            }
        }
        Ok(())
    }
}

async fn discard_partial_output(output_path: &Path) {
    if output_path.is_file() {
        if let Err(e) = tokio::fs::remove_file(output_path).await {
            warn!("Failed to remove partial output {}: {}", output_path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::test_support::{read_zip, write_zip};
    use crate::transcoder::fake::FakeTool;
    use std::fs;
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;
    use zip::CompressionMethod;

    struct Fixture {
        _dir: TempDir,
        books: PathBuf,
        scratch: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let books = dir.path().join("books");
            let scratch = dir.path().join("scratch");
            fs::create_dir(&books).unwrap();
            fs::create_dir(&scratch).unwrap();
            Self { _dir: dir, books, scratch }
        }

        fn config(&self) -> Config {
            Config {
                scratch_root: Some(self.scratch.clone()),
                ..Default::default()
            }
        }

        fn scratch_is_empty(&self) -> bool {
            fs::read_dir(&self.scratch).unwrap().next().is_none()
        }
    }

    fn sample_book(path: &Path) {
        write_zip(
            path,
            &[
                ("mimetype", b"application/epub+zip"),
                ("OEBPS/img/cover.jpg", &[0xAB; 2048]),
                ("OEBPS/content.opf", b"<package/>"),
            ],
        );
    }

    #[tokio::test]
    async fn test_single_book_scenario() {
        let fx = Fixture::new();
        let book = fx.books.join("book.epub");
        sample_book(&book);

        let processor = EpubProcessor::new(fx.config(), FakeTool::default()).await.unwrap();
        let report = processor.process_file(&book).await.unwrap();

        assert_eq!(report.output, fx.books.join("book_compressed.epub"));
        assert!(report.output.is_file());
        assert_eq!(report.entries, 3);
        assert_eq!(report.stats.total_images, 1);
        assert_eq!(report.stats.processed_images, 1);
        assert_eq!(report.stats.failed_images, 0);
        assert!(report.stats.original_size > 0);
        assert!(report.stats.new_size > 0);

        let members = read_zip(&report.output);
        assert_eq!(members[0].0, "mimetype");
        assert_eq!(members[0].2, CompressionMethod::Stored);
        let mut names: Vec<_> = members.iter().map(|m| m.0.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["OEBPS/content.opf", "OEBPS/img/cover.jpg", "mimetype"]);

        let cover = members.iter().find(|m| m.0 == "OEBPS/img/cover.jpg").unwrap();
        assert!(cover.1.len() < 2048);

        assert!(fx.scratch_is_empty());
    }

    #[tokio::test]
    async fn test_one_failing_image_does_not_abort() {
        let fx = Fixture::new();
        let book = fx.books.join("gallery.epub");
        write_zip(
            &book,
            &[
                ("mimetype", b"application/epub+zip"),
                ("img/a.png", &[1; 400]),
                ("img/b.png", &[2; 400]),
                ("img/c.png", &[3; 400]),
            ],
        );

        let processor = EpubProcessor::new(fx.config(), FakeTool::failing_on(&["b.png"]))
            .await
            .unwrap();
        let report = processor.process_file(&book).await.unwrap();

        assert_eq!(report.stats.total_images, 3);
        assert_eq!(report.stats.processed_images, 2);
        assert_eq!(report.stats.failed_images, 1);

        let members = read_zip(&report.output);
        let size_of = |name: &str| members.iter().find(|m| m.0 == name).unwrap().1.len();
        assert_eq!(size_of("img/a.png"), 200);
        assert_eq!(size_of("img/b.png"), 400);
        assert_eq!(size_of("img/c.png"), 200);
        let mut names: Vec<_> = members.iter().map(|m| m.0.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["img/a.png", "img/b.png", "img/c.png", "mimetype"]);
        assert!(fx.scratch_is_empty());
    }

    #[tokio::test]
    async fn test_member_named_like_temp_file_survives() {
        let fx = Fixture::new();
        let book = fx.books.join("lookalike.epub");
        write_zip(
            &book,
            &[
                ("mimetype", b"application/epub+zip"),
                ("img/a.jpg", &[4; 600]),
                ("img/a.tmp.jpg", &[5; 300]),
            ],
        );

        let processor = EpubProcessor::new(fx.config(), FakeTool::default()).await.unwrap();
        let report = processor.process_file(&book).await.unwrap();

        assert_eq!(report.entries, 3);
        assert_eq!(report.stats.processed_images, 2);
        assert_eq!(report.stats.failed_images, 0);

        let members = read_zip(&report.output);
        let mut names: Vec<_> = members.iter().map(|m| m.0.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["img/a.jpg", "img/a.tmp.jpg", "mimetype"]);
        let member = |name: &str| members.iter().find(|m| m.0 == name).unwrap().1.clone();
        assert_eq!(member("img/a.jpg"), vec![4; 300]);
        assert_eq!(member("img/a.tmp.jpg"), vec![5; 150]);
    }

    #[tokio::test]
    async fn test_book_without_images_is_repackaged() {
        let fx = Fixture::new();
        let book = fx.books.join("plain.epub");
        write_zip(&book, &[("mimetype", b"application/epub+zip"), ("text.xhtml", b"<html/>")]);

        let processor = EpubProcessor::new(fx.config(), FakeTool::default()).await.unwrap();
        let report = processor.process_file(&book).await.unwrap();

        assert_eq!(report.stats, ProcessingStats {
            original_size: report.stats.original_size,
            new_size: report.stats.new_size,
            ..Default::default()
        });
        assert_eq!(report.entries, 2);
        assert_eq!(processor.tool().transforms.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_malformed_book_fails_and_cleans_up() {
        let fx = Fixture::new();
        let book = fx.books.join("broken.epub");
        fs::write(&book, b"not a zip").unwrap();

        let processor = EpubProcessor::new(fx.config(), FakeTool::default()).await.unwrap();
        let (stage, result) = processor.run_file(&book).await;
        let err = result.unwrap_err();

        assert_eq!(stage, RunStage::Failed);
        assert!(format!("{:#}", err).contains("extraction failed"));
        assert!(fx.scratch_is_empty());
        assert!(!fx.books.join("broken_compressed.epub").exists());
    }

    #[tokio::test]
    async fn test_repackaging_failure_cleans_up_scratch() {
        let fx = Fixture::new();
        let book = fx.books.join("book.epub");
        sample_book(&book);
        // a directory where the output file should go
        fs::create_dir(fx.books.join("book_compressed.epub")).unwrap();

        let processor = EpubProcessor::new(fx.config(), FakeTool::default()).await.unwrap();
        let err = processor.process_file(&book).await.unwrap_err();

        assert!(format!("{:#}", err).contains("EPUB creation failed"));
        assert!(fx.scratch_is_empty());
        assert!(fx.books.join("book_compressed.epub").is_dir());
    }

    #[tokio::test]
    async fn test_missing_tool_fails_before_any_work() {
        let fx = Fixture::new();
        let tool = FakeTool {
            unavailable: true,
            ..Default::default()
        };

        let err = match EpubProcessor::new(fx.config(), tool).await {
            Ok(_) => panic!("pre-flight should fail"),
            Err(e) => e,
        };

        assert!(matches!(
            err.downcast_ref::<ShrinkError>(),
            Some(ShrinkError::MissingDependency(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let fx = Fixture::new();
        let config = Config {
            quality: 0,
            ..fx.config()
        };
        let tool = FakeTool::default();
        assert!(EpubProcessor::new(config, tool).await.is_err());
    }

    #[tokio::test]
    async fn test_pattern_without_matches() {
        let fx = Fixture::new();
        let processor = EpubProcessor::new(fx.config(), FakeTool::default()).await.unwrap();

        let pattern = format!("{}/*.epub", fx.books.display());
        let err = processor.process_pattern(&pattern).await.unwrap_err();

        assert!(matches!(
            err.downcast_ref::<ShrinkError>(),
            Some(ShrinkError::NoMatches(_))
        ));
        assert_eq!(processor.tool().probes.load(Ordering::SeqCst), 0);
        assert!(fx.scratch_is_empty());
    }

    #[tokio::test]
    async fn test_batch_continues_past_failed_file() {
        let fx = Fixture::new();
        sample_book(&fx.books.join("a.epub"));
        fs::write(fx.books.join("b.epub"), b"garbage").unwrap();
        sample_book(&fx.books.join("c.epub"));

        let processor = EpubProcessor::new(fx.config(), FakeTool::default()).await.unwrap();
        let pattern = format!("{}/*.epub", fx.books.display());
        let report = processor.process_pattern(&pattern).await.unwrap();

        assert_eq!(report.succeeded.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, fx.books.join("b.epub"));
        // stats start from zero for every file
        for file_report in &report.succeeded {
            assert_eq!(file_report.stats.total_images, 1);
            assert_eq!(file_report.stats.processed_images, 1);
        }
        assert!(fx.books.join("a_compressed.epub").is_file());
        assert!(fx.books.join("c_compressed.epub").is_file());
        assert_eq!(processor.tool().verifies.load(Ordering::SeqCst), 1);
        assert!(fx.scratch_is_empty());
    }

    #[tokio::test]
    async fn test_successful_run_ends_reported() {
        let fx = Fixture::new();
        let book = fx.books.join("book.epub");
        sample_book(&book);

        let processor = EpubProcessor::new(fx.config(), FakeTool::default()).await.unwrap();
        let (stage, result) = processor.run_file(&book).await;

        assert!(result.is_ok());
        assert_eq!(stage, RunStage::Reported);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(RunStage::ImagesProcessed.to_string(), "images processed");
        assert_eq!(RunStage::Init.to_string(), "init");
        assert_eq!(RunStage::Failed.to_string(), "failed");
    }
}
