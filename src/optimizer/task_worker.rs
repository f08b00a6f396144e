//! # Task Worker Module
//!
//! Pipeline per-file: backup → trasformazione → preservazione metadata →
//! emissione del TaskResult.
//!
//! ## Sequenza per ogni MediaFile:
//! 1. Se il backup è abilitato, copia verbatim nell'albero di backup; se la
//!    copia fallisce il file diventa Error e la trasformazione NON viene
//!    tentata (mai rischiare un originale non recuperabile)
//! 2. Dispatch esplicito per `MediaKind`: Image → ricodifica in-memory,
//!    Video → ffmpeg, MetadataSidecar → copia verbatim in output,
//!    Unsupported → Skipped
//! 3. Sull'output immagine ricodificato, re-iniezione best-effort dei tag
//!    embedded (il video lo fa internamente)
//!
//! `process()` è infallibile: ogni errore per-file viene convertito in un
//! TaskResult con status Error prima di lasciare il task. Il batch non si
//! ferma mai per un singolo file.

use tracing::debug;

use crate::backup::BackupManager;
use crate::config::RunConfig;
use crate::error::OptimizeError;
use crate::image_processor::ImageProcessor;
use crate::metadata::MetadataPreserver;
use crate::optimizer::path_resolver::PathResolver;
use crate::scanner::{MediaFile, MediaKind};
use crate::stats::TaskResult;
use crate::video_processor::VideoProcessor;

/// Processes exactly one MediaFile through the full pipeline
pub struct TaskWorker {
    config: RunConfig,
    image_processor: ImageProcessor,
    video_processor: VideoProcessor,
    metadata: MetadataPreserver,
    backup: Option<BackupManager>,
}

impl TaskWorker {
    pub fn new(config: RunConfig) -> Self {
        let backup = config
            .backup_enabled
            .then(|| BackupManager::new(&config.backup_dir));

        Self {
            image_processor: ImageProcessor::new(config.clone()),
            video_processor: VideoProcessor::new(config.clone()),
            metadata: MetadataPreserver::new(&config.output_dir),
            backup,
            config,
        }
    }

    /// Run the pipeline. Never fails: per-file errors become Error results.
    pub async fn process(&self, media: MediaFile) -> TaskResult {
        let original_bytes = match tokio::fs::metadata(&media.source_path).await {
            Ok(meta) => meta.len(),
            Err(e) => return TaskResult::error(media, 0, format!("unreadable file: {e}")),
        };

        match self.run_pipeline(&media, original_bytes).await {
            Ok(result) => result,
            Err(e) => TaskResult::error(media, original_bytes, e),
        }
    }

    async fn run_pipeline(
        &self,
        media: &MediaFile,
        original_bytes: u64,
    ) -> Result<TaskResult, OptimizeError> {
        if let Some(backup) = &self.backup {
            backup.backup(&media.source_path, &media.relative_path).await?;
        }

        match media.kind {
            MediaKind::Unsupported => {
                debug!("Unsupported kind, skipping: {}", media.source_path.display());
                Ok(TaskResult::skipped(media.clone(), original_bytes))
            }
            MediaKind::MetadataSidecar => self.copy_sidecar(media, original_bytes).await,
            MediaKind::Image => self.process_image(media, original_bytes).await,
            MediaKind::Video => self.process_video(media, original_bytes).await,
        }
    }

    async fn copy_sidecar(
        &self,
        media: &MediaFile,
        original_bytes: u64,
    ) -> Result<TaskResult, OptimizeError> {
        if !MetadataPreserver::is_sidecar_name(&media.file_name()) {
            debug!(
                "Loose JSON without a paired media name, copied as-is: {}",
                media.relative_path.display()
            );
        }

        self.metadata
            .copy_sidecar(&media.source_path, &media.relative_path)
            .await?;

        Ok(TaskResult::skipped(media.clone(), original_bytes))
    }

    async fn process_image(
        &self,
        media: &MediaFile,
        original_bytes: u64,
    ) -> Result<TaskResult, OptimizeError> {
        if self.config.skip_small && original_bytes < self.config.min_image_kb * 1024 {
            debug!("Skipping small image: {}", media.relative_path.display());
            return Ok(TaskResult::skipped(media.clone(), original_bytes));
        }

        let bytes = tokio::fs::read(&media.source_path).await?;

        // Decode/resize/encode is CPU-bound, keep it off the async threads
        let processor = self.image_processor.clone();
        let extension = media.extension.clone();
        let optimized = tokio::task::spawn_blocking(move || processor.optimize(&bytes, &extension))
            .await
            .map_err(|e| {
                OptimizeError::Io(std::io::Error::new(std::io::ErrorKind::Other, e))
            })??;

        let output_path = PathResolver::output_path(
            &self.config.output_dir,
            media,
            optimized.renamed_extension,
        );
        PathResolver::ensure_parent_dirs(&output_path).await?;
        tokio::fs::write(&output_path, &optimized.bytes).await?;

        // Orientation and camera tags do not survive re-encoding on their own
        MetadataPreserver::embed_tags(&media.source_path, &output_path).await;

        Ok(TaskResult::optimized(
            media.clone(),
            original_bytes,
            optimized.bytes.len() as u64,
        ))
    }

    async fn process_video(
        &self,
        media: &MediaFile,
        original_bytes: u64,
    ) -> Result<TaskResult, OptimizeError> {
        if self.config.skip_small && original_bytes < self.config.min_video_mb * 1024 * 1024 {
            debug!("Skipping small video: {}", media.relative_path.display());
            return Ok(TaskResult::skipped(media.clone(), original_bytes));
        }

        let output_path = PathResolver::output_path(&self.config.output_dir, media, None);
        let optimized_bytes = self
            .video_processor
            .optimize(&media.source_path, &output_path)
            .await?;

        Ok(TaskResult::optimized(
            media.clone(),
            original_bytes,
            optimized_bytes,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::TaskStatus;
    use image::RgbImage;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn setup(backup_enabled: bool) -> (TempDir, RunConfig) {
        let root = TempDir::new().unwrap();
        let input = root.path().join("input");
        fs::create_dir_all(&input).unwrap();

        let mut config = RunConfig::for_input(&input);
        config.backup_enabled = backup_enabled;
        config.skip_small = false;
        (root, config)
    }

    fn write_jpeg(path: &Path, width: u32, height: u32) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        RgbImage::from_pixel(width, height, image::Rgb([90, 60, 30]))
            .save(path)
            .unwrap();
    }

    fn media_for(config: &RunConfig, rel: &str) -> MediaFile {
        MediaFile::classify(&config.input_dir.join(rel), &config.input_dir).unwrap()
    }

    #[tokio::test]
    async fn test_image_pipeline_backs_up_then_optimizes() {
        let (_root, config) = setup(true);
        write_jpeg(&config.input_dir.join("album/a.jpg"), 64, 64);

        let worker = TaskWorker::new(config.clone());
        let result = worker.process(media_for(&config, "album/a.jpg")).await;

        assert_eq!(result.status, TaskStatus::Optimized);
        assert!(config.output_dir.join("album/a.jpg").exists());

        // Backup is byte-identical to the source
        let original = fs::read(config.input_dir.join("album/a.jpg")).unwrap();
        let backed_up = fs::read(config.backup_dir.join("album/a.jpg")).unwrap();
        assert_eq!(original, backed_up);
    }

    #[tokio::test]
    async fn test_corrupt_image_yields_error_without_partial_output() {
        let (_root, config) = setup(false);
        let source = config.input_dir.join("bad.jpg");
        fs::write(&source, b"not a jpeg at all").unwrap();

        let worker = TaskWorker::new(config.clone());
        let result = worker.process(media_for(&config, "bad.jpg")).await;

        assert_eq!(result.status, TaskStatus::Error);
        assert!(result.error_detail.is_some());
        assert!(!config.output_dir.join("bad.jpg").exists());
    }

    #[tokio::test]
    async fn test_unwritable_backup_stops_before_transform() {
        let (_root, mut config) = setup(true);
        write_jpeg(&config.input_dir.join("a.jpg"), 32, 32);

        // Point the backup tree at a path that cannot be a directory
        let blocker = config.input_dir.join("blocker");
        fs::write(&blocker, b"file, not dir").unwrap();
        config.backup_dir = blocker.join("backups");

        let worker = TaskWorker::new(config.clone());
        let result = worker.process(media_for(&config, "a.jpg")).await;

        assert_eq!(result.status, TaskStatus::Error);
        // No optimization was attempted
        assert!(!config.output_dir.join("a.jpg").exists());
    }

    #[tokio::test]
    async fn test_sidecar_copied_unchanged() {
        let (_root, config) = setup(false);
        let sidecar = config.input_dir.join("a.jpg.json");
        fs::write(&sidecar, br#"{"title":"a"}"#).unwrap();

        let worker = TaskWorker::new(config.clone());
        let result = worker.process(media_for(&config, "a.jpg.json")).await;

        assert_eq!(result.status, TaskStatus::Skipped);
        let copied = fs::read(config.output_dir.join("a.jpg.json")).unwrap();
        assert_eq!(copied, br#"{"title":"a"}"#);
    }

    #[tokio::test]
    async fn test_unsupported_kind_is_skipped_without_output() {
        let (_root, config) = setup(false);
        fs::write(config.input_dir.join("notes.txt"), b"hello").unwrap();

        let worker = TaskWorker::new(config.clone());
        let result = worker.process(media_for(&config, "notes.txt")).await;

        assert_eq!(result.status, TaskStatus::Skipped);
        assert!(!config.output_dir.join("notes.txt").exists());
    }

    #[tokio::test]
    async fn test_small_image_threshold_skips() {
        let (_root, mut config) = setup(false);
        config.skip_small = true;
        config.min_image_kb = 100;
        write_jpeg(&config.input_dir.join("tiny.jpg"), 8, 8);

        let worker = TaskWorker::new(config.clone());
        let result = worker.process(media_for(&config, "tiny.jpg")).await;

        assert_eq!(result.status, TaskStatus::Skipped);
        assert!(!config.output_dir.join("tiny.jpg").exists());
    }

    #[tokio::test]
    async fn test_png_conversion_renames_output() {
        let (_root, mut config) = setup(false);
        config.convert_png_to_jpeg = true;
        let png = config.input_dir.join("b.png");
        fs::create_dir_all(png.parent().unwrap()).unwrap();
        RgbImage::from_pixel(16, 16, image::Rgb([1, 2, 3]))
            .save(&png)
            .unwrap();

        let worker = TaskWorker::new(config.clone());
        let result = worker.process(media_for(&config, "b.png")).await;

        assert_eq!(result.status, TaskStatus::Optimized);
        assert!(config.output_dir.join("b.jpg").exists());
        assert!(!config.output_dir.join("b.png").exists());
    }

    #[tokio::test]
    async fn test_downscale_only_applies_to_large_images() {
        let (_root, mut config) = setup(false);
        config.max_resolution = Some(100);
        write_jpeg(&config.input_dir.join("big.jpg"), 300, 200);

        let worker = TaskWorker::new(config.clone());
        let result = worker.process(media_for(&config, "big.jpg")).await;
        assert_eq!(result.status, TaskStatus::Optimized);

        let written = image::open(config.output_dir.join("big.jpg")).unwrap();
        assert!(written.width().max(written.height()) <= 100);
    }
}
