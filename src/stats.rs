//! # Statistics Aggregator Module
//!
//! Questo modulo definisce il risultato per-file e le statistiche aggregate.
//!
//! ## Responsabilità:
//! - `TaskResult`: esito di un singolo file (Optimized / Skipped / Error)
//! - `RunStatistics`: riduzione commutativa e associativa dei TaskResult
//! - Lista degli errori per-file per il report finale
//! - Utilità di formattazione dimensioni human-readable
//!
//! L'aggregatore ha un singolo owner (il loop del dispatcher): i worker
//! emettono `TaskResult` su un canale e solo quel loop chiama `record()`.
//! Dato che `record()` somma contatori e byte, l'ordine di completamento dei
//! task non influenza mai i totali finali. Dopo `finalize()` la struct è di
//! sola lettura.

use std::time::Duration;

use crate::scanner::{MediaFile, MediaKind};

/// Outcome of a single task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Optimized,
    Skipped,
    Error,
}

/// Produced exactly once per scanned regular file
#[derive(Debug, Clone)]
pub struct TaskResult {
    pub media_file: MediaFile,
    pub status: TaskStatus,
    pub original_bytes: u64,
    pub optimized_bytes: u64,
    pub error_detail: Option<String>,
}

impl TaskResult {
    pub fn optimized(media_file: MediaFile, original_bytes: u64, optimized_bytes: u64) -> Self {
        Self {
            media_file,
            status: TaskStatus::Optimized,
            original_bytes,
            optimized_bytes,
            error_detail: None,
        }
    }

    /// A file that was accounted for but not transformed (unsupported kind,
    /// small-file threshold, sidecar copy)
    pub fn skipped(media_file: MediaFile, original_bytes: u64) -> Self {
        Self {
            media_file,
            status: TaskStatus::Skipped,
            original_bytes,
            optimized_bytes: original_bytes,
            error_detail: None,
        }
    }

    pub fn error(media_file: MediaFile, original_bytes: u64, detail: impl ToString) -> Self {
        Self {
            media_file,
            status: TaskStatus::Error,
            original_bytes,
            optimized_bytes: 0,
            error_detail: Some(detail.to_string()),
        }
    }
}

/// Aggregated statistics for a whole run
#[derive(Debug, Default, Clone)]
pub struct RunStatistics {
    pub scanned: usize,
    pub images_total: usize,
    pub images_optimized: usize,
    pub videos_total: usize,
    pub videos_optimized: usize,
    pub skipped: usize,
    pub errors: usize,
    pub original_bytes: u64,
    pub optimized_bytes: u64,
    pub elapsed: Duration,
    /// (relative path, error detail) for every Error result
    pub failures: Vec<(String, String)>,
    /// True when the run was cut short by an external interrupt
    pub interrupted: bool,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one task result. Commutative: only counters and sums.
    pub fn record(&mut self, result: &TaskResult) {
        self.scanned += 1;

        match result.media_file.kind {
            MediaKind::Image => self.images_total += 1,
            MediaKind::Video => self.videos_total += 1,
            _ => {}
        }

        match result.status {
            TaskStatus::Optimized => {
                match result.media_file.kind {
                    MediaKind::Image => self.images_optimized += 1,
                    MediaKind::Video => self.videos_optimized += 1,
                    _ => {}
                }
                self.original_bytes += result.original_bytes;
                self.optimized_bytes += result.optimized_bytes;
            }
            TaskStatus::Skipped => {
                self.skipped += 1;
            }
            TaskStatus::Error => {
                self.errors += 1;
                self.failures.push((
                    result.media_file.relative_path.display().to_string(),
                    result
                        .error_detail
                        .clone()
                        .unwrap_or_else(|| "unknown error".to_string()),
                ));
            }
        }
    }

    /// Freeze the statistics with the total elapsed time
    pub fn finalize(&mut self, elapsed: Duration) {
        self.elapsed = elapsed;
        self.failures.sort();
    }

    pub fn optimized(&self) -> usize {
        self.images_optimized + self.videos_optimized
    }

    pub fn bytes_saved(&self) -> u64 {
        self.original_bytes.saturating_sub(self.optimized_bytes)
    }

    pub fn reduction_percent(&self) -> f64 {
        if self.original_bytes > 0 {
            (self.bytes_saved() as f64 / self.original_bytes as f64) * 100.0
        } else {
            0.0
        }
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Scanned: {} | Optimized: {} | Skipped: {} | Errors: {} | Saved: {} ({:.2}%)",
            self.scanned,
            self.optimized(),
            self.skipped,
            self.errors,
            format_size(self.bytes_saved()),
            self.reduction_percent()
        )
    }
}

/// Get human-readable file size
pub fn format_size(size: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = size as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", size as u64, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn media(kind_ext: &str) -> MediaFile {
        let name = format!("file.{}", kind_ext);
        MediaFile::classify(
            &Path::new("/in").join(&name),
            Path::new("/in"),
        )
        .unwrap()
    }

    fn sample_results() -> Vec<TaskResult> {
        vec![
            TaskResult::optimized(media("jpg"), 5_000_000, 2_000_000),
            TaskResult::optimized(media("jpg"), 400_000, 350_000),
            TaskResult::optimized(media("mp4"), 50_000_000, 30_000_000),
            TaskResult::skipped(media("txt"), 1_000),
            TaskResult::error(media("jpg"), 9_000, "corrupt header"),
        ]
    }

    #[test]
    fn test_accounting_invariant() {
        let mut stats = RunStatistics::new();
        for result in sample_results() {
            stats.record(&result);
        }

        assert_eq!(stats.scanned, 5);
        assert_eq!(stats.scanned, stats.optimized() + stats.skipped + stats.errors);
        assert_eq!(stats.images_total, 3);
        assert_eq!(stats.images_optimized, 2);
        assert_eq!(stats.videos_total, 1);
        assert_eq!(stats.videos_optimized, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.errors, 1);
        assert_eq!(stats.original_bytes, 55_400_000);
        assert_eq!(stats.optimized_bytes, 32_350_000);
    }

    #[test]
    fn test_merge_is_order_independent() {
        let results = sample_results();

        let mut forward = RunStatistics::new();
        for result in &results {
            forward.record(result);
        }

        let mut backward = RunStatistics::new();
        for result in results.iter().rev() {
            backward.record(result);
        }
        backward.finalize(Duration::ZERO);
        forward.finalize(Duration::ZERO);

        assert_eq!(forward.scanned, backward.scanned);
        assert_eq!(forward.images_optimized, backward.images_optimized);
        assert_eq!(forward.videos_optimized, backward.videos_optimized);
        assert_eq!(forward.skipped, backward.skipped);
        assert_eq!(forward.errors, backward.errors);
        assert_eq!(forward.original_bytes, backward.original_bytes);
        assert_eq!(forward.optimized_bytes, backward.optimized_bytes);
        assert_eq!(forward.failures, backward.failures);
    }

    #[test]
    fn test_error_detail_reaches_failures() {
        let mut stats = RunStatistics::new();
        stats.record(&TaskResult::error(media("jpg"), 100, "corrupt header"));

        assert_eq!(stats.failures.len(), 1);
        assert_eq!(stats.failures[0].1, "corrupt header");
    }

    #[test]
    fn test_reduction_percent() {
        let mut stats = RunStatistics::new();
        assert_eq!(stats.reduction_percent(), 0.0);

        stats.record(&TaskResult::optimized(media("jpg"), 1000, 250));
        assert!((stats.reduction_percent() - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
    }
}
