//! # Report Module
//!
//! Rendering del riepilogo finale del run: tempo trascorso, conteggi
//! per categoria, skipped, errori (con dettaglio per file), byte totali e
//! percentuale risparmiata. Lo stesso testo viene persistito come
//! `optimization_report_<timestamp>.txt` nell'albero di output.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::info;

use crate::stats::{format_size, RunStatistics};

/// Renders and persists the final run summary
pub struct Reporter;

impl Reporter {
    /// The full textual report
    pub fn render(stats: &RunStatistics) -> String {
        let mut lines = vec!["=== Optimization Report ===".to_string()];

        if stats.interrupted {
            lines.push("(run interrupted - partial results below)".to_string());
        }

        lines.push(format!("Elapsed: {:.2}s", stats.elapsed.as_secs_f64()));
        lines.push(format!("Files scanned: {}", stats.scanned));
        lines.push(format!(
            "  Images optimized: {} of {}",
            stats.images_optimized, stats.images_total
        ));
        lines.push(format!(
            "  Videos optimized: {} of {}",
            stats.videos_optimized, stats.videos_total
        ));
        lines.push(format!("  Skipped: {}", stats.skipped));
        lines.push(format!("  Errors: {}", stats.errors));
        lines.push(format!(
            "Original size: {}",
            format_size(stats.original_bytes)
        ));
        lines.push(format!(
            "Optimized size: {}",
            format_size(stats.optimized_bytes)
        ));
        lines.push(format!(
            "Space saved: {} ({:.1}%)",
            format_size(stats.bytes_saved()),
            stats.reduction_percent()
        ));

        if !stats.failures.is_empty() {
            lines.push("Failed files:".to_string());
            for (path, detail) in &stats.failures {
                lines.push(format!("  {path}: {detail}"));
            }
        }

        lines.join("\n") + "\n"
    }

    /// Log the report line by line through tracing
    pub fn print(stats: &RunStatistics) {
        for line in Self::render(stats).lines() {
            info!("{line}");
        }
    }

    /// Persist the report into the output tree; returns the report path
    pub async fn save(stats: &RunStatistics, output_dir: &Path) -> Result<PathBuf> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        let path = output_dir.join(format!("optimization_report_{timestamp}.txt"));

        tokio::fs::create_dir_all(output_dir).await?;
        tokio::fs::write(&path, Self::render(stats)).await?;

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::MediaFile;
    use crate::stats::TaskResult;
    use std::time::Duration;
    use tempfile::TempDir;

    fn sample_stats() -> RunStatistics {
        let media = MediaFile::classify(Path::new("/in/a.jpg"), Path::new("/in")).unwrap();
        let broken = MediaFile::classify(Path::new("/in/bad.jpg"), Path::new("/in")).unwrap();

        let mut stats = RunStatistics::new();
        stats.record(&TaskResult::optimized(media, 1_000_000, 400_000));
        stats.record(&TaskResult::error(broken, 500, "corrupt header"));
        stats.finalize(Duration::from_secs(3));
        stats
    }

    #[test]
    fn test_render_contains_all_sections() {
        let report = Reporter::render(&sample_stats());

        assert!(report.contains("Images optimized: 1 of 2"));
        assert!(report.contains("Videos optimized: 0 of 0"));
        assert!(report.contains("Errors: 1"));
        assert!(report.contains("bad.jpg: corrupt header"));
        assert!(report.contains("60.0%"));
        assert!(!report.contains("interrupted"));
    }

    #[test]
    fn test_render_marks_interrupted_runs() {
        let mut stats = sample_stats();
        stats.interrupted = true;
        assert!(Reporter::render(&stats).contains("partial results"));
    }

    #[tokio::test]
    async fn test_save_writes_report_into_output_tree() {
        let out = TempDir::new().unwrap();
        let path = Reporter::save(&sample_stats(), out.path()).await.unwrap();

        assert!(path.starts_with(out.path()));
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("=== Optimization Report ==="));
    }
}
