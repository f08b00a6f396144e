//! # Progress Tracking Module
//!
//! Wrapper attorno a `indicatif` per il feedback real-time del batch.
//! Una barra sola per tutto il run; ogni TaskResult incrementa di uno e
//! aggiorna il messaggio con l'esito del file appena completato.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::stats::{TaskResult, TaskStatus};

/// Manages progress reporting for a whole optimization run
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new(total_files: u64) -> Self {
        let bar = ProgressBar::new(total_files);

        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Advance by one completed task, showing its outcome
    pub fn record(&self, result: &TaskResult) {
        let name = result.media_file.file_name();
        let message = match result.status {
            TaskStatus::Optimized => {
                let saved = if result.original_bytes > 0 {
                    100.0
                        * (result.original_bytes.saturating_sub(result.optimized_bytes)) as f64
                        / result.original_bytes as f64
                } else {
                    0.0
                };
                format!("✅ {name}: {saved:.1}% saved")
            }
            TaskStatus::Skipped => format!("⏩ {name}: skipped"),
            TaskStatus::Error => format!("❌ {name}: error"),
        };

        self.bar.inc(1);
        self.bar.set_message(message);
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}
