//! # Main Optimizer Orchestrator Module
//!
//! Questo è il modulo che orchestra tutto il processo di ottimizzazione.
//!
//! ## Responsabilità:
//! - Verifica condizioni fatali prima di schedulare qualsiasi task
//!   (config valida, encoder esterno presente se servono video)
//! - Discovery e classificazione dei file tramite lo Scanner
//! - Worker pool limitato: semaforo a `workers` permessi, un task per file
//! - Timeout opzionale per task: un task bloccato diventa un Error result
//! - Aggregazione: i worker emettono TaskResult su un canale mpsc, un solo
//!   loop li riduce in `RunStatistics` (merge commutativo, nessun lock)
//! - Interruzione esterna (Ctrl-C): il loop smette di drenare e finalizza
//!   un report parziale con i risultati già completati
//!
//! ## Garanzie:
//! - Ogni MediaFile produce esattamente un TaskResult
//! - Il fallimento di un task non termina mai il pool né gli altri task
//! - Il run è completo solo quando ogni task schedulato ha emesso il suo
//!   risultato (il canale si chiude quando l'ultimo sender viene droppato)

use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tracing::{error, info, warn};

use crate::config::RunConfig;
use crate::error::OptimizeError;
use crate::optimizer::task_worker::TaskWorker;
use crate::progress::ProgressManager;
use crate::scanner::{MediaFile, MediaKind, Scanner};
use crate::stats::{RunStatistics, TaskResult};
use crate::video_processor::VideoProcessor;

/// Main optimization run orchestrator
pub struct MediaOptimizer {
    config: RunConfig,
}

impl MediaOptimizer {
    /// Create a new optimizer instance; fails on invalid configuration
    pub fn new(config: RunConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Run the whole batch and return the frozen statistics
    pub async fn run(&self) -> Result<RunStatistics> {
        let start = Instant::now();
        info!(
            "Starting media optimization in: {}",
            self.config.input_dir.display()
        );
        info!("📁 Output directory: {}", self.config.output_dir.display());
        if self.config.backup_enabled {
            info!("🗄️ Backup directory: {}", self.config.backup_dir.display());
        } else {
            info!("🗄️ Backup disabled");
        }
        if let Some(max) = self.config.max_resolution {
            info!("🎯 Downscaling media larger than {max}px (longest edge)");
        }
        info!(
            "🎬 Video mode: CRF {} / preset {}",
            self.config.crf, self.config.preset
        );

        // Scan up front; the nested default output/backup dirs are pruned so
        // a re-run does not re-ingest its own artifacts
        let scanner = Scanner::new(
            &self.config.input_dir,
            vec![
                self.config.output_dir.clone(),
                self.config.backup_dir.clone(),
            ],
        );
        let files: Vec<MediaFile> = scanner.scan().collect();
        info!("Found {} files to process", files.len());

        // Missing encoder binaries are fatal, but only when something would
        // actually need them
        if files.iter().any(|f| f.kind == MediaKind::Video) {
            VideoProcessor::check_dependencies().await?;
        }

        tokio::fs::create_dir_all(&self.config.output_dir).await?;

        if files.is_empty() {
            info!("No files found to process");
            let mut stats = RunStatistics::new();
            stats.finalize(start.elapsed());
            return Ok(stats);
        }

        let progress = ProgressManager::new(files.len() as u64);
        let stats = self.dispatch(files, &progress, start).await?;

        progress.finish(&stats.format_summary());
        Ok(stats)
    }

    /// Schedule one task per file on a bounded pool and reduce the results
    async fn dispatch(
        &self,
        files: Vec<MediaFile>,
        progress: &ProgressManager,
        start: Instant,
    ) -> Result<RunStatistics> {
        let semaphore = Arc::new(Semaphore::new(self.config.workers));
        let (tx, mut rx) = mpsc::unbounded_channel::<TaskResult>();
        let mut handles = Vec::with_capacity(files.len());

        for media in files {
            let permit = semaphore.clone().acquire_owned().await?;
            let worker = TaskWorker::new(self.config.clone());
            let timeout_secs = self.config.task_timeout_secs;
            let tx = tx.clone();

            handles.push(tokio::spawn(async move {
                let _permit = permit;

                let result = match timeout_secs {
                    Some(secs) => {
                        let fallback = media.clone();
                        match tokio::time::timeout(
                            Duration::from_secs(secs),
                            worker.process(media),
                        )
                        .await
                        {
                            Ok(result) => result,
                            Err(_) => {
                                TaskResult::error(fallback, 0, OptimizeError::Timeout(secs))
                            }
                        }
                    }
                    None => worker.process(media).await,
                };

                // The receiver only disappears on interrupt; losing the send
                // is fine then, the run is already being cut short
                let _ = tx.send(result);
            }));
        }
        drop(tx);

        // Single-owner reduction: this loop is the only mutator of the stats
        let mut stats = RunStatistics::new();
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Some(result) => {
                        if let Some(detail) = &result.error_detail {
                            error!(
                                "Failed to process {}: {detail}",
                                result.media_file.relative_path.display()
                            );
                        }
                        progress.record(&result);
                        stats.record(&result);
                    }
                    None => break,
                },
                _ = &mut ctrl_c => {
                    warn!("Interrupted, reporting partial results");
                    stats.interrupted = true;
                    break;
                }
            }
        }

        if stats.interrupted {
            for handle in &handles {
                handle.abort();
            }
        } else {
            // All senders are gone, but join the handles so panicked tasks
            // cannot go unnoticed
            for join in futures::future::join_all(handles).await {
                if let Err(e) = join {
                    if e.is_panic() {
                        error!("Worker task panicked: {e}");
                    }
                }
            }
        }

        stats.finalize(start.elapsed());
        Ok(stats)
    }
}
