//! # Takeout Media Optimizer Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per altri consumatori
//!
//! ## Architettura dei moduli:
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tipi di errore custom per le diverse operazioni
//! - `scanner`: Discovery ricorsiva e classificazione dei file
//! - `backup`: Copia verbatim degli originali nell'albero di backup
//! - `metadata`: Sidecar JSON e preservazione tag embedded
//! - `image_processor`: Ricodifica immagini in-memory (JPEG/PNG/WebP)
//! - `video_processor`: Transcodifica video via FFmpeg (MP4/MOV/AVI/MKV)
//! - `optimizer`: Dispatcher con worker pool e pipeline per-file
//! - `stats`: Risultati per-file e statistiche aggregate del run
//! - `progress`: Progress bar real-time
//! - `report`: Rendering e persistenza del report finale
//!
//! ## Utilizzo:
//! ```rust,no_run
//! use takeout_media_optimizer::{MediaOptimizer, Reporter, RunConfig};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = RunConfig::for_input(std::path::Path::new("/photos/export"));
//! let stats = MediaOptimizer::new(config)?.run().await?;
//! Reporter::print(&stats);
//! # Ok(())
//! # }
//! ```

pub mod backup;
pub mod config;
pub mod error;
pub mod image_processor;
pub mod metadata;
pub mod optimizer;
pub mod platform;
pub mod progress;
pub mod report;
pub mod scanner;
pub mod stats;
pub mod video_processor;

pub use config::{Preset, RunConfig};
pub use error::OptimizeError;
pub use optimizer::MediaOptimizer;
pub use report::Reporter;
pub use scanner::{MediaFile, MediaKind, Scanner};
pub use stats::{RunStatistics, TaskResult, TaskStatus};
