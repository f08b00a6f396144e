//! # Takeout Media Optimizer - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Validazione delle condizioni fatali prima di avviare il run
//! - Creazione della configurazione e avvio dell'optimizer
//! - Report finale (log + file nell'albero di output)
//!
//! ## Exit status:
//! - 0 quando il run completa, anche con errori per-file registrati
//! - non-zero solo per condizioni fatali pre-run (input illeggibile,
//!   encoder esterno mancante, configurazione invalida)
//!
//! ## Esempio di utilizzo:
//! ```bash
//! takeout-optimizer /path/to/export -j 85 --crf 23 --max-resolution 1920
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use takeout_media_optimizer::{MediaOptimizer, Preset, Reporter, RunConfig};

#[derive(Parser)]
#[command(name = "takeout-optimizer")]
#[command(about = "Shrink an exported photo/video library, preserving metadata and originals")]
struct Args {
    /// Directory containing the exported photos and videos
    input_dir: PathBuf,

    /// Directory for the optimized files (default: <input>/optimized)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Directory for verbatim copies of the originals (default: <input>/originals)
    #[arg(short, long)]
    backup_dir: Option<PathBuf>,

    /// JPEG quality (1-100)
    #[arg(short, long, default_value = "85")]
    jpeg_quality: u8,

    /// Convert PNG images to JPEG
    #[arg(long)]
    convert_png: bool,

    /// Do not keep backup copies of the originals
    #[arg(long)]
    no_backup: bool,

    /// Number of parallel workers (default: available CPUs)
    #[arg(short = 'p', long)]
    workers: Option<usize>,

    /// Video CRF value (0-51, lower = better quality)
    #[arg(long, default_value = "23")]
    crf: u8,

    /// Video encoding speed profile
    #[arg(long, value_enum, default_value_t = Preset::Medium)]
    preset: Preset,

    /// Downscale media whose longest edge exceeds this many pixels
    #[arg(long)]
    max_resolution: Option<u32>,

    /// Abort a single stalled task after this many seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Also recompress small files (below 100 KB images / 5 MB videos)
    #[arg(long)]
    no_skip_small: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Fatal startup conditions: unreadable input root
    if !args.input_dir.is_dir() {
        return Err(anyhow::anyhow!(
            "Input directory does not exist: {}",
            args.input_dir.display()
        ));
    }

    let mut config = RunConfig::for_input(&args.input_dir);
    if let Some(output_dir) = args.output_dir {
        config.output_dir = output_dir;
    }
    if let Some(backup_dir) = args.backup_dir {
        config.backup_dir = backup_dir;
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    config.jpeg_quality = args.jpeg_quality;
    config.convert_png_to_jpeg = args.convert_png;
    config.backup_enabled = !args.no_backup;
    config.crf = args.crf;
    config.preset = args.preset;
    config.max_resolution = args.max_resolution;
    config.task_timeout_secs = args.timeout_secs;
    config.skip_small = !args.no_skip_small;

    let optimizer = MediaOptimizer::new(config.clone())?;
    let stats = optimizer.run().await?;

    Reporter::print(&stats);
    let report_path = Reporter::save(&stats, &config.output_dir).await?;
    info!("Report saved to: {}", report_path.display());

    // Per-file errors are in the report; only fatal pre-run conditions
    // change the exit status
    Ok(())
}
