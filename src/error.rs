//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce `OptimizeError` enum per categorizzare tutti gli errori possibili
//! - Fornisce messaggi di errore descrittivi e strutturati
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori:
//! - `Io`: Errori di I/O (file non trovati, permessi, etc.)
//! - `Image`: Errori di decodifica/encoding immagini (file corrotti, etc.)
//! - `Ffmpeg`: Errori dell'encoder video esterno
//! - `Backup`: Errori di scrittura del backup (blocca la trasformazione)
//! - `Metadata`: Errori di preservazione metadata/sidecar
//! - `UnsupportedFormat`: Formato file non supportato
//! - `MissingDependency`: Tool esterno mancante (ffmpeg, ffprobe)
//! - `Validation`: Errori di validazione input
//! - `Timeout`: Task singolo bloccato oltre il limite configurato
//!
//! Gli errori per-file non interrompono mai il batch: vengono convertiti
//! in un `TaskResult` con status Error prima di raggiungere l'aggregatore.

/// Custom error types for media optimization
#[derive(thiserror::Error, Debug)]
pub enum OptimizeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    #[error("Backup error: {0}")]
    Backup(String),

    #[error("Metadata preservation error: {0}")]
    Metadata(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Dependency missing: {0}")]
    MissingDependency(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Task timed out after {0}s")]
    Timeout(u64),
}
