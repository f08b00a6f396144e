//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione di un run di ottimizzazione.
//!
//! ## Responsabilità:
//! - Definisce la struct `RunConfig` con tutti i parametri di ottimizzazione
//! - Definisce l'enum `Preset` per i profili di velocità dell'encoder video
//! - Fornisce validazione robusta dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce valori di default sensati per tutti i parametri
//!
//! ## Parametri di configurazione:
//! - `max_resolution`: Lato massimo in pixel, `None` = mai ridimensionare
//! - `jpeg_quality`: Qualità JPEG (1-100, default: 85)
//! - `convert_png_to_jpeg`: Converte PNG in JPEG (default: false)
//! - `crf`: CRF video (0-51, default: 23, più basso = migliore qualità)
//! - `preset`: Preset di velocità x264 (default: medium)
//! - `audio_bitrate`: Bitrate audio video (default: "128k")
//! - `workers`: Numero di worker paralleli (default: CPU disponibili)
//! - `backup_enabled` / `backup_dir`: Copia verbatim degli originali
//! - `skip_small`: Ignora immagini < 100 KB e video < 5 MB (default: true)
//! - `task_timeout_secs`: Timeout opzionale per singolo task
//!
//! ## Validazione:
//! - Controlla che jpeg_quality sia 1-100
//! - Controlla che crf sia 0-51
//! - Controlla che workers sia > 0
//! - Controlla che max_resolution, se presente, sia > 0

use anyhow::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::OptimizeError;

/// x264 encoding speed/efficiency profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum, Default)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Ultrafast,
    Superfast,
    Veryfast,
    Faster,
    Fast,
    #[default]
    Medium,
    Slow,
    Slower,
    Veryslow,
}

impl Preset {
    /// The string ffmpeg expects for `-preset`
    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Ultrafast => "ultrafast",
            Preset::Superfast => "superfast",
            Preset::Veryfast => "veryfast",
            Preset::Faster => "faster",
            Preset::Fast => "fast",
            Preset::Medium => "medium",
            Preset::Slow => "slow",
            Preset::Slower => "slower",
            Preset::Veryslow => "veryslow",
        }
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for a single optimization run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Root directory of the exported media tree
    pub input_dir: PathBuf,
    /// Directory mirroring the input tree with optimized artifacts
    pub output_dir: PathBuf,
    /// Whether originals are copied verbatim before any transform
    pub backup_enabled: bool,
    /// Directory mirroring the input tree with untouched originals
    pub backup_dir: PathBuf,
    /// Longest allowed edge in pixels (None = never resize)
    pub max_resolution: Option<u32>,
    /// JPEG quality (1-100)
    pub jpeg_quality: u8,
    /// Re-encode PNG sources as JPEG
    pub convert_png_to_jpeg: bool,
    /// Video CRF value (0-51, lower = better quality)
    pub crf: u8,
    /// Video encoding speed profile
    pub preset: Preset,
    /// Video audio bitrate
    pub audio_bitrate: String,
    /// Number of parallel workers
    pub workers: usize,
    /// Skip media below the small-file thresholds
    pub skip_small: bool,
    /// Minimum image size worth recompressing (KB)
    pub min_image_kb: u64,
    /// Minimum video size worth transcoding (MB)
    pub min_video_mb: u64,
    /// Optional per-task timeout; an expired task becomes an Error result
    pub task_timeout_secs: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::new(),
            output_dir: PathBuf::new(),
            backup_enabled: true,
            backup_dir: PathBuf::new(),
            max_resolution: None,
            jpeg_quality: 85,
            convert_png_to_jpeg: false,
            crf: 23,
            preset: Preset::Medium,
            audio_bitrate: "128k".to_string(),
            workers: default_workers(),
            skip_small: true,
            min_image_kb: 100,
            min_video_mb: 5,
            task_timeout_secs: None,
        }
    }
}

/// Number of workers to use when the user gives no preference
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

impl RunConfig {
    /// Build a configuration rooted at `input_dir`, with the export-tool
    /// defaults for output and backup locations (both nested under the input
    /// root, like the export layout this tool was written for).
    pub fn for_input(input_dir: &Path) -> Self {
        Self {
            input_dir: input_dir.to_path_buf(),
            output_dir: input_dir.join("optimized"),
            backup_dir: input_dir.join("originals"),
            ..Default::default()
        }
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), OptimizeError> {
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(OptimizeError::Validation(
                "JPEG quality must be between 1 and 100".to_string(),
            ));
        }

        if self.crf > 51 {
            return Err(OptimizeError::Validation(
                "Video CRF must be between 0 and 51".to_string(),
            ));
        }

        if self.workers == 0 {
            return Err(OptimizeError::Validation(
                "Number of workers must be greater than 0".to_string(),
            ));
        }

        if self.max_resolution == Some(0) {
            return Err(OptimizeError::Validation(
                "Max resolution must be greater than 0".to_string(),
            ));
        }

        if self.task_timeout_secs == Some(0) {
            return Err(OptimizeError::Validation(
                "Task timeout must be greater than 0".to_string(),
            ));
        }

        if self.input_dir.as_os_str().is_empty() || !self.input_dir.is_dir() {
            return Err(OptimizeError::Validation(format!(
                "Input directory does not exist: {}",
                self.input_dir.display()
            )));
        }

        Ok(())
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: RunConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn valid_config() -> (TempDir, RunConfig) {
        let temp_dir = TempDir::new().unwrap();
        let config = RunConfig::for_input(temp_dir.path());
        (temp_dir, config)
    }

    #[test]
    fn test_config_validation() {
        let (_guard, mut config) = valid_config();
        assert!(config.validate().is_ok());

        config.jpeg_quality = 0;
        assert!(config.validate().is_err());

        config.jpeg_quality = 85;
        config.crf = 52;
        assert!(config.validate().is_err());

        config.crf = 23;
        config.workers = 0;
        assert!(config.validate().is_err());

        config.workers = 4;
        config.max_resolution = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_rejects_missing_input() {
        let mut config = RunConfig::default();
        config.input_dir = PathBuf::from("/definitely/not/a/real/directory");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_default() {
        let config = RunConfig::default();
        assert_eq!(config.jpeg_quality, 85);
        assert_eq!(config.crf, 23);
        assert_eq!(config.preset, Preset::Medium);
        assert_eq!(config.audio_bitrate, "128k");
        assert!(config.backup_enabled);
        assert!(config.skip_small);
        assert_eq!(config.max_resolution, None);
        assert!(config.workers >= 1);
    }

    #[test]
    fn test_for_input_nests_defaults() {
        let (guard, config) = valid_config();
        assert_eq!(config.output_dir, guard.path().join("optimized"));
        assert_eq!(config.backup_dir, guard.path().join("originals"));
    }

    #[test]
    fn test_preset_names() {
        assert_eq!(Preset::Medium.as_str(), "medium");
        assert_eq!(Preset::Veryslow.to_string(), "veryslow");
        assert_eq!(Preset::default(), Preset::Medium);
    }

    #[tokio::test]
    async fn test_config_save_load() {
        let (guard, mut original) = valid_config();
        let config_path = guard.path().join("config.json");

        original.jpeg_quality = 70;
        original.crf = 28;
        original.preset = Preset::Slow;
        original.max_resolution = Some(1920);

        original.save_to_file(&config_path).await.unwrap();
        let loaded = RunConfig::from_file(&config_path).await.unwrap();

        assert_eq!(loaded.jpeg_quality, 70);
        assert_eq!(loaded.crf, 28);
        assert_eq!(loaded.preset, Preset::Slow);
        assert_eq!(loaded.max_resolution, Some(1920));
        assert_eq!(loaded.input_dir, original.input_dir);
    }
}
