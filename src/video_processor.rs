//! # Video Processing Module
//!
//! Questo modulo gestisce la transcodifica video tramite FFmpeg.
//!
//! ## Responsabilità:
//! - Analisi proprietà video con ffprobe (dimensioni, durata, codec)
//! - Transcodifica con libx264 a CRF e preset configurabili
//! - Downscale-only: filtro scale applicato solo se il lato più lungo
//!   supera `max_resolution` (mai upscaling)
//! - Ricodifica audio AAC al bitrate configurato
//! - Preservazione metadata container (`-map_metadata 0`) e tag embedded
//! - Verifica dipendenze esterne (ffmpeg, ffprobe)
//!
//! ## Pipeline di transcodifica:
//! 1. ffprobe per le dimensioni sorgente
//! 2. ffmpeg verso un file temporaneo con la stessa estensione del sorgente
//!    (il container di output resta quello originale)
//! 3. exiftool best-effort per i tag embedded
//! 4. Copia del temporaneo nel path finale dentro l'albero di output
//!
//! Un exit code non-zero di ffmpeg diventa `OptimizeError::Ffmpeg` e quindi
//! un TaskResult Error: il batch prosegue, nessun output parziale resta nel
//! mirror.

use std::path::Path;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::debug;

use crate::config::RunConfig;
use crate::error::OptimizeError;
use crate::metadata::MetadataPreserver;
use crate::platform::PlatformCommands;

/// Handles video optimization through the external encoder
pub struct VideoProcessor {
    config: RunConfig,
}

impl VideoProcessor {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    /// Transcode `input_path` and write the result to `final_output_path`.
    /// Returns the optimized byte size.
    pub async fn optimize(
        &self,
        input_path: &Path,
        final_output_path: &Path,
    ) -> Result<u64, OptimizeError> {
        let info = self.probe(input_path).await?;
        debug!(
            "Probed {}: {}x{} {} ({:.1}s)",
            input_path.display(),
            info.width,
            info.height,
            info.codec,
            info.duration
        );

        if let Some(parent) = final_output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // ffmpeg infers the container from the extension, so the temp file
        // must carry the same one as the source
        let suffix = input_path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_else(|| ".mp4".to_string());
        let temp_file = NamedTempFile::with_suffix(suffix)?;

        self.transcode(input_path, temp_file.path(), &info).await?;

        MetadataPreserver::embed_tags(input_path, temp_file.path()).await;

        let optimized_bytes = tokio::fs::copy(temp_file.path(), final_output_path).await?;
        debug!(
            "Video optimization completed: {} -> {}",
            input_path.display(),
            final_output_path.display()
        );

        Ok(optimized_bytes)
    }

    async fn transcode(
        &self,
        input_path: &Path,
        output_path: &Path,
        info: &VideoInfo,
    ) -> Result<(), OptimizeError> {
        let platform = PlatformCommands::instance();

        let mut cmd = Command::new(platform.get_command("ffmpeg"));
        cmd.args([
            "-i",
            &input_path.to_string_lossy(),
            "-c:v",
            "libx264",
            "-preset",
            self.config.preset.as_str(),
            "-crf",
            &self.config.crf.to_string(),
            "-c:a",
            "aac",
            "-b:a",
            &self.config.audio_bitrate,
            "-map_metadata",
            "0",
            "-movflags",
            "+faststart",
            "-loglevel",
            "warning",
        ]);

        // Downscale-only: leave already-small videos at their resolution
        if let Some(max) = self.config.max_resolution {
            if info.width.max(info.height) > max {
                cmd.args([
                    "-vf",
                    &format!("scale=w={max}:h={max}:force_original_aspect_ratio=decrease"),
                ]);
            }
        }

        cmd.args(["-y", &output_path.to_string_lossy()]);

        let output = cmd
            .output()
            .await
            .map_err(|e| OptimizeError::Ffmpeg(format!("failed to execute ffmpeg: {e}")))?;

        if !output.status.success() {
            return Err(OptimizeError::Ffmpeg(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }

        Ok(())
    }

    /// Get video information using ffprobe
    pub async fn probe(&self, video_path: &Path) -> Result<VideoInfo, OptimizeError> {
        let platform = PlatformCommands::instance();

        let output = Command::new(platform.get_command("ffprobe"))
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
                &video_path.to_string_lossy(),
            ])
            .output()
            .await
            .map_err(|e| OptimizeError::Ffmpeg(format!("failed to execute ffprobe: {e}")))?;

        if !output.status.success() {
            return Err(OptimizeError::Ffmpeg(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ));
        }

        let info: serde_json::Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| OptimizeError::Ffmpeg(format!("unreadable ffprobe output: {e}")))?;

        Ok(VideoInfo::from_probe(&info))
    }

    /// Check that the external encoder binaries are available.
    /// Called at startup only when the scan found videos; their absence is a
    /// fatal condition, not a per-file one.
    pub async fn check_dependencies() -> Result<(), OptimizeError> {
        let platform = PlatformCommands::instance();

        for tool in ["ffmpeg", "ffprobe"] {
            if !platform.is_command_available(tool).await {
                return Err(OptimizeError::MissingDependency(format!(
                    "{tool} is required for video processing"
                )));
            }
        }

        Ok(())
    }
}

/// Video file information
#[derive(Debug, Clone)]
pub struct VideoInfo {
    pub duration: f64,
    pub bitrate: u64,
    pub width: u32,
    pub height: u32,
    pub codec: String,
}

impl VideoInfo {
    /// Extract the fields this crate cares about from ffprobe's JSON
    fn from_probe(info: &serde_json::Value) -> Self {
        let format = &info["format"];
        let duration = format["duration"]
            .as_str()
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0);
        let bitrate = format["bit_rate"]
            .as_str()
            .and_then(|b| b.parse::<u64>().ok())
            .unwrap_or(0);

        let empty = vec![];
        let streams = info["streams"].as_array().unwrap_or(&empty);
        let video_stream = streams
            .iter()
            .find(|s| s["codec_type"] == "video")
            .unwrap_or(&serde_json::Value::Null);

        Self {
            duration,
            bitrate,
            width: video_stream["width"].as_u64().unwrap_or(0) as u32,
            height: video_stream["height"].as_u64().unwrap_or(0) as u32,
            codec: video_stream["codec_name"]
                .as_str()
                .unwrap_or("unknown")
                .to_string(),
        }
    }

    /// Whether the downscale filter applies for this source
    pub fn exceeds(&self, max_resolution: u32) -> bool {
        self.width.max(self.height) > max_resolution
    }
}
