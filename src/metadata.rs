//! # Metadata Preservation Module
//!
//! Questo modulo preserva i metadata attorno alla trasformazione.
//!
//! ## Responsabilità:
//! - Copia verbatim dei file sidecar JSON nell'albero di output
//! - Re-iniezione dei tag embedded (EXIF: orientamento, camera, GPS) negli
//!   output ricodificati tramite exiftool
//!
//! ## Convenzione sidecar (tool di export):
//! - `<nome.ext>.json`
//! - `<nome.ext>.supplemental-metadata.json`
//!
//! La re-iniezione dei tag è best-effort: se exiftool manca o fallisce viene
//! loggato un warning e il file resta comunque Optimized. Un viewer senza
//! EXIF mostra al peggio l'orientamento sbagliato, mentre fallire il task
//! butterebbe via una ricodifica valida.

use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::OptimizeError;
use crate::platform::PlatformCommands;

/// Sidecar suffixes produced by the export tool, in lookup priority order
pub const SIDECAR_SUFFIXES: &[&str] = &[".supplemental-metadata.json", ".json"];

/// Copies sidecar files and re-attaches embedded tags to transformed output
pub struct MetadataPreserver {
    output_dir: PathBuf,
}

impl MetadataPreserver {
    pub fn new(output_dir: &Path) -> Self {
        Self {
            output_dir: output_dir.to_path_buf(),
        }
    }

    /// True when `file_name` follows the export tool's sidecar convention
    /// for some media file (i.e. the name continues past a media extension).
    pub fn is_sidecar_name(file_name: &str) -> bool {
        let lower = file_name.to_lowercase();
        SIDECAR_SUFFIXES.iter().any(|suffix| {
            lower
                .strip_suffix(suffix)
                .is_some_and(|base| !base.is_empty())
        })
    }

    /// Copy a sidecar file unchanged into the output tree at the same
    /// relative path. Returns the number of bytes copied.
    pub async fn copy_sidecar(
        &self,
        source: &Path,
        relative_path: &Path,
    ) -> Result<u64, OptimizeError> {
        let target = self.output_dir.join(relative_path);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                OptimizeError::Metadata(format!("creating {}: {e}", parent.display()))
            })?;
        }

        let bytes = fs::copy(source, &target).await.map_err(|e| {
            OptimizeError::Metadata(format!("copying sidecar to {}: {e}", target.display()))
        })?;

        debug!("Copied sidecar {} -> {}", source.display(), target.display());
        Ok(bytes)
    }

    /// Re-embed the tags of `source` into the transformed `target` so viewers
    /// keep orientation and camera data. Best-effort: failures are logged,
    /// never propagated.
    pub async fn embed_tags(source: &Path, target: &Path) {
        let platform = PlatformCommands::instance();

        if !platform.is_command_available("exiftool").await {
            warn!(
                "exiftool not available, embedded tags of {} not preserved",
                source.display()
            );
            return;
        }

        let output = Command::new(platform.get_command("exiftool"))
            .args([
                "-tagsFromFile",
                &source.to_string_lossy(),
                "-all:all",
                "-orientation",
                "-overwrite_original",
                &target.to_string_lossy(),
            ])
            .output()
            .await;

        match output {
            Ok(out) if out.status.success() => {
                debug!("Re-embedded tags: {} -> {}", source.display(), target.display());
            }
            Ok(out) => {
                warn!(
                    "Failed to preserve embedded tags for {}: {}",
                    source.display(),
                    String::from_utf8_lossy(&out.stderr)
                );
            }
            Err(e) => {
                warn!(
                    "Failed to run exiftool for {}: {e}",
                    source.display()
                );
            }
        }
    }
}
