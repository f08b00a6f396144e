//! # Path Resolution Module
//!
//! Calcola i path speculari nell'albero di output. Ogni task possiede un
//! path relativo disgiunto, quindi le scritture non collidono mai.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::OptimizeError;
use crate::scanner::MediaFile;

/// Computes mirrored destination paths for produced artifacts
pub struct PathResolver;

impl PathResolver {
    /// Output path for a media file, preserving the relative hierarchy.
    /// `renamed_extension` rewrites the suffix (PNG converted to JPEG).
    pub fn output_path(
        output_dir: &Path,
        media: &MediaFile,
        renamed_extension: Option<&str>,
    ) -> PathBuf {
        let mut path = output_dir.join(&media.relative_path);
        if let Some(ext) = renamed_extension {
            path.set_extension(ext);
        }
        path
    }

    /// Create the parent directories of `path` if missing
    pub async fn ensure_parent_dirs(path: &Path) -> Result<(), OptimizeError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}
