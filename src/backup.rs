//! # Backup Manager Module
//!
//! Questo modulo gestisce la copia verbatim degli originali nell'albero di
//! backup prima di qualsiasi trasformazione.
//!
//! ## Responsabilità:
//! - Copia byte-per-byte nel backup tree allo stesso path relativo
//! - Creazione delle directory intermedie necessarie
//! - Skip silenzioso se un backup per quel path esiste già (mai sovrascritto)
//!
//! Se il backup non può essere scritto il file viene classificato Error e la
//! trasformazione non viene tentata: meglio rinunciare all'ottimizzazione che
//! rischiare un originale non recuperabile.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::error::OptimizeError;

/// Copies original files verbatim into a mirrored backup tree
pub struct BackupManager {
    backup_dir: PathBuf,
}

impl BackupManager {
    pub fn new(backup_dir: &Path) -> Self {
        Self {
            backup_dir: backup_dir.to_path_buf(),
        }
    }

    /// Where the backup for `relative_path` lives
    pub fn backup_path(&self, relative_path: &Path) -> PathBuf {
        self.backup_dir.join(relative_path)
    }

    /// Copy `source` into the backup tree at `relative_path`.
    /// A pre-existing backup is treated as already-backed-up and left alone.
    pub async fn backup(&self, source: &Path, relative_path: &Path) -> Result<(), OptimizeError> {
        let target = self.backup_path(relative_path);

        if target.exists() {
            debug!("Backup already exists, skipping: {}", target.display());
            return Ok(());
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| OptimizeError::Backup(format!("creating {}: {e}", parent.display())))?;
        }

        fs::copy(source, &target)
            .await
            .map_err(|e| OptimizeError::Backup(format!("copying to {}: {e}", target.display())))?;

        debug!("Backed up {} -> {}", source.display(), target.display());
        Ok(())
    }
}
