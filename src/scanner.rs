//! # Directory Scanner Module
//!
//! Questo modulo gestisce la discovery ricorsiva e la classificazione dei file.
//!
//! ## Responsabilità:
//! - Discovery ricorsiva di tutti i file regolari nell'albero di input
//! - Classificazione per estensione (case-insensitive) in `MediaKind`
//! - Calcolo del path relativo che preserva la gerarchia
//! - Esclusione delle directory di output/backup quando annidate nell'input
//!
//! ## Formati supportati:
//! - **Immagini**: JPG, JPEG, PNG, WebP
//! - **Video**: MP4, MOV, AVI, MKV
//! - **Sidecar metadata**: JSON (convenzione del tool di export)
//! - Tutto il resto è `Unsupported` e verrà conteggiato come skipped
//!
//! I symlink non vengono seguiti e le entry non regolari sono ignorate.
//! La scansione è lazy e single-pass: riscansionare riparte sempre dalla root.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Classification of a discovered file, derived from its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    MetadataSidecar,
    Unsupported,
}

impl MediaKind {
    /// Classify a lowercased extension
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "jpg" | "jpeg" | "png" | "webp" => MediaKind::Image,
            "mp4" | "mov" | "avi" | "mkv" => MediaKind::Video,
            "json" => MediaKind::MetadataSidecar,
            _ => MediaKind::Unsupported,
        }
    }
}

/// A classified regular file discovered under the input root.
/// Immutable once created; every MediaFile yields exactly one TaskResult.
#[derive(Debug, Clone)]
pub struct MediaFile {
    /// Path relative to the input root, preserving hierarchy
    pub relative_path: PathBuf,
    /// Absolute (or input-rooted) path of the source file
    pub source_path: PathBuf,
    /// Lowercased extension, empty when the file has none
    pub extension: String,
    pub kind: MediaKind,
}

impl MediaFile {
    /// Build a MediaFile for `path` found under `input_root`.
    /// Returns None when the path does not live under the root.
    pub fn classify(path: &Path, input_root: &Path) -> Option<Self> {
        let relative_path = path.strip_prefix(input_root).ok()?.to_path_buf();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let kind = MediaKind::from_extension(&extension);

        Some(Self {
            relative_path,
            source_path: path.to_path_buf(),
            extension,
            kind,
        })
    }

    /// File name for log/progress messages
    pub fn file_name(&self) -> String {
        self.source_path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }
}

/// Walks the input tree and yields one classified MediaFile per regular file
pub struct Scanner {
    input_dir: PathBuf,
    pruned: Vec<PathBuf>,
}

impl Scanner {
    /// Create a scanner rooted at `input_dir`. `pruned` directories (the
    /// output and backup trees, when nested under the input root) are never
    /// descended into, so a re-run does not re-ingest its own artifacts.
    pub fn new(input_dir: &Path, pruned: Vec<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.to_path_buf(),
            pruned,
        }
    }

    /// Lazy, finite, single-pass sequence of classified files
    pub fn scan(&self) -> impl Iterator<Item = MediaFile> + '_ {
        WalkDir::new(&self.input_dir)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| !self.is_pruned(entry.path()))
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| MediaFile::classify(entry.path(), &self.input_dir))
    }

    fn is_pruned(&self, path: &Path) -> bool {
        self.pruned.iter().any(|p| path == p)
    }
}
