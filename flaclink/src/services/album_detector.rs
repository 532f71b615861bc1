//! Album detection
//!
//! A directory is an album when it holds a recognized audio file, directly
//! or below it. Detection never fails: a directory that cannot be read is
//! logged and treated as "not an album" so one bad folder does not stop a
//! scan.

use crate::models::Album;
use crate::utils::list_dir;
use flaclink_common::{DetectionStrategy, Result, SyncConfig};
use std::path::Path;

/// Decides whether a directory is an album and captures its listing
#[derive(Debug, Clone)]
pub struct AlbumDetector {
    strategy: DetectionStrategy,
    audio_extensions: Vec<String>,
}

impl AlbumDetector {
    /// Detector with the first-branch strategy and `.flac` as the only audio extension
    pub fn new() -> Self {
        Self {
            strategy: DetectionStrategy::FirstBranch,
            audio_extensions: vec!["flac".to_string()],
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            strategy: config.detection,
            audio_extensions: config.audio_extensions.clone(),
        }
    }

    pub fn with_strategy(mut self, strategy: DetectionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn strategy(&self) -> DetectionStrategy {
        self.strategy
    }

    pub fn is_album(&self, dir_path: &Path) -> bool {
        match self.strategy {
            DetectionStrategy::FirstBranch => self.first_branch(dir_path),
            DetectionStrategy::Exhaustive => self.exhaustive(dir_path),
        }
    }

    /// Entries are visited in listing order. The first subdirectory decides
    /// the answer outright; an audio file seen before any subdirectory
    /// answers `true`.
    fn first_branch(&self, dir_path: &Path) -> bool {
        let entries = match list_dir(dir_path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Skipping unreadable directory: {}", e);
                return false;
            }
        };

        for entry in entries {
            if entry.is_dir {
                return self.first_branch(&entry.path);
            }
            if self.is_audio_file(&entry.path) {
                return true;
            }
        }

        false
    }

    fn exhaustive(&self, dir_path: &Path) -> bool {
        let entries = match list_dir(dir_path) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Skipping unreadable directory: {}", e);
                return false;
            }
        };

        let (dirs, files): (Vec<_>, Vec<_>) = entries.into_iter().partition(|e| e.is_dir);

        files.iter().any(|file| self.is_audio_file(&file.path))
            || dirs.iter().any(|dir| self.exhaustive(&dir.path))
    }

    /// Exact, case-sensitive extension match
    pub fn is_audio_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.audio_extensions.iter().any(|known| known == ext))
            .unwrap_or(false)
    }

    /// Capture the album's name and immediate, unfiltered listing
    ///
    /// Entry names are kept as raw OS strings so the fingerprint sees every byte.
    pub fn describe(&self, dir_path: &Path) -> Result<Album> {
        let name = dir_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir_path.to_string_lossy().into_owned());

        let entries = list_dir(dir_path)?;

        Ok(Album::new(name, entries.into_iter().map(|entry| entry.file_name)))
    }

    /// `Some(album)` when `dir_path` is an album that can be described
    pub fn detect(&self, dir_path: &Path) -> Option<Album> {
        if !self.is_album(dir_path) {
            tracing::debug!("Not an album: {}", dir_path.display());
            return None;
        }

        match self.describe(dir_path) {
            Ok(album) => {
                tracing::debug!(album = %album.name, entries = album.contents.len(), "Album detected");
                Some(album)
            }
            Err(e) => {
                tracing::warn!("Could not describe album: {}", e);
                None
            }
        }
    }
}

impl Default for AlbumDetector {
    fn default() -> Self {
        Self::new()
    }
}
