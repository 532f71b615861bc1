//! Test fixtures: temporary source, library and registry locations

#![allow(dead_code)]

use anyhow::Result;
use flaclink::SyncConfig;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Isolated source root, library root and registry file
///
/// The TempDir must be kept alive for the duration of the test.
pub struct Fixture {
    pub temp_dir: TempDir,
    pub source: PathBuf,
    pub library: PathBuf,
    pub registry_path: PathBuf,
}

impl Fixture {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let source = temp_dir.path().join("downloads");
        let library = temp_dir.path().join("library");
        let data_dir = temp_dir.path().join(".flaclink");
        fs::create_dir_all(&source)?;
        fs::create_dir_all(&library)?;
        fs::create_dir_all(&data_dir)?;

        Ok(Self {
            registry_path: data_dir.join("albums.db"),
            temp_dir,
            source,
            library,
        })
    }

    pub fn config(&self) -> SyncConfig {
        SyncConfig::new(&self.registry_path).with_lock_timeout(Duration::from_millis(100))
    }
}

/// Create `root/<relative>` with `data`, making parent directories
pub fn write_file(root: &Path, relative: &str, data: &[u8]) -> Result<PathBuf> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, data)?;
    Ok(path)
}

/// Names of the immediate entries of `dir`, sorted
pub fn entry_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<std::io::Result<Vec<_>>>()?;
    names.sort();
    Ok(names)
}

/// True when both paths are the same underlying file
#[cfg(unix)]
pub fn same_file(a: &Path, b: &Path) -> Result<bool> {
    use std::os::unix::fs::MetadataExt;
    let (ma, mb) = (fs::metadata(a)?, fs::metadata(b)?);
    Ok(ma.dev() == mb.dev() && ma.ino() == mb.ino())
}
