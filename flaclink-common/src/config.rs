//! Configuration loading and application-data directory resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Application-data directory name under the user's home directory
pub const APP_DIR_NAME: &str = ".flaclink";

/// Registry store file inside the application-data directory
pub const REGISTRY_FILE_NAME: &str = "albums.db";

/// Optional settings file inside the application-data directory
pub const CONFIG_FILE_NAME: &str = "flaclink.toml";

/// Environment variable overriding the application-data directory
pub const DATA_DIR_ENV: &str = "FLACLINK_DATA_DIR";

/// How long opening the registry waits for exclusive access
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(100);

/// Extensions (without the dot) that mark a file as album audio
pub const DEFAULT_AUDIO_EXTENSIONS: &[&str] = &["flac"];

/// How a directory is searched for audio files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectionStrategy {
    /// Descend into the first subdirectory only and return its answer.
    ///
    /// Files beside that subdirectory, and later siblings, are never looked
    /// at. This is the historical behavior and keeps existing registries
    /// consistent.
    #[default]
    FirstBranch,
    /// Full depth-first search over every child
    Exhaustive,
}

/// Application-data directory resolution, in priority order:
/// 1. Command-line argument
/// 2. `FLACLINK_DATA_DIR` environment variable
/// 3. `~/.flaclink`
pub struct DataDirResolver {
    cli_override: Option<PathBuf>,
}

impl DataDirResolver {
    pub fn new(cli_override: Option<PathBuf>) -> Self {
        Self { cli_override }
    }

    pub fn resolve(&self) -> Result<PathBuf> {
        if let Some(path) = &self.cli_override {
            return Ok(path.clone());
        }

        if let Ok(path) = std::env::var(DATA_DIR_ENV) {
            if !path.is_empty() {
                return Ok(PathBuf::from(path));
            }
        }

        default_data_dir()
    }
}

/// `~/.flaclink`
pub fn default_data_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(APP_DIR_NAME))
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))
}

/// Creates the application-data directory and names the files inside it
pub struct DataDirInitializer {
    data_dir: PathBuf,
}

impl DataDirInitializer {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Create the directory if missing
    pub fn ensure_directory_exists(&self) -> Result<()> {
        if self.data_dir.is_dir() {
            return Ok(());
        }

        std::fs::create_dir_all(&self.data_dir)
            .map_err(|e| Error::Config(format!(
                "Failed to create data directory {}: {}",
                self.data_dir.display(),
                e
            )))?;
        info!("Created data directory at {}", self.data_dir.display());

        Ok(())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn registry_path(&self) -> PathBuf {
        self.data_dir.join(REGISTRY_FILE_NAME)
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE_NAME)
    }
}

/// Contents of `flaclink.toml`; every key is optional
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct TomlConfig {
    pub lock_timeout_ms: Option<u64>,
    pub exhaustive_detection: Option<bool>,
    pub audio_extensions: Option<Vec<String>>,
}

impl TomlConfig {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config file: {}", e)))
    }

    /// Load the settings file, degrading to defaults
    ///
    /// A missing file is normal and silent. An unreadable or malformed file
    /// logs a warning and yields defaults so a scheduled run still proceeds.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Could not read {}: {} (using defaults)", path.display(), e);
                return Self::default();
            }
        };

        match Self::parse(&content) {
            Ok(config) => {
                info!("Loaded settings from {}", path.display());
                config
            }
            Err(e) => {
                warn!("{} in {} (using defaults)", e, path.display());
                Self::default()
            }
        }
    }
}

/// Runtime configuration injected into the sync orchestrator
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// Registry store file
    pub registry_path: PathBuf,
    /// Bounded wait for exclusive registry access
    pub lock_timeout: Duration,
    pub detection: DetectionStrategy,
    /// Recognized audio extensions, without the dot, matched exactly
    pub audio_extensions: Vec<String>,
    /// Report what would happen without touching the target or the registry
    pub dry_run: bool,
}

impl SyncConfig {
    pub fn new(registry_path: impl Into<PathBuf>) -> Self {
        Self {
            registry_path: registry_path.into(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            detection: DetectionStrategy::default(),
            audio_extensions: DEFAULT_AUDIO_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            dry_run: false,
        }
    }

    /// Apply values present in the settings file
    pub fn with_toml(mut self, toml: &TomlConfig) -> Self {
        if let Some(ms) = toml.lock_timeout_ms {
            self.lock_timeout = Duration::from_millis(ms);
        }
        if let Some(exhaustive) = toml.exhaustive_detection {
            self.detection = if exhaustive {
                DetectionStrategy::Exhaustive
            } else {
                DetectionStrategy::FirstBranch
            };
        }
        if let Some(extensions) = &toml.audio_extensions {
            if extensions.is_empty() {
                warn!("audio_extensions is empty in settings file, keeping defaults");
            } else {
                self.audio_extensions = extensions
                    .iter()
                    .map(|ext| ext.trim_start_matches('.').to_string())
                    .collect();
            }
        }
        self
    }

    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    pub fn with_detection(mut self, detection: DetectionStrategy) -> Self {
        self.detection = detection;
        self
    }

    pub fn with_audio_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.audio_extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}
