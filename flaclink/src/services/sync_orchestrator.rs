//! Sync orchestration
//!
//! One run is two top-level operations, each with its own registry handle:
//! 1. `backfill(target)` registers albums already present in the library,
//!    so albums added by hand are never linked a second time.
//! 2. `sync_new(source, target)` links every source album whose
//!    fingerprint is not registered yet, then registers it.
//!
//! Only directories directly under a scan root are album candidates; regular
//! files there are counted and skipped.
//!
//! A dry run never creates the registry file. When it does not exist yet the
//! run proceeds as if it were empty.

use crate::db::Registry;
use crate::models::{Album, Fingerprint};
use crate::services::{AlbumDetector, AlbumReplicator};
use crate::utils::listing::list_scan_root;
use flaclink_common::{Error, Result, SyncConfig};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use tracing::info;

/// Result of registering albums already in the library
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillSummary {
    /// Non-directory entries at the library root
    pub skipped_files: usize,
    /// Albums newly added to the registry (or that would be, in a dry run)
    pub registered: usize,
    /// Albums whose fingerprint was already registered
    pub already_known: usize,
    /// Directories that are not albums
    pub not_albums: usize,
}

impl fmt::Display for BackfillSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Registered {} existing albums ({} already known), skipped {} regular files and {} non-album directories.",
            self.registered, self.already_known, self.skipped_files, self.not_albums
        )
    }
}

/// Result of linking new albums from the source root
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    /// Non-directory entries at the source root
    pub skipped_files: usize,
    /// Albums linked and registered (or that would be, in a dry run)
    pub linked: usize,
    /// Albums already registered, including duplicates found earlier in the same scan
    pub duplicates: usize,
    /// Directories that are not albums
    pub not_albums: usize,
    pub dry_run: bool,
}

impl fmt::Display for SyncSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.dry_run { "Would link" } else { "Linked" };
        write!(
            f,
            "Skipped {} regular files. {} {} new albums, found {} already in registry or duplicate.",
            self.skipped_files, verb, self.linked, self.duplicates
        )
    }
}

/// Both halves of one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub backfill: BackfillSummary,
    pub sync: SyncSummary,
}

/// Top-level control over detection, registry and replication
pub struct SyncOrchestrator {
    config: SyncConfig,
    detector: AlbumDetector,
    replicator: AlbumReplicator,
}

impl SyncOrchestrator {
    pub fn new(config: SyncConfig) -> Self {
        let detector = AlbumDetector::from_config(&config);
        Self {
            config,
            detector,
            replicator: AlbumReplicator::new(),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    async fn open_registry(&self) -> Result<Option<Registry>> {
        if self.config.dry_run && !self.config.registry_path.exists() {
            info!(
                "Registry {} does not exist yet; dry run treats it as empty",
                self.config.registry_path.display()
            );
            return Ok(None);
        }
        Registry::open(&self.config.registry_path, self.config.lock_timeout)
            .await
            .map(Some)
    }

    /// Backfill the library, then link new albums from the source
    pub async fn run(&self, source_root: &Path, target_root: &Path) -> Result<RunSummary> {
        // Dry runs insert nothing; the planned set carries library albums into the sync half
        let mut planned = HashSet::new();
        let backfill = self.backfill_planned(target_root, &mut planned).await?;
        let sync = self.sync_new_planned(source_root, target_root, &mut planned).await?;
        Ok(RunSummary { backfill, sync })
    }

    /// Register albums already present under `library_root` without linking anything
    pub async fn backfill(&self, library_root: &Path) -> Result<BackfillSummary> {
        self.backfill_planned(library_root, &mut HashSet::new()).await
    }

    /// Link every unregistered album under `source_root` into `target_root`
    pub async fn sync_new(&self, source_root: &Path, target_root: &Path) -> Result<SyncSummary> {
        self.sync_new_planned(source_root, target_root, &mut HashSet::new())
            .await
    }

    async fn backfill_planned(
        &self,
        library_root: &Path,
        planned: &mut HashSet<Fingerprint>,
    ) -> Result<BackfillSummary> {
        info!(
            "Updating registry with albums already in target dir {}",
            library_root.display()
        );
        let entries = list_scan_root(library_root)?;

        let mut registry = self.open_registry().await?;
        let mut summary = BackfillSummary::default();
        let outcome: Result<()> = async {
            for entry in entries {
                if !entry.is_dir {
                    info!("Skipping regular file: {}", entry.name);
                    summary.skipped_files += 1;
                    continue;
                }

                let Some(album) = self.detector.detect(&entry.path) else {
                    summary.not_albums += 1;
                    continue;
                };

                if is_registered(&mut registry, &album).await? {
                    summary.already_known += 1;
                    continue;
                }

                if self.config.dry_run {
                    if !planned.insert(album.fingerprint()?) {
                        summary.already_known += 1;
                        continue;
                    }
                    info!(album = %album.name, "Would add existing album to registry");
                } else if let Some(registry) = registry.as_mut() {
                    info!(album = %album.name, "Adding existing album to registry");
                    registry.insert(&album).await?;
                }
                summary.registered += 1;
            }
            Ok::<(), Error>(())
        }
        .await;

        finish(registry, outcome).await?;
        info!("{}", summary);
        Ok(summary)
    }

    async fn sync_new_planned(
        &self,
        source_root: &Path,
        target_root: &Path,
        planned: &mut HashSet<Fingerprint>,
    ) -> Result<SyncSummary> {
        info!(
            strategy = ?self.detector.strategy(),
            "Scanning for albums in {}",
            source_root.display()
        );
        let entries = list_scan_root(source_root)?;

        let mut registry = self.open_registry().await?;
        let mut summary = SyncSummary {
            dry_run: self.config.dry_run,
            ..SyncSummary::default()
        };
        let outcome: Result<()> = async {
            for entry in entries {
                if !entry.is_dir {
                    tracing::debug!("Skipping regular file: {}", entry.name);
                    summary.skipped_files += 1;
                    continue;
                }

                let Some(album) = self.detector.detect(&entry.path) else {
                    summary.not_albums += 1;
                    continue;
                };

                if is_registered(&mut registry, &album).await? {
                    tracing::debug!(album = %album.name, "Already in registry or duplicate");
                    summary.duplicates += 1;
                    continue;
                }

                if self.config.dry_run {
                    if !planned.insert(album.fingerprint()?) {
                        summary.duplicates += 1;
                        continue;
                    }
                    info!(album = %album.name, "Would link album");
                } else if let Some(registry) = registry.as_mut() {
                    info!(album = %album.name, "Linking album");
                    let stats = self.replicator.replicate(&entry.path, target_root)?;
                    tracing::debug!(
                        album = %album.name,
                        directories = stats.directories,
                        links = stats.links,
                        "Album linked"
                    );
                    registry.insert(&album).await?;
                }
                summary.linked += 1;
            }
            Ok::<(), Error>(())
        }
        .await;

        finish(registry, outcome).await?;
        info!("{}", summary);
        Ok(summary)
    }
}

async fn is_registered(registry: &mut Option<Registry>, album: &Album) -> Result<bool> {
    match registry {
        Some(registry) => registry.contains(album).await,
        None => Ok(false),
    }
}

/// Close the registry on every path, keeping the operation's error if it failed
async fn finish(registry: Option<Registry>, outcome: Result<()>) -> Result<()> {
    let closed = match registry {
        Some(registry) => registry.close().await,
        None => Ok(()),
    };
    outcome?;
    closed
}
