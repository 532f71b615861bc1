//! Scanning, linking and sync services

pub mod album_detector;
pub mod album_replicator;
pub mod sync_orchestrator;

pub use album_detector::AlbumDetector;
pub use album_replicator::{AlbumReplicator, ReplicationStats};
pub use sync_orchestrator::{BackfillSummary, RunSummary, SyncOrchestrator, SyncSummary};
