//! flaclink library interface
//!
//! Replicates newly downloaded album directories into a music library with
//! hardlinks, remembering every album it has seen so repeated runs never
//! link the same album twice.
//!
//! Exposes public APIs for integration testing and for the `flaclink` binary.

pub mod db;
pub mod models;
pub mod services;
pub mod utils;

pub use crate::db::{Registry, RegistryEntry};
pub use crate::models::{Album, Fingerprint};
pub use crate::services::{
    AlbumDetector, AlbumReplicator, BackfillSummary, ReplicationStats, RunSummary,
    SyncOrchestrator, SyncSummary,
};
pub use flaclink_common::{DetectionStrategy, Error, Result, SyncConfig};
