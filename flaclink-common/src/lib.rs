//! # flaclink Common Library
//!
//! Shared code for the flaclink workspace:
//! - Error taxonomy and process exit codes
//! - Application-data directory resolution
//! - Runtime configuration (`SyncConfig`) and the optional TOML file

pub mod config;
pub mod error;

pub use config::{DetectionStrategy, SyncConfig};
pub use error::{Error, Result};
