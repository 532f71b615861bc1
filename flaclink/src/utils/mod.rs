//! Utility modules for flaclink

pub mod listing;
pub mod paths;

pub use listing::{list_dir, list_scan_root, ListedEntry};
pub use paths::normalize_path;
