//! Common error types for flaclink

use std::path::PathBuf;
use thiserror::Error;

/// Common result type for flaclink operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while scanning, registering or linking albums
///
/// Every variant is fatal for the operation that returns it. Non-fatal
/// conditions (unreadable nested directories, regular files at a scan root)
/// are logged and skipped where they occur and never surface as an `Error`.
#[derive(Error, Debug)]
pub enum Error {
    /// Wrong command-line usage
    #[error("Usage error: {0}")]
    Usage(String),

    /// Directory could not be listed
    #[error("IO error on {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Scan root exists but is not a directory
    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    /// Registry could not be opened or locked within the timeout
    #[error("Album registry unavailable at {}: {}", .path.display(), .source)]
    StoreUnavailable {
        path: PathBuf,
        source: sqlx::Error,
    },

    /// Registry read or write failed on an open handle
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Fingerprint serialization failed
    #[error("Fingerprint encode error: {0}")]
    Encode(#[source] bincode::Error),

    /// Stored fingerprint could not be decoded
    #[error("Fingerprint decode error: {0}")]
    Decode(#[source] bincode::Error),

    /// Target directory could not be created (usually because it exists)
    #[error("Failed to create directory {}: {}", .path.display(), .source)]
    DirCreate {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Album source directory could not be listed during replication
    #[error("Failed to read album directory {}: {}", .path.display(), .source)]
    AlbumRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Hardlink could not be created
    #[error(
        "Failed to link {} -> {}: {}{}",
        .source_path.display(),
        .target_path.display(),
        .source,
        cross_device_hint(.source)
    )]
    Link {
        source_path: PathBuf,
        target_path: PathBuf,
        source: std::io::Error,
    },

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit status for this error
    ///
    /// | status | condition                               |
    /// |--------|-----------------------------------------|
    /// | 1      | unreadable or invalid scan root         |
    /// | 2      | usage                                   |
    /// | 3      | registry unavailable                    |
    /// | 4      | registry read/write or fingerprint codec|
    /// | 5      | replication (read / mkdir / hardlink)   |
    /// | 6      | configuration                           |
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Io { .. } | Error::NotADirectory(_) => 1,
            Error::Usage(_) => 2,
            Error::StoreUnavailable { .. } => 3,
            Error::Database(_) | Error::Encode(_) | Error::Decode(_) => 4,
            Error::AlbumRead { .. } | Error::DirCreate { .. } | Error::Link { .. } => 5,
            Error::Config(_) => 6,
        }
    }

    /// True when a hardlink failed because source and target are on different volumes
    pub fn is_cross_device(&self) -> bool {
        match self {
            Error::Link { source, .. } => is_cross_device(source),
            _ => false,
        }
    }
}

#[cfg(unix)]
fn is_cross_device(err: &std::io::Error) -> bool {
    err.raw_os_error() == Some(libc::EXDEV)
}

#[cfg(not(unix))]
fn is_cross_device(_err: &std::io::Error) -> bool {
    false
}

fn cross_device_hint(err: &std::io::Error) -> &'static str {
    if is_cross_device(err) {
        " (source and target must be on the same volume)"
    } else {
        ""
    }
}
