//! Hardlink replication of an album tree
//!
//! The album directory is recreated under the target parent, subdirectories
//! are recreated recursively, and every other entry becomes a hardlink to
//! the source file. Source and target must live on the same volume.
//!
//! The first failure aborts the whole album. The album directory this call
//! created is then removed again, so the target never keeps a half-linked
//! album; only a failed removal can leave one behind, and that is logged.

use crate::utils::list_dir;
use flaclink_common::{Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Counts of what one replication created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplicationStats {
    pub directories: usize,
    pub links: usize,
}

/// Mirrors a source directory tree into a target using hardlinks
#[derive(Debug, Clone, Default)]
pub struct AlbumReplicator;

impl AlbumReplicator {
    pub fn new() -> Self {
        Self
    }

    /// Replicate `source_dir` as `target_parent/<base name of source_dir>`
    ///
    /// The album directory must not exist yet.
    pub fn replicate(&self, source_dir: &Path, target_parent: &Path) -> Result<ReplicationStats> {
        let album_dir = album_target_path(source_dir, target_parent)?;

        create_dir(&album_dir)?;
        let mut stats = ReplicationStats {
            directories: 1,
            links: 0,
        };

        match self.link_contents(source_dir, &album_dir, &mut stats) {
            Ok(()) => {
                tracing::debug!(
                    target = %album_dir.display(),
                    directories = stats.directories,
                    links = stats.links,
                    "Album replicated"
                );
                Ok(stats)
            }
            Err(err) => {
                self.rollback(&album_dir);
                Err(err)
            }
        }
    }

    fn link_contents(
        &self,
        source_dir: &Path,
        target_dir: &Path,
        stats: &mut ReplicationStats,
    ) -> Result<()> {
        let entries = list_dir(source_dir).map_err(|err| match err {
            Error::Io { path, source } => Error::AlbumRead { path, source },
            other => other,
        })?;

        for entry in entries {
            let target_path = target_dir.join(&entry.file_name);

            if entry.is_dir {
                create_dir(&target_path)?;
                stats.directories += 1;
                self.link_contents(&entry.path, &target_path, stats)?;
            } else {
                fs::hard_link(&entry.path, &target_path).map_err(|source| Error::Link {
                    source_path: entry.path.clone(),
                    target_path: target_path.clone(),
                    source,
                })?;
                stats.links += 1;
                tracing::debug!("Linked {}", target_path.display());
            }
        }

        Ok(())
    }

    fn rollback(&self, album_dir: &Path) {
        match fs::remove_dir_all(album_dir) {
            Ok(()) => tracing::warn!("Removed partially replicated album {}", album_dir.display()),
            Err(e) => tracing::error!(
                "Could not remove partially replicated album {}: {} (target tree is incomplete)",
                album_dir.display(),
                e
            ),
        }
    }
}

/// `target_parent` joined with the source directory's base name
pub fn album_target_path(source_dir: &Path, target_parent: &Path) -> Result<PathBuf> {
    let base = source_dir.file_name().ok_or_else(|| Error::DirCreate {
        path: target_parent.to_path_buf(),
        source: io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("source {} has no directory name", source_dir.display()),
        ),
    })?;
    Ok(target_parent.join(base))
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir(path).map_err(|source| Error::DirCreate {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path, data: &[u8]) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, data).unwrap();
    }

    #[test]
    fn test_replicates_flat_album() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("downloads").join("A");
        let target = temp_dir.path().join("library");
        touch(&source.join("x.flac"), b"x");
        touch(&source.join("y.flac"), b"y");
        fs::create_dir_all(&target).unwrap();

        let stats = AlbumReplicator::new().replicate(&source, &target).unwrap();

        assert_eq!(stats, ReplicationStats { directories: 1, links: 2 });
        assert_eq!(fs::read(target.join("A").join("x.flac")).unwrap(), b"x");
        assert_eq!(fs::read(target.join("A").join("y.flac")).unwrap(), b"y");
    }

    #[test]
    fn test_replicates_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("Box");
        let target = temp_dir.path().join("library");
        touch(&source.join("CD1").join("01.flac"), b"1");
        touch(&source.join("CD2").join("01.flac"), b"2");
        touch(&source.join("CD2").join("Scans").join("front.jpg"), b"img");
        fs::create_dir(source.join("Empty")).unwrap();
        fs::create_dir_all(&target).unwrap();

        let stats = AlbumReplicator::new().replicate(&source, &target).unwrap();

        assert_eq!(stats, ReplicationStats { directories: 5, links: 3 });
        assert!(target.join("Box").join("Empty").is_dir());
        assert_eq!(
            fs::read(target.join("Box").join("CD2").join("Scans").join("front.jpg")).unwrap(),
            b"img"
        );
    }

    #[test]
    fn test_existing_album_directory_is_dir_create_error() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("A");
        let target = temp_dir.path().join("library");
        touch(&source.join("x.flac"), b"x");
        touch(&target.join("A").join("keep.txt"), b"mine");

        let result = AlbumReplicator::new().replicate(&source, &target);

        assert!(matches!(result, Err(Error::DirCreate { .. })));
        // Pre-existing directory is not rolled back
        assert_eq!(fs::read(target.join("A").join("keep.txt")).unwrap(), b"mine");
    }

    #[test]
    fn test_missing_target_parent_is_dir_create_error() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("A");
        touch(&source.join("x.flac"), b"x");

        let result = AlbumReplicator::new().replicate(&source, &temp_dir.path().join("nope"));

        assert!(matches!(result, Err(Error::DirCreate { .. })));
    }

    #[test]
    fn test_album_target_path_uses_base_name() {
        let path = album_target_path(Path::new("/dl/Some Album"), Path::new("/lib")).unwrap();
        assert_eq!(path, PathBuf::from("/lib/Some Album"));

        assert!(album_target_path(Path::new("/"), Path::new("/lib")).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_replication_rolls_back() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("A");
        let target = temp_dir.path().join("library");
        touch(&source.join("a.flac"), b"a");
        touch(&source.join("z_locked").join("b.flac"), b"b");
        fs::create_dir_all(&target).unwrap();

        let locked = source.join("z_locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(&locked).is_ok() {
            // Permissions are not enforced (running as root)
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let result = AlbumReplicator::new().replicate(&source, &target);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(matches!(result, Err(Error::AlbumRead { .. })));
        assert!(!target.join("A").exists());
        assert!(source.join("a.flac").exists());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_cross_device_link_rolls_back() {
        use std::os::unix::fs::MetadataExt;

        // tmpfs under /dev/shm is a separate volume from the temp dir on most hosts
        let shm = Path::new("/dev/shm");
        if !shm.is_dir() {
            return;
        }
        let source_root = TempDir::new_in(shm).unwrap();
        let target_root = TempDir::new().unwrap();
        let source_dev = fs::metadata(source_root.path()).unwrap().dev();
        let target_dev = fs::metadata(target_root.path()).unwrap().dev();
        if source_dev == target_dev {
            return;
        }

        let source = source_root.path().join("A");
        touch(&source.join("CD1").join("01.flac"), b"1");
        touch(&source.join("x.flac"), b"x");

        let result = AlbumReplicator::new().replicate(&source, target_root.path());

        match result {
            Err(err @ Error::Link { .. }) => {
                assert!(err.is_cross_device());
                assert_eq!(err.exit_code(), 5);
            }
            other => panic!("expected Link error, got {other:?}"),
        }
        assert!(!target_root.path().join("A").exists());
        assert!(source.join("x.flac").exists());
    }
}
