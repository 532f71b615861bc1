//! One-level directory listing
//!
//! Every scan in flaclink looks at exactly one directory level at a time and
//! relies on a stable entry order: byte-wise ascending by file name. Symbolic
//! links are reported as themselves and never followed.

use flaclink_common::{Error, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// An immediate child of a listed directory
#[derive(Debug, Clone)]
pub struct ListedEntry {
    /// Raw file name, used for target paths and fingerprints
    pub file_name: OsString,
    /// Display name (lossy for non UTF-8 names)
    pub name: String,
    pub path: PathBuf,
    /// True only for real directories, not symlinks to them
    pub is_dir: bool,
}

/// List the immediate entries of `dir`, sorted by file name
pub fn list_dir(dir: &Path) -> Result<Vec<ListedEntry>> {
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name();

    let mut entries = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
            Error::io(path, e.into())
        })?;

        entries.push(ListedEntry {
            file_name: entry.file_name().to_os_string(),
            name: entry.file_name().to_string_lossy().into_owned(),
            path: entry.path().to_path_buf(),
            is_dir: entry.file_type().is_dir(),
        });
    }

    Ok(entries)
}

/// List a top-level scan root; the root must be a readable directory
pub fn list_scan_root(root: &Path) -> Result<Vec<ListedEntry>> {
    let metadata = std::fs::metadata(root).map_err(|e| Error::io(root, e))?;
    if !metadata.is_dir() {
        return Err(Error::NotADirectory(root.to_path_buf()));
    }
    list_dir(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_entries_sorted_by_name() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("b.flac"), b"").unwrap();
        fs::create_dir(temp_dir.path().join("C")).unwrap();
        fs::write(temp_dir.path().join("a.flac"), b"").unwrap();

        let names: Vec<String> = list_dir(temp_dir.path())
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();

        // Byte order puts uppercase before lowercase
        assert_eq!(names, vec!["C", "a.flac", "b.flac"]);
    }

    #[test]
    fn test_only_immediate_entries_listed() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("CD1").join("deep")).unwrap();
        fs::write(temp_dir.path().join("CD1").join("t.flac"), b"").unwrap();

        let entries = list_dir(temp_dir.path()).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "CD1");
        assert!(entries[0].is_dir);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directory_is_not_a_directory() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join("real")).unwrap();
        std::os::unix::fs::symlink(temp_dir.path().join("real"), temp_dir.path().join("link"))
            .unwrap();

        let entries = list_dir(temp_dir.path()).unwrap();
        let link = entries.iter().find(|e| e.name == "link").unwrap();

        assert!(!link.is_dir);
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = list_dir(&temp_dir.path().join("missing"));

        assert!(matches!(result, Err(Error::Io { .. })));
    }

    #[test]
    fn test_scan_root_must_be_directory() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("not-a-dir");
        fs::write(&file, b"").unwrap();

        assert!(matches!(list_scan_root(&file), Err(Error::NotADirectory(_))));
        assert!(matches!(
            list_scan_root(&temp_dir.path().join("missing")),
            Err(Error::Io { .. })
        ));
    }
}
