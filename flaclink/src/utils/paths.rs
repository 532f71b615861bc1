//! Lexical path cleaning for command-line arguments

use std::path::{Component, Path, PathBuf};

/// Clean a path without touching the filesystem
///
/// Drops `.` components and trailing separators, and folds `name/..` pairs.
/// `..` directly under the root stays at the root; leading `..` in a
/// relative path is kept. An empty result becomes `.`.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match cleaned.components().next_back() {
                Some(Component::Normal(_)) => {
                    cleaned.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => cleaned.push(".."),
            },
            other => cleaned.push(other.as_os_str()),
        }
    }

    if cleaned.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        cleaned
    }
}
