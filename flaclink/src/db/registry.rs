//! Album fingerprint registry
//!
//! A single-file SQLite store with one table, `albums`, mapping an album's
//! fingerprint (BLOB primary key) to its directory name. BLOB keys compare
//! byte-wise, so `ORDER BY fingerprint` is key order.
//!
//! A `Registry` holds the store's exclusive lock for its whole lifetime.
//! The connection runs in SQLite's exclusive locking mode, so the write lock
//! taken at open is kept until the connection goes away. Call
//! [`Registry::close`] on the success path; dropping the handle on an error
//! path closes the connection and releases the lock as well.

use crate::models::{Album, Fingerprint};
use flaclink_common::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteLockingMode};
use sqlx::{Connection, SqliteConnection};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A stored `(fingerprint → name)` pair with its decoded content listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub name: String,
    pub contents: Vec<String>,
}

/// Open handle on the registry store
pub struct Registry {
    conn: SqliteConnection,
    path: PathBuf,
}

impl Registry {
    /// Open (creating if needed) the store at `path`
    ///
    /// Waits up to `lock_timeout` for exclusive access, then fails with
    /// `Error::StoreUnavailable`. Ensures the `albums` table exists.
    pub async fn open(path: &Path, lock_timeout: Duration) -> Result<Self> {
        let unavailable = |source: sqlx::Error| Error::StoreUnavailable {
            path: path.to_path_buf(),
            source,
        };

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .locking_mode(SqliteLockingMode::Exclusive)
            .busy_timeout(lock_timeout);

        let mut conn = SqliteConnection::connect_with(&options)
            .await
            .map_err(unavailable)?;

        sqlx::query("BEGIN EXCLUSIVE")
            .execute(&mut conn)
            .await
            .map_err(unavailable)?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS albums (
                fingerprint BLOB PRIMARY KEY NOT NULL,
                name TEXT NOT NULL
            ) WITHOUT ROWID
            "#,
        )
        .execute(&mut conn)
        .await
        .map_err(unavailable)?;

        sqlx::query("COMMIT")
            .execute(&mut conn)
            .await
            .map_err(unavailable)?;

        tracing::debug!("Opened album registry {}", path.display());

        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Close the connection and release the lock
    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        tracing::debug!("Closed album registry {}", self.path.display());
        Ok(())
    }

    /// True when an album with the same content listing is registered
    pub async fn contains(&mut self, album: &Album) -> Result<bool> {
        Ok(self.lookup(&album.fingerprint()?).await?.is_some())
    }

    /// Name stored under `fingerprint`, if any
    pub async fn lookup(&mut self, fingerprint: &Fingerprint) -> Result<Option<String>> {
        let name: Option<String> =
            sqlx::query_scalar("SELECT name FROM albums WHERE fingerprint = ?")
                .bind(fingerprint.as_bytes())
                .fetch_optional(&mut self.conn)
                .await?;

        Ok(name)
    }

    /// Register an album; an existing entry with the same fingerprint takes the new name
    pub async fn insert(&mut self, album: &Album) -> Result<()> {
        let fingerprint = album.fingerprint()?;

        sqlx::query(
            r#"
            INSERT INTO albums (fingerprint, name)
            VALUES (?, ?)
            ON CONFLICT(fingerprint) DO UPDATE SET name = excluded.name
            "#,
        )
        .bind(fingerprint.as_bytes())
        .bind(&album.name)
        .execute(&mut self.conn)
        .await?;

        Ok(())
    }

    /// Number of registered albums
    pub async fn len(&mut self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM albums")
            .fetch_one(&mut self.conn)
            .await?;
        Ok(count as u64)
    }

    pub async fn is_empty(&mut self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// All entries in key order, fingerprints decoded back to content listings
    pub async fn entries(&mut self) -> Result<Vec<RegistryEntry>> {
        let rows: Vec<(Vec<u8>, String)> =
            sqlx::query_as("SELECT fingerprint, name FROM albums ORDER BY fingerprint")
                .fetch_all(&mut self.conn)
                .await?;

        rows.into_iter()
            .map(|(key, name)| {
                let contents = Fingerprint::from_bytes(key).decode()?;
                Ok(RegistryEntry { name, contents })
            })
            .collect()
    }

    /// Visit every entry in key order
    pub async fn for_each<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(&RegistryEntry),
    {
        for entry in self.entries().await? {
            f(&entry);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const TIMEOUT: Duration = Duration::from_millis(100);

    fn album(name: &str, contents: &[&str]) -> Album {
        Album::new(name, contents.iter().copied())
    }

    #[tokio::test]
    async fn test_open_creates_store_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("albums.db");

        let mut registry = Registry::open(&path, TIMEOUT).await.unwrap();

        assert!(path.exists());
        assert!(registry.is_empty().await.unwrap());
        registry.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_insert_then_contains() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = Registry::open(&temp_dir.path().join("albums.db"), TIMEOUT)
            .await
            .unwrap();
        let a = album("A", &["x.flac", "y.flac"]);

        assert!(!registry.contains(&a).await.unwrap());
        registry.insert(&a).await.unwrap();
        assert!(registry.contains(&a).await.unwrap());

        // Same listing under another name is the same album
        assert!(registry.contains(&album("Copy of A", &["x.flac", "y.flac"])).await.unwrap());
        assert!(!registry.contains(&album("A", &["y.flac", "x.flac"])).await.unwrap());

        registry.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_insert_overwrites_name() {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = Registry::open(&temp_dir.path().join("albums.db"), TIMEOUT)
            .await
            .unwrap();

        registry.insert(&album("First", &["x.flac"])).await.unwrap();
        registry.insert(&album("Second", &["x.flac"])).await.unwrap();

        assert_eq!(registry.len().await.unwrap(), 1);
        let fp = Fingerprint::encode(&["x.flac".to_string()]).unwrap();
        assert_eq!(registry.lookup(&fp).await.unwrap().as_deref(), Some("Second"));

        registry.close().await.unwrap();
    }
}
