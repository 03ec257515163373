//! Key-value blob persistence
//!
//! The local store only needs an opaque string-keyed blob store. Two
//! implementations are provided:
//!
//! - [`FileBlobStore`]: one file per key under a data directory, written
//!   atomically (temp file, fsync, rename) so a partial write is never
//!   observable on the next load.
//! - [`MemoryBlobStore`]: in-process map, used by tests and embedders that
//!   bring their own persistence.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::error::{StorageError, StorageResult};

/// Opaque string-keyed blob store
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read the value stored under `key`, or `None` if absent
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Overwrite the value stored under `key`
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;
}

/// File-backed blob store
///
/// Files: `<data_dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file holding `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl BlobStore for FileBlobStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.path_for(key);

        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                Err(StorageError::PermissionDenied { path, source: e })
            }
            Err(e) => Err(StorageError::ReadError { path, source: e }),
        }
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        atomic_write(&self.path_for(key), value.as_bytes()).await
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
async fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| StorageError::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
    }

    // Same directory as the target so the rename stays on one filesystem
    let temp_path = path.with_extension("tmp");

    let mut file = fs::File::create(&temp_path)
        .await
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    file.write_all(data)
        .await
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;

    file.sync_all()
        .await
        .map_err(|e| StorageError::from_io(e, temp_path.clone()))?;
    drop(file);

    fs::rename(&temp_path, path)
        .await
        .map_err(|e| StorageError::AtomicWriteFailed {
            from: temp_path.clone(),
            to: path.to_path_buf(),
            source: e,
        })?;

    Ok(())
}

/// In-memory blob store
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value directly, bypassing failure injection
    pub fn insert(&self, key: &str, value: impl Into<String>) {
        self.lock().insert(key.to_string(), value.into());
    }

    /// Read a value directly
    pub fn value(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    /// Make subsequent `set` calls fail (simulates a full or read-only disk)
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map still holds consistent strings
        self.blobs.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(format!(
                "writes disabled for '{}'",
                key
            )));
        }
        self.insert(key, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_store_missing_key() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileBlobStore::new(temp_dir.path());

        assert!(store.get("bookmarks").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_store_roundtrip_and_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileBlobStore::new(temp_dir.path());

        store.set("bookmarks", r#"["a"]"#).await.unwrap();
        store.set("bookmarks", r#"["a","b"]"#).await.unwrap();

        assert_eq!(
            store.get("bookmarks").await.unwrap().as_deref(),
            Some(r#"["a","b"]"#)
        );
        // Temp file is renamed away
        assert!(!store.path_for("bookmarks").with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_atomic_write_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b").join("c");
        let store = FileBlobStore::new(&nested);

        store.set("pending_bookmark_ops", "[]").await.unwrap();

        assert!(nested.join("pending_bookmark_ops.json").exists());
    }

    #[tokio::test]
    async fn test_file_store_write_into_file_path_fails() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not-a-dir");
        std::fs::write(&blocker, "x").unwrap();

        let store = FileBlobStore::new(&blocker);
        let result = store.set("bookmarks", "[]").await;

        assert!(matches!(result, Err(StorageError::CreateDirectory { .. })));
    }

    #[tokio::test]
    async fn test_memory_store_failure_injection() {
        let store = MemoryBlobStore::new();
        store.set("k", "v1").await.unwrap();

        store.set_fail_writes(true);
        assert!(store.set("k", "v2").await.is_err());
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v1"));

        store.set_fail_writes(false);
        store.set("k", "v3").await.unwrap();
        assert_eq!(store.value("k").as_deref(), Some("v3"));
    }
}
