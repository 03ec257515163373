//! Local bookmark persistence
//!
//! Stores the bookmark set and the pending-operation log as JSON blobs:
//! - `bookmarks` - array of id strings
//! - `pending_bookmark_ops` - array of `{kind, id, timestamp}` records
//!
//! Legacy ids are migrated on load and the canonical set is written back
//! immediately, so migration only costs once. A blob that fails to parse is
//! copied to `<key>.corrupt` before the error is returned.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::blob::BlobStore;
use super::error::{StorageError, StorageResult};
use crate::migration;
use crate::models::{BookmarkSet, PendingOperation};

/// Blob key for the bookmark set
pub const BOOKMARKS_KEY: &str = "bookmarks";

/// Blob key for the pending-operation log
pub const PENDING_OPS_KEY: &str = "pending_bookmark_ops";

/// Suffix of the key an unreadable blob is copied to before it can be replaced
pub const CORRUPT_SUFFIX: &str = ".corrupt";

/// Persistence layer for bookmarks and pending operations
#[derive(Clone)]
pub struct LocalStore {
    blobs: Arc<dyn BlobStore>,
}

impl LocalStore {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    /// Load the bookmark set
    ///
    /// A missing blob loads as empty. Ids are migrated and deduplicated; if that
    /// changed anything the canonical set is persisted before returning.
    pub async fn load_bookmarks(&self) -> StorageResult<BookmarkSet> {
        let raw_ids: Vec<String> = self.read_json(BOOKMARKS_KEY).await?.unwrap_or_default();

        let migrated = migration::migrate(&raw_ids);
        let changed = migrated != raw_ids;
        let set: BookmarkSet = migrated.into_iter().collect();

        if changed || set.len() != raw_ids.len() {
            info!(
                "Normalized stored bookmarks: {} raw ids -> {} canonical",
                raw_ids.len(),
                set.len()
            );
            // A failed rewrite only means migration runs again next load
            if let Err(e) = self.save(&set).await {
                warn!("Failed to persist migrated bookmarks: {}", e);
            }
        }

        debug!("Loaded {} bookmarks", set.len());
        Ok(set)
    }

    /// Load the pending-operation log
    ///
    /// Independent of [`load_bookmarks`](Self::load_bookmarks): one unreadable
    /// blob never hides the other.
    pub async fn load_pending_ops(&self) -> StorageResult<Vec<PendingOperation>> {
        let ops: Vec<PendingOperation> =
            self.read_json(PENDING_OPS_KEY).await?.unwrap_or_default();
        debug!("Loaded {} pending operations", ops.len());
        Ok(ops)
    }

    /// Overwrite the persisted bookmark set
    pub async fn save(&self, ids: &BookmarkSet) -> StorageResult<()> {
        self.write_json(BOOKMARKS_KEY, ids).await
    }

    /// Overwrite the persisted pending-operation log
    pub async fn save_pending_ops(&self, ops: &[PendingOperation]) -> StorageResult<()> {
        self.write_json(PENDING_OPS_KEY, ops).await
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        &self,
        key: &str,
    ) -> StorageResult<Option<T>> {
        let Some(content) = self.blobs.get(key).await? else {
            return Ok(None);
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        match serde_json::from_str(&content) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                self.quarantine(key, &content).await;
                Err(StorageError::InvalidFormat {
                    key: key.to_string(),
                    details: e.to_string(),
                })
            }
        }
    }

    /// Keep a copy of unreadable content so later saves cannot destroy it
    async fn quarantine(&self, key: &str, content: &str) {
        let backup = format!("{}{}", key, CORRUPT_SUFFIX);
        match self.blobs.set(&backup, content).await {
            Ok(()) => warn!("Unreadable '{}' copied to '{}'", key, backup),
            Err(e) => warn!("Failed to keep a copy of unreadable '{}': {}", key, e),
        }
    }

    async fn write_json<T: serde::Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> StorageResult<()> {
        let json = serde_json::to_string(value).map_err(|e| StorageError::Serialize {
            key: key.to_string(),
            source: e,
        })?;
        self.blobs.set(key, &json).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OperationKind;
    use crate::storage::blob::{FileBlobStore, MemoryBlobStore};
    use tempfile::TempDir;

    fn memory_store() -> (Arc<MemoryBlobStore>, LocalStore) {
        let blobs = Arc::new(MemoryBlobStore::new());
        let store = LocalStore::new(blobs.clone());
        (blobs, store)
    }

    #[tokio::test]
    async fn test_load_empty() {
        let (_, store) = memory_store();

        assert!(store.load_bookmarks().await.unwrap().is_empty());
        assert!(store.load_pending_ops().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let (_, store) = memory_store();

        let set: BookmarkSet = ["a", "b"].into_iter().collect();
        store.save(&set).await.unwrap();
        store
            .save_pending_ops(&[PendingOperation::remove("c").at(5)])
            .await
            .unwrap();

        assert_eq!(store.load_bookmarks().await.unwrap(), set);
        let ops = store.load_pending_ops().await.unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].kind, OperationKind::Remove);
        assert_eq!(ops[0].id.as_str(), "c");
        assert_eq!(ops[0].timestamp, 5);
    }

    #[tokio::test]
    async fn test_load_migrates_and_rewrites() {
        let (blobs, store) = memory_store();
        blobs.insert(
            BOOKMARKS_KEY,
            r#"["venue77_0123456789abcdef_4","venue77","unknown_0123456789abcdef_1"]"#,
        );

        let set = store.load_bookmarks().await.unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains("venue77"));
        assert!(set.contains("unknown_0123456789abcdef_1"));

        // Persisted form is canonical now
        let stored = blobs.value(BOOKMARKS_KEY).unwrap();
        assert_eq!(stored, r#"["unknown_0123456789abcdef_1","venue77"]"#);
    }

    #[tokio::test]
    async fn test_load_does_not_rewrite_canonical_data() {
        let (blobs, store) = memory_store();
        blobs.insert(BOOKMARKS_KEY, r#"["b","a"]"#);
        blobs.set_fail_writes(true);

        // No write is attempted, so disabled writes are irrelevant
        let set = store.load_bookmarks().await.unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(blobs.value(BOOKMARKS_KEY).unwrap(), r#"["b","a"]"#);
    }

    #[tokio::test]
    async fn test_load_survives_failed_migration_rewrite() {
        let (blobs, store) = memory_store();
        blobs.insert(BOOKMARKS_KEY, r#"["venue77_0123456789abcdef_4"]"#);
        blobs.set_fail_writes(true);

        let set = store.load_bookmarks().await.unwrap();
        assert!(set.contains("venue77"));
    }

    #[tokio::test]
    async fn test_load_rejects_corrupt_blob() {
        let (blobs, store) = memory_store();
        blobs.insert(BOOKMARKS_KEY, "{not json");

        let err = store.load_bookmarks().await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidFormat { .. }));

        // The original is untouched and a copy is kept aside
        assert_eq!(blobs.value(BOOKMARKS_KEY).unwrap(), "{not json");
        assert_eq!(blobs.value("bookmarks.corrupt").unwrap(), "{not json");
    }

    #[tokio::test]
    async fn test_corrupt_pending_ops_do_not_hide_bookmarks() {
        let (blobs, store) = memory_store();
        blobs.insert(BOOKMARKS_KEY, r#"["a","b"]"#);
        blobs.insert(PENDING_OPS_KEY, "garbage");

        let set = store.load_bookmarks().await.unwrap();
        assert_eq!(set, ["a", "b"].into_iter().collect());

        let err = store.load_pending_ops().await.unwrap_err();
        assert!(
            matches!(err, StorageError::InvalidFormat { ref key, .. } if key == PENDING_OPS_KEY)
        );
        assert_eq!(
            blobs.value("pending_bookmark_ops.corrupt").unwrap(),
            "garbage"
        );
        assert_eq!(blobs.value(BOOKMARKS_KEY).unwrap(), r#"["a","b"]"#);
    }

    #[tokio::test]
    async fn test_save_propagates_storage_error() {
        let (blobs, store) = memory_store();
        blobs.set_fail_writes(true);

        let set: BookmarkSet = ["a"].into_iter().collect();
        assert!(store.save(&set).await.is_err());
    }

    #[tokio::test]
    async fn test_persists_across_reopens() {
        let temp_dir = TempDir::new().unwrap();

        {
            let store = LocalStore::new(Arc::new(FileBlobStore::new(temp_dir.path())));
            let set: BookmarkSet = ["x", "y"].into_iter().collect();
            store.save(&set).await.unwrap();
            store
                .save_pending_ops(&[PendingOperation::add("z").at(1)])
                .await
                .unwrap();
        }

        let store = LocalStore::new(Arc::new(FileBlobStore::new(temp_dir.path())));
        let set = store.load_bookmarks().await.unwrap();
        let ops = store.load_pending_ops().await.unwrap();
        assert_eq!(set, ["x", "y"].into_iter().collect());
        assert_eq!(ops, vec![PendingOperation::add("z").at(1)]);
    }
}
