//! marksync Core Library
//!
//! This crate provides the core functionality for marksync, an offline-first
//! bookmark service that keeps a local set of bookmarked ids in step with a
//! remote per-user copy.
//!
//! # Architecture
//!
//! - **Local store**: source of truth for the UI, always updated first
//! - **Pending operations**: durable log of mutations not yet confirmed remotely
//! - **Sync engine**: union-then-replay reconciliation against the remote
//!
//! Reads never touch storage or network; every mutation is visible
//! immediately and reaches the remote eventually.
//!
//! # Quick Start
//!
//! ```text
//! let store = LocalStore::new(Arc::new(FileBlobStore::new(config.data_dir.clone())));
//! let bookmarks = Bookmarks::init(store, remote, Arc::new(config.tier), config.auth(),
//!     BookmarksOptions::from_config(&config)).await;
//!
//! bookmarks.toggle("venue77").await?;
//! bookmarks.sync().await;
//! bookmarks.dispose().await;
//! ```
//!
//! # Modules
//!
//! - `bookmarks`: Bookmark facade (main entry point)
//! - `models`: Bookmark ids, sets and pending operations
//! - `migration`: Legacy composite id rewriting
//! - `queue`: Pending-operation log and replay
//! - `storage`: Blob stores and the local bookmark store
//! - `sync`: Reconciliation engine and sync status
//! - `remote`: Remote bookmark service (HTTP)
//! - `tier`: Bookmark quotas
//! - `config`: Application configuration

pub mod auth;
pub mod bookmarks;
pub mod config;
pub mod migration;
pub mod models;
pub mod queue;
pub mod remote;
pub mod storage;
pub mod sync;
pub mod tier;

pub use auth::AuthContext;
pub use bookmarks::{BookmarkError, Bookmarks, BookmarksOptions, WriteHandle, WriteOutcome};
pub use config::Config;
pub use models::{BookmarkId, BookmarkSet, OperationKind, PendingOperation, SyncOutcome};
pub use queue::OperationQueue;
pub use remote::{HttpRemote, OfflineRemote, RemoteBookmarkService};
pub use storage::{BlobStore, FileBlobStore, LocalStore, MemoryBlobStore, StorageError};
pub use sync::{SyncRun, SyncStatus};
pub use tier::{FixedQuota, Tier, TierGate};
