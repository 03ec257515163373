//! Storage layer
//!
//! Handles durable persistence of the bookmark set and pending operations.
//!
//! ## Architecture
//!
//! - **BlobStore**: opaque string-keyed persistence (files, or memory in tests)
//! - **LocalStore**: JSON encoding, legacy id migration on load
//!
//! Storage failures are reported as [`StorageError`]; the bookmark facade
//! logs them and keeps serving its in-memory state.

pub mod blob;
pub mod error;
pub mod local;

pub use blob::{BlobStore, FileBlobStore, MemoryBlobStore};
pub use error::{StorageError, StorageResult};
pub use local::LocalStore;
