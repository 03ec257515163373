//! Bookmark synchronization
//!
//! Reconciles the local bookmark set and pending-operation log against the
//! remote bookmark service.
//!
//! ## Usage
//!
//! ```ignore
//! let engine = SyncEngine::new(remote, Duration::from_secs(10));
//! if let Some(flight) = engine.begin_sync() {
//!     let outcome = flight.reconcile(user_id, &local, &pending).await;
//! }
//! ```

mod engine;
mod status;

pub use engine::{SyncEngine, SyncFlight, PUSH_FAILED};
pub use status::{SyncRun, SyncStatus};
