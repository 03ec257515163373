//! Bookmark reconciliation
//!
//! The engine is the only component that talks to the remote service. Every
//! remote exchange, including the push behind a single mutation, is a full
//! reconciliation run guarded by one single-flight lock: a caller that loses
//! the race is turned away, not queued.
//!
//! ## Reconciliation
//!
//! 1. Fetch remote ids (failure or timeout reads as empty)
//! 2. Remote empty but local not: treat the backend as unavailable or fresh
//!    and push local verbatim instead of wiping local state
//! 3. Otherwise `final = replay(local ∪ remote, pending)`
//! 4. Push `final` unless it already equals the remote set

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::status::SyncStatus;
use crate::models::{BookmarkId, BookmarkSet, PendingOperation, SyncOutcome};
use crate::queue;
use crate::remote::RemoteBookmarkService;

/// Error surfaced when the remote rejects or never receives our set
pub const PUSH_FAILED: &str = "Could not reach the bookmark server. Changes are saved locally and will sync later.";

/// Reconciles local bookmark state against the remote service
pub struct SyncEngine {
    remote: Arc<dyn RemoteBookmarkService>,
    timeout: Duration,
    in_flight: AtomicBool,
    status: watch::Sender<SyncStatus>,
}

impl SyncEngine {
    pub fn new(remote: Arc<dyn RemoteBookmarkService>, timeout: Duration) -> Self {
        let (status, _) = watch::channel(SyncStatus::default());
        Self {
            remote,
            timeout,
            in_flight: AtomicBool::new(false),
            status,
        }
    }

    pub fn status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    /// Try to start a reconciliation run
    ///
    /// Returns `None` while another run holds the lock.
    pub fn begin_sync(&self) -> Option<SyncFlight<'_>> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Reconciliation already in flight");
            return None;
        }

        self.status.send_modify(|s| s.is_syncing = true);
        Some(SyncFlight { engine: self })
    }

    /// Record a confirmed remote state
    pub fn record_success(&self) {
        self.status.send_modify(|s| {
            s.error = None;
            s.last_synced_at = Some(Utc::now());
        });
    }

    /// Record a non-blocking error for the UI
    pub fn record_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.status.send_modify(|s| s.error = Some(message));
    }
}

/// Holds the single-flight lock; released on drop, including unwinds
pub struct SyncFlight<'a> {
    engine: &'a SyncEngine,
}

impl SyncFlight<'_> {
    /// Run one reconciliation over snapshots of local state
    ///
    /// The caller adopts `final_set` and clears the replayed `pending`
    /// entries only when the outcome is successful.
    pub async fn reconcile(
        &self,
        user_id: &str,
        local: &BookmarkSet,
        pending: &[PendingOperation],
    ) -> SyncOutcome {
        let remote_ids = self.fetch(user_id).await;

        if remote_ids.is_empty() && !local.is_empty() {
            info!(
                "Remote returned no bookmarks, pushing {} local bookmarks",
                local.len()
            );
            return if self.push(user_id, local).await {
                SyncOutcome::succeeded(local.clone())
            } else {
                warn!("Bootstrap push failed; keeping local state");
                SyncOutcome::failed(local.clone(), PUSH_FAILED)
            };
        }

        let remote: BookmarkSet = remote_ids.into_iter().collect();
        let merged = local.clone().union(&remote);
        let final_set = queue::replay(merged, pending);

        if final_set == remote {
            debug!("Local and remote agree on {} bookmarks", final_set.len());
            return SyncOutcome::succeeded(final_set);
        }

        if self.push(user_id, &final_set).await {
            info!(
                "Synced {} bookmarks ({} pending operations applied)",
                final_set.len(),
                pending.len()
            );
            SyncOutcome::succeeded(final_set)
        } else {
            warn!("Push of reconciled bookmarks failed; keeping local state");
            SyncOutcome::failed(final_set, PUSH_FAILED)
        }
    }

    /// Replace the remote set. Timeouts count as failure.
    async fn push(&self, user_id: &str, ids: &BookmarkSet) -> bool {
        match tokio::time::timeout(self.engine.timeout, self.engine.remote.push(user_id, ids)).await
        {
            Ok(confirmed) => confirmed,
            Err(_) => {
                warn!("Remote push timed out after {:?}", self.engine.timeout);
                false
            }
        }
    }

    /// Fetch the remote set. Timeouts read as empty.
    async fn fetch(&self, user_id: &str) -> Vec<BookmarkId> {
        match tokio::time::timeout(self.engine.timeout, self.engine.remote.fetch(user_id)).await {
            Ok(ids) => ids,
            Err(_) => {
                warn!("Remote fetch timed out after {:?}", self.engine.timeout);
                Vec::new()
            }
        }
    }
}

impl Drop for SyncFlight<'_> {
    fn drop(&mut self) {
        self.engine.in_flight.store(false, Ordering::SeqCst);
        self.engine.status.send_modify(|s| s.is_syncing = false);
    }
}
