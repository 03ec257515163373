//! Observable sync status
//!
//! Published through a `watch` channel so UIs can show a spinner and a
//! non-blocking error line.

use chrono::{DateTime, Utc};

/// Current sync status
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStatus {
    /// A reconciliation run is active
    pub is_syncing: bool,
    /// Last remote failure, cleared by the next confirmed write or sync
    pub error: Option<String>,
    /// When the remote last confirmed our state
    pub last_synced_at: Option<DateTime<Utc>>,
}

/// Outcome of a `sync()` request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncRun {
    /// A reconciliation ran to completion (successfully or not)
    Completed(crate::models::SyncOutcome),
    /// Another run held the lock; this call did nothing
    AlreadyInFlight,
    /// No signed-in user; sync is disabled
    NotAuthenticated,
}

impl SyncRun {
    /// The outcome, if a run actually happened
    pub fn outcome(&self) -> Option<&crate::models::SyncOutcome> {
        match self {
            SyncRun::Completed(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome().is_some_and(|o| o.success)
    }
}
