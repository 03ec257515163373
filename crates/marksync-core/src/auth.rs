//! Authentication context
//!
//! Sign-in happens outside this crate; the sync engine only needs a stable
//! user id and whether it may talk to the remote service.

use serde::{Deserialize, Serialize};

/// Who the bookmarks belong to, as seen by the remote service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: String,
    pub is_authenticated: bool,
}

impl AuthContext {
    /// A signed-in user
    pub fn authenticated(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            is_authenticated: true,
        }
    }

    /// No user; sync is disabled
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// The user id to sync as, if sync is allowed
    pub fn sync_user(&self) -> Option<&str> {
        (self.is_authenticated && !self.user_id.is_empty()).then_some(self.user_id.as_str())
    }
}
