//! Tier-based bookmark quotas
//!
//! The quota source is external (subscription state lives elsewhere); this
//! crate only asks for the current cap.

use serde::{Deserialize, Serialize};

/// Quota value meaning "no cap"
pub const UNLIMITED: i64 = -1;

/// Bookmark cap on the free tier
pub const FREE_TIER_QUOTA: i64 = 10;

/// Read-only view of the user's bookmark quota
pub trait TierGate: Send + Sync {
    /// Maximum number of bookmarks, or [`UNLIMITED`]
    fn current_quota(&self) -> i64;
}

/// Subscription tiers known to the client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Pro,
}

impl Tier {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "free" => Some(Tier::Free),
            "pro" => Some(Tier::Pro),
            _ => None,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Free => write!(f, "free"),
            Tier::Pro => write!(f, "pro"),
        }
    }
}

impl TierGate for Tier {
    fn current_quota(&self) -> i64 {
        match self {
            Tier::Free => FREE_TIER_QUOTA,
            Tier::Pro => UNLIMITED,
        }
    }
}

/// A fixed quota, independent of any tier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedQuota(pub i64);

impl TierGate for FixedQuota {
    fn current_quota(&self) -> i64 {
        self.0
    }
}

/// Whether a set of `current` bookmarks may grow by one under `quota`
pub fn has_room(quota: i64, current: usize) -> bool {
    quota < 0 || (current as u64) < quota as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_quotas() {
        assert_eq!(Tier::Free.current_quota(), 10);
        assert_eq!(Tier::Pro.current_quota(), UNLIMITED);
        assert_eq!(FixedQuota(3).current_quota(), 3);
    }

    #[test]
    fn test_has_room() {
        assert!(has_room(10, 9));
        assert!(!has_room(10, 10));
        assert!(!has_room(0, 0));
        assert!(has_room(UNLIMITED, 100_000));
    }

    #[test]
    fn test_parse() {
        assert_eq!(Tier::parse("Pro"), Some(Tier::Pro));
        assert_eq!(Tier::parse("free"), Some(Tier::Free));
        assert_eq!(Tier::parse("gold"), None);
    }
}
