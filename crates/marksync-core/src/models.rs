//! Data models for marksync
//!
//! Defines the core data structures: bookmark ids, the bookmark set,
//! pending operations and sync outcomes.

use std::borrow::Borrow;
use std::collections::btree_set::{self, BTreeSet};
use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// An opaque identifier for a bookmarked entity
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookmarkId(String);

impl BookmarkId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BookmarkId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for BookmarkId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl Borrow<str> for BookmarkId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// The set of saved bookmark ids
///
/// Order carries no meaning; an ordered set is used only so the
/// serialized form is stable across saves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookmarkSet(BTreeSet<BookmarkId>);

impl BookmarkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    /// Insert an id, returning `true` if it was not already present
    pub fn insert(&mut self, id: BookmarkId) -> bool {
        self.0.insert(id)
    }

    /// Remove an id, returning `true` if it was present
    pub fn remove(&mut self, id: &str) -> bool {
        self.0.remove(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> btree_set::Iter<'_, BookmarkId> {
        self.0.iter()
    }

    /// Set union, consuming `self`
    pub fn union(mut self, other: &BookmarkSet) -> BookmarkSet {
        self.0.extend(other.0.iter().cloned());
        self
    }

    /// Ids as plain strings (for persistence and the wire)
    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(|id| id.as_str().to_string()).collect()
    }
}

impl FromIterator<BookmarkId> for BookmarkSet {
    fn from_iter<I: IntoIterator<Item = BookmarkId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a str> for BookmarkSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(BookmarkId::from).collect())
    }
}

impl FromIterator<String> for BookmarkSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().map(BookmarkId::from).collect())
    }
}

impl IntoIterator for BookmarkSet {
    type Item = BookmarkId;
    type IntoIter = btree_set::IntoIter<BookmarkId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a BookmarkSet {
    type Item = &'a BookmarkId;
    type IntoIter = btree_set::Iter<'a, BookmarkId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Kind of a pending mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Add,
    Remove,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Add => write!(f, "add"),
            OperationKind::Remove => write!(f, "remove"),
        }
    }
}

/// A mutation that has not yet been confirmed by the remote service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingOperation {
    pub kind: OperationKind,
    pub id: BookmarkId,
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
}

impl PendingOperation {
    /// Create an operation stamped with the current time
    pub fn new(kind: OperationKind, id: BookmarkId) -> Self {
        Self {
            kind,
            id,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn add(id: impl Into<BookmarkId>) -> Self {
        Self::new(OperationKind::Add, id.into())
    }

    pub fn remove(id: impl Into<BookmarkId>) -> Self {
        Self::new(OperationKind::Remove, id.into())
    }

    /// Use a specific timestamp (for replaying stored logs and tests)
    pub fn at(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Apply this operation to a set. Both kinds are idempotent.
    pub fn apply(&self, set: &mut BookmarkSet) {
        match self.kind {
            OperationKind::Add => {
                set.insert(self.id.clone());
            }
            OperationKind::Remove => {
                set.remove(self.id.as_str());
            }
        }
    }
}

/// Result of a single reconciliation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub success: bool,
    pub final_set: BookmarkSet,
    pub error: Option<String>,
}

impl SyncOutcome {
    pub fn succeeded(final_set: BookmarkSet) -> Self {
        Self {
            success: true,
            final_set,
            error: None,
        }
    }

    pub fn failed(final_set: BookmarkSet, error: impl Into<String>) -> Self {
        Self {
            success: false,
            final_set,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bookmark_set_deduplicates() {
        let set: BookmarkSet = ["a", "b", "a"].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert!(set.contains("a"));
        assert!(set.contains("b"));
    }

    #[test]
    fn test_union() {
        let local: BookmarkSet = ["A", "B"].into_iter().collect();
        let remote: BookmarkSet = ["B", "C"].into_iter().collect();

        let merged = local.union(&remote);
        assert_eq!(merged, ["A", "B", "C"].into_iter().collect());
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut set = BookmarkSet::new();
        let add = PendingOperation::add("x");
        add.apply(&mut set);
        add.apply(&mut set);
        assert_eq!(set.len(), 1);

        let remove = PendingOperation::remove("x");
        remove.apply(&mut set);
        remove.apply(&mut set);
        assert!(set.is_empty());
    }

    #[test]
    fn test_pending_operation_serialization() {
        let op = PendingOperation::add("org_42").at(1_700_000_000_000);
        let json = serde_json::to_string(&op).unwrap();
        assert_eq!(
            json,
            r#"{"kind":"add","id":"org_42","timestamp":1700000000000}"#
        );

        let parsed: PendingOperation = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, op);
    }

    #[test]
    fn test_set_serializes_as_plain_array() {
        let set: BookmarkSet = ["b", "a"].into_iter().collect();
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["a","b"]"#);
    }
}
