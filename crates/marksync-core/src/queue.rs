//! Pending operation log
//!
//! Append-only record of bookmark mutations the remote service has not
//! confirmed yet. Replay is idempotent per id, so a plain FIFO is enough.

use crate::models::{BookmarkSet, PendingOperation};

/// Ordered log of unconfirmed mutations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationQueue {
    ops: Vec<PendingOperation>,
}

impl OperationQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a queue from a persisted log
    pub fn from_ops(ops: Vec<PendingOperation>) -> Self {
        Self { ops }
    }

    pub fn append(&mut self, op: PendingOperation) {
        self.ops.push(op);
    }

    /// Remove and return every entry
    pub fn drain_all(&mut self) -> Vec<PendingOperation> {
        std::mem::take(&mut self.ops)
    }

    /// Read-only view of the log
    pub fn peek_all(&self) -> &[PendingOperation] {
        &self.ops
    }

    /// Remove exactly the given entries (first match each), keeping anything
    /// appended since they were read. Returns how many were removed.
    pub fn acknowledge(&mut self, confirmed: &[PendingOperation]) -> usize {
        let mut removed = 0;
        for op in confirmed {
            if let Some(pos) = self.ops.iter().position(|queued| queued == op) {
                self.ops.remove(pos);
                removed += 1;
            }
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Apply the log to `set` in timestamp order
    pub fn replay(&self, set: BookmarkSet) -> BookmarkSet {
        replay(set, &self.ops)
    }
}

/// Apply `ops` to `set` in timestamp order (stable for equal timestamps)
pub fn replay(mut set: BookmarkSet, ops: &[PendingOperation]) -> BookmarkSet {
    let mut ordered: Vec<&PendingOperation> = ops.iter().collect();
    ordered.sort_by_key(|op| op.timestamp);

    for op in ordered {
        op.apply(&mut set);
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(ids: &[&str]) -> BookmarkSet {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_append_and_peek() {
        let mut queue = OperationQueue::new();
        queue.append(PendingOperation::add("a").at(1));
        queue.append(PendingOperation::remove("b").at(2));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.peek_all()[0].id.as_str(), "a");
        assert_eq!(queue.peek_all()[1].id.as_str(), "b");
    }

    #[test]
    fn test_drain_all_empties_queue() {
        let mut queue = OperationQueue::new();
        queue.append(PendingOperation::add("a").at(1));

        let drained = queue.drain_all();
        assert_eq!(drained.len(), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_acknowledge_keeps_newer_entries() {
        let mut queue = OperationQueue::new();
        queue.append(PendingOperation::add("a").at(1));
        queue.append(PendingOperation::remove("b").at(2));

        let snapshot = queue.peek_all().to_vec();
        queue.append(PendingOperation::add("c").at(3));

        assert_eq!(queue.acknowledge(&snapshot), 2);
        assert_eq!(queue.peek_all(), &[PendingOperation::add("c").at(3)]);

        // Acknowledging again is a no-op
        assert_eq!(queue.acknowledge(&snapshot), 0);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_acknowledge_removes_one_duplicate_per_entry() {
        let mut queue = OperationQueue::new();
        queue.append(PendingOperation::add("a").at(1));
        queue.append(PendingOperation::add("a").at(1));

        queue.acknowledge(&[PendingOperation::add("a").at(1)]);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_replay_uses_timestamp_order() {
        // Submitted out of order: the remove happened after the add
        let ops = vec![
            PendingOperation::remove("x").at(20),
            PendingOperation::add("x").at(10),
        ];
        assert_eq!(replay(set(&[]), &ops), set(&[]));

        let ops = vec![
            PendingOperation::add("x").at(20),
            PendingOperation::remove("x").at(10),
        ];
        assert_eq!(replay(set(&["x"]), &ops), set(&["x"]));
    }

    #[test]
    fn test_replay_is_noop_for_absent_and_present_ids() {
        let queue = OperationQueue::from_ops(vec![
            PendingOperation::add("a").at(1),
            PendingOperation::remove("missing").at(2),
        ]);
        assert_eq!(queue.replay(set(&["a", "b"])), set(&["a", "b"]));
    }
}
