//! Snapshot-based undo/redo history.
//!
//! The history is a linear sequence of [`DiagramSnapshot`]s with a cursor.
//! Every completed mutation records exactly one snapshot; undo and redo move
//! the cursor and hand back a snapshot for the model to adopt wholesale.
//! Recording after an undo discards the abandoned redo branch, and the
//! sequence is pruned from the front once it exceeds its capacity.
//!
//! Snapshots are structural clones holding no references into the live model,
//! so "current" and "historical" state can never alias each other.

use crate::model::DiagramSnapshot;

/// Default maximum number of retained snapshots.
pub const MAX_HISTORY: usize = 50;

/// Ordered snapshot sequence with a cursor.
///
/// `can_undo` holds when the cursor is past the first snapshot, `can_redo`
/// when it is before the last. The first recorded snapshot is expected to be
/// the empty diagram at session start, so undoing the first real edit always
/// lands on a defined state.
#[derive(Debug, Clone)]
pub struct History {
    snapshots: Vec<DiagramSnapshot>,
    cursor: usize,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(MAX_HISTORY)
    }
}

impl History {
    /// Create an empty history with the given snapshot capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            snapshots: Vec::new(),
            cursor: 0,
            capacity,
        }
    }

    /// Append a snapshot of the just-completed mutation and advance the
    /// cursor to it. Any snapshots after the current cursor (an undone redo
    /// branch) are discarded first. When the sequence outgrows the capacity,
    /// the oldest snapshot is evicted and the cursor shifted so it still
    /// names the same logical snapshot.
    pub fn record(&mut self, snapshot: DiagramSnapshot) {
        if self.cursor + 1 < self.snapshots.len() {
            self.snapshots.truncate(self.cursor + 1);
        }
        self.snapshots.push(snapshot);
        self.cursor = self.snapshots.len() - 1;
        if self.snapshots.len() > self.capacity {
            self.snapshots.remove(0);
            self.cursor -= 1;
        }
    }

    /// Step the cursor back and return the snapshot to adopt, or `None` if
    /// already at the oldest state.
    pub fn undo(&mut self) -> Option<&DiagramSnapshot> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.snapshots.get(self.cursor)
    }

    /// Step the cursor forward and return the snapshot to adopt, or `None`
    /// if already at the newest state.
    pub fn redo(&mut self) -> Option<&DiagramSnapshot> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.snapshots.get(self.cursor)
    }

    /// True if there is an older snapshot to return to.
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    /// True if there is a newer snapshot to return to.
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    /// Number of retained snapshots.
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// True if nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// The snapshot the cursor currently points at, if any.
    pub fn current(&self) -> Option<&DiagramSnapshot> {
        self.snapshots.get(self.cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BlockKind, Diagram};

    /// Snapshot of a diagram containing `n` gain blocks.
    fn snap(n: usize) -> DiagramSnapshot {
        let mut diagram = Diagram::new();
        for _ in 0..n {
            diagram.create_block(BlockKind::Gain, 0.0, 0.0);
        }
        diagram.snapshot()
    }

    #[test]
    fn test_empty_history() {
        let mut history = History::new(MAX_HISTORY);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert!(history.undo().is_none());
        assert!(history.redo().is_none());
        assert!(history.is_empty());
    }

    #[test]
    fn test_record_then_undo_redo() {
        let mut history = History::new(MAX_HISTORY);
        history.record(snap(0)); // initial empty state
        history.record(snap(1));
        history.record(snap(2));
        assert_eq!(history.len(), 3);
        assert!(history.can_undo());
        assert!(!history.can_redo());

        assert_eq!(history.undo(), Some(&snap(1)));
        assert_eq!(history.undo(), Some(&snap(0)));
        assert!(history.undo().is_none());

        assert_eq!(history.redo(), Some(&snap(1)));
        assert_eq!(history.redo(), Some(&snap(2)));
        assert!(history.redo().is_none());
    }

    #[test]
    fn test_record_after_undo_discards_redo_branch() {
        let mut history = History::new(MAX_HISTORY);
        history.record(snap(0));
        history.record(snap(1));
        history.record(snap(2));
        history.undo();
        history.undo();
        history.record(snap(3));
        assert_eq!(history.len(), 2);
        assert!(!history.can_redo());
        assert_eq!(history.current(), Some(&snap(3)));
        assert_eq!(history.undo(), Some(&snap(0)));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = History::new(MAX_HISTORY);
        for n in 0..=MAX_HISTORY {
            history.record(snap(n));
        }
        // The 51st record evicted the oldest entry
        assert_eq!(history.len(), MAX_HISTORY);
        // Cursor still resolves to the latest logical snapshot
        assert_eq!(history.current(), Some(&snap(MAX_HISTORY)));
        assert!(!history.can_redo());
        // Undoing all the way down lands on snapshot 1, not 0
        let mut oldest = None;
        while history.can_undo() {
            oldest = history.undo().cloned();
        }
        assert_eq!(oldest, Some(snap(1)));
    }

    #[test]
    fn test_length_tracks_mutation_count() {
        let mut history = History::new(MAX_HISTORY);
        history.record(snap(0));
        for n in 1..=20 {
            history.record(snap(n));
            assert_eq!(history.len(), n + 1);
        }
    }
}
