//! The exit queue.
//!
//! Uses a `BTreeSet<(PriorityKey, ExitId)>` so that:
//! - the minimum is the oldest output still claimed (`first()`)
//! - iteration walks entries in settlement order, letting finalize plan a
//!   whole call before touching anything
//! - the exit id breaks any tie deterministically

use std::collections::BTreeSet;

use exitgame_types::{ExitId, PriorityKey};

/// Min-ordered queue of pending exits.
#[derive(Debug, Default, Clone)]
pub struct ExitQueue {
    entries: BTreeSet<(PriorityKey, ExitId)>,
}

impl ExitQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry. Returns `false` if it was already queued.
    pub fn insert(&mut self, priority: PriorityKey, exit_id: ExitId) -> bool {
        self.entries.insert((priority, exit_id))
    }

    /// Lowest-priority-key entry without removing it.
    #[must_use]
    pub fn peek_min(&self) -> Option<(PriorityKey, ExitId)> {
        self.entries.first().copied()
    }

    /// Remove and return the lowest-priority-key entry.
    pub fn pop_min(&mut self) -> Option<(PriorityKey, ExitId)> {
        self.entries.pop_first()
    }

    /// Entries in settlement order.
    pub fn iter(&self) -> impl Iterator<Item = (PriorityKey, ExitId)> + '_ {
        self.entries.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
