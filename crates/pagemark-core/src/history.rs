//! Linear undo/redo history.
//!
//! The log stores opaque committed states in chronological order together
//! with a cursor pointing at the state that is currently visible. Pushing
//! while the cursor is behind the newest entry drops everything after the
//! cursor: there is no branching history.

use serde::{Deserialize, Serialize};

/// Derived view of a [`HistoryLog`], suitable for driving UI state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HistoryStatus {
    /// Whether [`HistoryLog::undo`] would return an entry.
    pub can_undo: bool,
    /// Whether [`HistoryLog::redo`] would return an entry.
    pub can_redo: bool,
    /// Number of stored entries.
    pub len: usize,
    /// Cursor position (`None` while the log is empty).
    pub cursor: Option<usize>,
    /// Mutation counter at the time the status was taken.
    pub revision: u64,
}

/// A linear log of committed states with an undo/redo cursor.
#[derive(Debug, Clone)]
pub struct HistoryLog<S> {
    entries: Vec<S>,
    /// `None` stands for "nothing committed".
    cursor: Option<usize>,
    /// Maximum number of retained entries (`None` = unbounded).
    limit: Option<usize>,
    revision: u64,
}

impl<S> Default for HistoryLog<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> HistoryLog<S> {
    /// Create an empty, unbounded log.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            cursor: None,
            limit: None,
            revision: 0,
        }
    }

    /// Create an empty log that keeps at most `limit` entries.
    ///
    /// Once full, every push evicts the oldest entry. A limit of zero is
    /// treated as one.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit.max(1)),
            ..Self::new()
        }
    }

    /// Commit a new state.
    ///
    /// Entries after the cursor are discarded first, then `state` becomes
    /// the newest entry and the cursor moves onto it.
    pub fn push(&mut self, state: S) {
        let keep = self.cursor.map_or(0, |c| c + 1);
        let dropped = self.entries.len() - keep;
        if dropped > 0 {
            log::trace!("history: discarding {dropped} redo entries");
        }
        self.entries.truncate(keep);
        self.entries.push(state);

        if let Some(limit) = self.limit {
            if self.entries.len() > limit {
                let excess = self.entries.len() - limit;
                self.entries.drain(..excess);
                log::trace!("history: evicted {excess} oldest entries");
            }
        }

        self.cursor = Some(self.entries.len() - 1);
        self.revision += 1;
        log::debug!(
            "history: pushed entry {} of {}",
            self.entries.len() - 1,
            self.entries.len()
        );
    }

    /// Step back one entry and return it.
    ///
    /// Returns `None` and leaves the log untouched when there is nothing to
    /// undo.
    pub fn undo(&mut self) -> Option<&S> {
        match self.cursor {
            Some(c) if c > 0 => {
                self.cursor = Some(c - 1);
                self.revision += 1;
                log::debug!("history: undo to entry {}", c - 1);
                self.entries.get(c - 1)
            }
            _ => None,
        }
    }

    /// Step forward one entry and return it.
    ///
    /// Returns `None` and leaves the log untouched when there is nothing to
    /// redo.
    pub fn redo(&mut self) -> Option<&S> {
        if !self.can_redo() {
            return None;
        }
        let next = self.cursor.map_or(0, |c| c + 1);
        self.cursor = Some(next);
        self.revision += 1;
        log::debug!("history: redo to entry {next}");
        self.entries.get(next)
    }

    /// Drop every entry and reset the cursor.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
        self.revision += 1;
        log::debug!("history: cleared");
    }

    /// `true` when the cursor is past the first entry.
    pub fn can_undo(&self) -> bool {
        matches!(self.cursor, Some(c) if c > 0)
    }

    /// `true` when entries exist after the cursor.
    pub fn can_redo(&self) -> bool {
        match self.cursor {
            Some(c) => c + 1 < self.entries.len(),
            None => !self.entries.is_empty(),
        }
    }

    /// The entry representing the current visible state.
    pub fn current(&self) -> Option<&S> {
        self.cursor.and_then(|c| self.entries.get(c))
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Counter bumped by every mutation (push, successful undo/redo, clear).
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// All stored entries, oldest first.
    pub fn entries(&self) -> &[S] {
        &self.entries
    }

    /// Snapshot of the derived flags.
    pub fn status(&self) -> HistoryStatus {
        HistoryStatus {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            len: self.entries.len(),
            cursor: self.cursor,
            revision: self.revision,
        }
    }
}
