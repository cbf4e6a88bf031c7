//! # Calculation History
//!
//! Completed binary operations, most recent first, capped at
//! [`HISTORY_LIMIT`] entries. Operand adoption and failed operations never
//! produce an entry.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::HISTORY_LIMIT;

/// One completed operation. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Unique id (stable across session save/load)
    pub id: Uuid,

    /// `"<left> <op> <right>"`, e.g. `"5 + 3"`
    pub expression: String,

    /// Rounded and clamped result
    pub result: f64,

    /// When the operation completed
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(expression: impl Into<String>, result: f64) -> Self {
        HistoryEntry {
            id: Uuid::new_v4(),
            expression: expression.into(),
            result,
            timestamp: Utc::now(),
        }
    }
}

/// Bounded, most-recent-first history.
#[derive(Debug, Clone, Default)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        History::default()
    }

    /// Rebuild from entries already ordered most recent first.
    ///
    /// Anything past the limit is dropped.
    pub fn from_entries(entries: impl IntoIterator<Item = HistoryEntry>) -> Self {
        History {
            entries: entries.into_iter().take(HISTORY_LIMIT).collect(),
        }
    }

    /// Prepend an entry, dropping the oldest past the limit.
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(HISTORY_LIMIT);
    }

    /// Owned copy, most recent first
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_is_most_recent_first() {
        let mut history = History::new();
        history.push(HistoryEntry::new("1 + 1", 2.0));
        history.push(HistoryEntry::new("2 + 2", 4.0));

        let entries = history.entries();
        assert_eq!(entries[0].expression, "2 + 2");
        assert_eq!(entries[1].expression, "1 + 1");
        assert_eq!(entries[0].result, 4.0);
    }

    #[test]
    fn test_bounded_at_limit() {
        let mut history = History::new();
        for i in 0..(HISTORY_LIMIT + 5) {
            history.push(HistoryEntry::new(format!("{} + 0", i), i as f64));
        }

        assert_eq!(history.len(), HISTORY_LIMIT);
        let entries = history.entries();
        assert_eq!(entries[0].result, (HISTORY_LIMIT + 4) as f64);
        assert_eq!(entries[HISTORY_LIMIT - 1].result, 5.0);
    }

    #[test]
    fn test_from_entries_truncates() {
        let entries: Vec<_> = (0..60).map(|i| HistoryEntry::new("x", i as f64)).collect();
        let history = History::from_entries(entries);
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history.entries()[0].result, 0.0);
    }

    #[test]
    fn test_entries_are_copies() {
        let mut history = History::new();
        history.push(HistoryEntry::new("1 + 1", 2.0));
        let mut copy = history.entries();
        copy.clear();
        assert_eq!(history.len(), 1);

        history.clear();
        assert!(history.is_empty());
    }
}
