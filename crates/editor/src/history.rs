// Chunk: docs/chunks/command_history - Command history
//!
//! Command history.
//!
//! The editor walks history through [`HistorySource`] and only remembers an
//! index into it; the list itself belongs to the shell.

use std::collections::VecDeque;

/// Read access to previously entered lines, oldest first.
pub trait HistorySource {
    fn len(&self) -> usize;

    fn entry(&self, index: usize) -> Option<&str>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Default history capacity.
pub const DEFAULT_HISTORY_CAPACITY: usize = 500;

/// A bounded list of entered lines.
///
/// Blank lines are not recorded and an entry equal to the most recent one is
/// not repeated. When full, the oldest entry is dropped.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<String>,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, line: &str) {
        if line.trim().is_empty() {
            return;
        }
        if self.entries.back().is_some_and(|last| last == line) {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(line.to_string());
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }
}

impl FromIterator<String> for History {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut history = History::new();
        for line in iter {
            history.push(&line);
        }
        history
    }
}

impl HistorySource for History {
    fn len(&self) -> usize {
        self.entries.len()
    }

    fn entry(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }
}

/// Where Up moves from `cursor`: the newest entry first, then older ones,
/// stopping at the oldest.
pub(crate) fn step_back(cursor: Option<usize>, len: usize) -> Option<usize> {
    match cursor {
        _ if len == 0 => None,
        None => Some(len - 1),
        Some(i) => Some(i.saturating_sub(1)),
    }
}

/// Where Down moves from `cursor`: towards newer entries, past the newest
/// onto an empty line.
pub(crate) fn step_forward(cursor: Option<usize>, len: usize) -> Option<usize> {
    match cursor {
        Some(i) if i + 1 < len => Some(i + 1),
        _ => None,
    }
}
