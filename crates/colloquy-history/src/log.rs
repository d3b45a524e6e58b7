//! Per-actor conversation log
//!
//! A log alternates initiator and responder lines. Appends may break the
//! alternation transiently; [`ConversationLog::enforce_invariants`] restores
//! it and trims the log to its bound.

use colloquy_core::Role;
use serde::{Deserialize, Serialize};

/// One line of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Side of the turn
    pub role: Role,
    /// Line text
    pub text: String,
}

impl HistoryEntry {
    /// Create an entry
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }
}

/// Ordered, bounded, role-alternating log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationLog {
    entries: Vec<HistoryEntry>,
}

impl ConversationLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line without enforcing anything
    pub fn push(&mut self, role: Role, text: impl Into<String>) {
        self.entries.push(HistoryEntry::new(role, text));
    }

    /// Collapse same-role neighbours, keeping the later line of each run,
    /// then drop the oldest lines until at most `max_entries` remain.
    pub fn enforce_invariants(&mut self, max_entries: usize) {
        let mut collapsed: Vec<HistoryEntry> = Vec::with_capacity(self.entries.len());
        for entry in self.entries.drain(..) {
            match collapsed.last_mut() {
                Some(last) if last.role == entry.role => *last = entry,
                _ => collapsed.push(entry),
            }
        }
        self.entries = collapsed;

        if self.entries.len() > max_entries {
            let excess = self.entries.len() - max_entries;
            self.entries.drain(..excess);
        }
    }

    /// Entries, oldest first
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Whether no two neighbours share a role
    pub fn is_alternating(&self) -> bool {
        self.entries.windows(2).all(|w| w[0].role != w[1].role)
    }
}
