//! Undo/redo over whole-document copies.
//!
//! Every undoable mutation pushes the pre-mutation document onto the past
//! stack. Undo moves the current document to the front of the future stack
//! and hands back the most recent past entry; redo does the reverse.

use std::collections::VecDeque;

use coverart_core::Document;
use tracing::debug;

/// Maximum undo entries kept by default
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// A saved document state with the action that replaced it
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub label: String,
    pub document: Document,
}

/// Bounded undo/redo stacks
#[derive(Debug, Clone)]
pub struct HistoryStack {
    /// Oldest first
    past: VecDeque<HistoryEntry>,
    /// Next redo first
    future: VecDeque<HistoryEntry>,
    limit: usize,
}

impl HistoryStack {
    pub fn new(limit: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: VecDeque::new(),
            limit,
        }
    }

    /// Save the state before a mutation. Clears redo history.
    pub fn push(&mut self, label: impl Into<String>, doc: &Document) {
        let label = label.into();
        debug!(%label, depth = self.past.len() + 1, "Pushing history entry");
        self.past.push_back(HistoryEntry {
            label,
            document: doc.clone(),
        });
        self.future.clear();

        while self.past.len() > self.limit {
            self.past.pop_front();
        }
    }

    /// Step back, returning the document to show. `current` becomes redoable.
    pub fn undo(&mut self, current: &Document) -> Option<Document> {
        let entry = self.past.pop_back()?;
        debug!(label = %entry.label, "Undo");
        self.future.push_front(HistoryEntry {
            label: entry.label.clone(),
            document: current.clone(),
        });
        Some(entry.document)
    }

    /// Step forward, returning the document to show. `current` becomes undoable.
    pub fn redo(&mut self, current: &Document) -> Option<Document> {
        let entry = self.future.pop_front()?;
        debug!(label = %entry.label, "Redo");
        self.past.push_back(HistoryEntry {
            label: entry.label.clone(),
            document: current.clone(),
        });
        while self.past.len() > self.limit {
            self.past.pop_front();
        }
        Some(entry.document)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.past.len()
    }

    pub fn redo_count(&self) -> usize {
        self.future.len()
    }

    /// Label of the action the next undo reverts
    pub fn undo_label(&self) -> Option<&str> {
        self.past.back().map(|e| e.label.as_str())
    }

    /// Label of the action the next redo reapplies
    pub fn redo_label(&self) -> Option<&str> {
        self.future.front().map(|e| e.label.as_str())
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}

impl Default for HistoryStack {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}
