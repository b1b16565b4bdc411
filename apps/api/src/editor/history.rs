#![allow(dead_code)]

//! Bounded undo/redo history over resume snapshots.
//!
//! Snapshots are whole-document clones, not inverse operations: every
//! accepted mutation records the prior snapshot, so undo is a plain swap and
//! can never half-apply. The undo side is capped; the oldest snapshot falls
//! off when the cap is hit. A new mutation after an undo clears the redo
//! side.

use std::collections::VecDeque;

use crate::document::Resume;

pub const DEFAULT_HISTORY_LIMIT: usize = 100;

#[derive(Debug)]
pub struct History {
    undo: VecDeque<Resume>,
    redo: Vec<Resume>,
    limit: usize,
}

impl History {
    pub fn new() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }

    pub fn with_limit(limit: usize) -> Self {
        History {
            undo: VecDeque::new(),
            redo: Vec::new(),
            limit,
        }
    }

    /// Records the snapshot that a mutation is about to replace.
    pub fn record(&mut self, prior: Resume) {
        self.undo.push_back(prior);
        if self.undo.len() > self.limit {
            self.undo.pop_front();
        }
        self.redo.clear();
    }

    /// Steps back one snapshot, parking `current` on the redo side.
    /// Returns `None` (and changes nothing) when there is nothing to undo.
    pub fn undo(&mut self, current: Resume) -> Option<Resume> {
        let prior = self.undo.pop_back()?;
        self.redo.push(current);
        Some(prior)
    }

    /// Steps forward one snapshot, parking `current` on the undo side.
    pub fn redo(&mut self, current: Resume) -> Option<Resume> {
        let next = self.redo.pop()?;
        self.undo.push_back(current);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    /// Drops all history. Called when the session switches documents.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Visibility;
    use chrono::Utc;
    use uuid::Uuid;

    fn snapshot(title: &str) -> Resume {
        Resume {
            id: Uuid::nil(),
            user_id: Uuid::nil(),
            title: title.to_string(),
            slug: title.to_string(),
            data: Default::default(),
            visibility: Visibility::Private,
            locked: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_empty_history_has_nothing_to_step() {
        let mut history = History::new();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert!(history.undo(snapshot("current")).is_none());
        assert!(history.redo(snapshot("current")).is_none());
    }

    #[test]
    fn test_undo_redo_round_trip() {
        let mut history = History::new();
        history.record(snapshot("v1"));

        let prior = history.undo(snapshot("v2")).unwrap();
        assert_eq!(prior.title, "v1");
        assert!(history.can_redo());

        let next = history.redo(prior).unwrap();
        assert_eq!(next.title, "v2");
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = History::new();
        history.record(snapshot("v1"));
        history.undo(snapshot("v2")).unwrap();
        assert_eq!(history.redo_depth(), 1);

        history.record(snapshot("v1b"));
        assert_eq!(history.redo_depth(), 0);
    }

    #[test]
    fn test_limit_drops_oldest() {
        let mut history = History::with_limit(3);
        for i in 0..5 {
            history.record(snapshot(&format!("v{i}")));
        }
        assert_eq!(history.undo_depth(), 3);

        // Oldest surviving snapshot is v2.
        let mut current = snapshot("current");
        let mut last = None;
        while let Some(prior) = history.undo(current) {
            current = prior.clone();
            last = Some(prior);
        }
        assert_eq!(last.unwrap().title, "v2");
    }

    #[test]
    fn test_clear_drops_both_sides() {
        let mut history = History::new();
        history.record(snapshot("v1"));
        history.undo(snapshot("v2")).unwrap();
        history.clear();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }
}
