// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Line history with a browse cursor.
//!
//! The last slot is always a scratch entry holding whatever the user is
//! currently typing. Browsing with prev/next moves a position index over the
//! entries; edits made while parked on the scratch slot are saved back into it
//! before the position moves, so a half-typed line survives a round trip
//! through older entries.

use miette::Diagnostic;
use thiserror::Error;

use crate::{HISTORY_SIZE_MAX, ok};

/// Browse errors surface to the user as a bell, never as text.
#[derive(Debug, Eq, PartialEq, Error, Diagnostic)]
pub enum HistoryError {
    #[error("beginning of history")]
    AtBeginning,
    #[error("end of history")]
    AtEnd,
}

#[derive(Debug)]
pub struct History {
    /// Invariant: never empty; the last element is the scratch slot.
    entries: Vec<String>,
    /// Invariant: `position < entries.len()`.
    position: usize,
    max_size: usize,
}

impl Default for History {
    fn default() -> Self {
        Self {
            entries: vec![String::new()],
            position: 0,
            max_size: HISTORY_SIZE_MAX,
        }
    }
}

impl History {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Number of frozen entries (the scratch slot is not counted).
    #[must_use]
    pub fn len(&self) -> usize { self.entries.len() - 1 }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Cap the number of frozen entries, evicting the oldest on overflow. A cap
    /// of zero keeps just the scratch slot.
    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
        self.evict();
    }

    /// Freeze `line` as the most recent entry and start a fresh scratch slot.
    /// The browse position snaps to the scratch slot.
    pub fn add(&mut self, line: &str) {
        // Overwrite the scratch slot rather than pushing after it, so the
        // scratch stays last.
        let scratch = self.entries.len() - 1;
        line.clone_into(&mut self.entries[scratch]);
        self.entries.push(String::new());
        self.evict();
        self.position = self.entries.len() - 1;
    }

    /// Save the in-progress line into the scratch slot. No-op while browsing a
    /// frozen entry, so stale edits never clobber history.
    pub fn save_scratch(&mut self, line: &str) {
        let scratch = self.entries.len() - 1;
        if self.position == scratch {
            line.clone_into(&mut self.entries[scratch]);
        }
    }

    /// The entry under the browse position.
    #[must_use]
    pub fn current(&self) -> &str { &self.entries[self.position] }

    /// Step to the previous (older) entry.
    ///
    /// # Errors
    ///
    /// [`HistoryError::AtBeginning`] when already on the oldest entry.
    pub fn prev(&mut self) -> Result<(), HistoryError> {
        if self.position == 0 {
            return Err(HistoryError::AtBeginning);
        }
        self.position -= 1;
        ok!()
    }

    /// Step to the next (newer) entry.
    ///
    /// # Errors
    ///
    /// [`HistoryError::AtEnd`] when already on the scratch slot.
    pub fn next(&mut self) -> Result<(), HistoryError> {
        if self.position == self.entries.len() - 1 {
            return Err(HistoryError::AtEnd);
        }
        self.position += 1;
        ok!()
    }

    fn evict(&mut self) {
        while self.entries.len() - 1 > self.max_size {
            self.entries.remove(0);
        }
        if self.position >= self.entries.len() {
            self.position = self.entries.len() - 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_starts_with_empty_scratch() {
        let history = History::new();
        assert!(history.is_empty());
        assert_eq!(history.current(), "");
    }

    #[test]
    fn test_add_freezes_and_resets_position() {
        let mut history = History::new();
        history.add("first");
        history.add("second");

        assert_eq!(history.len(), 2);
        assert_eq!(history.current(), ""); // parked on the new scratch

        history.prev().unwrap();
        assert_eq!(history.current(), "second");
        history.prev().unwrap();
        assert_eq!(history.current(), "first");
    }

    #[test]
    fn test_prev_at_beginning_errors() {
        let mut history = History::new();
        history.add("only");
        history.prev().unwrap();
        let err = history.prev().unwrap_err();
        assert_eq!(err, HistoryError::AtBeginning);
        assert_eq!(err.to_string(), "beginning of history");
    }

    #[test]
    fn test_next_at_end_errors() {
        let mut history = History::new();
        let err = history.next().unwrap_err();
        assert_eq!(err, HistoryError::AtEnd);
        assert_eq!(err.to_string(), "end of history");
    }

    #[test]
    fn test_scratch_survives_browse_round_trip() {
        let mut history = History::new();
        history.add("older");

        history.save_scratch("half typ");
        history.prev().unwrap();
        assert_eq!(history.current(), "older");
        history.next().unwrap();
        assert_eq!(history.current(), "half typ");
    }

    #[test]
    fn test_save_scratch_is_noop_while_browsing() {
        let mut history = History::new();
        history.add("older");
        history.prev().unwrap();

        // Position is on the frozen entry; saving must not touch it.
        history.save_scratch("edited copy");
        assert_eq!(history.current(), "older");
        history.next().unwrap();
        assert_eq!(history.current(), "");
    }

    #[test]
    fn test_add_mid_browse_freezes_submitted_line() {
        let mut history = History::new();
        history.add("first");
        history.prev().unwrap();

        // Submitting while browsing freezes the submitted line, not the
        // browsed one, and snaps back to a fresh scratch.
        history.add("second");
        assert_eq!(history.current(), "");
        history.prev().unwrap();
        assert_eq!(history.current(), "second");
        history.prev().unwrap();
        assert_eq!(history.current(), "first");
    }

    #[test]
    fn test_max_size_evicts_oldest() {
        let mut history = History::new();
        history.set_max_size(2);
        history.add("a");
        history.add("b");
        history.add("c");

        assert_eq!(history.len(), 2);
        history.prev().unwrap();
        assert_eq!(history.current(), "c");
        history.prev().unwrap();
        assert_eq!(history.current(), "b");
        assert_eq!(history.prev().unwrap_err(), HistoryError::AtBeginning);
    }

    #[test]
    fn test_shrinking_max_size_clamps_position() {
        let mut history = History::new();
        history.add("a");
        history.add("b");
        history.add("c");
        history.prev().unwrap();

        history.set_max_size(1);
        assert_eq!(history.len(), 1);
        // Position stays in range and next() still terminates at the scratch.
        while history.next().is_ok() {}
        assert_eq!(history.current(), "");
    }
}
