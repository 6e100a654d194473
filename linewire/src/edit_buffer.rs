// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The in-memory line buffer and cursor, with the primitive edit operations the
//! dispatch loop applies to it.
//!
//! The buffer is a sequence of Unicode code points (not grapheme clusters, not
//! bytes), and the cursor is an index into that sequence. The invariant
//! `0 <= cursor <= len` holds after every operation.
//!
//! Operations that can hit a boundary (cursor already at an edge, nothing to
//! delete) return `false` instead of failing; the caller turns that into a
//! terminal bell and carries on.

/// Line buffer + cursor owned by one in-flight line-edit session.
#[derive(Debug, Default)]
pub struct EditBuffer {
    buffer: Vec<char>,
    cursor: usize,
}

impl EditBuffer {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.buffer.is_empty() }

    #[must_use]
    pub fn len(&self) -> usize { self.buffer.len() }

    #[must_use]
    pub fn cursor(&self) -> usize { self.cursor }

    #[must_use]
    pub fn chars(&self) -> &[char] { &self.buffer }

    /// The buffer contents as an owned string.
    #[must_use]
    pub fn contents(&self) -> String { self.buffer.iter().collect() }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
    }

    /// Replace the whole buffer with `line`, cursor at the end. Used when a
    /// history entry or a single completion candidate is loaded.
    pub fn set_line(&mut self, line: &str) {
        self.buffer = line.chars().collect();
        self.cursor = self.buffer.len();
    }

    /// Splice `ch` at the cursor and advance past it.
    pub fn insert(&mut self, ch: char) {
        self.buffer.insert(self.cursor, ch);
        self.cursor += 1;
    }

    /// Remove the code point left of the cursor. `false` when already at the
    /// start of the line.
    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        self.buffer.remove(self.cursor);
        true
    }

    /// Remove the code point under the cursor. `false` when already at the end
    /// of the line.
    pub fn delete_forward(&mut self) -> bool {
        if self.cursor == self.buffer.len() {
            return false;
        }
        self.buffer.remove(self.cursor);
        true
    }

    /// Swap the two code points around the cursor (the last two when the cursor
    /// sits at the end of the line), then advance the cursor unless it is
    /// already at the end. `false` when there is nothing to the left to swap.
    pub fn transpose(&mut self) -> bool {
        if self.buffer.is_empty() {
            return false;
        }

        let mut pivot = self.cursor;
        if pivot == self.buffer.len() {
            pivot = self.buffer.len() - 1;
        }
        if pivot == 0 {
            return false;
        }

        self.buffer.swap(pivot - 1, pivot);

        if self.cursor < self.buffer.len() {
            self.cursor += 1;
        }

        true
    }

    pub fn move_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    pub fn move_right(&mut self) -> bool {
        if self.cursor == self.buffer.len() {
            return false;
        }
        self.cursor += 1;
        true
    }

    pub fn move_home(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor = 0;
        true
    }

    pub fn move_end(&mut self) -> bool {
        if self.cursor == self.buffer.len() {
            return false;
        }
        self.cursor = self.buffer.len();
        true
    }

    /// Truncate the buffer at the cursor, discarding everything to the right.
    pub fn kill_to_end(&mut self) { self.buffer.truncate(self.cursor); }

    /// Delete the word left of the cursor: scan left skipping spaces, then skip
    /// the word itself, and truncate the buffer at that boundary (anything right
    /// of the cursor goes with it). Cursor moves to the boundary.
    pub fn delete_prev_word(&mut self) {
        let mut boundary = 0;
        let mut in_word = false;
        for index in (0..self.cursor).rev() {
            if self.buffer[index] != ' ' {
                in_word = true;
                continue;
            }
            if !in_word {
                continue;
            }
            boundary = index + 1;
            break;
        }

        self.buffer.truncate(boundary);
        self.cursor = boundary;
    }
}
