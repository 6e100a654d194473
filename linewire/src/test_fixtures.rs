// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Test doubles for exercising a [`crate::LineEditor`] against in-memory
//! streams.
//!
//! The input half needs no fixture: any `&[u8]` already implements
//! [`std::io::Read`]. The output half does: assertions about write batching
//! ("the completion grid and the repaint went out as one write") need the
//! write boundaries preserved, so [`OutputMock`] records each `write` call as
//! its own chunk instead of flattening everything into one buffer.

use std::{io::{self, Write},
          sync::Arc};

use crate::StdMutex;

/// A [`Write`] implementation that records every write as a separate chunk.
///
/// Cloning does not duplicate the recording: clones share the same underlying
/// storage, so one clone can be handed to a [`crate::LineEditor`] while the
/// test keeps another for assertions.
#[derive(Clone, Debug, Default)]
pub struct OutputMock {
    pub chunks: Arc<StdMutex<Vec<Vec<u8>>>>,
}

impl OutputMock {
    /// Every write so far, one lossy string per chunk.
    ///
    /// # Panics
    ///
    /// If the internal mutex is poisoned.
    #[must_use]
    pub fn get_copy_of_writes_as_strings(&self) -> Vec<String> {
        self.chunks
            .lock()
            .unwrap()
            .iter()
            .map(|chunk| String::from_utf8_lossy(chunk).to_string())
            .collect()
    }

    /// All chunks concatenated into one lossy string.
    ///
    /// # Panics
    ///
    /// If the internal mutex is poisoned.
    #[must_use]
    pub fn get_copy_of_buffer_as_string(&self) -> String {
        self.get_copy_of_writes_as_strings().concat()
    }

    /// All chunks concatenated, with ANSI escape sequences stripped. Useful
    /// for asserting what a human would read off the terminal.
    ///
    /// # Panics
    ///
    /// If the internal mutex is poisoned.
    #[must_use]
    pub fn get_copy_of_buffer_as_string_strip_ansi(&self) -> String {
        let buffer: Vec<u8> = self.chunks.lock().unwrap().concat();
        let stripped = strip_ansi_escapes::strip(&buffer);
        String::from_utf8_lossy(&stripped).to_string()
    }

    /// Number of writes recorded so far.
    ///
    /// # Panics
    ///
    /// If the internal mutex is poisoned.
    #[must_use]
    pub fn write_count(&self) -> usize { self.chunks.lock().unwrap().len() }
}

impl Write for OutputMock {
    #[allow(clippy::unwrap_in_result)] /* This is for lock.unwrap(). */
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.chunks.lock().unwrap().push(buf.to_vec());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> { Ok(()) }
}
