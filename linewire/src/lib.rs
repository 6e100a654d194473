// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! # r3bl_linewire
//!
//! Readline-style line editing over any duplex byte stream, not just a local
//! TTY. Point a [`LineEditor`] at the two halves of anything that speaks
//! VT100 — an SSH channel, a telnet socket, a serial port, a PTY you manage
//! yourself, or an in-memory pipe in tests — and it runs a fully synchronous
//! read→decode→dispatch→render loop on the calling thread.
//!
//! What you get:
//! - A hand-rolled key decoder for control bytes, CSI and SS3 escape
//!   sequences, and UTF-8 text, which swallows sequences it does not
//!   recognize instead of leaking them into the buffer.
//! - Emacs-style editing: cursor movement, kill-to-end, delete-previous-word,
//!   transpose, clear-screen, and line reset.
//! - A minimal-repaint renderer that handles prompts with embedded colors,
//!   per-character display widths (tabs, CJK), and lines that wrap over
//!   multiple terminal rows.
//! - In-memory history with a scratch slot, so a half-typed line survives a
//!   browse through older entries.
//! - Pluggable [`Completer`], [`Hinter`], and [`Helper`] callbacks.
//! - A terminal geometry probe built on the VT100 cursor position report.
//! - Interleaved output: log lines printed above a live prompt, which is then
//!   repainted underneath.
//!
//! What you do not get: terminal setup. The stream must already be in a
//! character-at-a-time, no-echo mode; raw-mode handling, transports, and
//! event loops live outside this crate.
//!
//! ## Example
//!
//! ```
//! use r3bl_linewire::{LineEditor, LineEvent};
//!
//! // Any `Read` + `Write` pair works. Here the "terminal" is a byte slice
//! // in and a `Vec<u8>` out.
//! let input: &[u8] = b"hello world\r";
//! let output: Vec<u8> = Vec::new();
//! let mut editor = LineEditor::new(input, output, "> ");
//!
//! let event = editor.read_line().unwrap();
//! assert_eq!(event, LineEvent::Line("hello world".into()));
//! ```

// Enforce strict error handling in production library code only. Tests are
// allowed to use .unwrap() (workspace `Cargo.toml` config allows it).
#![cfg_attr(not(test), deny(clippy::unwrap_in_result))]

// Attach sources.
pub mod decl_macros;
pub mod edit_buffer;
pub mod editor;
pub mod history;
pub mod key_decoder;
pub mod providers;
pub mod renderer;
pub mod test_fixtures;

// Re-export the public API.
pub use edit_buffer::*;
pub use editor::*;
pub use history::*;
pub use key_decoder::*;
pub use providers::*;
pub use renderer::*;
pub use test_fixtures::*;

// Type aliases.
pub type StdMutex<T> = std::sync::Mutex<T>;

// Constants.
pub const DEFAULT_COLUMNS: usize = 80;
pub const DEFAULT_ROWS: usize = 24;
pub const DEFAULT_TAB_WIDTH: usize = 4;
pub const HISTORY_SIZE_MAX: usize = 1_000;
