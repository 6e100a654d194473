// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! The line editor itself: owns the two halves of the duplex stream, runs the
//! blocking read→decode→dispatch→render loop, and carries the line buffer,
//! history, geometry, and providers across sessions.
//!
//! The editor performs no terminal setup. The stream is assumed to already be
//! in a character-at-a-time, no-echo mode (a raw PTY, an SSH channel, a telnet
//! socket, an in-memory pipe in tests); the editor's only job is what bytes to
//! read and write on it.

use std::io::{self, BufRead, BufReader, Read, Write};

use miette::Diagnostic;
use thiserror::Error;

use crate::{BELL,
            CLEAR_SCREEN,
            CLEAR_TO_LINE_END,
            Completer,
            EditBuffer,
            Geometry,
            Helper,
            Hint,
            Hinter,
            History,
            KeyCommand,
            PROBE_CURSOR_POSITION,
            RESTORE_CURSOR,
            RenderFrame,
            RenderState,
            SAVE_CURSOR,
            completion_grid,
            default_char_width,
            help_table,
            ok,
            parse_cursor_report,
            read_key_command,
            reconcile};

/// Failure modes of [`LineEditor`] operations. Everything here is fatal to the
/// call that produced it; the editor keeps no half-written state (render state
/// commits only after a successful write).
#[derive(Debug, Error, Diagnostic)]
pub enum LineEditorError {
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The stream answered the geometry probe, but never with a parseable
    /// `ESC [ rows ; cols R` report.
    #[error("malformed cursor position report")]
    MalformedCursorReport,
}

/// How one [`LineEditor::read_line`] session ended. Every variant carries the
/// buffer contents at that moment, so an interrupted or EOF'd session still
/// surrenders what the user had typed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LineEvent {
    /// Enter: the confirmed line.
    Line(String),
    /// ctrl-c.
    Interrupted(String),
    /// ctrl-d on an empty line, or the input stream ran dry.
    Eof(String),
}

/// Readline-style line editing over any duplex byte stream.
///
/// `R` is the terminal-to-editor half (key bytes in), `W` the editor-to-
/// terminal half (VT100 bytes out). Reads block; the editor is fully
/// synchronous with no internal threads or timers. One [`read_line`] session
/// may be in flight at a time.
///
/// [`read_line`]: LineEditor::read_line
pub struct LineEditor<R: Read, W: Write> {
    input: BufReader<R>,
    output: W,
    prompt: String,
    buffer: EditBuffer,
    render: RenderState,
    geometry: Geometry,
    history: History,
    completer: Option<Box<dyn Completer>>,
    hinter: Option<Box<dyn Hinter>>,
    helper: Option<Box<dyn Helper>>,
    width_char: fn(char) -> usize,
}

impl<R: Read, W: Write> std::fmt::Debug for LineEditor<R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineEditor")
            .field("prompt", &self.prompt)
            .field("buffer", &self.buffer)
            .field("render", &self.render)
            .field("geometry", &self.geometry)
            .finish_non_exhaustive()
    }
}

impl<R: Read, W: Write> LineEditor<R, W> {
    /// Wrap the two halves of a duplex stream. Geometry starts at the 80×24
    /// fallback until [`set_geometry`] or [`probe_geometry`] says otherwise.
    ///
    /// [`set_geometry`]: LineEditor::set_geometry
    /// [`probe_geometry`]: LineEditor::probe_geometry
    pub fn new(input: R, output: W, prompt: impl Into<String>) -> Self {
        Self {
            input: BufReader::new(input),
            output,
            prompt: prompt.into(),
            buffer: EditBuffer::new(),
            render: RenderState::default(),
            geometry: Geometry::default(),
            history: History::new(),
            completer: None,
            hinter: None,
            helper: None,
            width_char: default_char_width,
        }
    }

    /// Run one blocking line-edit session: paint the empty prompt, then decode
    /// and dispatch keys until the line is confirmed, interrupted, or the
    /// stream ends.
    ///
    /// The confirmed line is **not** added to history automatically; call
    /// [`add_history_entry`] with lines worth recalling.
    ///
    /// # Errors
    ///
    /// [`LineEditorError::Io`] when reading or writing the stream fails. The
    /// partial line stays readable through [`line`] afterwards.
    ///
    /// [`add_history_entry`]: LineEditor::add_history_entry
    /// [`line`]: LineEditor::line
    pub fn read_line(&mut self) -> miette::Result<LineEvent, LineEditorError> {
        self.reset_line()?;

        loop {
            let command = read_key_command(&mut self.input)?;
            tracing::trace!(%command, "dispatch");

            match command {
                KeyCommand::Submit => {
                    let line = self.buffer.contents();
                    tracing::debug!(chars = line.chars().count(), "line confirmed");
                    return Ok(LineEvent::Line(line));
                }
                KeyCommand::Interrupt => {
                    return Ok(LineEvent::Interrupted(self.buffer.contents()));
                }
                KeyCommand::EndOfInput => {
                    return Ok(LineEvent::Eof(self.buffer.contents()));
                }
                KeyCommand::EndOfTransmission => {
                    if self.buffer.is_empty() {
                        return Ok(LineEvent::Eof(self.buffer.contents()));
                    }
                    self.apply_edit(EditBuffer::delete_forward)?;
                }
                KeyCommand::Insert(ch) => {
                    self.buffer.insert(ch);
                    self.refresh()?;
                }
                KeyCommand::Backspace => self.apply_edit(EditBuffer::backspace)?,
                KeyCommand::DeleteForward => {
                    self.apply_edit(EditBuffer::delete_forward)?;
                }
                KeyCommand::MoveLeft => self.apply_edit(EditBuffer::move_left)?,
                KeyCommand::MoveRight => self.apply_edit(EditBuffer::move_right)?,
                KeyCommand::MoveHome => self.apply_edit(EditBuffer::move_home)?,
                KeyCommand::MoveEnd => self.apply_edit(EditBuffer::move_end)?,
                KeyCommand::Transpose => self.apply_edit(EditBuffer::transpose)?,
                KeyCommand::KillToEnd => {
                    self.buffer.kill_to_end();
                    self.refresh()?;
                }
                KeyCommand::DeletePrevWord => {
                    self.buffer.delete_prev_word();
                    self.refresh()?;
                }
                KeyCommand::HistoryPrev => self.history_prev()?,
                KeyCommand::HistoryNext => self.history_next()?,
                KeyCommand::Reset => self.reset_line()?,
                KeyCommand::ClearScreen => self.refresh_with_prefix(CLEAR_SCREEN)?,
                KeyCommand::Complete => self.complete_line()?,
                KeyCommand::Help => self.print_help()?,
            }
        }
    }

    /// Abandon the in-flight line: clear buffer, cursor, and render state,
    /// then paint a fresh empty prompt. Bound to ctrl-u, and run at the start
    /// of every session.
    ///
    /// # Errors
    ///
    /// [`LineEditorError::Io`] when the repaint cannot be written.
    pub fn reset_line(&mut self) -> miette::Result<(), LineEditorError> {
        self.buffer.clear();
        self.render = RenderState::default();
        self.refresh()
    }

    /// Ask the terminal how big it is: save the cursor, park it at the far
    /// corner, request a cursor position report, and adopt the answer as the
    /// new geometry. The saved cursor is restored whether or not the report
    /// parses.
    ///
    /// # Errors
    ///
    /// [`LineEditorError::MalformedCursorReport`] when the stream closes
    /// before a terminator or the report fields do not parse;
    /// [`LineEditorError::Io`] when the stream itself fails.
    pub fn probe_geometry(&mut self) -> miette::Result<Geometry, LineEditorError> {
        let mut probe =
            String::with_capacity(SAVE_CURSOR.len() + PROBE_CURSOR_POSITION.len());
        probe.push_str(SAVE_CURSOR);
        probe.push_str(PROBE_CURSOR_POSITION);
        self.output.write_all(probe.as_bytes())?;
        self.output.flush()?;

        let report = self.read_report()?;

        self.output.write_all(RESTORE_CURSOR.as_bytes())?;
        self.output.flush()?;

        let Some((rows, columns)) = parse_cursor_report(&report) else {
            return Err(LineEditorError::MalformedCursorReport);
        };

        tracing::debug!(rows, columns, "geometry probe answered");
        self.geometry = Geometry { columns, rows };
        Ok(self.geometry)
    }

    /// Write `data` above the live prompt: erase the prompt's row, emit the
    /// payload with line feeds expanded to CR+LF, then repaint the prompt and
    /// buffer below it. Returns the payload length, counted before expansion.
    ///
    /// # Errors
    ///
    /// [`LineEditorError::Io`] when either the payload write or the repaint
    /// fails.
    pub fn print_data(&mut self, data: &[u8]) -> miette::Result<usize, LineEditorError> {
        let mut out = Vec::with_capacity(1 + CLEAR_TO_LINE_END.len() + data.len());
        out.push(b'\r');
        out.extend_from_slice(CLEAR_TO_LINE_END.as_bytes());
        for byte in data {
            if *byte == b'\n' {
                out.extend_from_slice(b"\r\n");
            } else {
                out.push(*byte);
            }
        }
        self.output.write_all(&out)?;
        self.output.flush()?;

        self.refresh()?;
        Ok(data.len())
    }

    /// [`print_data`] for text.
    ///
    /// # Errors
    ///
    /// Same as [`print_data`].
    ///
    /// [`print_data`]: LineEditor::print_data
    pub fn print(&mut self, text: &str) -> miette::Result<usize, LineEditorError> {
        self.print_data(text.as_bytes())
    }

    /// The line buffer contents. After [`LineEvent::Interrupted`] or
    /// [`LineEvent::Eof`] this still holds the partial line.
    #[must_use]
    pub fn line(&self) -> String { self.buffer.contents() }

    #[must_use]
    pub fn prompt(&self) -> &str { &self.prompt }

    /// Takes effect on the next repaint.
    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    #[must_use]
    pub fn geometry(&self) -> Geometry { self.geometry }

    pub fn set_geometry(&mut self, geometry: Geometry) { self.geometry = geometry; }

    /// Freeze `line` as the newest history entry. The editor never adds
    /// entries on its own.
    pub fn add_history_entry(&mut self, line: &str) { self.history.add(line); }

    /// Cap the number of frozen history entries, evicting the oldest.
    pub fn set_max_history(&mut self, max_size: usize) {
        self.history.set_max_size(max_size);
    }

    pub fn set_completer(&mut self, completer: impl Completer + 'static) {
        self.completer = Some(Box::new(completer));
    }

    pub fn set_hinter(&mut self, hinter: impl Hinter + 'static) {
        self.hinter = Some(Box::new(hinter));
    }

    pub fn set_helper(&mut self, helper: impl Helper + 'static) {
        self.helper = Some(Box::new(helper));
    }

    /// Replace the per-character width function used in render arithmetic.
    /// The default is [`default_char_width`]; use
    /// [`crate::unicode_char_width`] for CJK and emoji aware widths.
    pub fn set_width_char(&mut self, width_char: fn(char) -> usize) {
        self.width_char = width_char;
    }

    /// Apply a boundary-checked edit: repaint on success, bell on a boundary.
    fn apply_edit(
        &mut self,
        op: fn(&mut EditBuffer) -> bool,
    ) -> miette::Result<(), LineEditorError> {
        if op(&mut self.buffer) {
            self.refresh()
        } else {
            self.bell()
        }
    }

    fn history_prev(&mut self) -> miette::Result<(), LineEditorError> {
        let current = self.buffer.contents();
        self.history.save_scratch(&current);
        if self.history.prev().is_err() {
            return self.bell();
        }
        let entry = self.history.current().to_string();
        self.buffer.set_line(&entry);
        self.refresh()
    }

    fn history_next(&mut self) -> miette::Result<(), LineEditorError> {
        if self.history.next().is_err() {
            return self.bell();
        }
        let entry = self.history.current().to_string();
        self.buffer.set_line(&entry);
        self.refresh()
    }

    fn complete_line(&mut self) -> miette::Result<(), LineEditorError> {
        let Some(completer) = self.completer.as_ref() else {
            self.buffer.insert('\t');
            return self.refresh();
        };

        let candidates = completer.complete(&self.buffer.contents());
        tracing::debug!(count = candidates.len(), "completion candidates");
        match candidates.as_slice() {
            [] => self.bell(),
            [only] => {
                self.buffer.set_line(only);
                self.refresh()
            }
            _ => {
                let grid = completion_grid(&candidates);
                self.refresh_with_prefix(&grid)
            }
        }
    }

    fn print_help(&mut self) -> miette::Result<(), LineEditorError> {
        let Some(helper) = self.helper.as_ref() else {
            self.buffer.insert('?');
            return self.refresh();
        };

        let rows = helper.help(&self.buffer.contents());
        let table = help_table(&rows);
        self.refresh_with_prefix(&table)
    }

    fn refresh(&mut self) -> miette::Result<(), LineEditorError> {
        self.refresh_with_prefix("")
    }

    /// Build the repaint plan, glue `prefix` in front of it, and push the
    /// whole thing to the stream as a single write. Render state commits only
    /// once that write (and flush) has succeeded.
    fn refresh_with_prefix(&mut self, prefix: &str) -> miette::Result<(), LineEditorError> {
        let hint = self.current_hint();
        let frame = RenderFrame {
            prompt: &self.prompt,
            buffer: self.buffer.chars(),
            cursor: self.buffer.cursor(),
            hint: hint.as_ref(),
            geometry: self.geometry,
            width_char: self.width_char,
        };
        let (next, plan) = reconcile(&frame, self.render);

        let plan = if prefix.is_empty() {
            plan
        } else {
            let mut combined = String::with_capacity(prefix.len() + plan.len());
            combined.push_str(prefix);
            combined.push_str(&plan);
            combined
        };

        self.output.write_all(plan.as_bytes())?;
        self.output.flush()?;
        self.render = next;
        ok!()
    }

    fn current_hint(&self) -> Option<Hint> {
        let hinter = self.hinter.as_ref()?;
        hinter.hint(&self.buffer.contents())
    }

    /// Boundary feedback. A bell is its own tiny write, never part of a plan.
    fn bell(&mut self) -> miette::Result<(), LineEditorError> {
        self.output.write_all(BELL.as_bytes())?;
        self.output.flush()?;
        ok!()
    }

    /// Collect bytes up to and including the report terminator `R`.
    fn read_report(&mut self) -> miette::Result<Vec<u8>, LineEditorError> {
        let mut report = Vec::new();
        self.input.read_until(b'R', &mut report)?;
        if report.last() != Some(&b'R') {
            return Err(LineEditorError::MalformedCursorReport);
        }
        Ok(report)
    }
}

/// Raw pass-through writer that only normalizes line endings (`\n` becomes
/// `\r\n`). No erase, no repaint: use [`LineEditor::print_data`] to write
/// above a live prompt. The returned count is of `buf` bytes consumed, so the
/// expansion is invisible to callers.
impl<R: Read, W: Write> Write for LineEditor<R, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut written = 0;
        let mut rest = buf;
        while !rest.is_empty() {
            match rest.iter().position(|byte| *byte == b'\n') {
                Some(index) => {
                    self.output.write_all(&rest[..index])?;
                    self.output.write_all(b"\r\n")?;
                    written += index + 1;
                    rest = &rest[index + 1..];
                }
                None => {
                    self.output.write_all(rest)?;
                    written += rest.len();
                    rest = &[];
                }
            }
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> { self.output.flush() }
}





#[cfg(test)]
mod tests_rendering {
    use pretty_assertions::assert_eq;

    use super::{tests_support::editor_from, *};
    use crate::HintStyle;

    #[test]
    fn test_clear_screen_and_repaint_are_one_write() {
        let (mut editor, output) = editor_from(b"hi\x0c\r");
        assert_eq!(editor.read_line().unwrap(), LineEvent::Line("hi".into()));

        let writes = output.get_copy_of_writes_as_strings();
        assert_eq!(writes.len(), 4);
        assert_eq!(writes[3], "\x1b[H\x1b[2J\r> hi\x1b[0K\r\x1b[4C");
    }

    #[test]
    fn test_hint_painted_after_buffer_never_committed() {
        let (mut editor, output) = editor_from(b"hello\r");
        editor.set_hinter(|line: &str| {
            (line == "hello").then(|| Hint::styled(" world", HintStyle::Dim))
        });

        assert_eq!(editor.read_line().unwrap(), LineEvent::Line("hello".into()));

        let writes = output.get_copy_of_writes_as_strings();
        assert_eq!(
            writes.last().unwrap(),
            "\r> hello\x1b[2m world\x1b[0m\x1b[0K\r\x1b[7C"
        );
    }

    #[test]
    fn test_cursor_on_row_boundary_gets_fresh_row() {
        let (mut editor, output) = editor_from(b"12345678\r");
        editor.set_geometry(Geometry {
            columns: 10,
            rows: 24,
        });

        assert_eq!(
            editor.read_line().unwrap(),
            LineEvent::Line("12345678".into())
        );
        let writes = output.get_copy_of_writes_as_strings();
        assert_eq!(writes.last().unwrap(), "\r> 12345678\x1b[0K\n\r\r");
    }

    #[test]
    fn test_prompt_change_takes_effect_on_next_session() {
        let (mut editor, output) = editor_from(b"\r");
        editor.set_prompt(">> ");

        assert_eq!(editor.read_line().unwrap(), LineEvent::Line(String::new()));
        assert_eq!(
            output.get_copy_of_writes_as_strings()[0],
            "\r>> \x1b[0K\r\x1b[3C"
        );
    }
}
