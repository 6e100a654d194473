// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Pure VT100 plan generation: given the logical line state and the terminal
//! geometry, produce the exact escape-sequence byte plan that reconciles what
//! the terminal shows with what the editor holds, including lines that wrap
//! over multiple terminal rows.
//!
//! Nothing in this module performs I/O. [`reconcile`] returns the plan as a
//! `String` plus the successor [`RenderState`]; the caller writes the plan in a
//! single buffered write and commits the state only if that write succeeds.
//! This keeps every render decision unit-testable byte for byte.

use unicode_width::UnicodeWidthChar;

use crate::{DEFAULT_COLUMNS, DEFAULT_ROWS, DEFAULT_TAB_WIDTH, Hint};

/// Ring the terminal bell.
pub const BELL: &str = "\x07";
/// Erase from the cursor to the end of the current row.
pub const CLEAR_TO_LINE_END: &str = "\x1b[0K";
/// Erase the entire current row.
pub const CLEAR_LINE: &str = "\x1b[2K";
/// Home the cursor and erase the whole screen.
pub const CLEAR_SCREEN: &str = "\x1b[H\x1b[2J";
/// Save the cursor position (DEC private).
pub const SAVE_CURSOR: &str = "\x1b7";
/// Restore the cursor position saved by [`SAVE_CURSOR`].
pub const RESTORE_CURSOR: &str = "\x1b8";
/// Park the cursor at the bottom-right corner, then request a cursor position
/// report. The reply arrives on the input stream as `ESC [ rows ; cols R`.
pub const PROBE_CURSOR_POSITION: &str = "\x1b[999;999H\x1b[6n";

/// Terminal width and height in character cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    pub columns: usize,
    pub rows: usize,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS,
            rows: DEFAULT_ROWS,
        }
    }
}

impl Geometry {
    /// Replace zero axes with the 80×24 fallback. Render arithmetic divides by
    /// the column count, so a zero width must never reach it.
    #[must_use]
    pub fn or_default(self) -> Self {
        Self {
            columns: if self.columns == 0 {
                DEFAULT_COLUMNS
            } else {
                self.columns
            },
            rows: if self.rows == 0 { DEFAULT_ROWS } else { self.rows },
        }
    }
}

/// What the terminal currently shows, carried between renders.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderState {
    /// Cursor index (into the buffer) as of the previous committed render.
    pub prev_cursor: usize,
    /// Largest number of extra rows this line has occupied so far. Rows above
    /// the current one get cleared on the next render.
    pub max_rows: usize,
}

/// One render's worth of inputs. Borrowed views only; building a frame is free.
#[derive(Clone, Copy, Debug)]
pub struct RenderFrame<'a> {
    pub prompt: &'a str,
    pub buffer: &'a [char],
    pub cursor: usize,
    pub hint: Option<&'a Hint>,
    pub geometry: Geometry,
    pub width_char: fn(char) -> usize,
}

/// Compute the escape plan that repaints the line and parks the terminal
/// cursor at the buffer cursor.
///
/// The plan, in order:
/// 1. Drop to the bottom row the line previously occupied.
/// 2. Clear each occupied row moving back up.
/// 3. From column 0, rewrite prompt, buffer, and hint, then clear to the end
///    of the row.
/// 4. If the cursor sits at the end of the buffer and lands exactly on a row
///    boundary, emit a newline so the cursor has a row to stand on.
/// 5. Climb from the end of the text to the cursor's row, return to column 0,
///    and step right to the cursor's column.
///
/// Widths are computed per character via `frame.width_char`; the prompt is
/// measured with [`visual_width`] so embedded color sequences count for zero
/// columns.
#[must_use]
pub fn reconcile(frame: &RenderFrame<'_>, state: RenderState) -> (RenderState, String) {
    let geometry = frame.geometry.or_default();
    let columns = geometry.columns;

    let prompt_width = visual_width(frame.prompt);

    // Cumulative widths: whole buffer, up to the cursor, up to the previous
    // cursor. One pass.
    let mut buffer_width = 0;
    let mut cursor_width = 0;
    let mut prev_cursor_width = 0;
    for (index, ch) in frame.buffer.iter().enumerate() {
        let w = (frame.width_char)(*ch);
        if index < frame.cursor {
            cursor_width += w;
        }
        if index < state.prev_cursor {
            prev_cursor_width += w;
        }
        buffer_width += w;
    }

    let mut hint_width = 0;
    if let Some(hint) = frame.hint {
        for ch in hint.text.chars() {
            hint_width += (frame.width_char)(ch);
        }
    }

    // Row/column of the end of the text, of the cursor, and the row of the
    // previous cursor, after wrapping.
    let mut end_row = (prompt_width + buffer_width + hint_width) / columns;
    let cursor_col = (prompt_width + cursor_width) % columns;
    let mut cursor_row = (prompt_width + cursor_width) / columns;
    let prev_cursor_row = (prompt_width + prev_cursor_width) / columns;

    let mut next = state;
    let old_rows = state.max_rows;
    if end_row > next.max_rows {
        next.max_rows = end_row;
    }

    let mut plan = String::new();

    // Drop to the bottom of the region this line occupies.
    if old_rows > prev_cursor_row {
        let down = old_rows - prev_cursor_row;
        plan.push_str(&format!("\x1b[{down}B"));
    }

    // Clear the extra rows, walking back up to the first one.
    for _ in 1..old_rows {
        plan.push_str(CLEAR_LINE);
        plan.push_str("\x1b[1A");
    }

    plan.push('\r');
    plan.push_str(frame.prompt);
    plan.extend(frame.buffer.iter());
    if let Some(hint) = frame.hint {
        plan.push_str(hint.style.sgr_prefix());
        plan.push_str(&hint.text);
        plan.push_str(hint.style.sgr_suffix());
    }
    plan.push_str(CLEAR_TO_LINE_END);

    // Cursor at the end of the buffer, parked exactly on a row boundary: give
    // it a fresh row to stand on.
    if frame.cursor == frame.buffer.len() && cursor_col == 0 {
        plan.push_str("\n\r");
        cursor_row += 1;
        end_row += 1;
        if end_row > next.max_rows {
            next.max_rows = end_row;
        }
    }

    // Climb from the end of the text back to the cursor's row.
    if end_row > cursor_row {
        let up = end_row - cursor_row;
        plan.push_str(&format!("\x1b[{up}A"));
    }

    plan.push('\r');
    if cursor_col > 0 {
        plan.push_str(&format!("\x1b[{cursor_col}C"));
    }

    next.prev_cursor = frame.cursor;
    (next, plan)
}

const GRID_COLUMNS: usize = 3;
const GRID_PADDING: usize = 4;
const HELP_PADDING: usize = 3;

/// Lay candidates out in up-to-three aligned columns, one padded cell per
/// candidate, each row starting below the current line. Ends with a bare `\n`
/// so the following repaint starts on a fresh row.
#[must_use]
pub fn completion_grid(candidates: &[String]) -> String {
    let mut widths = [0_usize; GRID_COLUMNS];
    for row in candidates.chunks(GRID_COLUMNS) {
        for (column, cell) in row.iter().enumerate() {
            widths[column] = widths[column].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for row in candidates.chunks(GRID_COLUMNS) {
        out.push_str("\n\r    ");
        for (column, cell) in row.iter().enumerate() {
            out.push_str(cell);
            let pad = widths[column] + GRID_PADDING - cell.chars().count();
            out.push_str(&" ".repeat(pad));
        }
    }
    out.push('\n');
    out
}

/// Two aligned columns of `(topic, description)` rows, same layout rules as
/// [`completion_grid`] with narrower indent and padding.
#[must_use]
pub fn help_table(rows: &[(String, String)]) -> String {
    let mut topic_width = 0;
    let mut description_width = 0;
    for (topic, description) in rows {
        topic_width = topic_width.max(topic.chars().count());
        description_width = description_width.max(description.chars().count());
    }

    let mut out = String::new();
    for (topic, description) in rows {
        out.push_str("\n\r  ");
        out.push_str(topic);
        out.push_str(&" ".repeat(topic_width + HELP_PADDING - topic.chars().count()));
        out.push_str(description);
        out.push_str(&" ".repeat(
            description_width + HELP_PADDING - description.chars().count(),
        ));
    }
    out.push('\n');
    out
}

/// Count the display columns of `text`, skipping VT100 escape sequences (an
/// `ESC` up to and including the next ASCII letter). Every visible character
/// counts as one column; prompts with multi-column glyphs should keep that in
/// mind.
#[must_use]
pub fn visual_width(text: &str) -> usize {
    let mut width = 0;
    let mut in_escape = false;
    for ch in text.chars() {
        if in_escape {
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else if ch == '\x1b' {
            in_escape = true;
        } else {
            width += 1;
        }
    }
    width
}

/// Default per-character width: tabs span [`DEFAULT_TAB_WIDTH`] columns,
/// everything else one.
#[must_use]
pub const fn default_char_width(ch: char) -> usize {
    if ch == '\t' { DEFAULT_TAB_WIDTH } else { 1 }
}

/// East-Asian-aware per-character width, for buffers holding CJK text or
/// emoji. Tabs keep the [`DEFAULT_TAB_WIDTH`] convention; zero-width
/// characters count zero.
#[must_use]
pub fn unicode_char_width(ch: char) -> usize {
    if ch == '\t' {
        return DEFAULT_TAB_WIDTH;
    }
    UnicodeWidthChar::width(ch).unwrap_or(0)
}


#[cfg(test)]
mod tests_reconcile {
    use pretty_assertions::assert_eq;

    use super::*;

    fn frame<'a>(prompt: &'a str, buffer: &'a [char], cursor: usize) -> RenderFrame<'a> {
        RenderFrame {
            prompt,
            buffer,
            cursor,
            hint: None,
            geometry: Geometry::default(),
            width_char: default_char_width,
        }
    }

    #[test]
    fn test_empty_line() {
        let (state, plan) = reconcile(&frame("> ", &[], 0), RenderState::default());
        assert_eq!(plan, "\r> \x1b[0K\r\x1b[2C");
        assert_eq!(state, RenderState::default());
    }

    #[test]
    fn test_full_line_cursor_at_end() {
        let buffer: Vec<char> = "foo bar".chars().collect();
        let (state, plan) =
            reconcile(&frame("> ", &buffer, buffer.len()), RenderState::default());
        assert_eq!(plan, "\r> foo bar\x1b[0K\r\x1b[9C");
        assert_eq!(state.prev_cursor, 7);
        assert_eq!(state.max_rows, 0);
    }

    #[test]
    fn test_cursor_mid_line() {
        let buffer: Vec<char> = "foo bar".chars().collect();
        let (_, plan) = reconcile(&frame("> ", &buffer, 3), RenderState::default());
        assert_eq!(plan, "\r> foo bar\x1b[0K\r\x1b[5C");
    }

    #[test]
    fn test_repaint_is_stable() {
        let buffer: Vec<char> = "steady".chars().collect();
        let (state, first) =
            reconcile(&frame("> ", &buffer, buffer.len()), RenderState::default());
        let (_, second) = reconcile(&frame("> ", &buffer, buffer.len()), state);
        assert_eq!(first, second);
    }

    #[test]
    fn test_tab_width_moves_cursor() {
        let buffer: Vec<char> = "\ta".chars().collect();
        let (_, plan) = reconcile(&frame("> ", &buffer, 2), RenderState::default());
        // Tab spans four columns: prompt(2) + tab(4) + a(1) = 7.
        assert_eq!(plan, "\r> \ta\x1b[0K\r\x1b[7C");
    }

    #[test]
    fn test_cursor_on_row_boundary_forces_newline() {
        let buffer: Vec<char> = "12345678".chars().collect();
        let mut fr = frame("> ", &buffer, buffer.len());
        fr.geometry = Geometry {
            columns: 10,
            rows: 24,
        };
        let (state, plan) = reconcile(&fr, RenderState::default());
        assert_eq!(plan, "\r> 12345678\x1b[0K\n\r\r");
        assert_eq!(state.prev_cursor, 8);
        assert_eq!(state.max_rows, 2);
    }

    #[test]
    fn test_wrapped_line_clears_previous_rows() {
        let first: Vec<char> = "12345678".chars().collect();
        let mut fr = frame("> ", &first, first.len());
        fr.geometry = Geometry {
            columns: 10,
            rows: 24,
        };
        let (state, _) = reconcile(&fr, RenderState::default());

        // One more character: the line now wraps for real, and the repaint
        // must first drop down and clear the region it used before.
        let second: Vec<char> = "123456789".chars().collect();
        let mut fr = frame("> ", &second, second.len());
        fr.geometry = Geometry {
            columns: 10,
            rows: 24,
        };
        let (state, plan) = reconcile(&fr, state);
        assert_eq!(plan, "\x1b[1B\x1b[2K\x1b[1A\r> 123456789\x1b[0K\r\x1b[1C");
        assert_eq!(state.max_rows, 2);
    }

    #[test]
    fn test_hint_is_painted_but_not_cursor_addressable() {
        let buffer: Vec<char> = "hello".chars().collect();
        let hint = crate::Hint::styled(" world", crate::HintStyle::Dim);
        let mut fr = frame("> ", &buffer, buffer.len());
        fr.hint = Some(&hint);
        let (_, plan) = reconcile(&fr, RenderState::default());
        // Cursor lands after "hello" (column 7), not after the hint.
        assert_eq!(plan, "\r> hello\x1b[2m world\x1b[0m\x1b[0K\r\x1b[7C");
    }

    #[test]
    fn test_zero_geometry_falls_back_to_default() {
        let buffer: Vec<char> = "ok".chars().collect();
        let mut fr = frame("> ", &buffer, buffer.len());
        fr.geometry = Geometry { columns: 0, rows: 0 };
        let (_, plan) = reconcile(&fr, RenderState::default());
        assert_eq!(plan, "\r> ok\x1b[0K\r\x1b[4C");
    }
}

#[cfg(test)]
mod tests_layouts {
    use pretty_assertions::assert_eq;

    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_grid_single_row() {
        let grid = completion_grid(&strings(&["foo bar", "foo bar baz"]));
        assert_eq!(grid, "\n\r    foo bar    foo bar baz    \n");
    }

    #[test]
    fn test_grid_wraps_after_three_cells() {
        let grid = completion_grid(&strings(&["aa", "b", "cc", "d"]));
        assert_eq!(grid, "\n\r    aa    b    cc    \n\r    d     \n");
    }

    #[test]
    fn test_help_table_aligns_columns() {
        let rows = vec![
            ("help".to_string(), "show this".to_string()),
            ("quit".to_string(), "exit the shell".to_string()),
        ];
        let table = help_table(&rows);
        assert_eq!(
            table,
            "\n\r  help   show this        \n\r  quit   exit the shell   \n"
        );
    }
}
