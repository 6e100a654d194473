// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Pluggable callback contracts consulted by the line editor: completion
//! candidates, inline hints, and help tables.
//!
//! Each contract is a trait with a blanket impl for plain closures, so both
//! `editor.set_completer(MyCompleter)` and `editor.set_completer(|line| ...)`
//! work. Absence of a provider is modeled by the editor never having been given
//! one, not by a nullable field.

/// Produces completion candidates for the current line. Candidate order is
/// preserved in the grid.
pub trait Completer {
    fn complete(&self, line: &str) -> Vec<String>;
}

impl<F> Completer for F
where
    F: Fn(&str) -> Vec<String>,
{
    fn complete(&self, line: &str) -> Vec<String> { self(line) }
}

/// Produces `(topic, description)` rows for the help table shown on `?`.
pub trait Helper {
    fn help(&self, line: &str) -> Vec<(String, String)>;
}

impl<F> Helper for F
where
    F: Fn(&str) -> Vec<(String, String)>,
{
    fn help(&self, line: &str) -> Vec<(String, String)> { self(line) }
}

/// Produces an inline suggestion displayed to the right of the user's input.
/// It is recomputed on every render and never becomes part of the line.
pub trait Hinter {
    fn hint(&self, line: &str) -> Option<Hint>;
}

impl<F> Hinter for F
where
    F: Fn(&str) -> Option<Hint>,
{
    fn hint(&self, line: &str) -> Option<Hint> { self(line) }
}

/// Suggestion text plus the attribute it is painted with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hint {
    pub text: String,
    pub style: HintStyle,
}

impl Hint {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: HintStyle::Plain,
        }
    }

    #[must_use]
    pub fn styled(text: impl Into<String>, style: HintStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// SGR attribute applied to hint text. [`HintStyle::Plain`] writes the text
/// bare, exactly as the buffer itself is written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HintStyle {
    #[default]
    Plain,
    Bold,
    Dim,
    Black,
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
}

impl HintStyle {
    /// The SGR sequence emitted before the hint text. Zero display columns.
    #[must_use]
    pub fn sgr_prefix(self) -> &'static str {
        match self {
            HintStyle::Plain => "",
            HintStyle::Bold => "\x1b[1m",
            HintStyle::Dim => "\x1b[2m",
            HintStyle::Black => "\x1b[30m",
            HintStyle::Red => "\x1b[31m",
            HintStyle::Green => "\x1b[32m",
            HintStyle::Yellow => "\x1b[33m",
            HintStyle::Blue => "\x1b[34m",
            HintStyle::Magenta => "\x1b[35m",
            HintStyle::Cyan => "\x1b[36m",
            HintStyle::White => "\x1b[37m",
        }
    }

    /// The reset emitted after the hint text, empty for [`HintStyle::Plain`].
    #[must_use]
    pub fn sgr_suffix(self) -> &'static str {
        match self {
            HintStyle::Plain => "",
            _ => "\x1b[0m",
        }
    }
}
