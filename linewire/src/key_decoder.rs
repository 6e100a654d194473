// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Byte-level key decoding: turns the raw input stream into [`KeyCommand`]s.
//!
//! The decoder is a small state machine driven one byte at a time:
//! - plain control bytes map straight to commands,
//! - `ESC` opens a sequence: `ESC [` (CSI) and `ESC O` (SS3) tails are decoded,
//!   anything else is swallowed without producing a command,
//! - everything else starts a UTF-8 sequence that decodes to [`KeyCommand::Insert`].
//!
//! Swallowing matters: an unrecognized sequence must consume its bytes, or
//! they would leak into the buffer as garbage text. A swallowed sequence makes
//! the decoder loop for the next real key, so callers always get a command (or
//! [`KeyCommand::EndOfInput`] once the stream is exhausted).

use std::io::{self, BufRead};

use strum_macros::Display;

/// One decoded editing command, ready for dispatch.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum KeyCommand {
    /// Insert one character at the cursor. Unbound control bytes arrive here
    /// too, inserted literally.
    Insert(char),
    /// Enter: the line is confirmed.
    Submit,
    /// Tab: consult the completion provider.
    Complete,
    /// `?`: consult the help provider.
    Help,
    Backspace,
    DeleteForward,
    /// ctrl-c.
    Interrupt,
    /// ctrl-d: end-of-file on an empty line, delete-forward otherwise. The
    /// dispatcher decides which, since only it sees the buffer.
    EndOfTransmission,
    /// ctrl-l.
    ClearScreen,
    /// ctrl-w.
    DeletePrevWord,
    MoveLeft,
    MoveRight,
    MoveHome,
    MoveEnd,
    /// Up arrow / ctrl-p.
    HistoryPrev,
    /// Down arrow / ctrl-n.
    HistoryNext,
    /// ctrl-u: abandon the line and start over.
    Reset,
    /// ctrl-k.
    KillToEnd,
    /// ctrl-t.
    Transpose,
    /// The underlying stream is exhausted.
    EndOfInput,
}

/// Block until one complete command has been decoded.
///
/// # Errors
///
/// Propagates any I/O failure from the stream other than
/// [`io::ErrorKind::Interrupted`], which is retried.
pub fn read_key_command<R: BufRead>(input: &mut R) -> io::Result<KeyCommand> {
    loop {
        let Some(byte) = read_byte(input)? else {
            return Ok(KeyCommand::EndOfInput);
        };

        let command = match byte {
            1 => KeyCommand::MoveHome,            // ctrl-a
            2 => KeyCommand::MoveLeft,            // ctrl-b
            3 => KeyCommand::Interrupt,           // ctrl-c
            4 => KeyCommand::EndOfTransmission,   // ctrl-d
            5 => KeyCommand::MoveEnd,             // ctrl-e
            6 => KeyCommand::MoveRight,           // ctrl-f
            8 | 127 => KeyCommand::Backspace,     // ctrl-h, del
            9 => KeyCommand::Complete,            // tab
            11 => KeyCommand::KillToEnd,          // ctrl-k
            12 => KeyCommand::ClearScreen,        // ctrl-l
            13 => KeyCommand::Submit,             // enter
            14 => KeyCommand::HistoryNext,        // ctrl-n
            16 => KeyCommand::HistoryPrev,        // ctrl-p
            20 => KeyCommand::Transpose,          // ctrl-t
            21 => KeyCommand::Reset,              // ctrl-u
            23 => KeyCommand::DeletePrevWord,     // ctrl-w
            27 => match read_escape_sequence(input)? {
                Some(command) => command,
                // Swallowed an unrecognized sequence; decode the next key.
                None => continue,
            },
            b'?' => KeyCommand::Help,
            _ => KeyCommand::Insert(read_utf8_char(input, byte)?),
        };

        return Ok(command);
    }
}

/// Decode the tail of an `ESC`-initiated sequence. The `ESC` itself is already
/// consumed. `None` means the sequence was recognized as noise and swallowed.
fn read_escape_sequence<R: BufRead>(input: &mut R) -> io::Result<Option<KeyCommand>> {
    let Some(first) = read_byte(input)? else {
        return Ok(Some(KeyCommand::EndOfInput));
    };

    match first {
        b'[' => {
            let Some(second) = read_byte(input)? else {
                return Ok(Some(KeyCommand::EndOfInput));
            };
            match second {
                // Extended sequences like `ESC [ 5 ~`: the parameter byte is
                // followed by exactly one more byte, which we drop.
                b'0'..=b'2' | b'4'..=b'9' => {
                    if read_byte(input)?.is_none() {
                        return Ok(Some(KeyCommand::EndOfInput));
                    }
                    tracing::trace!(parameter = second, "swallowed CSI sequence");
                    Ok(None)
                }
                b'3' => {
                    let Some(tail) = read_byte(input)? else {
                        return Ok(Some(KeyCommand::EndOfInput));
                    };
                    if tail == b'~' {
                        Ok(Some(KeyCommand::DeleteForward))
                    } else {
                        Ok(None)
                    }
                }
                b'A' => Ok(Some(KeyCommand::HistoryPrev)),
                b'B' => Ok(Some(KeyCommand::HistoryNext)),
                b'C' => Ok(Some(KeyCommand::MoveRight)),
                b'D' => Ok(Some(KeyCommand::MoveLeft)),
                b'H' => Ok(Some(KeyCommand::MoveHome)),
                b'F' => Ok(Some(KeyCommand::MoveEnd)),
                _ => {
                    tracing::trace!(terminator = second, "swallowed CSI sequence");
                    Ok(None)
                }
            }
        }
        b'O' => {
            let Some(second) = read_byte(input)? else {
                return Ok(Some(KeyCommand::EndOfInput));
            };
            match second {
                b'H' => Ok(Some(KeyCommand::MoveHome)),
                b'F' => Ok(Some(KeyCommand::MoveEnd)),
                _ => Ok(None),
            }
        }
        _ => {
            tracing::trace!(byte = first, "swallowed escape tail");
            Ok(None)
        }
    }
}

/// Expected byte length of a UTF-8 sequence based on its lead byte. `None`
/// for continuation bytes and values no well-formed sequence starts with
/// (`C0`/`C1` overlong leads, `F5` and up past U+10FFFF).
fn utf8_sequence_length(lead: u8) -> Option<usize> {
    match lead {
        0x00..=0x7F => Some(1),
        0xC2..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF4 => Some(4),
        _ => None,
    }
}

/// Finish decoding a UTF-8 character whose lead byte is already consumed.
///
/// Malformed input degrades to U+FFFD: a bad lead byte costs exactly that one
/// byte, and a non-continuation byte mid-sequence is left unconsumed so it
/// gets decoded on its own next time around.
fn read_utf8_char<R: BufRead>(input: &mut R, lead: u8) -> io::Result<char> {
    let Some(length) = utf8_sequence_length(lead) else {
        return Ok(char::REPLACEMENT_CHARACTER);
    };

    if length == 1 {
        return Ok(char::from(lead));
    }

    let mut code_point = match length {
        2 => u32::from(lead & 0b0001_1111),
        3 => u32::from(lead & 0b0000_1111),
        _ => u32::from(lead & 0b0000_0111),
    };

    for _ in 1..length {
        let Some(byte) = peek_byte(input)? else {
            // Truncated at end of stream.
            return Ok(char::REPLACEMENT_CHARACTER);
        };
        if byte & 0b1100_0000 != 0b1000_0000 {
            return Ok(char::REPLACEMENT_CHARACTER);
        }
        input.consume(1);
        code_point = (code_point << 6) | u32::from(byte & 0b0011_1111);
    }

    // Overlong forms re-encode a small code point in too many bytes; reject
    // them like any other malformed sequence. Surrogates fail `from_u32`.
    let minimum = match length {
        2 => 0x80,
        3 => 0x800,
        _ => 0x1_0000,
    };
    if code_point < minimum {
        return Ok(char::REPLACEMENT_CHARACTER);
    }

    Ok(char::from_u32(code_point).unwrap_or(char::REPLACEMENT_CHARACTER))
}

/// Locate a `ESC [ rows ; cols R` cursor position report in `report` and
/// return the two decimal fields. The report may be preceded by unrelated
/// bytes (typed-ahead keys); scanning starts at each `ESC` found.
#[must_use]
pub fn parse_cursor_report(report: &[u8]) -> Option<(usize, usize)> {
    for (start, byte) in report.iter().enumerate() {
        if *byte != 0x1b {
            continue;
        }
        if let Some(parsed) = parse_report_fields(&report[start..]) {
            return Some(parsed);
        }
    }
    None
}

fn parse_report_fields(bytes: &[u8]) -> Option<(usize, usize)> {
    let rest = bytes.strip_prefix(b"\x1b[")?;
    let semicolon = rest.iter().position(|byte| *byte == b';')?;
    let terminator = rest.iter().position(|byte| *byte == b'R')?;
    if terminator < semicolon {
        return None;
    }
    let rows = parse_decimal(&rest[..semicolon])?;
    let cols = parse_decimal(&rest[semicolon + 1..terminator])?;
    Some((rows, cols))
}

fn parse_decimal(digits: &[u8]) -> Option<usize> {
    if digits.is_empty() {
        return None;
    }
    let mut value = 0_usize;
    for digit in digits {
        if !digit.is_ascii_digit() {
            return None;
        }
        value = value
            .checked_mul(10)?
            .checked_add(usize::from(digit - b'0'))?;
    }
    Some(value)
}

/// Pull one byte off the stream. `None` at end of input.
fn read_byte<R: BufRead>(input: &mut R) -> io::Result<Option<u8>> {
    let byte = peek_byte(input)?;
    if byte.is_some() {
        input.consume(1);
    }
    Ok(byte)
}

/// Look at the next byte without consuming it, retrying interrupted reads.
fn peek_byte<R: BufRead>(input: &mut R) -> io::Result<Option<u8>> {
    loop {
        match input.fill_buf() {
            Ok([]) => return Ok(None),
            Ok(buffer) => return Ok(Some(buffer[0])),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => return Err(error),
        }
    }
}


#[cfg(test)]
mod tests_control_bytes {
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    use super::*;

    #[test_case(&[1], KeyCommand::MoveHome; "ctrl a")]
    #[test_case(&[2], KeyCommand::MoveLeft; "ctrl b")]
    #[test_case(&[3], KeyCommand::Interrupt; "ctrl c")]
    #[test_case(&[4], KeyCommand::EndOfTransmission; "ctrl d")]
    #[test_case(&[5], KeyCommand::MoveEnd; "ctrl e")]
    #[test_case(&[6], KeyCommand::MoveRight; "ctrl f")]
    #[test_case(&[8], KeyCommand::Backspace; "ctrl h")]
    #[test_case(&[9], KeyCommand::Complete; "tab")]
    #[test_case(&[11], KeyCommand::KillToEnd; "ctrl k")]
    #[test_case(&[12], KeyCommand::ClearScreen; "ctrl l")]
    #[test_case(&[13], KeyCommand::Submit; "enter")]
    #[test_case(&[14], KeyCommand::HistoryNext; "ctrl n")]
    #[test_case(&[16], KeyCommand::HistoryPrev; "ctrl p")]
    #[test_case(&[20], KeyCommand::Transpose; "ctrl t")]
    #[test_case(&[21], KeyCommand::Reset; "ctrl u")]
    #[test_case(&[23], KeyCommand::DeletePrevWord; "ctrl w")]
    #[test_case(&[127], KeyCommand::Backspace; "del")]
    #[test_case(b"?", KeyCommand::Help; "question mark")]
    fn test_single_byte(bytes: &[u8], expected: KeyCommand) {
        let mut input = bytes;
        assert_eq!(read_key_command(&mut input).unwrap(), expected);
    }

    #[test]
    fn test_plain_text_inserts() {
        let mut input: &[u8] = b"ab";
        assert_eq!(
            read_key_command(&mut input).unwrap(),
            KeyCommand::Insert('a')
        );
        assert_eq!(
            read_key_command(&mut input).unwrap(),
            KeyCommand::Insert('b')
        );
        assert_eq!(read_key_command(&mut input).unwrap(), KeyCommand::EndOfInput);
    }

    #[test]
    fn test_bare_line_feed_inserts_literally() {
        let mut input: &[u8] = b"\n";
        assert_eq!(
            read_key_command(&mut input).unwrap(),
            KeyCommand::Insert('\n')
        );
    }

    #[test]
    fn test_empty_stream_is_end_of_input() {
        let mut input: &[u8] = b"";
        assert_eq!(read_key_command(&mut input).unwrap(), KeyCommand::EndOfInput);
    }
}
