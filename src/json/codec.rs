//! String escaping and unescaping.
//!
//! Shared by the parser (unescape, including UTF-16 surrogate pairs) and
//! the printer (escape). Escaping scans once for bytes that need work and
//! copies verbatim when there are none; otherwise the exact output length is
//! known up front so callers can reserve it in one step.

use std::convert::Infallible;

use crate::alloc::{Allocator, SystemAllocator};
use crate::error::{ErrorCode, JsonResult};

/// Escape sequences for every byte below 0x20.
const CONTROL_ESCAPES: [&str; 32] = [
    "\\u0000", "\\u0001", "\\u0002", "\\u0003", "\\u0004", "\\u0005", "\\u0006", "\\u0007",
    "\\b", "\\t", "\\n", "\\u000b", "\\f", "\\r", "\\u000e", "\\u000f",
    "\\u0010", "\\u0011", "\\u0012", "\\u0013", "\\u0014", "\\u0015", "\\u0016", "\\u0017",
    "\\u0018", "\\u0019", "\\u001a", "\\u001b", "\\u001c", "\\u001d", "\\u001e", "\\u001f",
];

/// First byte marks of a UTF-8 sequence, indexed by sequence length.
const FIRST_BYTE_MARK: [u32; 5] = [0x00, 0x00, 0xC0, 0xE0, 0xF0];

fn escape_for(byte: u8) -> Option<&'static str> {
    match byte {
        b'"' => Some("\\\""),
        b'\\' => Some("\\\\"),
        b if b < 0x20 => CONTROL_ESCAPES.get(usize::from(b)).copied(),
        _ => None,
    }
}

/// Returns true if any byte of `s` must be escaped.
pub fn needs_escape(s: &str) -> bool {
    s.bytes().any(|b| escape_for(b).is_some())
}

/// Exact length of `s` once escaped and wrapped in quotes.
pub fn escaped_len(s: &str) -> usize {
    let body = if needs_escape(s) {
        s.bytes()
            .map(|b| escape_for(b).map_or(1, str::len))
            .sum()
    } else {
        s.len()
    };
    body + 2
}

/// Emit the quoted, escaped form of `s` as a sequence of chunks.
///
/// Unescaped runs are passed through as slices of `s`, so the emitted
/// chunks concatenate to exactly [`escaped_len`] bytes.
pub fn escape_with<E, F>(s: &str, mut emit: F) -> Result<(), E>
where
    F: FnMut(&str) -> Result<(), E>,
{
    emit("\"")?;
    if !needs_escape(s) {
        emit(s)?;
        return emit("\"");
    }
    let mut run_start = 0;
    for (i, byte) in s.bytes().enumerate() {
        if let Some(sequence) = escape_for(byte) {
            if run_start < i {
                emit(s.get(run_start..i).unwrap_or_default())?;
            }
            emit(sequence)?;
            run_start = i + 1;
        }
    }
    if run_start < s.len() {
        emit(s.get(run_start..).unwrap_or_default())?;
    }
    emit("\"")
}

/// Append the quoted, escaped form of `s` to `out`.
pub fn escape_into(s: &str, out: &mut String) {
    let result: Result<(), Infallible> = escape_with(s, |chunk| {
        out.push_str(chunk);
        Ok(())
    });
    if let Err(never) = result {
        match never {}
    }
}

/// Quote and escape `s`.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(escaped_len(s));
    escape_into(s, &mut out);
    out
}

/// Decode a complete quoted string literal such as `"a\nb"`.
///
/// The literal must span the whole input.
pub fn unescape(literal: &str) -> JsonResult<String> {
    let (text, end) = parse_string(literal.as_bytes(), 0, &SystemAllocator)?;
    if end != literal.len() {
        return Err(ErrorCode::E109_TrailingContent(end));
    }
    Ok(text)
}

/// Parse the string literal whose opening quote is at `start`.
///
/// Returns the unescaped text and the offset just past the closing quote.
/// The output buffer comes from `alloc`; on failure it is released before
/// the error is returned.
pub(crate) fn parse_string<A: Allocator + ?Sized>(
    input: &[u8],
    start: usize,
    alloc: &A,
) -> JsonResult<(String, usize)> {
    match input.get(start) {
        Some(b'"') => {}
        Some(_) => return Err(ErrorCode::E100_UnexpectedCharacter(start)),
        None => return Err(ErrorCode::E101_UnexpectedEnd(start)),
    }

    // First pass: find the closing quote and overestimate the output size.
    let body_start = start + 1;
    let mut end = body_start;
    let mut skipped = 0;
    loop {
        match input.get(end) {
            None => return Err(ErrorCode::E103_UnterminatedString(input.len())),
            Some(b'"') => break,
            Some(b'\\') => {
                if end + 1 >= input.len() {
                    return Err(ErrorCode::E103_UnterminatedString(input.len()));
                }
                skipped += 1;
                end += 2;
            }
            Some(_) => end += 1,
        }
    }

    let mut output = alloc.allocate(end - body_start - skipped)?;
    match decode_body(input, body_start, end, &mut output) {
        Ok(()) => {}
        Err(e) => {
            alloc.release(output);
            return Err(e);
        }
    }
    match String::from_utf8(output) {
        Ok(text) => Ok((text, end + 1)),
        Err(e) => {
            alloc.release(e.into_bytes());
            Err(ErrorCode::E500_InternalError("unescaped string is not UTF-8"))
        }
    }
}

/// Second pass: copy `input[pos..end]` into `output`, resolving escapes.
fn decode_body(input: &[u8], mut pos: usize, end: usize, output: &mut Vec<u8>) -> JsonResult<()> {
    while pos < end {
        let run_end = input
            .get(pos..end)
            .and_then(|rest| rest.iter().position(|&b| b == b'\\'))
            .map_or(end, |offset| pos + offset);
        if run_end > pos {
            output.extend_from_slice(input.get(pos..run_end).unwrap_or_default());
            pos = run_end;
            continue;
        }

        let unescaped = match input.get(pos + 1) {
            Some(b'b') => 0x08,
            Some(b'f') => 0x0C,
            Some(b'n') => b'\n',
            Some(b'r') => b'\r',
            Some(b't') => b'\t',
            Some(&c) if matches!(c, b'"' | b'\\' | b'/') => c,
            Some(b'u') => {
                pos += utf16_literal_to_utf8(input, pos, end, output)?;
                continue;
            }
            _ => return Err(ErrorCode::E104_InvalidEscape(pos)),
        };
        output.push(unescaped);
        pos += 2;
    }
    Ok(())
}

/// Parse four hex digits at `pos`.
fn parse_hex4(input: &[u8], pos: usize) -> Option<u32> {
    let digits = input.get(pos..pos + 4)?;
    digits.iter().try_fold(0u32, |acc, &b| {
        let digit = match b {
            b'0'..=b'9' => b - b'0',
            b'a'..=b'f' => b - b'a' + 10,
            b'A'..=b'F' => b - b'A' + 10,
            _ => return None,
        };
        Some((acc << 4) | u32::from(digit))
    })
}

/// Decode one `\uXXXX` (or surrogate pair `\uXXXX\uXXXX`) starting at the
/// backslash at `pos`. Returns the number of input bytes consumed.
fn utf16_literal_to_utf8(
    input: &[u8],
    pos: usize,
    end: usize,
    output: &mut Vec<u8>,
) -> JsonResult<usize> {
    let invalid = ErrorCode::E105_InvalidUnicodeEscape(pos);

    if end - pos < 6 {
        return Err(invalid);
    }
    let first = parse_hex4(input, pos + 2).ok_or_else(|| invalid.clone())?;

    // A low surrogate cannot come first.
    if (0xDC00..=0xDFFF).contains(&first) {
        return Err(invalid);
    }

    let (codepoint, consumed) = if (0xD800..=0xDBFF).contains(&first) {
        let second_pos = pos + 6;
        if end - second_pos < 6 {
            return Err(invalid);
        }
        if input.get(second_pos..second_pos + 2) != Some(b"\\u".as_slice()) {
            return Err(invalid);
        }
        let second = parse_hex4(input, second_pos + 2).ok_or_else(|| invalid.clone())?;
        if !(0xDC00..=0xDFFF).contains(&second) {
            return Err(invalid);
        }
        (0x10000 + (((first & 0x3FF) << 10) | (second & 0x3FF)), 12)
    } else {
        (first, 6)
    };

    if !encode_utf8(codepoint, output) {
        return Err(invalid);
    }
    Ok(consumed)
}

/// Append `codepoint` as 1-4 UTF-8 bytes. Returns false above U+10FFFF.
pub(crate) fn encode_utf8(codepoint: u32, output: &mut Vec<u8>) -> bool {
    let len = match codepoint {
        0..=0x7F => 1,
        0x80..=0x7FF => 2,
        0x800..=0xFFFF => 3,
        0x1_0000..=0x10_FFFF => 4,
        _ => return false,
    };
    let mut bytes = [0u8; 4];
    let mut rest = codepoint;
    for slot in bytes.iter_mut().take(len).skip(1).rev() {
        *slot = ((rest | 0x80) & 0xBF) as u8;
        rest >>= 6;
    }
    bytes[0] = ((rest | FIRST_BYTE_MARK[len]) & 0xFF) as u8;
    output.extend_from_slice(&bytes[..len]);
    true
}
