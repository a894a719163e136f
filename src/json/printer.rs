//! Rendering of a tree back to text.
//!
//! Two strategies share one layout:
//!
//! - Unbuffered: every node renders into its own exactly sized string.
//!   Containers render all children first, sum their lengths, then allocate
//!   once and copy. A failure releases every string produced so far.
//! - Buffered: one [`PrintBuffer`] receives all output. A growable buffer
//!   doubles on demand up to a size ceiling; a caller-owned fixed buffer
//!   never grows and overflow is an error.
//!
//! Layout: compact output has no whitespace. Pretty output separates array
//! elements with `", "` on one line and puts each object member on its own
//! line, indented with tabs, as `"key":\tvalue`.

use std::fmt;

use super::codec::{escape_with, escaped_len};
use super::limits::MAX_PRINT_SIZE;
use super::types::{Node, Value};
use crate::alloc::{Allocator, SystemAllocator};
use crate::error::{ErrorCode, JsonResult};

/// Widest decimal rendering of a `u32`.
const NUMBER_WIDTH: usize = 10;

/// Initial size of the buffer used by `Display`.
const DISPLAY_PREBUFFER: usize = 256;

/// Render `value` in decimal into the tail of `scratch`.
fn format_u32(mut value: u32, scratch: &mut [u8; NUMBER_WIDTH]) -> &[u8] {
    let mut start = NUMBER_WIDTH;
    loop {
        start -= 1;
        scratch[start] = b'0' + (value % 10) as u8;
        value /= 10;
        if value == 0 {
            break;
        }
    }
    &scratch[start..]
}

/// Separators that differ between compact and pretty output.
struct Punctuation {
    element: &'static [u8],
    open_object: &'static [u8],
    key: &'static [u8],
}

const COMPACT: Punctuation = Punctuation {
    element: b",",
    open_object: b"{",
    key: b":",
};

const PRETTY: Punctuation = Punctuation {
    element: b", ",
    open_object: b"{\n",
    key: b":\t",
};

fn punctuation(pretty: bool) -> &'static Punctuation {
    if pretty {
        &PRETTY
    } else {
        &COMPACT
    }
}

fn literal_for(value: &Value<'_>) -> Option<&'static [u8]> {
    match value {
        Value::Null | Value::Reference(_) => Some(b"null"),
        Value::False => Some(b"false"),
        Value::True => Some(b"true"),
        _ => None,
    }
}

fn into_text<A: Allocator + ?Sized>(alloc: &A, bytes: Vec<u8>) -> JsonResult<String> {
    String::from_utf8(bytes).map_err(|e| {
        alloc.release(e.into_bytes());
        ErrorCode::E500_InternalError("rendered output is not UTF-8")
    })
}

// ============================================================================
// Buffered
// ============================================================================

enum Storage<'b> {
    Growable(Vec<u8>),
    Fixed(&'b mut [u8]),
}

/// Output buffer for the buffered printer.
pub(crate) struct PrintBuffer<'b, A: Allocator + ?Sized> {
    storage: Storage<'b>,
    offset: usize,
    max_size: usize,
    alloc: &'b A,
}

impl<'b, A: Allocator + ?Sized> PrintBuffer<'b, A> {
    /// Growable buffer starting at `size_hint` bytes.
    pub(crate) fn growable(alloc: &'b A, size_hint: usize, max_size: usize) -> JsonResult<Self> {
        if size_hint > max_size {
            return Err(ErrorCode::E302_SizeLimitExceeded(size_hint, max_size));
        }
        Ok(Self {
            storage: Storage::Growable(alloc.allocate(size_hint)?),
            offset: 0,
            max_size,
            alloc,
        })
    }

    /// Caller-owned buffer that never grows.
    pub(crate) fn fixed(alloc: &'b A, buffer: &'b mut [u8]) -> Self {
        Self {
            storage: Storage::Fixed(buffer),
            offset: 0,
            max_size: MAX_PRINT_SIZE,
            alloc,
        }
    }

    /// Bytes written so far.
    pub(crate) fn len(&self) -> usize {
        self.offset
    }

    fn capacity(&self) -> usize {
        match &self.storage {
            Storage::Growable(buffer) => buffer.capacity(),
            Storage::Fixed(buffer) => buffer.len(),
        }
    }

    /// Make room for `needed` more bytes.
    pub(crate) fn ensure(&mut self, needed: usize) -> JsonResult<()> {
        if needed > self.max_size {
            return Err(ErrorCode::E302_SizeLimitExceeded(needed, self.max_size));
        }
        let required = self
            .offset
            .checked_add(needed)
            .ok_or(ErrorCode::E302_SizeLimitExceeded(usize::MAX, self.max_size))?;
        let available = self.capacity();
        if required <= available {
            return Ok(());
        }

        let old = match &mut self.storage {
            Storage::Fixed(_) => return Err(ErrorCode::E301_BufferTooSmall(required, available)),
            Storage::Growable(buffer) => buffer,
        };
        let new_size = match required.checked_mul(2) {
            Some(doubled) if doubled <= self.max_size => doubled,
            _ if required <= self.max_size => self.max_size,
            _ => return Err(ErrorCode::E302_SizeLimitExceeded(required, self.max_size)),
        };

        let mut grown = self.alloc.allocate(new_size)?;
        grown.extend_from_slice(old);
        log::trace!("print buffer grew from {available} to {new_size} bytes");
        let old = std::mem::replace(old, grown);
        self.alloc.release(old);
        Ok(())
    }

    /// Append `bytes`, growing if allowed.
    pub(crate) fn push(&mut self, bytes: &[u8]) -> JsonResult<()> {
        self.ensure(bytes.len())?;
        let end = self.offset + bytes.len();
        match &mut self.storage {
            Storage::Growable(buffer) => buffer.extend_from_slice(bytes),
            Storage::Fixed(buffer) => buffer
                .get_mut(self.offset..end)
                .ok_or(ErrorCode::E500_InternalError("fixed buffer overrun"))?
                .copy_from_slice(bytes),
        }
        self.offset = end;
        Ok(())
    }

    fn push_tabs(&mut self, count: usize) -> JsonResult<()> {
        self.ensure(count)?;
        for _ in 0..count {
            self.push(b"\t")?;
        }
        Ok(())
    }

    fn push_escaped(&mut self, s: &str) -> JsonResult<()> {
        self.ensure(escaped_len(s))?;
        escape_with(s, |chunk| self.push(chunk.as_bytes()))
    }

    /// Hand the buffer back to the allocator without producing output.
    pub(crate) fn discard(self) {
        if let Storage::Growable(buffer) = self.storage {
            self.alloc.release(buffer);
        }
    }

    /// Finish a growable buffer as text.
    pub(crate) fn into_string(self) -> JsonResult<String> {
        match self.storage {
            Storage::Growable(buffer) => into_text(self.alloc, buffer),
            Storage::Fixed(_) => Err(ErrorCode::E500_InternalError(
                "fixed print buffer has no owned text",
            )),
        }
    }

    /// Render `node` at nesting `depth`.
    pub(crate) fn render(&mut self, node: &Node<'_>, depth: usize, pretty: bool) -> JsonResult<()> {
        let value = node.value.resolve();
        if let Some(literal) = literal_for(value) {
            return self.push(literal);
        }
        match value {
            Value::Number(n) => {
                let mut scratch = [0u8; NUMBER_WIDTH];
                self.push(format_u32(*n, &mut scratch))
            }
            Value::String(s) => self.push_escaped(s),
            Value::Raw(text) => self.push(text.as_bytes()),
            Value::Array(items) => self.render_array(items, depth, pretty),
            Value::Object(members) => self.render_object(members, depth, pretty),
            _ => Err(ErrorCode::E500_InternalError("unrenderable value")),
        }
    }

    fn render_array(&mut self, items: &[Node<'_>], depth: usize, pretty: bool) -> JsonResult<()> {
        self.push(b"[")?;
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.push(punctuation(pretty).element)?;
            }
            self.render(item, depth + 1, pretty)?;
        }
        self.push(b"]")
    }

    fn render_object(&mut self, members: &[Node<'_>], depth: usize, pretty: bool) -> JsonResult<()> {
        if members.is_empty() {
            if pretty {
                self.push(b"{\n")?;
                self.push_tabs(depth)?;
                return self.push(b"}");
            }
            return self.push(b"{}");
        }

        self.push(punctuation(pretty).open_object)?;
        let last = members.len() - 1;
        for (i, member) in members.iter().enumerate() {
            if pretty {
                self.push_tabs(depth + 1)?;
            }
            self.push_escaped(member.name().unwrap_or_default())?;
            self.push(punctuation(pretty).key)?;
            self.render(member, depth + 1, pretty)?;
            if i != last {
                self.push(b",")?;
            }
            if pretty {
                self.push(b"\n")?;
            }
        }
        if pretty {
            self.push_tabs(depth)?;
        }
        self.push(b"}")
    }
}

/// Render into a growable buffer that starts at `size_hint` bytes.
pub(crate) fn print_buffered<A: Allocator + ?Sized>(
    alloc: &A,
    node: &Node<'_>,
    size_hint: usize,
    max_size: usize,
    pretty: bool,
) -> JsonResult<String> {
    let mut buffer = PrintBuffer::growable(alloc, size_hint, max_size)?;
    match buffer.render(node, 0, pretty) {
        Ok(()) => buffer.into_string(),
        Err(e) => {
            buffer.discard();
            Err(e)
        }
    }
}

/// Render into a caller-owned buffer. Returns the number of bytes written.
pub(crate) fn print_fixed<A: Allocator + ?Sized>(
    alloc: &A,
    node: &Node<'_>,
    output: &mut [u8],
    pretty: bool,
) -> JsonResult<usize> {
    let mut buffer = PrintBuffer::fixed(alloc, output);
    buffer.render(node, 0, pretty)?;
    Ok(buffer.len())
}

// ============================================================================
// Unbuffered
// ============================================================================

/// Renderer that gives every node its own allocation.
pub(crate) struct Unbuffered<'e, A: Allocator + ?Sized> {
    alloc: &'e A,
    pretty: bool,
}

impl<'e, A: Allocator + ?Sized> Unbuffered<'e, A> {
    pub(crate) fn new(alloc: &'e A, pretty: bool) -> Self {
        Self { alloc, pretty }
    }

    fn copy(&self, bytes: &[u8]) -> JsonResult<String> {
        let mut out = self.alloc.allocate(bytes.len())?;
        out.extend_from_slice(bytes);
        into_text(self.alloc, out)
    }

    fn escaped(&self, s: &str) -> JsonResult<String> {
        let mut out = self.alloc.allocate(escaped_len(s))?;
        let result: Result<(), std::convert::Infallible> = escape_with(s, |chunk| {
            out.extend_from_slice(chunk.as_bytes());
            Ok(())
        });
        if let Err(never) = result {
            match never {}
        }
        into_text(self.alloc, out)
    }

    fn release_all(&self, parts: Vec<String>) {
        for part in parts {
            self.alloc.release(part.into_bytes());
        }
    }

    /// Render `node` at nesting `depth`.
    pub(crate) fn render(&self, node: &Node<'_>, depth: usize) -> JsonResult<String> {
        let value = node.value.resolve();
        if let Some(literal) = literal_for(value) {
            return self.copy(literal);
        }
        match value {
            Value::Number(n) => {
                let mut scratch = [0u8; NUMBER_WIDTH];
                self.copy(format_u32(*n, &mut scratch))
            }
            Value::String(s) => self.escaped(s),
            Value::Raw(text) => self.copy(text.as_bytes()),
            Value::Array(items) => self.render_array(items, depth),
            Value::Object(members) => self.render_object(members, depth),
            _ => Err(ErrorCode::E500_InternalError("unrenderable value")),
        }
    }

    /// Collect rendered parts, releasing the finished ones on failure.
    fn render_each<I>(&self, parts: I) -> JsonResult<Vec<String>>
    where
        I: IntoIterator<Item = JsonResult<String>>,
    {
        let mut rendered = Vec::new();
        for part in parts {
            match part {
                Ok(text) => rendered.push(text),
                Err(e) => {
                    self.release_all(rendered);
                    return Err(e);
                }
            }
        }
        Ok(rendered)
    }

    fn assemble(
        &self,
        total: usize,
        parts: Vec<String>,
        write: impl FnOnce(&[String], &mut Vec<u8>),
    ) -> JsonResult<String> {
        let mut out = match self.alloc.allocate(total) {
            Ok(out) => out,
            Err(e) => {
                self.release_all(parts);
                return Err(e);
            }
        };
        write(&parts, &mut out);
        self.release_all(parts);
        into_text(self.alloc, out)
    }

    fn render_array(&self, items: &[Node<'_>], depth: usize) -> JsonResult<String> {
        if items.is_empty() {
            return self.copy(b"[]");
        }
        let entries = self.render_each(items.iter().map(|item| self.render(item, depth + 1)))?;

        let separator = punctuation(self.pretty).element;
        let total = 2
            + entries.iter().map(String::len).sum::<usize>()
            + separator.len() * (entries.len() - 1);
        self.assemble(total, entries, |entries, out| {
            out.push(b'[');
            for (i, entry) in entries.iter().enumerate() {
                if i > 0 {
                    out.extend_from_slice(separator);
                }
                out.extend_from_slice(entry.as_bytes());
            }
            out.push(b']');
        })
    }

    fn render_object(&self, members: &[Node<'_>], depth: usize) -> JsonResult<String> {
        let pretty = self.pretty;
        if members.is_empty() {
            if !pretty {
                return self.copy(b"{}");
            }
            let mut text = Vec::with_capacity(depth + 3);
            text.extend_from_slice(b"{\n");
            text.resize(depth + 2, b'\t');
            text.push(b'}');
            return self.copy(&text);
        }

        // Names and values interleave: [name0, value0, name1, value1, ...].
        let mut parts = Vec::with_capacity(members.len() * 2);
        for member in members {
            let rendered = self
                .escaped(member.name().unwrap_or_default())
                .and_then(|name| {
                    parts.push(name);
                    self.render(member, depth + 1)
                });
            match rendered {
                Ok(value) => parts.push(value),
                Err(e) => {
                    self.release_all(parts);
                    return Err(e);
                }
            }
        }

        let marks = punctuation(pretty);
        let indent = if pretty { depth + 1 } else { 0 };
        let per_member = indent + if pretty { 3 } else { 1 };
        let count = members.len();
        let total = parts.iter().map(String::len).sum::<usize>()
            + per_member * count
            + (count - 1)
            + if pretty { 2 + depth + 1 } else { 2 };
        self.assemble(total, parts, |parts, out| {
            out.extend_from_slice(marks.open_object);
            for (i, pair) in parts.chunks(2).enumerate() {
                out.resize(out.len() + indent, b'\t');
                for (j, part) in pair.iter().enumerate() {
                    if j == 1 {
                        out.extend_from_slice(marks.key);
                    }
                    out.extend_from_slice(part.as_bytes());
                }
                if i + 1 != count {
                    out.push(b',');
                }
                if pretty {
                    out.push(b'\n');
                }
            }
            if pretty {
                out.resize(out.len() + depth, b'\t');
            }
            out.push(b'}');
        })
    }
}

/// Compact with `{}`, pretty with `{:#}`.
impl fmt::Display for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = print_buffered(
            &SystemAllocator,
            self,
            DISPLAY_PREBUFFER,
            MAX_PRINT_SIZE,
            f.alternate(),
        )
        .map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    use crate::alloc::BudgetAllocator;

    fn member<'a>(name: &'a str, node: Node<'a>) -> Node<'a> {
        Node {
            name: Some(Cow::Borrowed(name)),
            value: node.value,
        }
    }

    fn sample() -> Node<'static> {
        Node::new(Value::Object(vec![
            member("a", Node::number(1)),
            member(
                "b",
                Node::new(Value::Array(vec![
                    Node::bool(true),
                    Node::bool(false),
                    Node::null(),
                ])),
            ),
            member("c", Node::object()),
            member("d", Node::new(Value::String("x\"y".into()))),
        ]))
    }

    fn unbuffered(node: &Node<'_>, pretty: bool) -> String {
        Unbuffered::new(&SystemAllocator, pretty).render(node, 0).unwrap()
    }

    fn buffered(node: &Node<'_>, pretty: bool) -> String {
        print_buffered(&SystemAllocator, node, 1, MAX_PRINT_SIZE, pretty).unwrap()
    }

    #[test]
    fn test_format_u32() {
        let mut scratch = [0u8; NUMBER_WIDTH];
        assert_eq!(format_u32(0, &mut scratch), b"0");
        assert_eq!(format_u32(7, &mut scratch), b"7");
        assert_eq!(format_u32(1200, &mut scratch), b"1200");
        assert_eq!(format_u32(u32::MAX, &mut scratch), b"4294967295");
    }

    #[test]
    fn test_compact_layout() {
        let expected = r#"{"a":1,"b":[true,false,null],"c":{},"d":"x\"y"}"#;
        assert_eq!(unbuffered(&sample(), false), expected);
        assert_eq!(buffered(&sample(), false), expected);
    }

    #[test]
    fn test_pretty_layout() {
        let expected = "{\n\t\"a\":\t1,\n\t\"b\":\t[true, false, null],\n\t\"c\":\t{\n\t},\n\t\"d\":\t\"x\\\"y\"\n}";
        assert_eq!(unbuffered(&sample(), true), expected);
        assert_eq!(buffered(&sample(), true), expected);
    }

    #[test]
    fn test_pretty_nested_object_indent() {
        let node = Node::new(Value::Array(vec![Node::new(Value::Object(vec![member(
            "k",
            Node::null(),
        )]))]));
        let expected = "[{\n\t\t\"k\":\tnull\n\t}]";
        assert_eq!(unbuffered(&node, true), expected);
        assert_eq!(buffered(&node, true), expected);
    }

    #[test]
    fn test_empty_containers() {
        assert_eq!(unbuffered(&Node::array(), true), "[]");
        assert_eq!(unbuffered(&Node::object(), false), "{}");
        assert_eq!(unbuffered(&Node::object(), true), "{\n}");
        assert_eq!(buffered(&Node::object(), true), "{\n}");
    }

    #[test]
    fn test_raw_is_verbatim() {
        let node = Node::new(Value::Array(vec![Node::new(Value::Raw("{ \"x\" : 1.5 }".into()))]));
        assert_eq!(unbuffered(&node, false), "[{ \"x\" : 1.5 }]");
        assert_eq!(buffered(&node, false), "[{ \"x\" : 1.5 }]");
    }

    #[test]
    fn test_reference_renders_target() {
        let target = Node::new(Value::Array(vec![Node::number(5)]));
        let alias = Node::new(Value::Reference(&target));
        assert_eq!(unbuffered(&alias, false), "[5]");
        assert_eq!(buffered(&alias, false), "[5]");
    }

    #[test]
    fn test_fixed_buffer_exact_fit() {
        let node = sample();
        let expected = unbuffered(&node, false);
        let mut exact = vec![0u8; expected.len()];
        let written = print_fixed(&SystemAllocator, &node, &mut exact, false).unwrap();
        assert_eq!(written, expected.len());
        assert_eq!(exact, expected.as_bytes());

        let mut short = vec![0u8; expected.len() - 1];
        let err = print_fixed(&SystemAllocator, &node, &mut short, false).unwrap_err();
        assert!(matches!(err, ErrorCode::E301_BufferTooSmall(_, _)));
    }

    #[test]
    fn test_growth_respects_ceiling() {
        let node = Node::new(Value::String("0123456789".into()));
        let err = print_buffered(&SystemAllocator, &node, 0, 8, false).unwrap_err();
        assert_eq!(err, ErrorCode::E302_SizeLimitExceeded(12, 8));
        let hint = print_buffered(&SystemAllocator, &node, 16, 8, false).unwrap_err();
        assert_eq!(hint, ErrorCode::E302_SizeLimitExceeded(16, 8));
    }

    #[test]
    fn test_growth_is_capped_at_ceiling() {
        let node = Node::new(Value::String("abcdef".into()));
        let text = print_buffered(&SystemAllocator, &node, 0, 10, false).unwrap();
        // Doubling 8 to 16 would overshoot; the buffer is capped at 10 instead.
        assert_eq!(text, "\"abcdef\"");
    }

    #[test]
    fn test_unbuffered_failure_releases_everything() {
        let node = sample();
        let full = unbuffered(&node, true).len();
        for budget in [0, 4, 16, full] {
            let alloc = BudgetAllocator::new(budget);
            let result = Unbuffered::new(&alloc, true).render(&node, 0);
            assert!(result.is_err(), "budget {budget}");
            assert_eq!(alloc.outstanding(), 0, "budget {budget}");
        }
    }

    #[test]
    fn test_buffered_failure_releases_everything() {
        let node = sample();
        let alloc = BudgetAllocator::new(40);
        let result = print_buffered(&alloc, &node, 4, MAX_PRINT_SIZE, false);
        assert!(matches!(result, Err(ErrorCode::E300_AllocationFailed(_))));
        assert_eq!(alloc.outstanding(), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(sample().to_string(), unbuffered(&sample(), false));
        assert_eq!(format!("{:#}", sample()), unbuffered(&sample(), true));
    }
}
