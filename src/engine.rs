//! Engine entry points.
//!
//! An [`Engine`] bundles the allocator every buffer is drawn from with the
//! [`Limits`] applied while parsing and printing. Node construction, parsing,
//! printing and deletion all go through it; the mutation API lives in
//! [`crate::json::mutate`] as further `Engine` methods.
//!
//! # Example
//!
//! ```
//! use jsontree::Engine;
//!
//! let engine = Engine::new();
//! let doc = engine.parse(r#"{"a":1,"b":[true,false,null]}"#).unwrap();
//! assert_eq!(doc.object_item("b").unwrap().array_size(), 3);
//!
//! let text = engine.print_unformatted(&doc).unwrap();
//! assert_eq!(text, r#"{"a":1,"b":[true,false,null]}"#);
//! engine.release_text(text);
//! engine.delete(doc);
//! ```

use std::borrow::Cow;
use std::cell::Cell;

use crate::alloc::{Allocator, SystemAllocator};
use crate::error::{ErrorCode, JsonResult};
use crate::json::limits::Limits;
use crate::json::parser::Parser;
use crate::json::printer::{self, Unbuffered};
use crate::json::types::{Node, Value};

thread_local! {
    static LAST_ERROR: Cell<Option<usize>> = const { Cell::new(None) };
}

/// Position of the most recent parse failure on this thread.
///
/// Cleared by every successful parse and set by every failed one. Failures
/// without an input position (allocation failures) leave it `None`. Prefer
/// the position carried by the returned [`ErrorCode`].
pub fn last_error_position() -> Option<usize> {
    LAST_ERROR.with(Cell::get)
}

/// Parser, printer and node factory bound to one allocator.
#[derive(Debug, Clone, Default)]
pub struct Engine<A: Allocator = SystemAllocator> {
    alloc: A,
    limits: Limits,
}

impl Engine<SystemAllocator> {
    /// Engine on the global heap with default limits.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<A: Allocator> Engine<A> {
    /// Engine drawing every buffer from `alloc`.
    pub fn with_allocator(alloc: A) -> Self {
        Self {
            alloc,
            limits: Limits::default(),
        }
    }

    /// Replace the limits.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// The allocator in use.
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    /// The limits in use.
    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Copy `s` into a buffer from the engine's allocator.
    pub(crate) fn dup_str(&self, s: &str) -> JsonResult<String> {
        let mut buffer = self.alloc.allocate(s.len())?;
        buffer.extend_from_slice(s.as_bytes());
        String::from_utf8(buffer).map_err(|e| {
            self.alloc.release(e.into_bytes());
            ErrorCode::E500_InternalError("copied string is not UTF-8")
        })
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// `null`.
    pub fn create_null<'a>(&self) -> Node<'a> {
        Node::null()
    }

    /// `true`.
    pub fn create_true<'a>(&self) -> Node<'a> {
        Node::bool(true)
    }

    /// `false`.
    pub fn create_false<'a>(&self) -> Node<'a> {
        Node::bool(false)
    }

    /// `true` or `false`.
    pub fn create_bool<'a>(&self, value: bool) -> Node<'a> {
        Node::bool(value)
    }

    /// Number.
    pub fn create_number<'a>(&self, value: u32) -> Node<'a> {
        Node::number(value)
    }

    /// Empty array.
    pub fn create_array<'a>(&self) -> Node<'a> {
        Node::array()
    }

    /// Empty object.
    pub fn create_object<'a>(&self) -> Node<'a> {
        Node::object()
    }

    /// String holding a copy of `value`.
    pub fn create_string<'a>(&self, value: &str) -> JsonResult<Node<'a>> {
        let text = self.dup_str(value)?;
        Ok(Node::new(Value::String(Cow::Owned(text))))
    }

    /// Raw node holding a copy of `text`, emitted verbatim when printed.
    pub fn create_raw<'a>(&self, text: &str) -> JsonResult<Node<'a>> {
        let text = self.dup_str(text)?;
        Ok(Node::new(Value::Raw(Cow::Owned(text))))
    }

    // ========================================================================
    // Parsing
    // ========================================================================

    /// Parse one value from the start of `text`.
    ///
    /// Content after the value is ignored; use [`Engine::parse_with_options`]
    /// to reject it or to learn where parsing stopped.
    pub fn parse<'a>(&self, text: &str) -> JsonResult<Node<'a>> {
        self.parse_with_options(text, false).map(|(node, _)| node)
    }

    /// Parse one value, returning it with the offset where parsing stopped.
    ///
    /// With `require_end`, trailing whitespace is consumed and anything after
    /// it fails with `E109_TrailingContent`.
    pub fn parse_with_options<'a>(
        &self,
        text: &str,
        require_end: bool,
    ) -> JsonResult<(Node<'a>, usize)> {
        let result =
            Parser::new(text.as_bytes(), &self.alloc, self.limits).parse_document(require_end);
        match &result {
            Ok(_) => LAST_ERROR.with(|slot| slot.set(None)),
            Err(e) => {
                log::debug!("parse failed: {e}");
                LAST_ERROR.with(|slot| slot.set(e.position()));
            }
        }
        result
    }

    // ========================================================================
    // Printing
    // ========================================================================

    /// Pretty text, one allocation per node.
    pub fn print(&self, node: &Node<'_>) -> JsonResult<String> {
        Unbuffered::new(&self.alloc, true).render(node, 0)
    }

    /// Compact text, one allocation per node.
    pub fn print_unformatted(&self, node: &Node<'_>) -> JsonResult<String> {
        Unbuffered::new(&self.alloc, false).render(node, 0)
    }

    /// Text rendered into one buffer that starts at `size_hint` bytes and
    /// doubles as needed, up to [`Limits::max_print_size`].
    pub fn print_buffered(
        &self,
        node: &Node<'_>,
        size_hint: usize,
        pretty: bool,
    ) -> JsonResult<String> {
        printer::print_buffered(
            &self.alloc,
            node,
            size_hint,
            self.limits.max_print_size,
            pretty,
        )
    }

    /// Render into `buffer` without allocating. Returns the bytes written;
    /// output that does not fit fails with `E301_BufferTooSmall`.
    pub fn print_preallocated(
        &self,
        node: &Node<'_>,
        buffer: &mut [u8],
        pretty: bool,
    ) -> JsonResult<usize> {
        printer::print_fixed(&self.alloc, node, buffer, pretty)
    }

    // ========================================================================
    // Release
    // ========================================================================

    /// Release `node` and everything it owns.
    ///
    /// Borrowed names and the targets of reference nodes are untouched.
    pub fn delete(&self, node: Node<'_>) {
        node.release_into(&self.alloc);
    }

    /// Return printed text to the allocator.
    pub fn release_text(&self, text: String) {
        self.alloc.release(text.into_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::BudgetAllocator;

    #[test]
    fn test_create_and_print() {
        let engine = Engine::new();
        assert_eq!(engine.print(&engine.create_null()).unwrap(), "null");
        assert_eq!(engine.print(&engine.create_bool(true)).unwrap(), "true");
        assert_eq!(engine.print(&engine.create_false()).unwrap(), "false");
        assert_eq!(engine.print(&engine.create_number(0)).unwrap(), "0");
        assert_eq!(engine.print(&engine.create_string("a\nb").unwrap()).unwrap(), r#""a\nb""#);
        assert_eq!(engine.print(&engine.create_raw("1.25").unwrap()).unwrap(), "1.25");
    }

    #[test]
    fn test_last_error_slot() {
        let engine = Engine::new();
        assert!(engine.parse("[1,2,]").is_err());
        assert_eq!(last_error_position(), Some(5));
        assert!(engine.parse("[]").is_ok());
        assert_eq!(last_error_position(), None);
    }

    #[test]
    fn test_parse_with_options_end() {
        let engine = Engine::new();
        let (_, end) = engine.parse_with_options("[1] ", false).unwrap();
        assert_eq!(end, 3);
        let (_, end) = engine.parse_with_options("[1] ", true).unwrap();
        assert_eq!(end, 4);
        assert_eq!(
            engine.parse_with_options("[1] 2", true).unwrap_err(),
            ErrorCode::E109_TrailingContent(4)
        );
    }

    #[test]
    fn test_limits_are_applied() {
        let engine = Engine::new().with_limits(Limits::strict().with_nesting_depth(1));
        assert!(engine.parse("[1]").is_ok());
        assert_eq!(
            engine.parse("[[1]]").unwrap_err(),
            ErrorCode::E110_NestingTooDeep(1, 1)
        );
    }

    #[test]
    fn test_delete_returns_every_buffer() {
        let engine = Engine::with_allocator(BudgetAllocator::new(1 << 16));
        let doc = engine.parse(r#"{"k":["x","y",{"z":"w"}],"n":1}"#).unwrap();
        assert!(engine.allocator().outstanding() > 0);
        let text = engine.print(&doc).unwrap();
        engine.release_text(text);
        engine.delete(doc);
        assert_eq!(engine.allocator().outstanding(), 0);
        assert_eq!(engine.allocator().live_buffers(), 0);
    }

    #[test]
    fn test_create_string_allocation_failure() {
        let engine = Engine::with_allocator(BudgetAllocator::new(2));
        assert_eq!(
            engine.create_string("abc").unwrap_err(),
            ErrorCode::E300_AllocationFailed(3)
        );
    }
}
