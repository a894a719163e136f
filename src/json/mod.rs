//! JSON document model, codec, parser, printer and mutation API.
//!
//! # Architecture
//!
//! The JSON subsystem is organized into focused modules, leaves first:
//!
//! - [`types`] - Document tree (`Node`, `Value`, `Kind`) and queries
//! - [`limits`] - Nesting and print-size limits
//! - [`codec`] - String escaping, unescaping and surrogate-pair decoding
//! - `parser` - Recursive descent parser with error positions
//! - `printer` - Unbuffered and buffered renderers
//! - [`mutate`] - Structural edits (insert, detach, replace, duplicate)
//! - [`minify`] - Whitespace and comment stripping
//!
//! # Grammar
//!
//! Literals `null`/`true`/`false`, integers (saturated into `0..=u32::MAX`),
//! double-quoted strings, arrays and objects with string keys. There are no
//! floats: a fraction or exponent after the integer part is left unparsed.
//!
//! # Example
//!
//! ```
//! use jsontree::json::{parse, print, print_unformatted};
//!
//! let doc = parse("[4294967296, -5, \"a\"]").unwrap();
//! assert_eq!(print_unformatted(&doc).unwrap(), "[4294967295,0,\"a\"]");
//! assert_eq!(print(&doc).unwrap(), "[4294967295, 0, \"a\"]");
//! ```

pub mod codec;
pub mod limits;
pub mod minify;
pub mod mutate;
pub(crate) mod parser;
pub(crate) mod printer;
pub mod types;

// Re-export commonly used items
pub use codec::{escape, unescape};
pub use limits::Limits;
pub use minify::{minify, minify_in_place};
pub use types::{Kind, Node, Value};

use crate::engine::Engine;
use crate::error::JsonResult;

/// Parse one value from the start of `text` on the global heap.
pub fn parse<'a>(text: &str) -> JsonResult<Node<'a>> {
    Engine::new().parse(text)
}

/// Parse one value and report where parsing stopped.
pub fn parse_with_options<'a>(text: &str, require_end: bool) -> JsonResult<(Node<'a>, usize)> {
    Engine::new().parse_with_options(text, require_end)
}

/// Pretty text on the global heap.
pub fn print(node: &Node<'_>) -> JsonResult<String> {
    Engine::new().print(node)
}

/// Compact text on the global heap.
pub fn print_unformatted(node: &Node<'_>) -> JsonResult<String> {
    Engine::new().print_unformatted(node)
}
