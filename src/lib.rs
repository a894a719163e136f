//! jsontree - a JSON document engine.
//!
//! Parses JSON text into an owned document tree, renders trees back to text
//! with either per-node allocation or a single growth buffer, and edits trees
//! under explicit ownership rules: borrowed member names and reference nodes
//! are never released with the tree that holds them.
//!
//! # Architecture
//!
//! - [`json`] - Document model, string codec, parser, printer, mutation API
//!   and minifier
//! - [`engine`] - [`Engine`], the entry point binding an allocator and limits
//! - [`alloc`] - The [`Allocator`] capability every byte buffer is drawn from
//! - [`error`] - Error codes for parse, shape and allocation failures
//! - [`conformance`] - Corpus runner and differential harness against
//!   `serde_json`
//!
//! # Example
//!
//! ```
//! use jsontree::Engine;
//!
//! let engine = Engine::new();
//! let mut doc = engine.parse(r#"{"name":"demo","tags":["a"]}"#).unwrap();
//! engine.add_number_to_object(&mut doc, "count", 2).unwrap();
//! assert_eq!(
//!     engine.print_unformatted(&doc).unwrap(),
//!     r#"{"name":"demo","tags":["a"],"count":2}"#
//! );
//! ```

// Library code must surface every failure as a Result.
// Tests are checked separately with `cargo test`.
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(missing_docs)]

pub mod alloc;
pub mod conformance;
pub mod engine;
pub mod error;
pub mod json;

// Re-export commonly used types
pub use alloc::{Allocator, BudgetAllocator, SystemAllocator};
pub use conformance::{DiffResult, DiffTestHarness};
pub use engine::{last_error_position, Engine};
pub use error::{ErrorCode, JsonResult};
pub use json::{Kind, Limits, Node, Value};
