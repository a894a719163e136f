//! Conformance tooling for the document engine.
//!
//! Two independent checks keep the engine honest:
//!
//! - [`CorpusRunner`] replays hand-verified vectors from `corpus/corpus.json`
//!   (parse, strict parse, pretty print, minify) and compares exact output
//!   text or exact error name and position.
//! - [`DiffTestHarness`] parses the same input with the engine and with
//!   `serde_json` and compares compact renderings byte for byte, on the
//!   subset of JSON both accept identically (unsigned 32-bit integers, no
//!   duplicate keys).
//!
//! Mismatches carry a [`ReproBundle`] with everything needed to replay them.

pub mod corpus;
mod harness;
mod repro;

pub use corpus::{Corpus, CorpusResults, CorpusRunner, TestResult, TestVector};
pub use harness::{BatchResult, DiffResult, DiffTestHarness};
pub use repro::ReproBundle;

use crate::error::ErrorCode;

/// Result type for conformance operations.
pub type ConformanceResult<T> = Result<T, ConformanceError>;

/// Errors that can occur during conformance testing.
#[derive(Debug)]
pub enum ConformanceError {
    /// The engine failed outside the behavior under test
    Engine(ErrorCode),
    /// The reference implementation failed to serialize
    Reference(String),
}

impl From<ErrorCode> for ConformanceError {
    fn from(e: ErrorCode) -> Self {
        Self::Engine(e)
    }
}

impl std::fmt::Display for ConformanceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Engine(e) => write!(f, "engine error: {}", e),
            Self::Reference(msg) => write!(f, "reference error: {}", msg),
        }
    }
}

impl std::error::Error for ConformanceError {}

/// Index of the first byte where `a` and `b` differ.
pub fn first_difference(a: &str, b: &str) -> Option<usize> {
    let common = a.bytes().zip(b.bytes()).position(|(x, y)| x != y);
    match common {
        Some(i) => Some(i),
        None if a.len() != b.len() => Some(a.len().min(b.len())),
        None => None,
    }
}
