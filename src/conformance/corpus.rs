//! Corpus-based conformance testing.
//!
//! Loads test vectors from `corpus.json` and runs them against the engine.
//! Every vector names an operation, an input text and the exact expected
//! outcome:
//!
//! - `{"ok": "<text>"}` for the rendered output
//! - `{"err": {"name": "E1xx_...", "position": N}}` for a parse failure
//!
//! Operations:
//!
//! - `parse`: lenient parse, then compact print
//! - `parse_strict`: parse requiring full consumption, then compact print
//! - `print_pretty`: strict parse, then pretty print
//! - `minify`: whitespace and comment stripping

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::engine::Engine;
use crate::error::{ErrorCode, JsonResult};
use crate::json::minify;

/// Corpus manifest with metadata.
#[derive(Debug, Deserialize)]
pub struct CorpusManifest {
    /// Format version of the corpus file.
    pub format_version: String,
    /// Corpus version.
    pub version: String,
    /// What the corpus covers.
    #[serde(default)]
    pub description: String,
}

/// A corpus containing test vectors.
#[derive(Debug, Deserialize)]
pub struct Corpus {
    /// Corpus metadata.
    pub manifest: CorpusManifest,
    /// List of test vectors.
    pub vectors: Vec<TestVector>,
}

/// A single test vector.
#[derive(Debug, Deserialize)]
pub struct TestVector {
    /// Unique identifier for the test.
    pub id: String,
    /// Operation to test (e.g., "parse", "minify").
    pub op: String,
    /// Input parameters for the operation.
    pub input: serde_json::Value,
    /// Expected result (success or error).
    pub expected: serde_json::Value,
}

/// Result of running a single test vector.
#[derive(Debug)]
pub enum TestResult {
    /// Test passed.
    Pass,
    /// Test failed with mismatch.
    Fail {
        /// Expected result from the corpus.
        expected: String,
        /// Actual result from the engine.
        actual: String,
    },
    /// Test was skipped (unknown operation).
    Skip {
        /// Reason for skipping.
        reason: String,
    },
    /// Test errored during execution.
    Error {
        /// Error message.
        message: String,
    },
}

impl TestResult {
    /// Returns true if this is a passing result.
    pub fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    /// Returns true if this is a failing result.
    pub fn is_fail(&self) -> bool {
        matches!(self, Self::Fail { .. })
    }
}

/// Results from running the corpus.
#[derive(Debug, Default)]
pub struct CorpusResults {
    /// Number of tests that passed.
    pub passed: usize,
    /// Number of tests that failed.
    pub failed: usize,
    /// Number of tests that were skipped.
    pub skipped: usize,
    /// Number of tests that errored.
    pub errors: usize,
    /// Detailed results for each test.
    pub details: Vec<(String, TestResult)>,
}

impl CorpusResults {
    /// Create a new empty results container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a test result.
    pub fn record(&mut self, id: &str, result: TestResult) {
        match &result {
            TestResult::Pass => self.passed += 1,
            TestResult::Fail { .. } => self.failed += 1,
            TestResult::Skip { .. } => self.skipped += 1,
            TestResult::Error { .. } => self.errors += 1,
        }
        self.details.push((id.to_string(), result));
    }

    /// Get total number of tests run.
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped + self.errors
    }

    /// Returns true if all tests passed (no failures or errors).
    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }

    /// Get a summary string of the results.
    pub fn summary(&self) -> String {
        format!(
            "{} passed, {} failed, {} skipped, {} errors (total: {})",
            self.passed,
            self.failed,
            self.skipped,
            self.errors,
            self.total()
        )
    }

    /// Get failures only.
    pub fn failures(&self) -> Vec<&(String, TestResult)> {
        self.details
            .iter()
            .filter(|(_, r)| matches!(r, TestResult::Fail { .. }))
            .collect()
    }

    /// Get errors only.
    pub fn error_details(&self) -> Vec<&(String, TestResult)> {
        self.details
            .iter()
            .filter(|(_, r)| matches!(r, TestResult::Error { .. }))
            .collect()
    }
}

/// Expected outcome of a vector.
#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Ok(String),
    Err { name: String, position: Option<usize> },
}

impl Outcome {
    fn from_expected(expected: &serde_json::Value) -> Result<Self, String> {
        if let Some(text) = expected.get("ok") {
            return text
                .as_str()
                .map(|t| Self::Ok(t.to_string()))
                .ok_or_else(|| "'ok' must be a string".to_string());
        }
        if let Some(err) = expected.get("err") {
            let name = err
                .get("name")
                .and_then(|v| v.as_str())
                .ok_or_else(|| "'err' needs a 'name'".to_string())?;
            let position = err
                .get("position")
                .and_then(|v| v.as_u64())
                .map(|p| p as usize);
            return Ok(Self::Err {
                name: name.to_string(),
                position,
            });
        }
        Err("expected must hold 'ok' or 'err'".to_string())
    }

    fn from_result(result: JsonResult<String>) -> Self {
        match result {
            Ok(text) => Self::Ok(text),
            Err(e) => Self::from_error(&e),
        }
    }

    fn from_error(e: &ErrorCode) -> Self {
        Self::Err {
            name: e.name().to_string(),
            position: e.position(),
        }
    }
}

/// Corpus runner that executes test vectors.
pub struct CorpusRunner {
    corpus: Corpus,
    engine: Engine,
}

impl CorpusRunner {
    /// Load corpus from a file path.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read corpus file: {}", e))?;
        Self::from_json(&content)
    }

    /// Load corpus from JSON text.
    pub fn from_json(content: &str) -> Result<Self, String> {
        let corpus: Corpus = serde_json::from_str(content)
            .map_err(|e| format!("Failed to parse corpus JSON: {}", e))?;

        Ok(Self {
            corpus,
            engine: Engine::new(),
        })
    }

    /// Get the corpus manifest.
    pub fn manifest(&self) -> &CorpusManifest {
        &self.corpus.manifest
    }

    /// Get the number of test vectors.
    pub fn vector_count(&self) -> usize {
        self.corpus.vectors.len()
    }

    /// Run all test vectors and return results.
    pub fn run_all(&self) -> CorpusResults {
        let mut results = CorpusResults::new();

        for vector in &self.corpus.vectors {
            let result = self.run_vector(vector);
            results.record(&vector.id, result);
        }

        results
    }

    /// Run a single test vector.
    fn run_vector(&self, vector: &TestVector) -> TestResult {
        let text = match vector.input.get("text").and_then(|v| v.as_str()) {
            Some(t) => t,
            None => {
                return TestResult::Error {
                    message: "Missing 'text' in input".to_string(),
                }
            }
        };
        let expected = match Outcome::from_expected(&vector.expected) {
            Ok(outcome) => outcome,
            Err(message) => return TestResult::Error { message },
        };

        let actual = match vector.op.as_str() {
            "parse" => self.parse_then_print(text, false, false),
            "parse_strict" => self.parse_then_print(text, true, false),
            "print_pretty" => self.parse_then_print(text, true, true),
            "minify" => Outcome::Ok(minify(text)),
            _ => {
                return TestResult::Skip {
                    reason: format!("Unknown operation: {}", vector.op),
                }
            }
        };

        if actual == expected {
            TestResult::Pass
        } else {
            TestResult::Fail {
                expected: format!("{:?}", expected),
                actual: format!("{:?}", actual),
            }
        }
    }

    fn parse_then_print(&self, text: &str, require_end: bool, pretty: bool) -> Outcome {
        let node = match self.engine.parse_with_options(text, require_end) {
            Ok((node, _)) => node,
            Err(e) => return Outcome::from_error(&e),
        };
        let printed = if pretty {
            self.engine.print(&node)
        } else {
            self.engine.print_unformatted(&node)
        };
        self.engine.delete(node);
        Outcome::from_result(printed)
    }
}
