//! Differential test harness comparing the engine with `serde_json`.

use std::collections::HashSet;

use super::repro::ReproBundle;
use super::{first_difference, ConformanceError, ConformanceResult};
use crate::engine::Engine;
use crate::json::types::Node;

/// Result of a differential test.
#[derive(Debug)]
pub enum DiffResult {
    /// Both implementations agree (same compact text, or both reject).
    Match {
        /// The agreed output, or the engine's error name.
        value: String,
    },
    /// Implementations disagree.
    Mismatch {
        /// Engine output.
        ours: String,
        /// Reference output.
        reference: String,
        /// Repro bundle for debugging.
        repro: ReproBundle,
    },
    /// The input uses something the two implementations treat differently
    /// by design.
    OutsideSubset {
        /// Why the input was skipped.
        reason: String,
    },
}

impl DiffResult {
    /// Check if the result is a match.
    pub fn is_match(&self) -> bool {
        matches!(self, Self::Match { .. })
    }

    /// Check if the result is a mismatch.
    pub fn is_mismatch(&self) -> bool {
        matches!(self, Self::Mismatch { .. })
    }
}

/// Why `value` falls outside the shared subset, if it does.
fn reference_outside_subset(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Number(n) => match n.as_u64() {
            Some(v) if v <= u64::from(u32::MAX) => None,
            _ => Some(format!("number {n} is not an unsigned 32-bit integer")),
        },
        serde_json::Value::Array(items) => items.iter().find_map(reference_outside_subset),
        serde_json::Value::Object(map) => map.values().find_map(reference_outside_subset),
        _ => None,
    }
}

/// Names an object repeats; `serde_json` keeps only the last value.
fn duplicate_key(node: &Node<'_>) -> Option<String> {
    if node.is_object() {
        let mut seen = HashSet::new();
        for member in node.children() {
            let name = member.name().unwrap_or_default();
            if !seen.insert(name) {
                return Some(format!("duplicate key {name:?}"));
            }
        }
    }
    node.children().find_map(duplicate_key)
}

/// Differential test harness.
pub struct DiffTestHarness {
    engine: Engine,
}

impl DiffTestHarness {
    /// Create a harness on the global heap.
    pub fn new() -> Self {
        Self {
            engine: Engine::new(),
        }
    }

    /// Parse `input` strictly with both implementations and compare compact
    /// output.
    pub fn compare(&self, test_name: &str, input: &str) -> ConformanceResult<DiffResult> {
        let reference = serde_json::from_str::<serde_json::Value>(input);
        let ours = self.engine.parse_with_options(input, true);

        let (node, value) = match (ours, reference) {
            (Err(e), Err(_)) => {
                return Ok(DiffResult::Match {
                    value: e.name().to_string(),
                })
            }
            (Ok((node, _)), Err(e)) => {
                self.engine.delete(node);
                return Ok(DiffResult::OutsideSubset {
                    reason: format!("accepted by the engine, rejected by serde_json: {e}"),
                });
            }
            (ours, Ok(value)) => {
                if let Some(reason) = reference_outside_subset(&value) {
                    if let Ok((node, _)) = ours {
                        self.engine.delete(node);
                    }
                    return Ok(DiffResult::OutsideSubset { reason });
                }
                match ours {
                    Ok((node, _)) => (node, value),
                    Err(e) => {
                        let reference = serialize(&value)?;
                        return Ok(self.mismatch(test_name, input, e.name().to_string(), reference));
                    }
                }
            }
        };

        if let Some(reason) = duplicate_key(&node) {
            self.engine.delete(node);
            return Ok(DiffResult::OutsideSubset { reason });
        }

        let printed = self.engine.print_unformatted(&node);
        self.engine.delete(node);
        let ours = printed?;
        let reference = serialize(&value)?;

        if ours == reference {
            Ok(DiffResult::Match { value: ours })
        } else {
            Ok(self.mismatch(test_name, input, ours, reference))
        }
    }

    fn mismatch(&self, test_name: &str, input: &str, ours: String, reference: String) -> DiffResult {
        log::debug!(
            "{test_name}: outputs differ at byte {:?}",
            first_difference(&ours, &reference)
        );
        let repro = ReproBundle::new(
            test_name.to_string(),
            "compact_print".to_string(),
            input.to_string(),
            ours.clone(),
            reference.clone(),
        );
        DiffResult::Mismatch {
            ours,
            reference,
            repro,
        }
    }

    /// Run a batch of differential tests.
    pub fn run_batch<'a>(&self, tests: impl Iterator<Item = (&'a str, &'a str)>) -> BatchResult {
        let mut results = BatchResult::new();

        for (name, input) in tests {
            match self.compare(name, input) {
                Ok(DiffResult::Match { value }) => {
                    results.record_pass(name, &value);
                }
                Ok(DiffResult::Mismatch {
                    ours,
                    reference,
                    repro,
                }) => {
                    results.record_fail(name, ours, reference, repro);
                }
                Ok(DiffResult::OutsideSubset { reason }) => {
                    results.record_skip(name, &reason);
                }
                Err(e) => {
                    results.record_error(name, e);
                }
            }
        }

        results
    }
}

impl Default for DiffTestHarness {
    fn default() -> Self {
        Self::new()
    }
}

fn serialize(value: &serde_json::Value) -> ConformanceResult<String> {
    serde_json::to_string(value).map_err(|e| ConformanceError::Reference(e.to_string()))
}

/// Results from running a batch of differential tests.
#[derive(Debug, Default)]
pub struct BatchResult {
    /// Number of tests that passed.
    pub passed: usize,
    /// Number of tests that failed.
    pub failed: usize,
    /// Number of tests that were skipped.
    pub skipped: usize,
    /// Number of tests that errored.
    pub errors: usize,
    /// Details of failures.
    pub failures: Vec<FailureDetail>,
    /// Details of errors.
    pub error_details: Vec<ErrorDetail>,
}

/// Details about a test failure.
#[derive(Debug)]
pub struct FailureDetail {
    /// Test name.
    pub name: String,
    /// Engine output.
    pub ours: String,
    /// Reference output.
    pub reference: String,
    /// Repro bundle.
    pub repro: ReproBundle,
}

/// Details about a test error.
#[derive(Debug)]
pub struct ErrorDetail {
    /// Test name.
    pub name: String,
    /// Error that occurred.
    pub error: ConformanceError,
}

impl BatchResult {
    /// Create a new empty batch result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a passing test.
    pub fn record_pass(&mut self, _name: &str, _value: &str) {
        self.passed += 1;
    }

    /// Record a failing test.
    pub fn record_fail(&mut self, name: &str, ours: String, reference: String, repro: ReproBundle) {
        self.failed += 1;
        self.failures.push(FailureDetail {
            name: name.to_string(),
            ours,
            reference,
            repro,
        });
    }

    /// Record a skipped test.
    pub fn record_skip(&mut self, name: &str, reason: &str) {
        log::debug!("{name}: skipped, {reason}");
        self.skipped += 1;
    }

    /// Record a test error.
    pub fn record_error(&mut self, name: &str, error: ConformanceError) {
        self.errors += 1;
        self.error_details.push(ErrorDetail {
            name: name.to_string(),
            error,
        });
    }

    /// Check if all tests passed.
    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.errors == 0
    }

    /// Get total number of tests run.
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped + self.errors
    }

    /// Format a summary string.
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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_on_shared_subset() {
        let harness = DiffTestHarness::new();
        let result = harness
            .compare("object", r#" { "a" : [1, "x\ty", null], "b" : {} } "#)
            .unwrap();
        match result {
            DiffResult::Match { value } => assert_eq!(value, r#"{"a":[1,"x\ty",null],"b":{}}"#),
            other => panic!("expected match, got {other:?}"),
        }
    }

    #[test]
    fn test_both_reject() {
        let harness = DiffTestHarness::new();
        assert!(harness.compare("trailing comma", "[1,]").unwrap().is_match());
    }

    #[test]
    fn test_outside_subset() {
        let harness = DiffTestHarness::new();
        for input in ["-1", "1.5", "4294967296", r#"{"a":1,"a":2}"#, "007"] {
            let result = harness.compare(input, input).unwrap();
            assert!(
                matches!(result, DiffResult::OutsideSubset { .. }),
                "{input}: {result:?}"
            );
        }
    }

    #[test]
    fn test_batch_result() {
        let harness = DiffTestHarness::new();
        let inputs = [("a", "[true]"), ("b", "-3"), ("c", r#""é""#)];
        let results = harness.run_batch(inputs.iter().copied());
        assert_eq!(results.passed, 2);
        assert_eq!(results.skipped, 1);
        assert_eq!(results.total(), 3);
        assert!(results.all_passed());
    }
}
