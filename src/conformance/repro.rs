//! Reproduction bundle for debugging conformance mismatches.

use std::path::Path;

use crate::engine::Engine;
use crate::error::JsonResult;

/// Everything needed to replay one mismatch.
#[derive(Debug, Clone)]
pub struct ReproBundle {
    /// Test name that failed.
    pub test_name: String,
    /// Operation that was being tested (e.g., "compact_print").
    pub operation: String,
    /// Input text.
    pub input: String,
    /// Engine output.
    pub ours: String,
    /// Reference output.
    pub reference: String,
}

impl ReproBundle {
    /// Create a new repro bundle.
    pub fn new(
        test_name: String,
        operation: String,
        input: String,
        ours: String,
        reference: String,
    ) -> Self {
        Self {
            test_name,
            operation,
            input,
            ours,
            reference,
        }
    }

    /// Format as a human-readable report.
    pub fn to_report(&self) -> String {
        format!(
            r#"=== Conformance Mismatch Report ===
Test: {}
Operation: {}
Input: {:?}

Engine Output:    {:?}
Reference Output: {:?}

To reproduce:
  printf '%s' {:?} | jsontree compact
"#,
            self.test_name, self.operation, self.input, self.ours, self.reference, self.input,
        )
    }

    /// Save the repro bundle to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        std::fs::write(path, self.to_report())
    }

    /// Format as compact JSON for machine parsing, rendered by the engine.
    pub fn to_json(&self) -> JsonResult<String> {
        let engine = Engine::new();
        let mut bundle = engine.create_object();
        engine.add_string_to_object(&mut bundle, "test_name", &self.test_name)?;
        engine.add_string_to_object(&mut bundle, "operation", &self.operation)?;
        engine.add_string_to_object(&mut bundle, "input", &self.input)?;
        engine.add_string_to_object(&mut bundle, "ours", &self.ours)?;
        engine.add_string_to_object(&mut bundle, "reference", &self.reference)?;
        let text = engine.print_unformatted(&bundle);
        engine.delete(bundle);
        text
    }
}
