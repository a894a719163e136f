//! Corpus-based conformance tests.
//!
//! These tests run all vectors from corpus/corpus.json and verify the
//! engine produces exactly the recorded output or error.

use jsontree::conformance::{CorpusRunner, CorpusResults, TestResult};
use std::path::Path;

/// Path to the corpus file relative to the project root.
const CORPUS_PATH: &str = "corpus/corpus.json";

fn load_results() -> Option<CorpusResults> {
    let corpus_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(CORPUS_PATH);

    if !corpus_path.exists() {
        eprintln!("Corpus file not found at {:?}, skipping", corpus_path);
        return None;
    }

    let runner = CorpusRunner::load(&corpus_path).expect("Failed to load corpus");
    Some(runner.run_all())
}

fn assert_group_passes(results: &CorpusResults, prefix: &str) {
    let group: Vec<_> = results
        .details
        .iter()
        .filter(|(id, _)| id.starts_with(prefix))
        .collect();

    let passed = group.iter().filter(|(_, r)| r.is_pass()).count();
    println!("{prefix} tests: {passed}/{} passed", group.len());
    assert!(!group.is_empty(), "no vectors with prefix {prefix}");

    for (id, result) in &group {
        if let TestResult::Fail { expected, actual } = result {
            panic!("{} failed: expected={}, actual={}", id, expected, actual);
        }
    }
}

/// Load and run the full corpus.
#[test]
fn test_full_corpus() {
    let corpus_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(CORPUS_PATH);
    let Some(results) = load_results() else {
        return;
    };

    let runner = CorpusRunner::load(&corpus_path).expect("Failed to load corpus");
    println!("Loaded corpus with {} vectors", runner.vector_count());
    println!("Manifest: {:?}", runner.manifest());

    // Print summary
    println!("\n=== Corpus Conformance Results ===");
    println!("{}", results.summary());

    // Print failures
    if !results.failures().is_empty() {
        println!("\nFailures:");
        for (id, result) in results.failures() {
            if let TestResult::Fail { expected, actual } = result {
                println!("  {} - expected: {}, actual: {}", id, expected, actual);
            }
        }
    }

    // Print errors
    if !results.error_details().is_empty() {
        println!("\nErrors:");
        for (id, result) in results.error_details() {
            if let TestResult::Error { message } = result {
                println!("  {} - {}", id, message);
            }
        }
    }

    assert_eq!(results.skipped, 0, "corpus uses an unknown operation");
    assert!(
        results.all_passed(),
        "Corpus conformance failed: {}",
        results.summary()
    );
}

/// Test that we can load the corpus manifest.
#[test]
fn test_corpus_manifest() {
    let corpus_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(CORPUS_PATH);

    if !corpus_path.exists() {
        eprintln!("Corpus file not found, skipping");
        return;
    }

    let runner = CorpusRunner::load(&corpus_path).expect("Failed to load corpus");
    let manifest = runner.manifest();

    assert_eq!(manifest.format_version, "corpus-v1");
    assert_eq!(manifest.version, "1");
    assert!(runner.vector_count() > 0);
}

/// Lenient and strict parse vectors.
#[test]
fn test_corpus_parse() {
    if let Some(results) = load_results() {
        assert_group_passes(&results, "parse_");
        assert_group_passes(&results, "strict_");
    }
}

/// Pretty printer vectors.
#[test]
fn test_corpus_pretty() {
    if let Some(results) = load_results() {
        assert_group_passes(&results, "pretty_");
    }
}

/// Minifier vectors.
#[test]
fn test_corpus_minify() {
    if let Some(results) = load_results() {
        assert_group_passes(&results, "minify_");
    }
}

/// Negative (error) vectors.
#[test]
fn test_corpus_negative_cases() {
    if let Some(results) = load_results() {
        assert_group_passes(&results, "negative_");
    }
}
