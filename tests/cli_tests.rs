//! CLI integration tests.
//!
//! Tests the jsontree CLI commands by invoking the binary as a subprocess.

use std::io::Write;
use std::process::{Command, Stdio};

fn run_command(args: &[&str], input: &str) -> (i32, String, String) {
    let binary = env!("CARGO_BIN_EXE_jsontree");
    let mut child = Command::new(binary)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap_or_else(|e| panic!("Failed to spawn jsontree at {:?}: {}", binary, e));

    {
        let stdin = child.stdin.as_mut().unwrap();
        stdin.write_all(input.as_bytes()).unwrap();
    }

    let output = child.wait_with_output().unwrap();
    let code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (code, stdout, stderr)
}

// ============================================================================
// Format Command Tests
// ============================================================================

#[test]
fn cli_format_object() {
    let (code, stdout, _stderr) = run_command(&["format"], r#"{"a":[1,2],"b":{}}"#);
    assert_eq!(code, 0, "Expected success exit code");
    assert_eq!(stdout, "{\n\t\"a\":\t[1, 2],\n\t\"b\":\t{\n\t}\n}\n");
}

#[test]
fn cli_format_buffered_matches() {
    let input = r#"[{"k":"v"},true,null,4294967295]"#;
    let (_, plain, _) = run_command(&["format"], input);
    let (code, buffered, _) = run_command(&["--buffered", "1", "format"], input);
    assert_eq!(code, 0, "Expected success exit code");
    assert_eq!(buffered, plain);
}

#[test]
fn cli_format_rejects_trailing_content() {
    let (code, stdout, _stderr) = run_command(&["format"], "[1] x");
    assert_eq!(code, 1, "Expected failure exit code");
    assert_eq!(
        stdout,
        "{\"err\":{\"code\":109,\"name\":\"E109_TrailingContent\",\"position\":4}}\n"
    );
}

// ============================================================================
// Compact Command Tests
// ============================================================================

#[test]
fn cli_compact() {
    let (code, stdout, _stderr) = run_command(&["compact"], " [ 1 , {\"b\" : null} ]\n");
    assert_eq!(code, 0, "Expected success exit code");
    assert_eq!(stdout, "[1,{\"b\":null}]\n");
}

#[test]
fn cli_compact_buffered_flag_after_command() {
    let (code, stdout, _stderr) = run_command(&["compact", "--buffered", "2"], "[\"abc\", 99999999999]");
    assert_eq!(code, 0, "Expected success exit code");
    assert_eq!(stdout, "[\"abc\",4294967295]\n");
}

#[test]
fn cli_compact_invalid_json() {
    let (code, stdout, _stderr) = run_command(&["compact"], "not valid json");
    assert_eq!(code, 1, "Expected failure exit code");
    assert!(stdout.contains("\"err\""), "Expected err in output: {}", stdout);
    assert!(stdout.contains("\"code\":100"), "Expected E100 error code: {}", stdout);
    assert!(stdout.contains("\"position\":0"), "Expected position: {}", stdout);
}

// ============================================================================
// Minify Command Tests
// ============================================================================

#[test]
fn cli_minify_strips_comments() {
    let (code, stdout, _stderr) = run_command(&["minify"], "/* x */ [1, 2] // y\n");
    assert_eq!(code, 0, "Expected success exit code");
    assert_eq!(stdout, "[1,2]\n");
}

#[test]
fn cli_minify_does_not_validate() {
    let (code, stdout, _stderr) = run_command(&["minify"], "{ not json ");
    assert_eq!(code, 0, "Expected success exit code");
    assert_eq!(stdout, "{notjson\n");
}

// ============================================================================
// Check Command Tests
// ============================================================================

#[test]
fn cli_check_reports_kind() {
    let cases = [
        ("{}", "object"),
        ("[]", "array"),
        ("\"s\"", "string"),
        ("12", "number"),
        ("true", "boolean"),
        ("null", "null"),
    ];
    for (input, kind) in cases {
        let (code, stdout, _stderr) = run_command(&["check"], input);
        assert_eq!(code, 0, "Expected success exit code for {input}");
        assert_eq!(stdout, format!("{{\"ok\":\"{kind}\"}}\n"));
    }
}

#[test]
fn cli_check_error_position() {
    let (code, stdout, _stderr) = run_command(&["check"], "[1,]");
    assert_eq!(code, 1, "Expected failure exit code");
    assert_eq!(
        stdout,
        "{\"err\":{\"code\":100,\"name\":\"E100_UnexpectedCharacter\",\"position\":3}}\n"
    );
}

#[test]
fn cli_check_nesting_limit() {
    let input = "[".repeat(257) + &"]".repeat(257);
    let (code, stdout, _stderr) = run_command(&["check"], &input);
    assert_eq!(code, 1, "Expected failure exit code");
    assert!(stdout.contains("E110_NestingTooDeep"), "Expected E110: {}", stdout);
    assert!(stdout.contains("\"position\":256"), "Expected position: {}", stdout);

    let input = "[".repeat(256) + &"]".repeat(256);
    let (code, stdout, _stderr) = run_command(&["compact"], &input);
    assert_eq!(code, 0, "Expected success at the nesting limit");
    assert_eq!(stdout, input + "\n");
}

// ============================================================================
// Version Command Tests
// ============================================================================

#[test]
fn cli_version() {
    let (code, stdout, _stderr) = run_command(&["version"], "");
    assert_eq!(code, 0, "Expected success exit code");
    assert_eq!(stdout, format!("jsontree v{}\n", env!("CARGO_PKG_VERSION")));
}

#[test]
fn cli_no_command() {
    let (code, stdout, _stderr) = run_command(&[], "");
    assert_eq!(code, 0, "Expected success exit code");
    assert!(stdout.contains("--help"), "Expected usage hint: {}", stdout);
}
