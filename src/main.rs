//! jsontree CLI.
//!
//! Reads a document from stdin and writes the result to stdout. Parse
//! failures print a JSON error object and exit with status 1; I/O failures
//! exit with status 2.

use std::io::{self, Read, Write};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use jsontree::{Allocator, Engine, ErrorCode, JsonResult, Node};

#[derive(Parser)]
#[command(name = "jsontree")]
#[command(about = "JSON document engine: format, compact, minify and check", long_about = None)]
#[command(version)]
struct Cli {
    /// Render through one growth buffer starting at SIZE bytes
    #[arg(long, global = true, value_name = "SIZE")]
    buffered: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse stdin and print it indented
    Format,

    /// Parse stdin and print it without whitespace
    Compact,

    /// Strip whitespace and comments from stdin without parsing it
    Minify,

    /// Parse stdin and report the kind of its root value
    Check,

    /// Show version information
    Version,
}

fn read_stdin() -> Result<String, ExitCode> {
    let mut input = String::new();
    match std::io::stdin().read_to_string(&mut input) {
        Ok(_) => Ok(input),
        Err(e) => {
            eprintln!("error: failed to read stdin: {e}");
            Err(ExitCode::from(2))
        }
    }
}

fn report_details<A: Allocator>(
    engine: &Engine<A>,
    details: &mut Node<'_>,
    error: &ErrorCode,
) -> JsonResult<()> {
    engine.add_number_to_object(details, "code", error.code())?;
    engine.add_string_to_object(details, "name", error.name())?;
    match error.position().map(u32::try_from) {
        Some(Ok(position)) => engine.add_number_to_object(details, "position", position),
        _ => engine.add_null_to_object(details, "position"),
    }
}

/// `{"err":{"code":N,"name":"...","position":P}}`, built with the engine.
fn error_report<A: Allocator>(engine: &Engine<A>, error: &ErrorCode) -> JsonResult<String> {
    let mut details = engine.create_object();
    if let Err(e) = report_details(engine, &mut details, error) {
        engine.delete(details);
        return Err(e);
    }
    let mut report = engine.create_object();
    if let Err(e) = engine.add_to_object(&mut report, "err", details) {
        engine.delete(report);
        return Err(e);
    }
    let text = engine.print_unformatted(&report);
    engine.delete(report);
    text
}

/// Write `text` as one line and hand it back to the allocator.
fn emit<A: Allocator>(engine: &Engine<A>, out: &mut impl Write, text: String) -> io::Result<()> {
    let written = writeln!(out, "{text}");
    engine.release_text(text);
    written
}

fn fail<A: Allocator>(
    engine: &Engine<A>,
    error: &ErrorCode,
    out: &mut impl Write,
) -> io::Result<u8> {
    match error_report(engine, error) {
        Ok(report) => emit(engine, out, report)?,
        Err(e) => eprintln!("error: {error} (report failed: {e})"),
    }
    Ok(1)
}

fn render<A: Allocator>(
    engine: &Engine<A>,
    node: &Node<'_>,
    pretty: bool,
    buffered: Option<usize>,
) -> JsonResult<String> {
    match (buffered, pretty) {
        (Some(size_hint), _) => engine.print_buffered(node, size_hint, pretty),
        (None, true) => engine.print(node),
        (None, false) => engine.print_unformatted(node),
    }
}

fn print_document<A: Allocator>(
    engine: &Engine<A>,
    input: &str,
    pretty: bool,
    buffered: Option<usize>,
    out: &mut impl Write,
) -> io::Result<u8> {
    let node = match engine.parse_with_options(input, true) {
        Ok((node, _)) => node,
        Err(e) => return fail(engine, &e, out),
    };
    let rendered = render(engine, &node, pretty, buffered);
    engine.delete(node);
    match rendered {
        Ok(text) => emit(engine, out, text).map(|()| 0),
        Err(e) => fail(engine, &e, out),
    }
}

fn check_document<A: Allocator>(
    engine: &Engine<A>,
    input: &str,
    out: &mut impl Write,
) -> io::Result<u8> {
    match engine.parse_with_options(input, true) {
        Ok((node, _)) => {
            let kind = node.kind();
            engine.delete(node);
            writeln!(out, "{{\"ok\":\"{kind}\"}}")?;
            Ok(0)
        }
        Err(e) => fail(engine, &e, out),
    }
}

/// Read stdin, run `command` on it and map the outcome to an exit status.
fn run_on_stdin(command: impl FnOnce(&str, &mut io::StdoutLock<'_>) -> io::Result<u8>) -> ExitCode {
    let input = match read_stdin() {
        Ok(input) => input,
        Err(code) => return code,
    };
    let mut out = io::stdout().lock();
    match command(&input, &mut out) {
        Ok(status) => ExitCode::from(status),
        Err(e) => {
            eprintln!("error: failed to write stdout: {e}");
            ExitCode::from(2)
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let engine = Engine::new();

    match cli.command {
        Some(Commands::Format) => {
            run_on_stdin(|input, out| print_document(&engine, input, true, cli.buffered, out))
        }
        Some(Commands::Compact) => {
            run_on_stdin(|input, out| print_document(&engine, input, false, cli.buffered, out))
        }
        Some(Commands::Minify) => run_on_stdin(|input, out| {
            writeln!(out, "{}", jsontree::json::minify(input))?;
            Ok(0)
        }),
        Some(Commands::Check) => run_on_stdin(|input, out| check_document(&engine, input, out)),
        Some(Commands::Version) => {
            println!("jsontree v{}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        None => {
            println!("jsontree v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for usage information");
            ExitCode::SUCCESS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsontree::BudgetAllocator;

    fn budget_engine() -> Engine<BudgetAllocator> {
        Engine::with_allocator(BudgetAllocator::new(1 << 16))
    }

    fn output(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_print_document_releases_everything() {
        for (pretty, buffered) in [(true, None), (false, None), (false, Some(4)), (true, Some(0))] {
            let engine = budget_engine();
            let mut out = Vec::new();
            let input = r#"{"a":["x",1],"b":null}"#;
            let status = print_document(&engine, input, pretty, buffered, &mut out);
            assert_eq!(status.unwrap(), 0);
            assert!(output(out).starts_with('{'));
            assert!(engine.allocator().allocations() > 0);
            assert_eq!(engine.allocator().outstanding(), 0);
            assert_eq!(engine.allocator().live_buffers(), 0);
        }
    }

    #[test]
    fn test_failure_report_releases_everything() {
        let engine = budget_engine();
        let mut out = Vec::new();
        assert_eq!(print_document(&engine, r#"{"a":["x",}"#, false, None, &mut out).unwrap(), 1);
        assert_eq!(
            output(out),
            "{\"err\":{\"code\":100,\"name\":\"E100_UnexpectedCharacter\",\"position\":10}}\n"
        );
        assert_eq!(engine.allocator().outstanding(), 0);
        assert_eq!(engine.allocator().live_buffers(), 0);
    }

    #[test]
    fn test_check_document_releases_everything() {
        let engine = budget_engine();
        let mut out = Vec::new();
        assert_eq!(check_document(&engine, r#"["one",{"two":"three"}]"#, &mut out).unwrap(), 0);
        assert_eq!(output(out), "{\"ok\":\"array\"}\n");
        assert!(engine.allocator().allocations() > 0);
        assert_eq!(engine.allocator().outstanding(), 0);

        let mut out = Vec::new();
        assert_eq!(check_document(&engine, "[1] 2", &mut out).unwrap(), 1);
        assert!(output(out).contains("E109_TrailingContent"));
        assert_eq!(engine.allocator().outstanding(), 0);
        assert_eq!(engine.allocator().live_buffers(), 0);
    }

    #[test]
    fn test_report_survives_allocation_failure() {
        let engine = Engine::with_allocator(BudgetAllocator::new(8));
        let error = ErrorCode::E109_TrailingContent(4);
        assert!(error_report(&engine, &error).unwrap_err().is_allocation_error());
        assert_eq!(engine.allocator().outstanding(), 0);
    }
}
