//! End-to-end tests for plain-text error reports
//!
//! These walk realistic error chains through the public API and check the
//! rendered text line by line.

use std::borrow::Cow;
use std::fmt;

use undertow::prelude::*;
use undertow::sink::plain::PlainTextOptions;
use undertow::{assert_sections, format_plain_text, format_plain_text_into, ScriptFrame};

fn property_line(report: &str, name: &str) -> String {
    let prefix = format!("{}:", name);
    report
        .lines()
        .find(|line| line.starts_with(&prefix))
        .map(|line| line[prefix.len()..].trim_start().to_string())
        .unwrap_or_else(|| panic!("no property {} in\n{}", name, report))
}

#[test]
fn test_outer_inner_example() {
    let err = ErrorRecord::new("E1", "outer")
        .with_property("Code", 5)
        .with_cause(ErrorRecord::new("E2", "inner").with_text("Detail", "line1\nline2"));

    let report = format_plain_text(&err);
    assert_sections!(&report, ["E1", "InnerException: E2"]);

    let (first, second) = report
        .split_once("-- InnerException: E2 ")
        .expect("second section present");

    let code = first.find("Code:").expect("Code in first section");
    let trace = first.find("StackTrace:").expect("StackTrace in first section");
    assert!(code < trace);
    assert_eq!(property_line(first, "Code"), "5");

    assert!(second.contains("\nDetail:\n    line1\n    line2\n"));
}

#[test]
fn test_error_without_cause_has_one_section() {
    let report = format_plain_text(&ErrorRecord::new("Lonely", "nothing caused me"));
    assert_sections!(report, ["Lonely"]);
}

#[test]
fn test_long_direct_chain() {
    let mut chain = ErrorRecord::new("E9", "deepest");
    for i in (0..9).rev() {
        chain = ErrorRecord::new(format!("E{}", i), "wrapper").with_cause(chain);
    }

    let report = format_plain_text(&chain);
    let expected: Vec<String> = (0..10)
        .map(|i| {
            if i == 0 {
                "E0".to_string()
            } else {
                format!("InnerException: E{}", i)
            }
        })
        .collect();
    assert_eq!(undertow::testing::section_titles(&report), expected);
}

#[test]
fn test_loader_sections_labelled_by_index() {
    let err = ErrorRecord::new("TypeLoadError", "Unable to load one or more types").with_loader_causes(vec![
        ErrorRecord::new("FileNotFound", "a.dll"),
        ErrorRecord::new("BadImage", "b.dll"),
        ErrorRecord::new("FileNotFound", "c.dll"),
    ]);

    assert_sections!(
        format_plain_text(&err),
        [
            "TypeLoadError",
            "LoaderException[0]: FileNotFound",
            "LoaderException[1]: BadImage",
            "LoaderException[2]: FileNotFound",
        ]
    );
}

#[test]
fn test_direct_cause_reported_before_loaders() {
    let err = ErrorRecord::new("Root", "r")
        .with_cause(ErrorRecord::new("Direct", "d"))
        .with_loader_causes(vec![ErrorRecord::new("L0", "0"), ErrorRecord::new("L1", "1")]);

    assert_sections!(
        format_plain_text(&err),
        [
            "Root",
            "InnerException: Direct",
            "LoaderException[0]: L0",
            "LoaderException[1]: L1",
        ]
    );
}

#[test]
fn test_value_rendering_rules() {
    let err = ErrorRecord::new("Mixed", "tab\there")
        .with_property("Count", 42u64)
        .with_property("Ratio", 0.5f64)
        .with_member("Amount", TypeTag::Decimal, "19.99")
        .with_member("When", TypeTag::DateTime, "2024-03-01T12:00:00Z")
        .with_property("Retryable", true)
        .with_member("Endpoint", TypeTag::other("Uri"), "http://host/a\tb")
        .with_null("Owner", TypeTag::Text)
        .with_null("Port", TypeTag::U16);

    let report = format_plain_text(&err);

    assert_eq!(property_line(&report, "Message"), "'tab\\there'");
    assert_eq!(property_line(&report, "Count"), "42");
    assert_eq!(property_line(&report, "Ratio"), "0.5");
    assert_eq!(property_line(&report, "Amount"), "19.99");
    assert_eq!(property_line(&report, "When"), "2024-03-01T12:00:00Z");
    assert_eq!(property_line(&report, "Retryable"), "(bool)true");
    assert_eq!(property_line(&report, "Endpoint"), "(Uri)http://host/a\\tb");
    assert_eq!(property_line(&report, "Owner"), "<null>");
    assert_eq!(property_line(&report, "Port"), "<null>");
}

#[test]
fn test_carriage_returns_dropped_in_blocks() {
    let err = ErrorRecord::new("Windows", "first\r\nsecond\r\n");
    let report = format_plain_text(&err);
    assert!(report.contains("Message:\n    first\n    second\n    \n"));
}

#[test]
fn test_failing_accessor_keeps_section_intact() {
    let err = ErrorRecord::new("Flaky", "m")
        .with_failing("Payload", TypeTag::other("Bytes"), AccessError::new("Disposed", "stream closed"))
        .with_property("Attempt", 3);

    let report = format_plain_text(&err);
    assert_eq!(property_line(&report, "Payload"), "Error[Disposed] = 'stream closed'");
    assert_eq!(property_line(&report, "Attempt"), "3");
    assert_eq!(property_line(&report, "StackTrace"), "<null>");
}

struct Unprintable;

impl fmt::Display for Unprintable {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        Err(fmt::Error)
    }
}

struct Exploding;

impl fmt::Display for Exploding {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        panic!("to_string blew up")
    }
}

#[test]
fn test_panicking_display_becomes_marker() {
    let err = ErrorRecord::new("E", "m")
        .with_member("Bad", TypeTag::other("Widget"), Exploding)
        .with_property("After", 7);

    let report = format_plain_text(&err);
    assert_eq!(property_line(&report, "Bad"), "Error[panic] = 'to_string blew up'");
    assert_eq!(property_line(&report, "After"), "7");
    assert_eq!(property_line(&report, "StackTrace"), "<null>");
}

struct Custom;

impl ErrorNode for Custom {
    fn type_name(&self) -> Cow<'_, str> {
        Cow::Borrowed("Custom")
    }

    fn describe(&self) -> Vec<Member<'_>> {
        vec![
            Member::value("Message", TypeTag::Text, "custom failure"),
            Member::value("Broken", TypeTag::other("Unprintable"), Unprintable),
            Member::new("Lazy", TypeTag::U32, || Ok(Some(undertow::Value::new(7u32)))),
        ]
    }

    fn stack_trace(&self) -> Result<Option<String>, AccessError> {
        Ok(Some("   at custom::run\n   at main".to_string()))
    }
}

#[test]
fn test_custom_node() {
    let report = format_plain_text(&Custom);

    assert_eq!(
        property_line(&report, "Broken"),
        "Error[fmt::Error] = 'an error occurred when formatting an argument'"
    );
    assert_eq!(property_line(&report, "Lazy"), "7");
    assert!(report.ends_with("StackTrace:\n       at custom::run\n       at main\n"));
}

#[test]
fn test_script_stack_trace() {
    let err = ErrorRecord::new("LuaError", "attempt to index nil")
        .with_script_frames(vec![
            ScriptFrame::new(Some("handler"), "events.lua", 14),
            ScriptFrame::host("Dispatch"),
        ])
        .with_stack_trace("   at host::dispatch");

    let report = format_plain_text(&err);
    let script = report.find("ScriptStackTrace:").expect("script trace present");
    let trace = report.find("StackTrace:  ").expect("stack trace present");
    assert!(script < trace);
    assert!(report.contains("ScriptStackTrace:\n       at handler in events.lua:line 14\n       at Dispatch (host)\n"));
}

#[test]
fn test_append_to_existing_buffer() {
    let mut log = String::from("2024-03-01 worker crashed");
    format_plain_text_into(&mut log, &ErrorRecord::new("Panic", "index out of bounds"));

    let mut lines = log.lines();
    assert_eq!(lines.next(), Some("2024-03-01 worker crashed"));
    assert!(lines.next().is_some_and(|line| line.starts_with("-- Panic ")));
}

#[test]
fn test_custom_layout_options() {
    let err = ErrorRecord::new("E", "a\nb").with_property("N", 1);
    let options = PlainTextOptions::default()
        .with_name_width(4)
        .with_indent(2)
        .with_separator_width(10);

    let report = ChainFormatter::new()
        .format(&err, PlainTextSink::new().with_options(options))
        .unwrap();

    assert_eq!(report, "-- E -----\nMessage:\n  a\n  b\nN:   1\nStackTrace: <null>\n");
}

#[test]
fn test_unwrap_then_report() {
    let err = ErrorRecord::invocation(
        "InvocationError",
        ErrorRecord::aggregate("AggregateError", vec![ErrorRecord::new("IoError", "disk full")]),
    );

    assert_sections!(
        format_plain_text(&err),
        [
            "InvocationError",
            "InnerException: AggregateError",
            "InnerException: IoError",
        ]
    );
    assert_sections!(format_plain_text(unwrap_root_cause(&err)), ["IoError"]);
}

#[test]
fn test_multi_cause_aggregate_reports_first_cause() {
    let err = ErrorRecord::aggregate(
        "AggregateError",
        vec![ErrorRecord::new("A", "a"), ErrorRecord::new("B", "b")],
    );

    let report = format_plain_text(&err);
    assert_sections!(&report, ["AggregateError", "InnerException: A"]);
    assert_eq!(property_line(&report, "InnerExceptions"), "(Vec<ErrorRecord>)[A, B]");
}
