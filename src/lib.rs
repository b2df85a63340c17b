//! # Undertow
//!
//! > *"What pulls from below the surface"*
//!
//! A Rust library for turning an error, and everything that caused it, into a
//! readable report.
//!
//! ## Philosophy
//!
//! **Undertow** separates *walking* an error chain from *rendering* it:
//! - **Walk** = [`ChainFormatter`] visits the root error and every reachable
//!   cause exactly once, in reading order, without recursion
//! - **Render** = an [`OutputSink`] decides what a section and a property look
//!   like: plain text, JSON, or anything else
//!
//! ## Quick Example
//!
//! ```rust
//! use undertow::{format_plain_text, ErrorRecord};
//!
//! let err = ErrorRecord::new("ConfigError", "could not load settings")
//!     .with_property("Line", 12)
//!     .with_cause(ErrorRecord::new("IoError", "permission denied"));
//!
//! let report = format_plain_text(&err);
//!
//! assert!(report.starts_with("-- ConfigError "));
//! assert!(report.contains("-- InnerException: IoError "));
//! assert!(report.contains("'permission denied'"));
//! ```
//!
//! Any type can be reported by implementing [`ErrorNode`]; standard errors
//! are covered by [`StdErrorNode`](std_error::StdErrorNode).

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod assert;
pub mod formatter;
pub mod node;
pub mod record;
pub mod render;
pub mod sink;
pub mod std_error;
pub mod testing;
pub mod unwrap;

use std::error::Error as StdError;

// Re-exports
pub use assert::{assert_false, assert_true, DebugSink, InvalidArgument};
pub use formatter::{ChainFormatter, FormatError};
pub use node::{AccessError, ErrorNode, Member, ScriptFrames, TypeTag, Value, WrapperKind};
pub use record::{ErrorRecord, ScriptFrame};
pub use sink::plain::{PlainTextOptions, PlainTextSink};
pub use sink::{OutputSink, PropertyValue, RenderedProperty};
pub use unwrap::unwrap_root_cause;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::formatter::{ChainFormatter, FormatError};
    pub use crate::node::{AccessError, ErrorNode, Member, TypeTag};
    pub use crate::record::ErrorRecord;
    pub use crate::sink::plain::PlainTextSink;
    pub use crate::sink::OutputSink;
    pub use crate::unwrap::unwrap_root_cause;
    pub use crate::ReportExt;
}

/// Format an error and its causes as plain text.
///
/// If the chain loops or exceeds the default section limit, the report ends
/// with a `<report truncated: ...>` line after the sections written so far.
pub fn format_plain_text(error: &dyn ErrorNode) -> String {
    let mut out = String::new();
    format_plain_text_into(&mut out, error);
    out
}

/// Append a plain-text report of an error and its causes to `out`.
///
/// The report starts on a fresh line.
///
/// # Examples
///
/// ```rust
/// use undertow::{format_plain_text_into, ErrorRecord};
///
/// let mut log = String::from("job 17 failed");
/// format_plain_text_into(&mut log, &ErrorRecord::new("Timeout", "no answer"));
///
/// assert!(log.starts_with("job 17 failed\n-- Timeout "));
/// ```
pub fn format_plain_text_into(out: &mut String, error: &dyn ErrorNode) {
    let result = ChainFormatter::new()
        .format(error, PlainTextSink::into_buffer(&mut *out))
        .map(|_| ());
    if let Err(err) = result {
        sink::plain::write_fresh_line(out);
        out.push_str(&format!("<report truncated: {}>\n", err));
    }
}

/// Format a standard error and its `source()` chain as plain text.
pub fn report_std_error<E: StdError + 'static>(error: &E) -> String {
    format_plain_text(&std_error::StdErrorNode::of(error))
}

/// Convenience methods on every [`ErrorNode`].
pub trait ReportExt {
    /// The plain-text report of this error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use undertow::{ErrorRecord, ReportExt};
    ///
    /// let report = ErrorRecord::new("Timeout", "no answer").message_string();
    /// assert!(report.contains("'no answer'"));
    /// ```
    fn message_string(&self) -> String;

    /// Write `Exception:` followed by the report to `sink`. Does nothing in
    /// release builds.
    fn debug_out(&self, sink: &dyn DebugSink);
}

impl<T: ErrorNode> ReportExt for T {
    fn message_string(&self) -> String {
        format_plain_text(self)
    }

    fn debug_out(&self, sink: &dyn DebugSink) {
        write_debug_report(self, sink);
    }
}

impl ReportExt for dyn ErrorNode + '_ {
    fn message_string(&self) -> String {
        format_plain_text(self)
    }

    fn debug_out(&self, sink: &dyn DebugSink) {
        write_debug_report(self, sink);
    }
}

fn write_debug_report(error: &dyn ErrorNode, sink: &dyn DebugSink) {
    if cfg!(debug_assertions) {
        sink.write_line(&format!("Exception:\n{}", format_plain_text(error)));
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    struct Looping;

    impl ErrorNode for Looping {
        fn type_name(&self) -> std::borrow::Cow<'_, str> {
            "Looping".into()
        }

        fn describe(&self) -> Vec<Member<'_>> {
            Vec::new()
        }

        fn cause(&self) -> Option<&dyn ErrorNode> {
            Some(self)
        }
    }

    #[test]
    fn test_format_plain_text_single_section() {
        let report = format_plain_text(&ErrorRecord::new("E", "m"));
        assert_eq!(testing::section_titles(&report), vec!["E"]);
        assert!(report.ends_with('\n'));
    }

    #[test]
    fn test_truncated_report_keeps_partial_output() {
        let report = format_plain_text(&Looping);

        assert!(report.starts_with("-- Looping "));
        assert!(report.ends_with("<report truncated: error chain too deep: more than 1024 sections>\n"));
        assert_eq!(testing::section_titles(&report).len(), formatter::DEFAULT_MAX_SECTIONS);
    }

    #[test]
    fn test_message_string_on_trait_object() {
        let err = ErrorRecord::new("E", "m");
        let node: &dyn ErrorNode = &err;
        assert_eq!(node.message_string(), err.message_string());
    }

    #[test]
    fn test_debug_out_writes_report() {
        let lines = RefCell::new(Vec::new());
        let sink = |line: &str| lines.borrow_mut().push(line.to_string());

        ErrorRecord::new("E", "m").debug_out(&sink);

        let lines = lines.borrow();
        if cfg!(debug_assertions) {
            assert_eq!(lines.len(), 1);
            assert!(lines[0].starts_with("Exception:\n-- E "));
        } else {
            assert!(lines.is_empty());
        }
    }

    #[test]
    fn test_report_std_error() {
        let err = "abc".parse::<i32>().unwrap_err();
        let report = report_std_error(&err);
        assert!(report.starts_with("-- ParseIntError "));
        assert!(report.contains("'invalid digit found in string'"));
    }
}
