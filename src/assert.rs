//! Debug-build assertion helpers
//!
//! [`assert_true`] and [`assert_false`] check a condition in debug builds. On
//! violation they write a diagnostic line (message and call site) to an
//! injected [`DebugSink`] and return an [`InvalidArgument`] error. In release
//! builds they always succeed without evaluating anything further.
//!
//! # Examples
//!
//! ```
//! use undertow::assert::{assert_true, InvalidArgument};
//!
//! fn set_width(width: usize) -> Result<usize, InvalidArgument> {
//!     assert_true(width > 0, Some("width must be positive"), &|_: &str| {})?;
//!     Ok(width)
//! }
//!
//! assert_eq!(set_width(3), Ok(3));
//! # #[cfg(debug_assertions)]
//! assert!(set_width(0).is_err());
//! ```

use std::fmt;
use std::panic::Location;

/// Receives diagnostic lines from the assertion helpers.
pub trait DebugSink {
    /// Write one line.
    fn write_line(&self, line: &str);
}

impl<F: Fn(&str)> DebugSink for F {
    fn write_line(&self, line: &str) {
        self(line)
    }
}

/// Forwards diagnostic lines to `tracing` at debug level.
#[cfg(feature = "tracing")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDebugSink;

#[cfg(feature = "tracing")]
impl DebugSink for TracingDebugSink {
    fn write_line(&self, line: &str) {
        tracing::debug!(target: "undertow::assert", "{}", line);
    }
}

/// A violated debug assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidArgument {
    message: Option<String>,
    location: &'static Location<'static>,
}

impl InvalidArgument {
    /// The assertion message, if one was given.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Where the assertion was made.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }
}

impl fmt::Display for InvalidArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid argument: {}",
            self.message.as_deref().unwrap_or("no description")
        )
    }
}

impl std::error::Error for InvalidArgument {}

/// Fail unless `condition` holds (debug builds only).
#[track_caller]
pub fn assert_true(condition: bool, message: Option<&str>, sink: &dyn DebugSink) -> Result<(), InvalidArgument> {
    check(!condition, message, sink, Location::caller())
}

/// Fail if `condition` holds (debug builds only).
#[track_caller]
pub fn assert_false(condition: bool, message: Option<&str>, sink: &dyn DebugSink) -> Result<(), InvalidArgument> {
    check(condition, message, sink, Location::caller())
}

#[cfg(debug_assertions)]
fn check(
    violated: bool,
    message: Option<&str>,
    sink: &dyn DebugSink,
    location: &'static Location<'static>,
) -> Result<(), InvalidArgument> {
    if !violated {
        return Ok(());
    }

    sink.write_line(&format!(
        "Assert: {}, {}:{}",
        message.unwrap_or("no description"),
        location.file(),
        location.line()
    ));
    Err(InvalidArgument {
        message: message.map(str::to_string),
        location,
    })
}

#[cfg(not(debug_assertions))]
fn check(
    _violated: bool,
    _message: Option<&str>,
    _sink: &dyn DebugSink,
    _location: &'static Location<'static>,
) -> Result<(), InvalidArgument> {
    Ok(())
}
