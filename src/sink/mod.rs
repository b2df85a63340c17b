//! Output strategies for error reports
//!
//! The formatter walks the error chain and reports what it finds to an
//! [`OutputSink`]: a section opens for each error, every member is forwarded
//! as a [`RenderedProperty`], and at the end the sink turns what it has
//! collected into its artifact.
//!
//! # Available sinks
//!
//! - [`PlainTextSink`](plain::PlainTextSink): the human-readable text report
//! - [`JsonSink`](json::JsonSink): a `serde_json::Value` (feature `serde`)
//! - [`RecordingSink`](crate::testing::RecordingSink): records raw events, for tests

use std::borrow::Cow;

use crate::node::{AccessError, TypeTag, Value};

#[cfg(feature = "serde")]
pub mod json;
pub mod plain;

/// Outcome of reading one member.
#[derive(Debug)]
pub enum PropertyValue<'a> {
    /// The accessor succeeded; `None` means the value is absent.
    Value(Option<Value<'a>>),
    /// The accessor failed.
    Failed(AccessError),
}

impl<'a> From<Result<Option<Value<'a>>, AccessError>> for PropertyValue<'a> {
    fn from(result: Result<Option<Value<'a>>, AccessError>) -> Self {
        match result {
            Ok(value) => PropertyValue::Value(value),
            Err(error) => PropertyValue::Failed(error),
        }
    }
}

/// A member after evaluation, ready to be rendered by a sink.
#[derive(Debug)]
pub struct RenderedProperty<'a> {
    /// Member name.
    pub name: Cow<'a, str>,
    /// Declared type.
    pub tag: TypeTag,
    /// The value or the failure that replaced it.
    pub value: PropertyValue<'a>,
}

impl<'a> RenderedProperty<'a> {
    /// Create a rendered property.
    pub fn new(name: impl Into<Cow<'a, str>>, tag: TypeTag, value: impl Into<PropertyValue<'a>>) -> Self {
        Self {
            name: name.into(),
            tag,
            value: value.into(),
        }
    }
}

/// Receives section and property events and produces the final artifact.
///
/// A sink instance serves exactly one report. It is driven from a single
/// thread and needs no synchronization.
///
/// # Example
///
/// ```rust
/// use std::convert::Infallible;
/// use undertow::sink::{OutputSink, RenderedProperty};
/// use undertow::{ChainFormatter, ErrorRecord};
///
/// /// Counts what the formatter reports.
/// #[derive(Default)]
/// struct Counter {
///     sections: usize,
///     properties: usize,
/// }
///
/// impl OutputSink for Counter {
///     type Artifact = (usize, usize);
///     type Error = Infallible;
///
///     fn open_section(&mut self, _first: bool, _title: &str) -> Result<(), Infallible> {
///         self.sections += 1;
///         Ok(())
///     }
///
///     fn property(&mut self, _property: RenderedProperty<'_>) -> Result<(), Infallible> {
///         self.properties += 1;
///         Ok(())
///     }
///
///     fn finalize(self) -> Result<(usize, usize), Infallible> {
///         Ok((self.sections, self.properties))
///     }
/// }
///
/// let err = ErrorRecord::new("Outer", "o").with_cause(ErrorRecord::new("Inner", "i"));
/// let counts = ChainFormatter::new().format(&err, Counter::default()).unwrap();
/// // Message + StackTrace per section
/// assert_eq!(counts, (2, 4));
/// ```
pub trait OutputSink {
    /// What a finished report looks like.
    type Artifact;

    /// Failure of the sink itself. These are not recovered by the formatter.
    type Error;

    /// Start a new section. `first` is true only for the root error.
    fn open_section(&mut self, first: bool, title: &str) -> Result<(), Self::Error>;

    /// Add a property to the current section.
    fn property(&mut self, property: RenderedProperty<'_>) -> Result<(), Self::Error>;

    /// Finish the report.
    fn finalize(self) -> Result<Self::Artifact, Self::Error>;
}
