//! Testing utilities for error reports
//!
//! Helpers for asserting on what the formatter produces: a sink that records
//! raw events instead of rendering them, a parser for section titles in
//! plain-text reports, an assertion macro, and (behind the `proptest`
//! feature) strategies that generate error chains.
//!
//! # Examples
//!
//! ## Recording sink
//!
//! ```rust
//! use undertow::testing::{RecordingSink, SinkEvent};
//! use undertow::{ChainFormatter, ErrorRecord};
//!
//! let events = ChainFormatter::new()
//!     .format(&ErrorRecord::new("IoError", "gone"), RecordingSink::new())
//!     .unwrap();
//!
//! assert!(matches!(&events[0], SinkEvent::Section { first: true, title } if title == "IoError"));
//! ```
//!
//! ## Assertion macro
//!
//! ```rust
//! use undertow::{assert_sections, format_plain_text, ErrorRecord};
//!
//! let err = ErrorRecord::new("Outer", "o").with_cause(ErrorRecord::new("Inner", "i"));
//! assert_sections!(format_plain_text(&err), ["Outer", "InnerException: Inner"]);
//! ```

use std::convert::Infallible;

use crate::node::{AccessError, TypeTag};
use crate::sink::{OutputSink, PropertyValue, RenderedProperty};

/// One event received by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    /// A section was opened.
    Section {
        /// Whether this is the root section.
        first: bool,
        /// Section title.
        title: String,
    },
    /// A property was reported.
    Property {
        /// Member name.
        name: String,
        /// Declared type.
        tag: TypeTag,
        /// String form of the value, `None` for absent values.
        value: Result<Option<String>, AccessError>,
    },
}

/// A sink that keeps every event it receives.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Vec<SinkEvent>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutputSink for RecordingSink {
    type Artifact = Vec<SinkEvent>;
    type Error = Infallible;

    fn open_section(&mut self, first: bool, title: &str) -> Result<(), Infallible> {
        self.events.push(SinkEvent::Section {
            first,
            title: title.to_string(),
        });
        Ok(())
    }

    fn property(&mut self, property: RenderedProperty<'_>) -> Result<(), Infallible> {
        let value = match &property.value {
            PropertyValue::Value(None) => Ok(None),
            PropertyValue::Value(Some(value)) => value.to_text().map(Some),
            PropertyValue::Failed(error) => Err(error.clone()),
        };
        self.events.push(SinkEvent::Property {
            name: property.name.into_owned(),
            tag: property.tag,
            value,
        });
        Ok(())
    }

    fn finalize(self) -> Result<Vec<SinkEvent>, Infallible> {
        Ok(self.events)
    }
}

/// Extract the section titles from a plain-text report, in order.
///
/// # Example
///
/// ```rust
/// use undertow::testing::section_titles;
///
/// let report = "-- A -----\nMessage: 'x'\n-- InnerException: B -----\n";
/// assert_eq!(section_titles(report), vec!["A", "InnerException: B"]);
/// ```
pub fn section_titles(report: &str) -> Vec<String> {
    report
        .lines()
        .filter_map(|line| line.strip_prefix("-- "))
        .filter_map(|rest| rest.rsplit_once(" --"))
        .filter(|(_, fill)| fill.chars().all(|c| c == '-'))
        .map(|(title, _)| title.to_string())
        .collect()
}

/// Assert that a plain-text report has exactly the given section titles.
///
/// # Example
///
/// ```rust
/// use undertow::{assert_sections, format_plain_text, ErrorRecord};
///
/// let report = format_plain_text(&ErrorRecord::new("Timeout", "slow"));
/// assert_sections!(report, ["Timeout"]);
/// ```
#[macro_export]
macro_rules! assert_sections {
    ($report:expr, [$($title:expr),* $(,)?]) => {{
        let report = $report;
        let titles = $crate::testing::section_titles(&report);
        let expected: Vec<String> = vec![$($title.to_string()),*];
        if titles != expected {
            panic!(
                "Expected sections {:?}, got {:?}\n{}",
                expected, titles, report
            );
        }
    }};
}

/// Proptest strategies for generating error chains.
///
/// Each strategy yields the generated error together with the section titles
/// a correct report must contain, in order.
#[cfg(feature = "proptest")]
pub mod strategies {
    use proptest::prelude::*;

    use crate::record::ErrorRecord;

    /// Generate an error type name such as `QxError`.
    pub fn arb_type_name() -> impl Strategy<Value = String> {
        "[A-Z][a-z]{0,8}Error"
    }

    /// Generate message text, including line breaks and tabs.
    pub fn arb_message() -> impl Strategy<Value = String> {
        "[a-z \t\r\n]{0,24}"
    }

    /// Generate a linear chain of direct causes, between 1 and `max_len`
    /// errors long.
    pub fn arb_linear_chain(max_len: usize) -> impl Strategy<Value = (ErrorRecord, Vec<String>)> {
        prop::collection::vec((arb_type_name(), arb_message()), 1..=max_len.max(1)).prop_map(|links| {
            let titles = links
                .iter()
                .enumerate()
                .map(|(i, (name, _))| {
                    if i == 0 {
                        name.clone()
                    } else {
                        format!("InnerException: {}", name)
                    }
                })
                .collect();

            let mut links = links.into_iter().rev();
            let mut chain = links
                .next()
                .map(|(name, message)| ErrorRecord::new(name, message))
                .unwrap_or_else(|| ErrorRecord::bare("Error"));
            for (name, message) in links {
                chain = ErrorRecord::new(name, message).with_cause(chain);
            }
            (chain, titles)
        })
    }

    /// Generate an error with between 0 and `max_loaders` loader causes.
    pub fn arb_loader_fanout(max_loaders: usize) -> impl Strategy<Value = (ErrorRecord, Vec<String>)> {
        (
            arb_type_name(),
            prop::collection::vec(arb_type_name(), 0..=max_loaders),
        )
            .prop_map(|(root, loaders)| {
                let mut titles = vec![root.clone()];
                titles.extend(
                    loaders
                        .iter()
                        .enumerate()
                        .map(|(i, name)| format!("LoaderException[{}]: {}", i, name)),
                );

                let record = ErrorRecord::new(root, "loading failed")
                    .with_loader_causes(loaders.into_iter().map(|name| ErrorRecord::new(name, "")));
                (record, titles)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format_plain_text;
    use crate::record::ErrorRecord;

    #[test]
    fn test_section_titles_ignores_properties() {
        let report = format_plain_text(
            &ErrorRecord::new("A", "-- not a title --").with_cause(ErrorRecord::new("B", "b")),
        );
        assert_eq!(section_titles(&report), vec!["A", "InnerException: B"]);
    }

    #[test]
    fn test_section_titles_keep_trailing_dashes() {
        let report = format_plain_text(&ErrorRecord::new("Foo-", "m").with_cause(ErrorRecord::new("a --b", "x")));
        assert_eq!(section_titles(&report), vec!["Foo-", "InnerException: a --b"]);
    }

    #[test]
    fn test_recording_sink_captures_values() {
        let events = crate::ChainFormatter::new()
            .format(
                &ErrorRecord::new("E", "m").with_null("Path", TypeTag::Text),
                RecordingSink::new(),
            )
            .unwrap();

        assert_eq!(
            events,
            vec![
                SinkEvent::Section {
                    first: true,
                    title: "E".to_string()
                },
                SinkEvent::Property {
                    name: "Message".to_string(),
                    tag: TypeTag::Text,
                    value: Ok(Some("m".to_string())),
                },
                SinkEvent::Property {
                    name: "Path".to_string(),
                    tag: TypeTag::Text,
                    value: Ok(None),
                },
                SinkEvent::Property {
                    name: "StackTrace".to_string(),
                    tag: TypeTag::Text,
                    value: Ok(None),
                },
            ]
        );
    }

    #[test]
    #[should_panic(expected = "Expected sections")]
    fn test_assert_sections_panics_on_mismatch() {
        let report = format_plain_text(&ErrorRecord::new("A", "a"));
        assert_sections!(report, ["B"]);
    }
}
