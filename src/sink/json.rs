//! Structured JSON sink (feature-gated)
//!
//! Builds a `serde_json::Value` with one object per section:
//!
//! ```json
//! [
//!   {
//!     "title": "ConfigError",
//!     "first": true,
//!     "properties": [
//!       { "name": "Message", "type": "String", "value": "could not load settings" },
//!       { "name": "Data", "type": "String", "error": { "kind": "Io", "message": "gone" } },
//!       { "name": "StackTrace", "type": "String", "value": null }
//!     ]
//!   }
//! ]
//! ```
//!
//! Values are carried as their raw string form; none of the plain-text
//! quoting or escaping applies.

use std::convert::Infallible;

use serde_json::{json, Map, Value as Json};

use crate::node::AccessError;
use crate::sink::{OutputSink, PropertyValue, RenderedProperty};

#[derive(Debug)]
struct JsonSection {
    title: String,
    first: bool,
    properties: Vec<Json>,
}

/// Collects a report as JSON.
///
/// # Example
///
/// ```rust
/// use undertow::sink::json::JsonSink;
/// use undertow::{ChainFormatter, ErrorRecord};
///
/// let err = ErrorRecord::new("Outer", "o").with_cause(ErrorRecord::new("Inner", "i"));
/// let json = ChainFormatter::new().format(&err, JsonSink::new()).unwrap();
///
/// assert_eq!(json[1]["title"], "InnerException: Inner");
/// assert_eq!(json[1]["properties"][0]["value"], "i");
/// ```
#[derive(Debug, Default)]
pub struct JsonSink {
    sections: Vec<JsonSection>,
}

impl JsonSink {
    /// Create an empty JSON sink.
    pub fn new() -> Self {
        Self::default()
    }

    fn current(&mut self) -> &mut JsonSection {
        if self.sections.is_empty() {
            self.sections.push(JsonSection {
                title: String::new(),
                first: true,
                properties: Vec::new(),
            });
        }
        let last = self.sections.len() - 1;
        &mut self.sections[last]
    }
}

fn error_json(error: &AccessError) -> Json {
    json!({ "kind": error.kind(), "message": error.message() })
}

impl OutputSink for JsonSink {
    type Artifact = Json;
    type Error = Infallible;

    fn open_section(&mut self, first: bool, title: &str) -> Result<(), Infallible> {
        self.sections.push(JsonSection {
            title: title.to_string(),
            first,
            properties: Vec::new(),
        });
        Ok(())
    }

    fn property(&mut self, property: RenderedProperty<'_>) -> Result<(), Infallible> {
        let mut entry = Map::new();
        entry.insert("name".to_string(), Json::from(property.name.as_ref()));
        entry.insert("type".to_string(), json!(property.tag));

        match &property.value {
            PropertyValue::Value(None) => {
                entry.insert("value".to_string(), Json::Null);
            }
            PropertyValue::Value(Some(value)) => match value.to_text() {
                Ok(text) => {
                    entry.insert("value".to_string(), Json::String(text));
                }
                Err(error) => {
                    entry.insert("error".to_string(), error_json(&error));
                }
            },
            PropertyValue::Failed(error) => {
                entry.insert("error".to_string(), error_json(error));
            }
        }

        self.current().properties.push(Json::Object(entry));
        Ok(())
    }

    fn finalize(self) -> Result<Json, Infallible> {
        Ok(Json::Array(
            self.sections
                .into_iter()
                .map(|section| {
                    json!({
                        "title": section.title,
                        "first": section.first,
                        "properties": section.properties,
                    })
                })
                .collect(),
        ))
    }
}
