//! Plain-text rendering rules for property values
//!
//! Rules, in priority order:
//!
//! 1. a failed accessor renders as `Error[<kind>] = '<message>'`
//! 2. an absent value renders as `<null>`
//! 3. text containing a line break renders as an indented block on the
//!    following lines; other text renders single-quoted with `\n`, `\r` and
//!    `\t` escaped
//! 4. numeric and temporal kinds render bare
//! 5. everything else renders as `(TypeName)` followed by the escaped value
//!
//! If producing the string form itself fails, rule 1 applies to that failure.

use std::borrow::Cow;

use crate::node::{AccessError, TypeTag};
use crate::sink::PropertyValue;

/// Literal written for absent values.
pub const NULL_MARKER: &str = "<null>";

/// Escape line feed, carriage return and tab into their two-character forms.
///
/// # Examples
///
/// ```
/// use undertow::render::escape_invisible;
///
/// assert_eq!(escape_invisible("a\tb\r\n"), "a\\tb\\r\\n");
/// assert_eq!(escape_invisible("plain"), "plain");
/// ```
pub fn escape_invisible(value: &str) -> Cow<'_, str> {
    if !value.contains(['\n', '\r', '\t']) {
        return Cow::Borrowed(value);
    }

    let mut out = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Inline marker for a failed accessor.
///
/// # Examples
///
/// ```
/// use undertow::node::AccessError;
/// use undertow::render::access_marker;
///
/// let err = AccessError::new("Io", "disk gone");
/// assert_eq!(access_marker(&err), "Error[Io] = 'disk gone'");
/// ```
pub fn access_marker(error: &AccessError) -> String {
    format!("Error[{}] = '{}'", error.kind(), error.message())
}

/// Renders a single property value as plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyRenderer {
    indent: usize,
}

impl Default for PropertyRenderer {
    fn default() -> Self {
        Self::new(4)
    }
}

impl PropertyRenderer {
    /// Create a renderer that indents multi-line text by `indent` spaces.
    pub fn new(indent: usize) -> Self {
        Self { indent }
    }

    /// Render `value` of declared type `tag`.
    ///
    /// The result has no trailing newline. Multi-line text starts with a
    /// newline so that the block begins on the line after the name.
    ///
    /// # Examples
    ///
    /// ```
    /// use undertow::node::{TypeTag, Value};
    /// use undertow::render::PropertyRenderer;
    /// use undertow::sink::PropertyValue;
    ///
    /// let renderer = PropertyRenderer::default();
    /// let text = PropertyValue::Value(Some(Value::new("a\tb")));
    /// assert_eq!(renderer.render(&TypeTag::Text, &text), "'a\\tb'");
    ///
    /// let other = PropertyValue::Value(Some(Value::new("http://x")));
    /// assert_eq!(renderer.render(&TypeTag::other("Uri"), &other), "(Uri)http://x");
    /// ```
    pub fn render(&self, tag: &TypeTag, value: &PropertyValue<'_>) -> String {
        let value = match value {
            PropertyValue::Failed(error) => return access_marker(error),
            PropertyValue::Value(None) => return NULL_MARKER.to_string(),
            PropertyValue::Value(Some(value)) => value,
        };

        let text = match value.to_text() {
            Ok(text) => text,
            Err(error) => return access_marker(&error),
        };

        if tag.is_text() {
            if text.contains('\n') {
                self.render_block(&text)
            } else {
                format!("'{}'", escape_invisible(&text))
            }
        } else if tag.is_primitive() {
            text
        } else {
            format!("({}){}", tag.name(), escape_invisible(&text))
        }
    }

    fn render_block(&self, text: &str) -> String {
        let margin = " ".repeat(self.indent);
        let mut out = String::with_capacity(text.len() + 16);
        for line in text.replace('\r', "").split('\n') {
            out.push('\n');
            out.push_str(&margin);
            out.push_str(line);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Value;

    fn render(tag: TypeTag, value: &str) -> String {
        PropertyRenderer::default().render(&tag, &PropertyValue::Value(Some(Value::new(value))))
    }

    #[test]
    fn test_null() {
        let renderer = PropertyRenderer::default();
        assert_eq!(renderer.render(&TypeTag::Text, &PropertyValue::Value(None)), "<null>");
        assert_eq!(renderer.render(&TypeTag::I32, &PropertyValue::Value(None)), "<null>");
    }

    #[test]
    fn test_single_line_text_is_quoted() {
        assert_eq!(render(TypeTag::Text, "hello"), "'hello'");
        assert_eq!(render(TypeTag::Text, "a\rb\tc"), "'a\\rb\\tc'");
    }

    #[test]
    fn test_multi_line_text_is_block() {
        assert_eq!(render(TypeTag::Text, "line1\nline2"), "\n    line1\n    line2");
        assert_eq!(render(TypeTag::Text, "line1\r\nline2"), "\n    line1\n    line2");
    }

    #[test]
    fn test_block_respects_indent() {
        let renderer = PropertyRenderer::new(2);
        let value = PropertyValue::Value(Some(Value::new("a\nb")));
        assert_eq!(renderer.render(&TypeTag::Text, &value), "\n  a\n  b");
    }

    #[test]
    fn test_primitives_render_bare() {
        assert_eq!(render(TypeTag::I32, "5"), "5");
        assert_eq!(render(TypeTag::F64, "1.5"), "1.5");
        assert_eq!(render(TypeTag::Decimal, "10.25"), "10.25");
        assert_eq!(render(TypeTag::DateTime, "2024-01-02T03:04:05Z"), "2024-01-02T03:04:05Z");
    }

    #[test]
    fn test_other_types_are_annotated_and_escaped() {
        assert_eq!(render(TypeTag::other("bool"), "true"), "(bool)true");
        assert_eq!(render(TypeTag::other("Path"), "a\nb"), "(Path)a\\nb");
    }

    #[test]
    fn test_failed_accessor_marker() {
        let value = PropertyValue::Failed(AccessError::new("Timeout", "took too long"));
        assert_eq!(
            PropertyRenderer::default().render(&TypeTag::Text, &value),
            "Error[Timeout] = 'took too long'"
        );
    }

    #[test]
    fn test_escape_borrows_when_clean() {
        assert!(matches!(escape_invisible("clean"), Cow::Borrowed(_)));
    }
}
