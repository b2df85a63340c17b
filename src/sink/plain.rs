//! Plain-text report sink
//!
//! Produces the classic text report:
//!
//! ```text
//! -- ConfigError -----------------------------------------------------------------
//! Message:             'could not load settings'
//! Line:                12
//! StackTrace:          <null>
//! -- InnerException: IoError -----------------------------------------------------
//! Message:             'file not found'
//! StackTrace:          <null>
//! ```

use std::borrow::BorrowMut;
use std::convert::Infallible;

use crate::render::PropertyRenderer;
use crate::sink::{OutputSink, RenderedProperty};

/// Layout settings for [`PlainTextSink`].
///
/// # Examples
///
/// ```rust
/// use undertow::sink::plain::PlainTextOptions;
///
/// let options = PlainTextOptions::default()
///     .with_name_width(12)
///     .with_indent(2);
///
/// assert_eq!(options.name_width(), 12);
/// assert_eq!(options.indent(), 2);
/// assert_eq!(options.separator_width(), 80);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlainTextOptions {
    name_width: usize,
    indent: usize,
    separator_width: usize,
}

impl Default for PlainTextOptions {
    fn default() -> Self {
        Self {
            name_width: 20,
            indent: 4,
            separator_width: 80,
        }
    }
}

impl PlainTextOptions {
    /// Column the `name:` label is padded to.
    pub fn with_name_width(mut self, width: usize) -> Self {
        self.name_width = width;
        self
    }

    /// Indentation of multi-line text blocks.
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Total width of section separator lines.
    pub fn with_separator_width(mut self, width: usize) -> Self {
        self.separator_width = width;
        self
    }

    /// Get the name column width.
    pub fn name_width(&self) -> usize {
        self.name_width
    }

    /// Get the block indentation.
    pub fn indent(&self) -> usize {
        self.indent
    }

    /// Get the separator width.
    pub fn separator_width(&self) -> usize {
        self.separator_width
    }
}

/// Writes a plain-text report into a `String` buffer.
///
/// The buffer can be owned (`PlainTextSink<String>`) or borrowed
/// (`PlainTextSink<&mut String>`); the finished artifact is the buffer itself.
#[derive(Debug)]
pub struct PlainTextSink<B = String> {
    out: B,
    options: PlainTextOptions,
    renderer: PropertyRenderer,
}

impl PlainTextSink<String> {
    /// Create a sink writing into a new buffer.
    pub fn new() -> Self {
        Self::into_buffer(String::new())
    }
}

impl Default for PlainTextSink<String> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: BorrowMut<String>> PlainTextSink<B> {
    /// Create a sink appending to an existing buffer.
    ///
    /// If the buffer already holds text that does not end in a newline, one
    /// is added so the report starts on a fresh line.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use undertow::sink::plain::PlainTextSink;
    /// use undertow::{ChainFormatter, ErrorRecord};
    ///
    /// let mut log = String::from("request failed:");
    /// ChainFormatter::new()
    ///     .format(&ErrorRecord::new("Timeout", "slow"), PlainTextSink::into_buffer(&mut log))
    ///     .unwrap();
    ///
    /// assert!(log.starts_with("request failed:\n-- Timeout "));
    /// ```
    pub fn into_buffer(mut out: B) -> Self {
        write_fresh_line(out.borrow_mut());
        Self {
            out,
            options: PlainTextOptions::default(),
            renderer: PropertyRenderer::default(),
        }
    }

    /// Replace the layout settings.
    pub fn with_options(mut self, options: PlainTextOptions) -> Self {
        self.renderer = PropertyRenderer::new(options.indent);
        self.options = options;
        self
    }

    fn write_separator(&mut self, title: &str) {
        let out = self.out.borrow_mut();
        let start = out.len();
        out.push_str("-- ");
        out.push_str(title);
        out.push(' ');

        let used = out[start..].chars().count();
        let fill = self.options.separator_width.saturating_sub(used).max(2);
        out.extend(std::iter::repeat_n('-', fill));
        out.push('\n');
    }
}

impl<B: BorrowMut<String>> OutputSink for PlainTextSink<B> {
    type Artifact = B;
    type Error = Infallible;

    fn open_section(&mut self, _first: bool, title: &str) -> Result<(), Infallible> {
        self.write_separator(title);
        Ok(())
    }

    fn property(&mut self, property: RenderedProperty<'_>) -> Result<(), Infallible> {
        let rendered = self.renderer.render(&property.tag, &property.value);
        let label = format!("{}:", property.name);

        let out = self.out.borrow_mut();
        out.push_str(&format!("{:<width$} ", label, width = self.options.name_width));
        if rendered.starts_with('\n') {
            // Block values start on the next line; drop the padding.
            let trimmed = out.trim_end_matches(' ').len();
            out.truncate(trimmed);
        }
        out.push_str(&rendered);
        out.push('\n');
        Ok(())
    }

    fn finalize(self) -> Result<B, Infallible> {
        Ok(self.out)
    }
}

/// Terminate a non-empty buffer's last line.
pub(crate) fn write_fresh_line(out: &mut String) {
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}
