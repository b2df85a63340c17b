//! Owned error values built from plain data
//!
//! [`ErrorRecord`] is the ready-made [`ErrorNode`] implementation: a type name,
//! an ordered list of members and whatever causes and stack information the
//! error carries. It is what tests, bridges from other error systems, and
//! callers that capture errors for later reporting reach for.
//!
//! # Examples
//!
//! ```
//! use undertow::ErrorRecord;
//!
//! let err = ErrorRecord::new("ConfigError", "could not load settings")
//!     .with_property("Line", 12)
//!     .with_cause(ErrorRecord::new("IoError", "file not found"));
//!
//! let report = undertow::format_plain_text(&err);
//! assert!(report.contains("InnerException: IoError"));
//! ```

use std::borrow::Cow;
use std::fmt;

use crate::node::{AccessError, ErrorNode, Member, ScriptFrames, TypeTag, Typed, Value, WrapperKind};

/// Message used by [`ErrorRecord::invocation`].
pub const INVOCATION_MESSAGE: &str = "Exception has been thrown by the target of an invocation.";

/// Message used by [`ErrorRecord::aggregate`].
pub const AGGREGATE_MESSAGE: &str = "One or more errors occurred.";

enum RecordValue {
    Null,
    Value(Box<dyn fmt::Display + Send + Sync>),
    Failing(AccessError),
}

impl fmt::Debug for RecordValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordValue::Null => f.write_str("Null"),
            RecordValue::Value(v) => f.debug_tuple("Value").field(&Value::new(v)).finish(),
            RecordValue::Failing(e) => f.debug_tuple("Failing").field(e).finish(),
        }
    }
}

#[derive(Debug)]
struct RecordMember {
    name: Cow<'static, str>,
    tag: TypeTag,
    value: RecordValue,
}

/// One frame of an attached script stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptFrame {
    /// Function name, if known.
    pub function: Option<String>,
    /// Chunk (script file) the frame belongs to.
    pub chunk: String,
    /// Line within the chunk.
    pub line: u32,
    /// Whether the frame belongs to the host runtime rather than a script.
    pub host: bool,
}

impl ScriptFrame {
    /// Create a script frame.
    pub fn new(function: Option<&str>, chunk: impl Into<String>, line: u32) -> Self {
        Self {
            function: function.map(str::to_string),
            chunk: chunk.into(),
            line,
            host: false,
        }
    }

    /// Create a frame that belongs to the host runtime.
    pub fn host(function: &str) -> Self {
        Self {
            function: Some(function.to_string()),
            chunk: String::new(),
            line: 0,
            host: true,
        }
    }
}

impl fmt::Display for ScriptFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let function = self.function.as_deref().unwrap_or("<anonymous>");
        if self.host {
            write!(f, "   at {} (host)", function)
        } else {
            write!(f, "   at {} in {}:line {}", function, self.chunk, self.line)
        }
    }
}

impl ScriptFrames for Vec<ScriptFrame> {
    fn count(&self) -> usize {
        self.len()
    }

    fn format_frames(&self, skip_host_frames: bool) -> String {
        self.iter()
            .filter(|frame| !(skip_host_frames && frame.host))
            .map(ScriptFrame::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// An owned error value with members, causes and stack information.
#[derive(Debug)]
pub struct ErrorRecord {
    type_name: Cow<'static, str>,
    wrapper: WrapperKind,
    members: Vec<RecordMember>,
    cause: Option<Box<ErrorRecord>>,
    loader_causes: Option<Vec<ErrorRecord>>,
    aggregate_causes: Vec<ErrorRecord>,
    stack_trace: Option<String>,
    script_frames: Vec<ScriptFrame>,
}

impl ErrorRecord {
    /// Create an error with a `Message` member.
    ///
    /// # Examples
    ///
    /// ```
    /// use undertow::{ErrorNode, ErrorRecord};
    ///
    /// let err = ErrorRecord::new("ParseError", "unexpected token");
    /// assert_eq!(err.type_name(), "ParseError");
    /// assert_eq!(err.describe()[0].name(), "Message");
    /// ```
    pub fn new(type_name: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
        Self::bare(type_name).with_text("Message", message)
    }

    /// Create an error without any members.
    pub fn bare(type_name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            type_name: type_name.into(),
            wrapper: WrapperKind::Plain,
            members: Vec::new(),
            cause: None,
            loader_causes: None,
            aggregate_causes: Vec::new(),
            stack_trace: None,
            script_frames: Vec::new(),
        }
    }

    /// Create an invocation wrapper around `inner`.
    ///
    /// Invocation wrappers carry no information of their own and are always
    /// skipped by [`unwrap_root_cause`](crate::unwrap::unwrap_root_cause).
    pub fn invocation(type_name: impl Into<Cow<'static, str>>, inner: ErrorRecord) -> Self {
        let mut record = Self::new(type_name, INVOCATION_MESSAGE).with_cause(inner);
        record.wrapper = WrapperKind::Invocation;
        record
    }

    /// Create an aggregate wrapper holding several causes.
    ///
    /// The first cause is reported as the direct cause; the full list is
    /// summarized in an `InnerExceptions` member.
    pub fn aggregate(type_name: impl Into<Cow<'static, str>>, causes: impl IntoIterator<Item = ErrorRecord>) -> Self {
        let causes: Vec<ErrorRecord> = causes.into_iter().collect();
        let summary = causes
            .iter()
            .map(|c| c.type_name.as_ref())
            .collect::<Vec<_>>()
            .join(", ");
        let mut record = Self::new(type_name, AGGREGATE_MESSAGE).with_member(
            "InnerExceptions",
            TypeTag::other("Vec<ErrorRecord>"),
            format!("[{}]", summary),
        );
        record.wrapper = WrapperKind::Aggregate;
        record.aggregate_causes = causes;
        record
    }

    /// Add a member whose type tag is inferred from `T`.
    pub fn with_property<T>(self, name: impl Into<Cow<'static, str>>, value: T) -> Self
    where
        T: Typed + fmt::Display + Send + Sync + 'static,
    {
        self.with_member(name, T::type_tag(), value)
    }

    /// Add a text member.
    pub fn with_text(self, name: impl Into<Cow<'static, str>>, value: impl Into<String>) -> Self {
        self.with_member(name, TypeTag::Text, value.into())
    }

    /// Add a member with an explicit type tag.
    pub fn with_member<T>(mut self, name: impl Into<Cow<'static, str>>, tag: TypeTag, value: T) -> Self
    where
        T: fmt::Display + Send + Sync + 'static,
    {
        self.members.push(RecordMember {
            name: name.into(),
            tag,
            value: RecordValue::Value(Box::new(value)),
        });
        self
    }

    /// Add a member whose value is absent.
    pub fn with_null(mut self, name: impl Into<Cow<'static, str>>, tag: TypeTag) -> Self {
        self.members.push(RecordMember {
            name: name.into(),
            tag,
            value: RecordValue::Null,
        });
        self
    }

    /// Add a member whose accessor fails with `error`.
    pub fn with_failing(mut self, name: impl Into<Cow<'static, str>>, tag: TypeTag, error: AccessError) -> Self {
        self.members.push(RecordMember {
            name: name.into(),
            tag,
            value: RecordValue::Failing(error),
        });
        self
    }

    /// Set the direct cause.
    pub fn with_cause(mut self, cause: ErrorRecord) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Set the loader-style sibling causes.
    pub fn with_loader_causes(mut self, causes: impl IntoIterator<Item = ErrorRecord>) -> Self {
        self.loader_causes = Some(causes.into_iter().collect());
        self
    }

    /// Set the platform stack trace.
    pub fn with_stack_trace(mut self, trace: impl Into<String>) -> Self {
        self.stack_trace = Some(trace.into());
        self
    }

    /// Attach script stack frames.
    pub fn with_script_frames(mut self, frames: impl IntoIterator<Item = ScriptFrame>) -> Self {
        self.script_frames.extend(frames);
        self
    }
}

impl ErrorNode for ErrorRecord {
    fn type_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.type_name)
    }

    fn describe(&self) -> Vec<Member<'_>> {
        self.members
            .iter()
            .map(|member| {
                let name = Cow::Borrowed(member.name.as_ref());
                match &member.value {
                    RecordValue::Null => Member::null(name, member.tag.clone()),
                    RecordValue::Value(value) => Member::value(name, member.tag.clone(), value),
                    RecordValue::Failing(error) => {
                        let error = error.clone();
                        Member::new(name, member.tag.clone(), move || Err(error))
                    }
                }
            })
            .collect()
    }

    fn cause(&self) -> Option<&dyn ErrorNode> {
        self.cause
            .as_deref()
            .or_else(|| self.aggregate_causes.first())
            .map(|cause| cause as &dyn ErrorNode)
    }

    fn loader_causes(&self) -> Option<Vec<&dyn ErrorNode>> {
        self.loader_causes
            .as_ref()
            .map(|causes| causes.iter().map(|c| c as &dyn ErrorNode).collect())
    }

    fn stack_trace(&self) -> Result<Option<String>, AccessError> {
        Ok(self.stack_trace.clone())
    }

    fn script_frames(&self) -> Option<&dyn ScriptFrames> {
        if self.script_frames.is_empty() {
            None
        } else {
            Some(&self.script_frames as &dyn ScriptFrames)
        }
    }

    fn wrapper_kind(&self) -> WrapperKind {
        self.wrapper
    }

    fn aggregate_causes(&self) -> Vec<&dyn ErrorNode> {
        self.aggregate_causes.iter().map(|c| c as &dyn ErrorNode).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(record: &ErrorRecord) -> Vec<(String, Result<Option<String>, AccessError>)> {
        record
            .describe()
            .into_iter()
            .map(|member| {
                let (name, _, value) = member.evaluate();
                let value = value.and_then(|v| v.map(|v| v.to_text()).transpose());
                (name.into_owned(), value)
            })
            .collect()
    }

    #[test]
    fn test_members_keep_insertion_order() {
        let record = ErrorRecord::new("E", "boom")
            .with_property("Code", 5)
            .with_null("Path", TypeTag::Text);

        let members = texts(&record);
        assert_eq!(members.len(), 3);
        assert_eq!(members[0], ("Message".to_string(), Ok(Some("boom".to_string()))));
        assert_eq!(members[1], ("Code".to_string(), Ok(Some("5".to_string()))));
        assert_eq!(members[2], ("Path".to_string(), Ok(None)));
    }

    #[test]
    fn test_failing_member() {
        let record = ErrorRecord::bare("E").with_failing("Data", TypeTag::Text, AccessError::new("Io", "gone"));
        let members = texts(&record);
        assert_eq!(members[0].1, Err(AccessError::new("Io", "gone")));
    }

    #[test]
    fn test_aggregate_exposes_first_cause() {
        let record = ErrorRecord::aggregate(
            "AggregateError",
            vec![ErrorRecord::new("A", "a"), ErrorRecord::new("B", "b")],
        );

        assert_eq!(record.wrapper_kind(), WrapperKind::Aggregate);
        assert_eq!(record.aggregate_causes().len(), 2);
        assert_eq!(record.cause().map(|c| c.type_name().into_owned()), Some("A".to_string()));

        let members = texts(&record);
        assert_eq!(members[1], ("InnerExceptions".to_string(), Ok(Some("[A, B]".to_string()))));
    }

    #[test]
    fn test_invocation_wrapper() {
        let record = ErrorRecord::invocation("InvocationError", ErrorRecord::new("Inner", "x"));
        assert_eq!(record.wrapper_kind(), WrapperKind::Invocation);
        assert!(record.cause().is_some());
    }

    #[test]
    fn test_script_frames_absent_when_empty() {
        assert!(ErrorRecord::new("E", "m").script_frames().is_none());

        let record = ErrorRecord::new("E", "m").with_script_frames(vec![ScriptFrame::new(Some("main"), "init.lua", 3)]);
        let frames = record.script_frames().unwrap();
        assert_eq!(frames.count(), 1);
        assert_eq!(frames.format_frames(false), "   at main in init.lua:line 3");
    }

    #[test]
    fn test_format_frames_skips_host_frames() {
        let frames = vec![
            ScriptFrame::new(None, "a.lua", 1),
            ScriptFrame::host("Invoke"),
            ScriptFrame::new(Some("f"), "b.lua", 2),
        ];

        assert_eq!(frames.format_frames(false).lines().count(), 3);
        assert_eq!(
            frames.format_frames(true),
            "   at <anonymous> in a.lua:line 1\n   at f in b.lua:line 2"
        );
    }
}
