//! The capability set an error exposes to the report engine
//!
//! The engine never reflects over arbitrary types. Instead, every error kind
//! that wants to be reported implements [`ErrorNode`], which answers a small set
//! of questions: what is your type name, which members do you have, what caused
//! you, and which stack information do you carry.
//!
//! Member values are read lazily through an accessor closure, so a member
//! whose value is expensive (or broken) costs nothing until the report needs
//! it, and a failing accessor only affects its own line in the report.
//!
//! # Examples
//!
//! ```
//! use std::borrow::Cow;
//! use undertow::node::{ErrorNode, Member, TypeTag};
//!
//! struct Timeout {
//!     millis: u64,
//! }
//!
//! impl ErrorNode for Timeout {
//!     fn type_name(&self) -> Cow<'_, str> {
//!         Cow::Borrowed("Timeout")
//!     }
//!
//!     fn describe(&self) -> Vec<Member<'_>> {
//!         vec![
//!             Member::value("Message", TypeTag::Text, "operation timed out"),
//!             Member::value("Millis", TypeTag::U64, self.millis),
//!         ]
//!     }
//! }
//!
//! let report = undertow::format_plain_text(&Timeout { millis: 250 });
//! assert!(report.contains("'operation timed out'"));
//! ```

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

/// Declared semantic type of a member.
///
/// The plain-text renderer picks its rules from the declared type, not from
/// the runtime value: text gets quoting and escaping, the primitive whitelist
/// renders bare, and everything else is prefixed with its type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// Text value.
    Text,
    /// Signed 8-bit integer.
    I8,
    /// Signed 16-bit integer.
    I16,
    /// Signed 32-bit integer.
    I32,
    /// Signed 64-bit integer.
    I64,
    /// Signed 128-bit integer.
    I128,
    /// Pointer-sized signed integer.
    Isize,
    /// Unsigned 8-bit integer.
    U8,
    /// Unsigned 16-bit integer.
    U16,
    /// Unsigned 32-bit integer.
    U32,
    /// Unsigned 64-bit integer.
    U64,
    /// Unsigned 128-bit integer.
    U128,
    /// Pointer-sized unsigned integer.
    Usize,
    /// Decimal number in its canonical textual form.
    Decimal,
    /// 32-bit float.
    F32,
    /// 64-bit float.
    F64,
    /// Date and/or time in its canonical textual form.
    DateTime,
    /// Any other type, carrying the name shown in the report.
    Other(Cow<'static, str>),
}

impl TypeTag {
    /// Create a tag for a type outside the primitive whitelist.
    pub fn other(name: impl Into<Cow<'static, str>>) -> Self {
        TypeTag::Other(name.into())
    }

    /// Returns true for [`TypeTag::Text`].
    pub fn is_text(&self) -> bool {
        matches!(self, TypeTag::Text)
    }

    /// Returns true for the numeric and temporal kinds that render without
    /// decoration.
    pub fn is_primitive(&self) -> bool {
        !matches!(self, TypeTag::Text | TypeTag::Other(_))
    }

    /// Name used when the type has to be spelled out.
    pub fn name(&self) -> &str {
        match self {
            TypeTag::Text => "String",
            TypeTag::I8 => "i8",
            TypeTag::I16 => "i16",
            TypeTag::I32 => "i32",
            TypeTag::I64 => "i64",
            TypeTag::I128 => "i128",
            TypeTag::Isize => "isize",
            TypeTag::U8 => "u8",
            TypeTag::U16 => "u16",
            TypeTag::U32 => "u32",
            TypeTag::U64 => "u64",
            TypeTag::U128 => "u128",
            TypeTag::Usize => "usize",
            TypeTag::Decimal => "Decimal",
            TypeTag::F32 => "f32",
            TypeTag::F64 => "f64",
            TypeTag::DateTime => "DateTime",
            TypeTag::Other(name) => name,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for TypeTag {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Types whose [`TypeTag`] is known statically.
pub trait Typed {
    /// The declared semantic type for values of this type.
    fn type_tag() -> TypeTag;
}

macro_rules! impl_typed {
    ($($ty:ty => $tag:expr),* $(,)?) => {
        $(
            impl Typed for $ty {
                fn type_tag() -> TypeTag {
                    $tag
                }
            }
        )*
    };
}

impl_typed! {
    String => TypeTag::Text,
    &str => TypeTag::Text,
    i8 => TypeTag::I8,
    i16 => TypeTag::I16,
    i32 => TypeTag::I32,
    i64 => TypeTag::I64,
    i128 => TypeTag::I128,
    isize => TypeTag::Isize,
    u8 => TypeTag::U8,
    u16 => TypeTag::U16,
    u32 => TypeTag::U32,
    u64 => TypeTag::U64,
    u128 => TypeTag::U128,
    usize => TypeTag::Usize,
    f32 => TypeTag::F32,
    f64 => TypeTag::F64,
    bool => TypeTag::Other(Cow::Borrowed("bool")),
    char => TypeTag::Other(Cow::Borrowed("char")),
}

/// Failure raised while reading a single member.
///
/// Rendered inline as `Error[<kind>] = '<message>'`; it never aborts the
/// surrounding section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessError {
    kind: Cow<'static, str>,
    message: String,
}

impl AccessError {
    /// Create an access error from a kind and a message.
    ///
    /// # Examples
    ///
    /// ```
    /// use undertow::node::AccessError;
    ///
    /// let err = AccessError::new("NotSupported", "value is write-only");
    /// assert_eq!(err.kind(), "NotSupported");
    /// assert_eq!(err.message(), "value is write-only");
    /// ```
    pub fn new(kind: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Create an access error from any error value, using the short name of
    /// its type as the kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use undertow::node::AccessError;
    ///
    /// let parse = "x".parse::<i32>().unwrap_err();
    /// let err = AccessError::from_error(&parse);
    /// assert_eq!(err.kind(), "ParseIntError");
    /// ```
    pub fn from_error<E: std::error::Error>(error: &E) -> Self {
        Self::new(
            short_type_name(std::any::type_name::<E>()).to_string(),
            error.to_string(),
        )
    }

    /// Convert a caught panic payload into an access error.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "accessor panicked".to_string()
        };
        Self::new("panic", message)
    }

    /// The error kind, typically a type name.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for AccessError {}

/// A member value, viewed through its `Display` implementation.
///
/// The `Display` output is the canonical ("invariant") string form the
/// renderers work with.
pub struct Value<'a>(Box<dyn fmt::Display + 'a>);

impl<'a> Value<'a> {
    /// Wrap any displayable value.
    pub fn new(value: impl fmt::Display + 'a) -> Self {
        Value(Box::new(value))
    }

    /// Produce the string form. A `Display` impl that returns an error or
    /// panics is reported as an access error.
    pub fn to_text(&self) -> Result<String, AccessError> {
        use fmt::Write as _;

        let mut out = String::new();
        let written = panic::catch_unwind(AssertUnwindSafe(|| write!(out, "{}", self.0)))
            .map_err(AccessError::from_panic)?;
        written.map_err(|_| {
            AccessError::new(
                "fmt::Error",
                "an error occurred when formatting an argument",
            )
        })?;
        Ok(out)
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_text() {
            Ok(text) => f.debug_tuple("Value").field(&text).finish(),
            Err(_) => f.write_str("Value(<unformattable>)"),
        }
    }
}

type Accessor<'a> = Box<dyn FnOnce() -> Result<Option<Value<'a>>, AccessError> + 'a>;

/// One named member of an error, read on demand.
pub struct Member<'a> {
    name: Cow<'a, str>,
    tag: TypeTag,
    accessor: Accessor<'a>,
}

impl<'a> Member<'a> {
    /// Create a member whose value is produced by `accessor` when the report
    /// reaches it. `Ok(None)` means the value is absent.
    pub fn new<F>(name: impl Into<Cow<'a, str>>, tag: TypeTag, accessor: F) -> Self
    where
        F: FnOnce() -> Result<Option<Value<'a>>, AccessError> + 'a,
    {
        Self {
            name: name.into(),
            tag,
            accessor: Box::new(accessor),
        }
    }

    /// Create a member with a value that is already known.
    pub fn value(name: impl Into<Cow<'a, str>>, tag: TypeTag, value: impl fmt::Display + 'a) -> Self {
        Self::new(name, tag, move || Ok(Some(Value::new(value))))
    }

    /// Create a member whose value is absent.
    pub fn null(name: impl Into<Cow<'a, str>>, tag: TypeTag) -> Self {
        Self::new(name, tag, || Ok(None))
    }

    /// Create a member whose value is absent when `value` is `None`.
    pub fn optional<T>(name: impl Into<Cow<'a, str>>, tag: TypeTag, value: Option<T>) -> Self
    where
        T: fmt::Display + 'a,
    {
        Self::new(name, tag, move || Ok(value.map(Value::new)))
    }

    /// The member name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared type of the member.
    pub fn tag(&self) -> &TypeTag {
        &self.tag
    }

    /// Run the accessor, containing both returned errors and panics.
    pub fn evaluate(self) -> (Cow<'a, str>, TypeTag, Result<Option<Value<'a>>, AccessError>) {
        let value = contain(self.accessor);
        (self.name, self.tag, value)
    }
}

impl fmt::Debug for Member<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .finish_non_exhaustive()
    }
}

/// Evaluate an accessor, turning a panic into an [`AccessError`].
pub(crate) fn contain<'a, F>(accessor: F) -> Result<Option<Value<'a>>, AccessError>
where
    F: FnOnce() -> Result<Option<Value<'a>>, AccessError>,
{
    panic::catch_unwind(AssertUnwindSafe(accessor)).unwrap_or_else(|payload| Err(AccessError::from_panic(payload)))
}

/// How an error participates in root-cause unwrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapperKind {
    /// An ordinary error.
    #[default]
    Plain,
    /// A wrapper that only records that an invocation failed; it always
    /// unwraps to its direct cause.
    Invocation,
    /// A collection of causes; it unwraps only when it holds exactly one.
    Aggregate,
}

/// Out-of-band stack frames attached to an error, for example frames from an
/// embedded script runtime.
pub trait ScriptFrames {
    /// Number of frames.
    fn count(&self) -> usize;

    /// Render the frames as text, optionally leaving out frames that belong
    /// to the host runtime.
    fn format_frames(&self, skip_host_frames: bool) -> String;
}

/// An error value the report engine can walk.
///
/// Only [`type_name`](ErrorNode::type_name) and
/// [`describe`](ErrorNode::describe) are required. The remaining methods
/// default to "nothing there".
pub trait ErrorNode {
    /// Name shown in the section title.
    fn type_name(&self) -> Cow<'_, str>;

    /// Ordered members of this error. Must not fail; individual accessors
    /// may.
    ///
    /// Stack trace, direct cause and loader causes are reported through their
    /// own methods and should not be listed here.
    fn describe(&self) -> Vec<Member<'_>>;

    /// The single error that caused this one.
    fn cause(&self) -> Option<&dyn ErrorNode> {
        None
    }

    /// Several independent causes at the same level, reported in index order.
    fn loader_causes(&self) -> Option<Vec<&dyn ErrorNode>> {
        None
    }

    /// Platform stack trace, if one was captured.
    fn stack_trace(&self) -> Result<Option<String>, AccessError> {
        Ok(None)
    }

    /// Attached script stack frames.
    fn script_frames(&self) -> Option<&dyn ScriptFrames> {
        None
    }

    /// Wrapper classification used by [`unwrap_root_cause`](crate::unwrap::unwrap_root_cause).
    fn wrapper_kind(&self) -> WrapperKind {
        WrapperKind::Plain
    }

    /// Causes held by an aggregate wrapper.
    fn aggregate_causes(&self) -> Vec<&dyn ErrorNode> {
        Vec::new()
    }
}

/// Strip module paths from a type name, keeping generic arguments.
pub(crate) fn short_type_name(full: &str) -> &str {
    let head = full.find('<').map_or(full, |idx| &full[..idx]);
    match head.rfind("::") {
        Some(idx) => &full[idx + 2..],
        None => full,
    }
}

/// Identity of a node for revisit detection. Zero-sized nodes have no
/// stable address and yield `None`.
pub(crate) fn node_identity(node: &dyn ErrorNode) -> Option<usize> {
    if std::mem::size_of_val(node) == 0 {
        None
    } else {
        Some(node as *const dyn ErrorNode as *const () as usize)
    }
}
