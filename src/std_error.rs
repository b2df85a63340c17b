//! Reporting `std::error::Error` chains
//!
//! [`StdErrorNode`] adapts any standard error, following its `source()` chain
//! as a sequence of direct causes. Standard errors only expose their
//! `Display` and `Debug` output, so each section lists a `Message` member,
//! and the root additionally carries the `Debug` rendering.
//!
//! # Examples
//!
//! ```
//! use std::io;
//! use undertow::report_std_error;
//!
//! let err = io::Error::new(io::ErrorKind::NotFound, "config.toml missing");
//! let report = report_std_error(&err);
//!
//! assert!(report.starts_with("-- io::Error "));
//! assert!(report.contains("'config.toml missing'"));
//! ```

use std::borrow::Cow;
use std::error::Error as StdError;

use crate::formatter::DEFAULT_MAX_SECTIONS;
use crate::node::{short_type_name, ErrorNode, Member, TypeTag, Value};

/// An [`ErrorNode`] view of a standard error and its sources.
#[derive(Debug)]
pub struct StdErrorNode<'a> {
    error: &'a (dyn StdError + 'static),
    type_name: Cow<'static, str>,
    root: bool,
    source: Option<Box<StdErrorNode<'a>>>,
}

impl<'a> StdErrorNode<'a> {
    /// Adapt an error of a known type; the section title uses its type name.
    ///
    /// # Examples
    ///
    /// ```
    /// use undertow::std_error::StdErrorNode;
    /// use undertow::ErrorNode;
    ///
    /// let parse = "x".parse::<u8>().unwrap_err();
    /// assert_eq!(StdErrorNode::of(&parse).type_name(), "ParseIntError");
    /// ```
    pub fn of<E: StdError + 'static>(error: &'a E) -> Self {
        let type_name = match recognize(error) {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(short_type_name(std::any::type_name::<E>()).to_string()),
        };
        Self::named(error, type_name)
    }

    /// Adapt a type-erased error; the section title is derived from the few
    /// standard error types that can be recognized, `Error` otherwise.
    pub fn new(error: &'a (dyn StdError + 'static)) -> Self {
        Self::named(error, recognize(error).unwrap_or("Error"))
    }

    /// Adapt an error with an explicit section title.
    pub fn named(error: &'a (dyn StdError + 'static), type_name: impl Into<Cow<'static, str>>) -> Self {
        let mut sources = Vec::new();
        let mut cursor = error.source();
        while let Some(source) = cursor {
            if sources.len() >= DEFAULT_MAX_SECTIONS {
                break;
            }
            sources.push(source);
            cursor = source.source();
        }

        let mut chain = None;
        for source in sources.into_iter().rev() {
            chain = Some(Box::new(StdErrorNode {
                error: source,
                type_name: Cow::Borrowed(recognize(source).unwrap_or("Error")),
                root: false,
                source: chain,
            }));
        }

        StdErrorNode {
            error,
            type_name: type_name.into(),
            root: true,
            source: chain,
        }
    }

    /// The adapted error.
    pub fn error(&self) -> &'a (dyn StdError + 'static) {
        self.error
    }
}

/// Name of the standard library error types we can identify at runtime.
fn recognize(error: &(dyn StdError + 'static)) -> Option<&'static str> {
    macro_rules! recognize {
        ($($ty:ty => $name:literal),* $(,)?) => {
            $(
                if error.is::<$ty>() {
                    return Some($name);
                }
            )*
        };
    }

    recognize! {
        std::io::Error => "io::Error",
        std::fmt::Error => "fmt::Error",
        std::num::ParseIntError => "ParseIntError",
        std::num::ParseFloatError => "ParseFloatError",
        std::num::TryFromIntError => "TryFromIntError",
        std::str::Utf8Error => "Utf8Error",
        std::string::FromUtf8Error => "FromUtf8Error",
        std::str::ParseBoolError => "ParseBoolError",
        std::char::ParseCharError => "ParseCharError",
        std::net::AddrParseError => "AddrParseError",
    }

    None
}

impl ErrorNode for StdErrorNode<'_> {
    fn type_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.type_name)
    }

    fn describe(&self) -> Vec<Member<'_>> {
        let error = self.error;
        let mut members = vec![Member::value("Message", TypeTag::Text, error)];
        if self.root {
            members.push(Member::new("Debug", TypeTag::Text, move || {
                Ok(Some(Value::new(format!("{:?}", error))))
            }));
        }
        members
    }

    fn cause(&self) -> Option<&dyn ErrorNode> {
        self.source.as_deref().map(|source| source as &dyn ErrorNode)
    }
}
