//! Error-chain traversal
//!
//! [`ChainFormatter`] walks an error and all of its causes and reports each
//! one to an [`OutputSink`] as a section. The walk is iterative: pending
//! causes live on an explicit stack, so arbitrarily long chains never grow the
//! call stack.
//!
//! # Order of sections
//!
//! Sections appear in the order a reader would follow the chain: the root
//! first, then its causes depth-first. The direct cause comes first, followed
//! by loader-style siblings in their original index order, each followed by
//! its own causes.
//!
//! # Shared and looping causes
//!
//! An error that loops back to one of its own ancestors fails the walk with
//! [`FormatError::Cycle`]. An error that is merely reachable twice, such as
//! the same instance listed in two loader slots, gets a section the second
//! time with a single `Duplicate` marker instead of its members and causes.
//!
//! # Per-section content
//!
//! 1. every member from [`ErrorNode::describe`], in order
//! 2. `ScriptStackTrace`, when script frames are attached
//! 3. `StackTrace`
//!
//! A member whose accessor fails or panics is rendered as an inline error
//! marker; the rest of the section is unaffected.
//!
//! # Example
//!
//! ```rust
//! use undertow::sink::plain::PlainTextSink;
//! use undertow::{ChainFormatter, ErrorRecord};
//!
//! let err = ErrorRecord::new("E1", "outer")
//!     .with_property("Code", 5)
//!     .with_cause(ErrorRecord::new("E2", "inner").with_text("Detail", "line1\nline2"));
//!
//! let report = ChainFormatter::new().format(&err, PlainTextSink::new()).unwrap();
//!
//! assert!(report.starts_with("-- E1 "));
//! assert!(report.contains("-- InnerException: E2 "));
//! assert!(report.contains("Detail:\n    line1\n    line2\n"));
//! ```

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

use crate::node::{contain, node_identity, AccessError, ErrorNode, TypeTag, Value};
use crate::sink::{OutputSink, PropertyValue, RenderedProperty};

/// Default cap on the number of sections in one report.
pub const DEFAULT_MAX_SECTIONS: usize = 1024;

/// Name of the stack trace property.
pub const STACK_TRACE: &str = "StackTrace";

/// Name of the attached script stack property.
pub const SCRIPT_STACK_TRACE: &str = "ScriptStackTrace";

/// Name of the marker property in the section of an already reported error.
pub const DUPLICATE_MEMBER: &str = "Duplicate";

/// Label prefix of a direct-cause section.
pub const INNER_EXCEPTION_LABEL: &str = "InnerException: ";

/// Member names that are reported through dedicated channels and skipped if
/// a node also lists them among its members.
pub const RESERVED_MEMBERS: [&str; 3] = [STACK_TRACE, "InnerException", "LoaderExceptions"];

/// Error returned by [`ChainFormatter::format`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError<E> {
    /// The output sink failed.
    Sink(E),
    /// An error is its own cause, directly or through other errors.
    Cycle {
        /// Type name of the error reached again.
        type_name: String,
    },
    /// The chain has more sections than the configured limit.
    ChainTooDeep {
        /// The configured section limit.
        limit: usize,
    },
}

impl<E> FormatError<E> {
    /// Returns true if the sink failed.
    pub fn is_sink(&self) -> bool {
        matches!(self, Self::Sink(_))
    }

    /// Returns true if the chain was cut short by the cycle or depth guard.
    pub fn is_malformed_chain(&self) -> bool {
        matches!(self, Self::Cycle { .. } | Self::ChainTooDeep { .. })
    }
}

impl<E: fmt::Display> fmt::Display for FormatError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sink(e) => write!(f, "output sink failed: {}", e),
            Self::Cycle { type_name } => {
                write!(f, "error chain loops: {} is its own cause", type_name)
            }
            Self::ChainTooDeep { limit } => {
                write!(f, "error chain too deep: more than {} sections", limit)
            }
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for FormatError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sink(e) => Some(e),
            _ => None,
        }
    }
}

/// A cause waiting for its section.
struct PendingSection<'a> {
    label: Cow<'static, str>,
    node: &'a dyn ErrorNode,
    depth: usize,
}

/// Identity of a visited node. A cause stored at offset 0 of its wrapper
/// shares the wrapper's address, so the type name is part of the key.
type NodeKey = (usize, String);

/// Walks error chains and drives an [`OutputSink`].
///
/// The formatter itself only holds configuration, so one instance can format
/// any number of errors, from any number of threads.
///
/// # Examples
///
/// ```rust
/// use undertow::sink::plain::PlainTextSink;
/// use undertow::{ChainFormatter, ErrorRecord, FormatError};
///
/// let chain = ErrorRecord::new("A", "a")
///     .with_cause(ErrorRecord::new("B", "b").with_cause(ErrorRecord::new("C", "c")));
///
/// let formatter = ChainFormatter::new().with_max_sections(2);
/// let result = formatter.format(&chain, PlainTextSink::new());
/// assert_eq!(result, Err(FormatError::ChainTooDeep { limit: 2 }));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainFormatter {
    max_sections: usize,
}

impl Default for ChainFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainFormatter {
    /// Create a formatter with the default section limit.
    pub fn new() -> Self {
        Self {
            max_sections: DEFAULT_MAX_SECTIONS,
        }
    }

    /// Set the maximum number of sections one report may contain.
    ///
    /// A limit of zero is treated as one: the root is always reported.
    pub fn with_max_sections(mut self, limit: usize) -> Self {
        self.max_sections = limit.max(1);
        self
    }

    /// Get the section limit.
    pub fn max_sections(&self) -> usize {
        self.max_sections
    }

    /// Report `root` and every cause reachable from it into `sink`.
    ///
    /// Fails if the sink fails, if an error loops back to one of its own
    /// ancestors, or if the chain exceeds the section limit. Failing member
    /// accessors never fail the report.
    pub fn format<'a, S>(&self, root: &'a dyn ErrorNode, mut sink: S) -> Result<S::Artifact, FormatError<S::Error>>
    where
        S: OutputSink,
    {
        let mut pending: Vec<PendingSection<'a>> = Vec::new();
        let mut visited: HashSet<NodeKey> = HashSet::new();
        // Keys of the section being written and its ancestors, by depth.
        let mut ancestors: Vec<Option<NodeKey>> = Vec::new();
        let mut sections = 1;

        let root_name = root.type_name().into_owned();
        let root_key = node_identity(root).map(|id| (id, root_name.clone()));
        if let Some(key) = &root_key {
            visited.insert(key.clone());
        }
        open(&mut sink, true, &root_name)?;
        emit_section_body(root, &mut sink)?;
        ancestors.push(root_key);
        queue_causes(root, 1, &mut pending);

        while let Some(next) = pending.pop() {
            if sections >= self.max_sections {
                #[cfg(feature = "tracing")]
                tracing::warn!(limit = self.max_sections, "error chain exceeds section limit");
                return Err(FormatError::ChainTooDeep {
                    limit: self.max_sections,
                });
            }

            let type_name = next.node.type_name().into_owned();
            let title = format!("{}{}", next.label, type_name);
            let key = node_identity(next.node).map(|id| (id, type_name.clone()));
            ancestors.truncate(next.depth);

            if let Some(key) = &key {
                if ancestors.iter().flatten().any(|ancestor| ancestor == key) {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(%type_name, "error chain loops back to an ancestor");
                    return Err(FormatError::Cycle { type_name });
                }

                if !visited.insert(key.clone()) {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(%type_name, "error already reported, writing duplicate marker");
                    open(&mut sink, false, &title)?;
                    sections += 1;
                    let marker = AccessError::new(
                        "AlreadyReported",
                        format!("{} appears earlier in this report", type_name),
                    );
                    let marker = PropertyValue::Failed(marker);
                    emit(&mut sink, RenderedProperty::new(DUPLICATE_MEMBER, TypeTag::Text, marker))?;
                    continue;
                }
            }

            open(&mut sink, false, &title)?;
            sections += 1;
            emit_section_body(next.node, &mut sink)?;
            ancestors.push(key);
            queue_causes(next.node, next.depth + 1, &mut pending);
        }

        sink.finalize().map_err(FormatError::Sink)
    }
}

fn open<S: OutputSink>(sink: &mut S, first: bool, title: &str) -> Result<(), FormatError<S::Error>> {
    #[cfg(feature = "tracing")]
    tracing::trace!(first, title, "opening report section");
    sink.open_section(first, title).map_err(FormatError::Sink)
}

fn emit<S: OutputSink>(sink: &mut S, property: RenderedProperty<'_>) -> Result<(), FormatError<S::Error>> {
    sink.property(property).map_err(FormatError::Sink)
}

fn emit_section_body<S: OutputSink>(node: &dyn ErrorNode, sink: &mut S) -> Result<(), FormatError<S::Error>> {
    for member in node.describe() {
        if RESERVED_MEMBERS.iter().any(|reserved| *reserved == member.name()) {
            continue;
        }

        let (name, tag, value) = member.evaluate();
        #[cfg(feature = "tracing")]
        {
            if let Err(error) = &value {
                tracing::debug!(member = %name, %error, "member accessor failed");
            }
        }
        emit(sink, RenderedProperty::new(name, tag, value))?;
    }

    if let Some(frames) = node.script_frames() {
        if frames.count() > 0 {
            let value = contain(|| Ok(Some(Value::new(frames.format_frames(false)))));
            emit(sink, RenderedProperty::new(SCRIPT_STACK_TRACE, TypeTag::Text, value))?;
        }
    }

    let trace = contain(|| node.stack_trace().map(|trace| trace.map(Value::new)));
    emit(sink, RenderedProperty::new(STACK_TRACE, TypeTag::Text, trace))
}

/// Push the causes of `node` so that popping yields them in reading order:
/// the direct cause, then the loader causes by index.
fn queue_causes<'a>(node: &'a dyn ErrorNode, depth: usize, pending: &mut Vec<PendingSection<'a>>) {
    if let Some(loaders) = node.loader_causes() {
        for (index, loader) in loaders.into_iter().enumerate().rev() {
            pending.push(PendingSection {
                label: Cow::Owned(format!("LoaderException[{}]: ", index)),
                node: loader,
                depth,
            });
        }
    }

    if let Some(cause) = node.cause() {
        pending.push(PendingSection {
            label: Cow::Borrowed(INNER_EXCEPTION_LABEL),
            node: cause,
            depth,
        });
    }
}
