//! Skip wrapper layers that add no diagnostic value
//!
//! Some errors exist only to carry another error: an invocation wrapper says
//! nothing beyond "the call failed", and an aggregate holding a single cause
//! is that cause in disguise. [`unwrap_root_cause`] peels those layers off.
//!
//! # Examples
//!
//! ```
//! use undertow::unwrap::unwrap_root_cause;
//! use undertow::{ErrorNode, ErrorRecord};
//!
//! let err = ErrorRecord::invocation(
//!     "InvocationError",
//!     ErrorRecord::aggregate("AggregateError", vec![ErrorRecord::new("IoError", "disk full")]),
//! );
//!
//! assert_eq!(unwrap_root_cause(&err).type_name(), "IoError");
//! ```

use crate::formatter::DEFAULT_MAX_SECTIONS;
use crate::node::{ErrorNode, WrapperKind};

/// Follow invocation wrappers and single-cause aggregates down to the first
/// error that is neither.
///
/// An aggregate with zero or several causes is a genuine branch point and is
/// returned as-is, as is an invocation wrapper that has no cause. Unwrapping
/// stops after [`DEFAULT_MAX_SECTIONS`] layers.
pub fn unwrap_root_cause<'a>(error: &'a dyn ErrorNode) -> &'a dyn ErrorNode {
    let mut current = error;
    for _ in 0..DEFAULT_MAX_SECTIONS {
        let next = match current.wrapper_kind() {
            WrapperKind::Invocation => current.cause(),
            WrapperKind::Aggregate => {
                let mut causes = current.aggregate_causes();
                if causes.len() == 1 {
                    causes.pop()
                } else {
                    None
                }
            }
            WrapperKind::Plain => None,
        };

        match next {
            Some(inner) => current = inner,
            None => return current,
        }
    }

    #[cfg(feature = "tracing")]
    tracing::warn!(limit = DEFAULT_MAX_SECTIONS, "stopped unwrapping wrapper errors at limit");
    current
}
