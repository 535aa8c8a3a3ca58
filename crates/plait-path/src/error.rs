//! Path construction errors.

use thiserror::Error;

use crate::kind::{AnchorKind, ObjectKind};
use crate::name::NameError;

/// Errors from parsing or re-tagging a path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The input string was empty.
    #[error("empty path")]
    Empty,

    /// A component failed name validation.
    #[error(transparent)]
    InvalidName(#[from] NameError),

    /// The head of the path does not match the requested anchor.
    #[error("anchor mismatch: expected {expected} path")]
    AnchorMismatch { expected: AnchorKind },

    /// The tail of the path does not match the requested object.
    #[error("object mismatch: expected {expected} path")]
    ObjectMismatch { expected: ObjectKind },

    /// `/` appeared somewhere other than the head.
    #[error("'/' may only appear at the start of a path")]
    RootNotFirst,

    /// A file-shaped item appeared before the end of the path.
    #[error("only the final component of a path may be a file")]
    FileBeforeEnd,
}
