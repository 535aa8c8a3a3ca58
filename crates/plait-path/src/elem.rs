//! The string/term bridge: a path string as a flat list of elements.
//!
//! `parse_elems` is the single tokenizer behind every string constructor.
//! The four typed builders in [`crate::path`] turn an element list into a
//! path term and reject lists whose head or tail does not fit the
//! requested anchor and object.

use crate::error::PathError;
use crate::name::Name;

/// One element of a split path string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Elem {
    /// The leading `/` of an absolute path.
    Root,
    /// A validated component.
    Name(Name),
    /// `.`, or an empty segment such as the middle of `a//b`.
    Dot,
    /// `..`
    Dotdot,
}

/// Split a POSIX path string into elements.
///
/// The result is never empty. A leading `/` becomes [`Elem::Root`]; empty
/// segments and `.` both become [`Elem::Dot`].
pub fn parse_elems(input: &str) -> Result<Vec<Elem>, PathError> {
    if input.is_empty() {
        return Err(PathError::Empty);
    }
    if input == "/" {
        return Ok(vec![Elem::Root]);
    }

    let (rest, absolute) = match input.strip_prefix('/') {
        Some(rest) => (rest, true),
        None => (input, false),
    };

    let mut elems = Vec::new();
    if absolute {
        elems.push(Elem::Root);
    }
    for piece in rest.split('/') {
        elems.push(match piece {
            "" | "." => Elem::Dot,
            ".." => Elem::Dotdot,
            other => Elem::Name(Name::new(other)?),
        });
    }
    Ok(elems)
}
