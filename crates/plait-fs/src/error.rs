//! Driver errors, tagged with the source location that raised them.

use std::io;
use std::panic::Location;

use thiserror::Error;

/// Result type for the filesystem drivers.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from the filesystem drivers.
///
/// Every variant carries the `file:line` that constructed it, so a failure
/// deep in a recursive walk still points at the driver step that raised it.
#[derive(Debug, Error)]
pub enum Error {
    /// A walk was started from a path that does not exist.
    #[error("{path}: not found ({file}:{line})")]
    NotFound {
        path: String,
        file: &'static str,
        line: u32,
    },

    /// An underlying filesystem call failed.
    #[error("{context} ({file}:{line})")]
    Io {
        context: String,
        #[source]
        source: io::Error,
        file: &'static str,
        line: u32,
    },

    /// A directory entry whose name the path model rejects.
    #[error("invalid entry {name:?} in {dir} ({file}:{line})")]
    InvalidEntry {
        name: String,
        dir: String,
        file: &'static str,
        line: u32,
    },

    /// Any other failure, including ones raised by fold callbacks.
    #[error("{message} ({file}:{line})")]
    Other {
        message: String,
        file: &'static str,
        line: u32,
    },
}

impl Error {
    #[track_caller]
    pub(crate) fn not_found(path: impl Into<String>) -> Self {
        let loc = Location::caller();
        Error::NotFound {
            path: path.into(),
            file: loc.file(),
            line: loc.line(),
        }
    }

    #[track_caller]
    pub(crate) fn io(context: impl Into<String>, source: io::Error) -> Self {
        let loc = Location::caller();
        Error::Io {
            context: context.into(),
            source,
            file: loc.file(),
            line: loc.line(),
        }
    }

    #[track_caller]
    pub(crate) fn invalid_entry(name: impl Into<String>, dir: impl Into<String>) -> Self {
        let loc = Location::caller();
        Error::InvalidEntry {
            name: name.into(),
            dir: dir.into(),
            file: loc.file(),
            line: loc.line(),
        }
    }

    /// Build a free-form error, for fold callbacks that need to abort a
    /// walk with their own message.
    #[track_caller]
    pub fn other(message: impl Into<String>) -> Self {
        let loc = Location::caller();
        Error::Other {
            message: message.into(),
            file: loc.file(),
            line: loc.line(),
        }
    }
}
