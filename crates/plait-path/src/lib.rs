//! plait-path: statically-kinded POSIX path terms and their algebra.
//!
//! This crate provides:
//!
//! - **Name**: a validated single path component
//! - **Elem**: the string/term bridge behind every parser
//! - **Term / Item**: the untyped recursive path body, including symlink
//!   items that carry their target as a nested path
//! - **Path**: the typed wrapper, tagged with anchor (absolute vs relative)
//!   and object (directory vs file), with concatenation, parent,
//!   normalization, link resolution and equivalence
//! - **Sexp**: the canonical serialized form
//!
//! This is a leaf crate with no async runtime and no I/O. The filesystem
//! drivers that interpret these terms against a real filesystem live in
//! `plait-fs`.

mod elem;
mod error;
mod kind;
mod name;
mod path;
mod sexp;
mod term;

#[cfg(test)]
mod proptests;

pub use elem::{parse_elems, Elem};
pub use error::PathError;
pub use kind::{Abs, Anchor, AnchorKind, Dir, File, Object, ObjectKind, Rel};
pub use name::{Name, NameError};
pub use path::{
    abs_dir, abs_dir_of_elems, abs_file, abs_file_of_elems, rel_dir, rel_dir_of_elems, rel_file,
    rel_file_of_elems, AbsDir, AbsFile, AnyPath, Path, RelDir, RelFile,
};
pub use sexp::{Sexp, SexpError};
pub use term::{Item, Items, Term};
