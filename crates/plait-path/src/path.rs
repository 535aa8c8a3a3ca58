//! Typed paths: a [`Term`] tagged with its anchor and object kinds.
//!
//! The four aliases ([`AbsDir`], [`AbsFile`], [`RelDir`], [`RelFile`]) are
//! the public vocabulary; the generic [`Path`] carries the algebra shared
//! between them. Construction always validates the structural invariants,
//! so holding a typed path is proof that its term is well formed.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::path::PathBuf;
use std::str::FromStr;

use crate::elem::{parse_elems, Elem};
use crate::error::PathError;
use crate::kind::{Abs, Anchor, AnchorKind, Dir, File, Object, ObjectKind, Rel};
use crate::name::Name;
use crate::term::{Item, Items, Term};

/// A path whose anchor and object are part of its type.
pub struct Path<A: Anchor, O: Object> {
    term: Term,
    _kind: PhantomData<fn() -> (A, O)>,
}

/// An absolute path naming a directory.
pub type AbsDir = Path<Abs, Dir>;
/// An absolute path naming a file.
pub type AbsFile = Path<Abs, File>;
/// A relative path naming a directory.
pub type RelDir = Path<Rel, Dir>;
/// A relative path naming a file.
pub type RelFile = Path<Rel, File>;

impl<A: Anchor, O: Object> Path<A, O> {
    pub(crate) fn from_term_unchecked(term: Term) -> Self {
        Path {
            term,
            _kind: PhantomData,
        }
    }

    /// Tag an untyped term, validating the structural invariants.
    pub fn from_term(term: Term) -> Result<Self, PathError> {
        term.check(A::KIND, O::KIND)?;
        Ok(Self::from_term_unchecked(term))
    }

    /// Build a path from an element list.
    ///
    /// Fails with [`PathError::AnchorMismatch`] when the head does not fit
    /// the anchor and [`PathError::ObjectMismatch`] when the tail does not
    /// fit the object.
    pub fn from_elems(elems: &[Elem]) -> Result<Self, PathError> {
        Self::from_term(term_of_elems(elems, O::KIND)?)
    }

    /// Parse a POSIX path string.
    pub fn parse(input: &str) -> Result<Self, PathError> {
        Self::from_elems(&parse_elems(input)?)
    }

    /// The untyped body.
    pub fn term(&self) -> &Term {
        &self.term
    }

    /// Give up the typing and keep the body.
    pub fn into_term(self) -> Term {
        self.term
    }

    /// Iterate the items front to back.
    pub fn items(&self) -> Items<'_> {
        self.term.iter()
    }

    /// The items as an owned list.
    pub fn to_list(&self) -> Vec<Item> {
        self.items().cloned().collect()
    }

    /// The tail item.
    pub fn last(&self) -> &Item {
        self.term.last()
    }

    /// Runtime value of the anchor attribute.
    pub fn anchor(&self) -> AnchorKind {
        A::KIND
    }

    /// Runtime value of the object attribute.
    pub fn object(&self) -> ObjectKind {
        O::KIND
    }

    /// True when any top-level item is a live link.
    pub fn has_link(&self) -> bool {
        self.term.has_link()
    }

    /// Collapse `.` items and matching name/`..` pairs. Idempotent.
    pub fn normalize(&self) -> Self {
        Self::from_term_unchecked(self.term.normalize())
    }

    /// True when [`Path::normalize`] would return the path unchanged.
    pub fn is_normalized(&self) -> bool {
        self.term.is_normalized()
    }

    /// Structural equality after normalizing both sides.
    ///
    /// Plain `==` compares terms as written; two spellings of the same
    /// place, such as `a/./b` and `a/b`, are `equivalent` but not `==`.
    pub fn equivalent(&self, other: &Self) -> bool {
        self.term.normalize() == other.term.normalize()
    }

    /// The directory above this path, normalized.
    pub fn parent(&self) -> Path<A, Dir> {
        Path::from_term_unchecked(self.term.parent().normalize())
    }

    /// Forget the static kinds, keeping them as runtime tags.
    pub fn erase(&self) -> AnyPath {
        let term = self.term.clone();
        match (A::KIND, O::KIND) {
            (AnchorKind::Abs, ObjectKind::Dir) => {
                AnyPath::AbsDir(Path::from_term_unchecked(term))
            }
            (AnchorKind::Abs, ObjectKind::File) => {
                AnyPath::AbsFile(Path::from_term_unchecked(term))
            }
            (AnchorKind::Rel, ObjectKind::Dir) => {
                AnyPath::RelDir(Path::from_term_unchecked(term))
            }
            (AnchorKind::Rel, ObjectKind::File) => {
                AnyPath::RelFile(Path::from_term_unchecked(term))
            }
        }
    }

    /// The printed form as an OS path.
    pub fn to_path_buf(&self) -> PathBuf {
        PathBuf::from(self.to_string())
    }
}

impl<A: Anchor> Path<A, Dir> {
    /// Append a relative path, keeping this path's anchor and taking the
    /// argument's object.
    pub fn concat<O: Object>(&self, rest: &Path<Rel, O>) -> Path<A, O> {
        Path::from_term_unchecked(self.term.concat(&rest.term))
    }

    /// This directory's child directory with the given name.
    pub fn child_dir(&self, name: Name) -> Path<A, Dir> {
        Path::from_term_unchecked(self.term.push(Item::Dir(name)))
    }

    /// This directory's child file with the given name.
    pub fn child_file(&self, name: Name) -> Path<A, File> {
        Path::from_term_unchecked(self.term.push(Item::File(name)))
    }
}

impl AbsDir {
    /// The filesystem root, `/`.
    pub fn root() -> AbsDir {
        Path::from_term_unchecked(Term::Item(Item::Root))
    }
}

impl RelDir {
    /// The current directory, `.`.
    pub fn current() -> RelDir {
        Path::from_term_unchecked(Term::Item(Item::Dot))
    }
}

/// Parse an absolute directory path.
pub fn abs_dir(input: &str) -> Result<AbsDir, PathError> {
    AbsDir::parse(input)
}

/// Parse an absolute file path.
pub fn abs_file(input: &str) -> Result<AbsFile, PathError> {
    AbsFile::parse(input)
}

/// Parse a relative directory path.
pub fn rel_dir(input: &str) -> Result<RelDir, PathError> {
    RelDir::parse(input)
}

/// Parse a relative file path.
pub fn rel_file(input: &str) -> Result<RelFile, PathError> {
    RelFile::parse(input)
}

/// Build an absolute directory path from elements.
pub fn abs_dir_of_elems(elems: &[Elem]) -> Result<AbsDir, PathError> {
    AbsDir::from_elems(elems)
}

/// Build an absolute file path from elements.
pub fn abs_file_of_elems(elems: &[Elem]) -> Result<AbsFile, PathError> {
    AbsFile::from_elems(elems)
}

/// Build a relative directory path from elements.
pub fn rel_dir_of_elems(elems: &[Elem]) -> Result<RelDir, PathError> {
    RelDir::from_elems(elems)
}

/// Build a relative file path from elements.
pub fn rel_file_of_elems(elems: &[Elem]) -> Result<RelFile, PathError> {
    RelFile::from_elems(elems)
}

fn term_of_elems(elems: &[Elem], object: ObjectKind) -> Result<Term, PathError> {
    let (last, init) = elems.split_last().ok_or(PathError::Empty)?;
    let tail = match last {
        Elem::Root => Item::Root,
        Elem::Dot => Item::Dot,
        Elem::Dotdot => Item::Dotdot,
        Elem::Name(n) => match object {
            ObjectKind::Dir => Item::Dir(n.clone()),
            ObjectKind::File => Item::File(n.clone()),
        },
    };
    let mut term = Term::Item(tail);
    for elem in init.iter().rev() {
        let item = match elem {
            Elem::Root => Item::Root,
            Elem::Dot => Item::Dot,
            Elem::Dotdot => Item::Dotdot,
            Elem::Name(n) => Item::Dir(n.clone()),
        };
        term = Term::Cons(item, Box::new(term));
    }
    Ok(term)
}

impl<A: Anchor, O: Object> Clone for Path<A, O> {
    fn clone(&self) -> Self {
        Self::from_term_unchecked(self.term.clone())
    }
}

impl<A: Anchor, O: Object> fmt::Debug for Path<A, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Path")
            .field("anchor", &A::KIND)
            .field("object", &O::KIND)
            .field("term", &self.term)
            .finish()
    }
}

impl<A: Anchor, O: Object> PartialEq for Path<A, O> {
    fn eq(&self, other: &Self) -> bool {
        self.term == other.term
    }
}

impl<A: Anchor, O: Object> Eq for Path<A, O> {}

impl<A: Anchor, O: Object> Hash for Path<A, O> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.term.hash(state);
    }
}

impl<A: Anchor, O: Object> fmt::Display for Path<A, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.term, f)
    }
}

impl<A: Anchor, O: Object> FromStr for Path<A, O> {
    type Err = PathError;

    fn from_str(input: &str) -> Result<Self, PathError> {
        Self::parse(input)
    }
}

impl<O: Object> Path<Abs, O> {
    /// Inline every link target. The result is link-free and names the
    /// same place, assuming the links on disk agree with the terms.
    pub fn resolve(&self) -> Path<Abs, O> {
        Path::from_term_unchecked(self.term.resolve())
    }
}

/// A path whose kinds are known only at runtime.
///
/// This is the tagged union behind `kind` discrimination and the key type
/// of the walkers' visited sets, which mix paths of every kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnyPath {
    AbsDir(AbsDir),
    AbsFile(AbsFile),
    RelDir(RelDir),
    RelFile(RelFile),
}

impl AnyPath {
    /// Tag an untyped term with its structurally determined kinds.
    pub fn from_term(term: Term) -> Result<AnyPath, PathError> {
        match (term.anchor(), term.object()) {
            (AnchorKind::Abs, ObjectKind::Dir) => AbsDir::from_term(term).map(AnyPath::AbsDir),
            (AnchorKind::Abs, ObjectKind::File) => AbsFile::from_term(term).map(AnyPath::AbsFile),
            (AnchorKind::Rel, ObjectKind::Dir) => RelDir::from_term(term).map(AnyPath::RelDir),
            (AnchorKind::Rel, ObjectKind::File) => RelFile::from_term(term).map(AnyPath::RelFile),
        }
    }

    /// Both runtime tags at once.
    pub fn kind(&self) -> (AnchorKind, ObjectKind) {
        (self.anchor(), self.object())
    }

    pub fn anchor(&self) -> AnchorKind {
        match self {
            AnyPath::AbsDir(_) | AnyPath::AbsFile(_) => AnchorKind::Abs,
            AnyPath::RelDir(_) | AnyPath::RelFile(_) => AnchorKind::Rel,
        }
    }

    pub fn object(&self) -> ObjectKind {
        match self {
            AnyPath::AbsDir(_) | AnyPath::RelDir(_) => ObjectKind::Dir,
            AnyPath::AbsFile(_) | AnyPath::RelFile(_) => ObjectKind::File,
        }
    }

    /// The untyped body.
    pub fn term(&self) -> &Term {
        match self {
            AnyPath::AbsDir(p) => p.term(),
            AnyPath::AbsFile(p) => p.term(),
            AnyPath::RelDir(p) => p.term(),
            AnyPath::RelFile(p) => p.term(),
        }
    }

    /// The printed form as an OS path.
    pub fn to_path_buf(&self) -> PathBuf {
        PathBuf::from(self.to_string())
    }
}

impl fmt::Display for AnyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.term(), f)
    }
}

impl From<AbsDir> for AnyPath {
    fn from(p: AbsDir) -> AnyPath {
        AnyPath::AbsDir(p)
    }
}

impl From<AbsFile> for AnyPath {
    fn from(p: AbsFile) -> AnyPath {
        AnyPath::AbsFile(p)
    }
}

impl From<RelDir> for AnyPath {
    fn from(p: RelDir) -> AnyPath {
        AnyPath::RelDir(p)
    }
}

impl From<RelFile> for AnyPath {
    fn from(p: RelFile) -> AnyPath {
        AnyPath::RelFile(p)
    }
}

impl TryFrom<AnyPath> for AbsDir {
    type Error = PathError;

    fn try_from(p: AnyPath) -> Result<AbsDir, PathError> {
        match p {
            AnyPath::AbsDir(p) => Ok(p),
            AnyPath::RelDir(_) | AnyPath::RelFile(_) => Err(PathError::AnchorMismatch {
                expected: AnchorKind::Abs,
            }),
            AnyPath::AbsFile(_) => Err(PathError::ObjectMismatch {
                expected: ObjectKind::Dir,
            }),
        }
    }
}

impl TryFrom<AnyPath> for AbsFile {
    type Error = PathError;

    fn try_from(p: AnyPath) -> Result<AbsFile, PathError> {
        match p {
            AnyPath::AbsFile(p) => Ok(p),
            AnyPath::RelDir(_) | AnyPath::RelFile(_) => Err(PathError::AnchorMismatch {
                expected: AnchorKind::Abs,
            }),
            AnyPath::AbsDir(_) => Err(PathError::ObjectMismatch {
                expected: ObjectKind::File,
            }),
        }
    }
}

impl TryFrom<AnyPath> for RelDir {
    type Error = PathError;

    fn try_from(p: AnyPath) -> Result<RelDir, PathError> {
        match p {
            AnyPath::RelDir(p) => Ok(p),
            AnyPath::AbsDir(_) | AnyPath::AbsFile(_) => Err(PathError::AnchorMismatch {
                expected: AnchorKind::Rel,
            }),
            AnyPath::RelFile(_) => Err(PathError::ObjectMismatch {
                expected: ObjectKind::Dir,
            }),
        }
    }
}

impl TryFrom<AnyPath> for RelFile {
    type Error = PathError;

    fn try_from(p: AnyPath) -> Result<RelFile, PathError> {
        match p {
            AnyPath::RelFile(p) => Ok(p),
            AnyPath::AbsDir(_) | AnyPath::AbsFile(_) => Err(PathError::AnchorMismatch {
                expected: AnchorKind::Rel,
            }),
            AnyPath::RelDir(_) => Err(PathError::ObjectMismatch {
                expected: ObjectKind::File,
            }),
        }
    }
}
