//! The untyped path body: items and non-empty cons sequences of them.
//!
//! [`Term`] is what every typed path wraps. The typed layer guarantees the
//! structural invariants (the root sentinel only at the head, file-shaped
//! items only at the tail); the algebra here is total over any term.

use std::fmt;

use crate::error::PathError;
use crate::kind::{AnchorKind, ObjectKind};
use crate::name::Name;

/// One step of a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Item {
    /// The absolute head `/`.
    Root,
    /// A directory component.
    Dir(Name),
    /// A file component.
    File(Name),
    /// The `.` component.
    Dot,
    /// The `..` component.
    Dotdot,
    /// A symlink whose target parses as a path of the same object kind.
    /// The target is absolute exactly when its head is [`Item::Root`].
    Link(Name, Box<Term>),
    /// A symlink whose target does not resolve on disk. The raw target is
    /// kept as its `/`-separated pieces, an empty leading piece standing
    /// for a leading `/`.
    BrokenLink(Name, Vec<String>),
}

impl Item {
    /// The on-disk entry name of this item, if it has one.
    pub fn name(&self) -> Option<&Name> {
        match self {
            Item::Dir(n) | Item::File(n) | Item::Link(n, _) | Item::BrokenLink(n, _) => Some(n),
            Item::Root | Item::Dot | Item::Dotdot => None,
        }
    }

    /// The object kind this item has when it stands at the tail of a path.
    pub fn object(&self) -> ObjectKind {
        match self {
            Item::Root | Item::Dir(_) | Item::Dot | Item::Dotdot => ObjectKind::Dir,
            Item::File(_) | Item::BrokenLink(..) => ObjectKind::File,
            Item::Link(_, target) => target.object(),
        }
    }
}

/// A non-empty sequence of items.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Term {
    Item(Item),
    Cons(Item, Box<Term>),
}

impl Term {
    /// The first item.
    pub fn head(&self) -> &Item {
        match self {
            Term::Item(item) | Term::Cons(item, _) => item,
        }
    }

    /// The last item.
    pub fn last(&self) -> &Item {
        match self {
            Term::Item(item) => item,
            Term::Cons(_, tail) => tail.last(),
        }
    }

    /// The first item and whatever follows it.
    pub fn split_first(&self) -> (&Item, Option<&Term>) {
        match self {
            Term::Item(item) => (item, None),
            Term::Cons(item, tail) => (item, Some(tail)),
        }
    }

    /// Iterate the items front to back.
    pub fn iter(&self) -> Items<'_> {
        Items { next: Some(self) }
    }

    /// Anchor of the whole term: absolute exactly when the head is the root.
    pub fn anchor(&self) -> AnchorKind {
        if matches!(self.head(), Item::Root) {
            AnchorKind::Abs
        } else {
            AnchorKind::Rel
        }
    }

    /// Object of the whole term: the object of its tail.
    pub fn object(&self) -> ObjectKind {
        self.last().object()
    }

    /// True when any top-level item is a live link.
    pub fn has_link(&self) -> bool {
        self.iter().any(|item| matches!(item, Item::Link(..)))
    }

    /// Append another term after this one.
    pub fn concat(&self, rest: &Term) -> Term {
        match self {
            Term::Item(item) => Term::Cons(item.clone(), Box::new(rest.clone())),
            Term::Cons(item, tail) => Term::Cons(item.clone(), Box::new(tail.concat(rest))),
        }
    }

    /// Append a single item.
    pub fn push(&self, item: Item) -> Term {
        self.concat(&Term::Item(item))
    }

    /// Replace the tail item with what lies above it.
    ///
    /// The root is its own parent; a name-bearing tail becomes `.`; a `.`
    /// or `..` tail ascends one level further.
    pub fn parent(&self) -> Term {
        match self {
            Term::Item(Item::Root) => Term::Item(Item::Root),
            Term::Item(Item::Dir(_) | Item::File(_) | Item::Link(..) | Item::BrokenLink(..)) => {
                Term::Item(Item::Dot)
            }
            Term::Item(Item::Dot | Item::Dotdot) => {
                Term::Cons(Item::Dotdot, Box::new(Term::Item(Item::Dotdot)))
            }
            Term::Cons(head, tail) => Term::Cons(head.clone(), Box::new(tail.parent())),
        }
    }

    /// Collapse `.` items and matching name/`..` pairs.
    ///
    /// Post-order: the tail is normalized first, then the head is combined
    /// with it. The result is a fixpoint of this function.
    pub fn normalize(&self) -> Term {
        match self {
            Term::Item(item) => Term::Item(item.clone()),
            Term::Cons(head, tail) => {
                let tail = tail.normalize();
                match (head, tail) {
                    (_, Term::Item(Item::Dot)) => Term::Item(head.clone()),
                    (Item::Dot, tail) => tail,
                    (Item::Root, Term::Item(Item::Dotdot)) => Term::Item(Item::Root),
                    (Item::Root, Term::Cons(Item::Dotdot, rest)) => {
                        Term::Cons(Item::Root, rest).normalize()
                    }
                    (
                        Item::Dotdot,
                        tail @ (Term::Item(Item::Dotdot) | Term::Cons(Item::Dotdot, _)),
                    ) => Term::Cons(Item::Dotdot, Box::new(tail)),
                    (Item::Dir(_) | Item::Link(..), Term::Item(Item::Dotdot)) => {
                        Term::Item(Item::Dot)
                    }
                    (Item::Dir(_) | Item::Link(..), Term::Cons(Item::Dotdot, rest)) => *rest,
                    (head, tail) => Term::Cons(head.clone(), Box::new(tail)),
                }
            }
        }
    }

    /// True when [`Term::normalize`] would leave this term unchanged:
    /// no `.` anywhere except as the sole item, and every `..` at the
    /// head, after the root, or after another `..`.
    pub fn is_normalized(&self) -> bool {
        if matches!(self, Term::Item(Item::Dot)) {
            return true;
        }
        let mut previous: Option<&Item> = None;
        for item in self.iter() {
            match item {
                Item::Dot => return false,
                Item::Dotdot => {
                    if let Some(prev) = previous {
                        if !matches!(prev, Item::Root | Item::Dotdot) {
                            return false;
                        }
                    }
                }
                _ => {}
            }
            previous = Some(item);
        }
        true
    }

    /// Inline every link target, front to back. An absolute target throws
    /// away whatever prefix had accumulated; a relative target is
    /// concatenated onto it.
    pub fn resolve(&self) -> Term {
        fn resolve_item(item: &Item) -> Term {
            match item {
                Item::Link(_, target) => target.resolve(),
                other => Term::Item(other.clone()),
            }
        }

        let (head, rest) = self.split_first();
        let mut acc = resolve_item(head);
        let mut cursor = rest;
        while let Some(term) = cursor {
            let (head, rest) = term.split_first();
            let next = resolve_item(head);
            acc = if next.anchor() == AnchorKind::Abs {
                next
            } else {
                acc.concat(&next)
            };
            cursor = rest;
        }
        acc
    }

    /// Check the structural invariants against an expected kind pair.
    pub(crate) fn check(&self, anchor: AnchorKind, object: ObjectKind) -> Result<(), PathError> {
        if self.anchor() != anchor {
            return Err(PathError::AnchorMismatch { expected: anchor });
        }
        if self.object() != object {
            return Err(PathError::ObjectMismatch { expected: object });
        }
        self.check_structure(true)
    }

    /// Root only at the head, file-shaped items only at the tail, and the
    /// same recursively inside link targets.
    pub(crate) fn check_structure(&self, at_head: bool) -> Result<(), PathError> {
        match self {
            Term::Item(item) => check_item(item, at_head, true),
            Term::Cons(head, tail) => {
                check_item(head, at_head, false)?;
                tail.check_structure(false)
            }
        }
    }
}

fn check_item(item: &Item, at_head: bool, at_tail: bool) -> Result<(), PathError> {
    match item {
        Item::Root if !at_head => Err(PathError::RootNotFirst),
        Item::File(_) | Item::BrokenLink(..) if !at_tail => Err(PathError::FileBeforeEnd),
        Item::Link(_, target) => {
            if !at_tail && target.object() == ObjectKind::File {
                return Err(PathError::FileBeforeEnd);
            }
            target.check_structure(true)
        }
        _ => Ok(()),
    }
}

/// Front-to-back iterator over a term's items.
#[derive(Debug, Clone)]
pub struct Items<'a> {
    next: Option<&'a Term>,
}

impl<'a> Iterator for Items<'a> {
    type Item = &'a Item;

    fn next(&mut self) -> Option<&'a Item> {
        let term = self.next?;
        let (item, rest) = term.split_first();
        self.next = rest;
        Some(item)
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = false;
        for item in self.iter() {
            match item {
                Item::Root => f.write_str("/")?,
                Item::Dot => {
                    if sep {
                        f.write_str("/")?;
                    }
                    f.write_str(".")?;
                    sep = true;
                }
                Item::Dotdot => {
                    if sep {
                        f.write_str("/")?;
                    }
                    f.write_str("..")?;
                    sep = true;
                }
                Item::Dir(n) | Item::File(n) | Item::Link(n, _) | Item::BrokenLink(n, _) => {
                    if sep {
                        f.write_str("/")?;
                    }
                    f.write_str(n.as_str())?;
                    sep = true;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Name {
        Name::new(s).unwrap()
    }

    fn dir(s: &str) -> Item {
        Item::Dir(name(s))
    }

    fn cons(head: Item, tail: Term) -> Term {
        Term::Cons(head, Box::new(tail))
    }

    #[test]
    fn display_joins_with_slashes() {
        let t = cons(Item::Root, cons(dir("a"), Term::Item(dir("b"))));
        assert_eq!(t.to_string(), "/a/b");
        assert_eq!(Term::Item(Item::Root).to_string(), "/");
        assert_eq!(Term::Item(Item::Dot).to_string(), ".");
        assert_eq!(
            cons(Item::Dotdot, Term::Item(dir("x"))).to_string(),
            "../x"
        );
    }

    #[test]
    fn anchor_follows_the_head() {
        assert_eq!(Term::Item(Item::Root).anchor(), AnchorKind::Abs);
        assert_eq!(Term::Item(dir("a")).anchor(), AnchorKind::Rel);
    }

    #[test]
    fn object_follows_the_tail_through_links() {
        let file_target = Term::Item(Item::File(name("f")));
        let link = Item::Link(name("l"), Box::new(file_target));
        assert_eq!(Term::Item(link).object(), ObjectKind::File);
        assert_eq!(Term::Item(dir("a")).object(), ObjectKind::Dir);
    }

    #[test]
    fn concat_is_right_nested() {
        let left = cons(dir("a"), Term::Item(dir("b")));
        let right = Term::Item(dir("c"));
        assert_eq!(left.concat(&right).to_string(), "a/b/c");
    }

    #[test]
    fn parent_of_names_is_dot() {
        assert_eq!(Term::Item(dir("a")).parent(), Term::Item(Item::Dot));
        assert_eq!(
            Term::Item(Item::File(name("f"))).parent(),
            Term::Item(Item::Dot)
        );
    }

    #[test]
    fn parent_of_root_is_root() {
        assert_eq!(Term::Item(Item::Root).parent(), Term::Item(Item::Root));
    }

    #[test]
    fn parent_of_dotdot_ascends_once_more() {
        assert_eq!(
            Term::Item(Item::Dotdot).parent().to_string(),
            "../.."
        );
    }

    #[test]
    fn normalize_drops_dots_and_folds_dotdots() {
        // "/a/./b/../c" -> "/a/c"
        let t = cons(
            Item::Root,
            cons(
                dir("a"),
                cons(Item::Dot, cons(dir("b"), cons(Item::Dotdot, Term::Item(dir("c"))))),
            ),
        );
        assert_eq!(t.normalize().to_string(), "/a/c");
    }

    #[test]
    fn normalize_stops_dotdot_at_root() {
        // "/../a" -> "/a"
        let t = cons(Item::Root, cons(Item::Dotdot, Term::Item(dir("a"))));
        assert_eq!(t.normalize().to_string(), "/a");
    }

    #[test]
    fn normalize_keeps_leading_dotdots() {
        // "../../a" stays as it is
        let t = cons(Item::Dotdot, cons(Item::Dotdot, Term::Item(dir("a"))));
        assert_eq!(t.normalize(), t);
    }

    #[test]
    fn normalize_collapses_to_sole_dot() {
        // "a/.." -> "."
        let t = cons(dir("a"), Term::Item(Item::Dotdot));
        assert_eq!(t.normalize(), Term::Item(Item::Dot));
    }

    #[test]
    fn is_normalized_matches_normalize_output() {
        let t = cons(
            Item::Root,
            cons(dir("a"), cons(Item::Dot, Term::Item(dir("b")))),
        );
        assert!(!t.is_normalized());
        assert!(t.normalize().is_normalized());
        assert!(Term::Item(Item::Dot).is_normalized());
    }

    #[test]
    fn resolve_inlines_relative_targets() {
        // x/Link(l -> s)/y resolves to x/s/y
        let target = Term::Item(dir("s"));
        let t = cons(
            dir("x"),
            cons(Item::Link(name("l"), Box::new(target)), Term::Item(dir("y"))),
        );
        assert_eq!(t.resolve().to_string(), "x/s/y");
        assert!(!t.resolve().has_link());
    }

    #[test]
    fn resolve_lets_an_absolute_target_win() {
        // /a/Link(l -> /t)/y resolves to /t/y
        let target = cons(Item::Root, Term::Item(dir("t")));
        let t = cons(
            Item::Root,
            cons(
                dir("a"),
                cons(Item::Link(name("l"), Box::new(target)), Term::Item(dir("y"))),
            ),
        );
        assert_eq!(t.resolve().to_string(), "/t/y");
    }

    #[test]
    fn structure_check_rejects_misplaced_items() {
        let rooted_tail = cons(dir("a"), Term::Item(Item::Root));
        assert_eq!(
            rooted_tail.check_structure(true),
            Err(PathError::RootNotFirst)
        );

        let file_first = cons(Item::File(name("f")), Term::Item(dir("a")));
        assert_eq!(
            file_first.check_structure(true),
            Err(PathError::FileBeforeEnd)
        );
    }
}
