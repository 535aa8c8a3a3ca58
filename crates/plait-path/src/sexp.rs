//! The serialized form: s-expressions over path terms.
//!
//! Printing is canonical — single line, single spaces, atoms quoted only
//! when they have to be — so that reading a printed term and printing it
//! again reproduces the original bytes.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::error::PathError;
use crate::kind::{Anchor, Object};
use crate::name::{Name, NameError};
use crate::path::Path;
use crate::term::{Item, Term};

/// A symbolic expression: an atom or a list of expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sexp {
    Atom(String),
    List(Vec<Sexp>),
}

impl Sexp {
    pub fn atom(s: impl Into<String>) -> Sexp {
        Sexp::Atom(s.into())
    }

    pub fn list(items: Vec<Sexp>) -> Sexp {
        Sexp::List(items)
    }
}

/// Errors from reading an s-expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SexpError {
    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("unexpected character {found:?} at byte {at}")]
    Unexpected { found: char, at: usize },

    #[error("unterminated quoted atom")]
    UnterminatedString,

    #[error("trailing input after s-expression")]
    Trailing,

    #[error("malformed {expected}: {found}")]
    Malformed { expected: &'static str, found: String },

    #[error(transparent)]
    InvalidName(#[from] NameError),

    #[error(transparent)]
    InvalidPath(#[from] PathError),
}

fn malformed(expected: &'static str, found: &Sexp) -> SexpError {
    SexpError::Malformed {
        expected,
        found: found.to_string(),
    }
}

fn needs_quoting(atom: &str) -> bool {
    atom.is_empty()
        || atom
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '"' | '\\'))
}

impl fmt::Display for Sexp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sexp::Atom(atom) => {
                if needs_quoting(atom) {
                    f.write_str("\"")?;
                    for c in atom.chars() {
                        if matches!(c, '"' | '\\') {
                            f.write_str("\\")?;
                        }
                        write!(f, "{c}")?;
                    }
                    f.write_str("\"")
                } else {
                    f.write_str(atom)
                }
            }
            Sexp::List(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    fmt::Display::fmt(item, f)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl FromStr for Sexp {
    type Err = SexpError;

    fn from_str(input: &str) -> Result<Sexp, SexpError> {
        let mut parser = Parser { src: input, pos: 0 };
        let value = parser.parse_value()?;
        parser.skip_whitespace();
        if parser.pos < parser.src.len() {
            return Err(SexpError::Trailing);
        }
        Ok(value)
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.bump();
        }
    }

    fn parse_value(&mut self) -> Result<Sexp, SexpError> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(SexpError::UnexpectedEof),
            Some('(') => {
                self.bump();
                let mut items = Vec::new();
                loop {
                    self.skip_whitespace();
                    match self.peek() {
                        None => return Err(SexpError::UnexpectedEof),
                        Some(')') => {
                            self.bump();
                            return Ok(Sexp::List(items));
                        }
                        Some(_) => items.push(self.parse_value()?),
                    }
                }
            }
            Some(')') => Err(SexpError::Unexpected {
                found: ')',
                at: self.pos,
            }),
            Some('"') => self.parse_quoted(),
            Some(_) => self.parse_bare(),
        }
    }

    fn parse_quoted(&mut self) -> Result<Sexp, SexpError> {
        self.bump(); // opening quote
        let mut atom = String::new();
        loop {
            match self.bump() {
                None => return Err(SexpError::UnterminatedString),
                Some('"') => return Ok(Sexp::Atom(atom)),
                Some('\\') => match self.bump() {
                    None => return Err(SexpError::UnterminatedString),
                    Some(c) => atom.push(c),
                },
                Some(c) => atom.push(c),
            }
        }
    }

    fn parse_bare(&mut self) -> Result<Sexp, SexpError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || matches!(c, '(' | ')' | '"') {
                break;
            }
            self.bump();
        }
        Ok(Sexp::Atom(self.src[start..self.pos].to_string()))
    }
}

impl Item {
    /// Encode this item.
    pub fn to_sexp(&self) -> Sexp {
        match self {
            Item::Root => Sexp::atom("Root"),
            Item::Dot => Sexp::atom("Dot"),
            Item::Dotdot => Sexp::atom("Dotdot"),
            Item::Dir(name) => Sexp::list(vec![Sexp::atom("Dir"), Sexp::atom(name.as_str())]),
            Item::File(name) => Sexp::list(vec![Sexp::atom("File"), Sexp::atom(name.as_str())]),
            Item::Link(name, target) => Sexp::list(vec![
                Sexp::atom("Link"),
                Sexp::atom(name.as_str()),
                target.to_sexp(),
            ]),
            Item::BrokenLink(name, parts) => Sexp::list(vec![
                Sexp::atom("BrokenLink"),
                Sexp::atom(name.as_str()),
                Sexp::list(parts.iter().map(Sexp::atom).collect()),
            ]),
        }
    }

    /// Decode an item.
    pub fn from_sexp(sexp: &Sexp) -> Result<Item, SexpError> {
        match sexp {
            Sexp::Atom(atom) => match atom.as_str() {
                "Root" => Ok(Item::Root),
                "Dot" => Ok(Item::Dot),
                "Dotdot" => Ok(Item::Dotdot),
                _ => Err(malformed("item", sexp)),
            },
            Sexp::List(items) => match items.as_slice() {
                [Sexp::Atom(tag), Sexp::Atom(name)] if tag == "Dir" => {
                    Ok(Item::Dir(Name::new(name.clone())?))
                }
                [Sexp::Atom(tag), Sexp::Atom(name)] if tag == "File" => {
                    Ok(Item::File(Name::new(name.clone())?))
                }
                [Sexp::Atom(tag), Sexp::Atom(name), target] if tag == "Link" => Ok(Item::Link(
                    Name::new(name.clone())?,
                    Box::new(Term::from_sexp(target)?),
                )),
                [Sexp::Atom(tag), Sexp::Atom(name), Sexp::List(parts)] if tag == "BrokenLink" => {
                    let parts = parts
                        .iter()
                        .map(|part| match part {
                            Sexp::Atom(s) => Ok(s.clone()),
                            list => Err(malformed("broken link target piece", list)),
                        })
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok(Item::BrokenLink(Name::new(name.clone())?, parts))
                }
                _ => Err(malformed("item", sexp)),
            },
        }
    }
}

impl Term {
    /// Encode this term.
    pub fn to_sexp(&self) -> Sexp {
        match self {
            Term::Item(item) => Sexp::list(vec![Sexp::atom("Item"), item.to_sexp()]),
            Term::Cons(head, tail) => {
                Sexp::list(vec![Sexp::atom("Cons"), head.to_sexp(), tail.to_sexp()])
            }
        }
    }

    /// Decode a term.
    pub fn from_sexp(sexp: &Sexp) -> Result<Term, SexpError> {
        match sexp {
            Sexp::List(items) => match items.as_slice() {
                [Sexp::Atom(tag), item] if tag == "Item" => {
                    Ok(Term::Item(Item::from_sexp(item)?))
                }
                [Sexp::Atom(tag), item, tail] if tag == "Cons" => Ok(Term::Cons(
                    Item::from_sexp(item)?,
                    Box::new(Term::from_sexp(tail)?),
                )),
                _ => Err(malformed("term", sexp)),
            },
            atom => Err(malformed("term", atom)),
        }
    }
}

impl<A: Anchor, O: Object> Path<A, O> {
    /// Encode this path.
    pub fn to_sexp(&self) -> Sexp {
        self.term().to_sexp()
    }

    /// Decode a path, re-validating its anchor and object.
    ///
    /// A link target is written without an anchor tag; its head item
    /// settles whether it is relative or absolute, so the same `Link`
    /// shape covers both.
    pub fn from_sexp(sexp: &Sexp) -> Result<Self, SexpError> {
        Ok(Self::from_term(Term::from_sexp(sexp)?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::{abs_dir, rel_dir, rel_file, AbsDir};

    #[test]
    fn prints_cons_spines() {
        let p = abs_dir("/a/b").unwrap();
        assert_eq!(
            p.to_sexp().to_string(),
            "(Cons Root (Cons (Dir a) (Item (Dir b))))"
        );
    }

    #[test]
    fn prints_single_items() {
        assert_eq!(AbsDir::root().to_sexp().to_string(), "(Item Root)");
        assert_eq!(
            rel_file("f.txt").unwrap().to_sexp().to_string(),
            "(Item (File f.txt))"
        );
    }

    #[test]
    fn prints_links_with_their_targets() {
        let target = rel_dir("b").unwrap();
        let term = Term::Item(Item::Link(
            Name::new("a").unwrap(),
            Box::new(target.into_term()),
        ));
        assert_eq!(
            term.to_sexp().to_string(),
            "(Item (Link a (Item (Dir b))))"
        );
    }

    #[test]
    fn prints_broken_links_with_raw_pieces() {
        let term = Term::Item(Item::BrokenLink(
            Name::new("dangle").unwrap(),
            vec![String::new(), "gone".into()],
        ));
        assert_eq!(
            term.to_sexp().to_string(),
            "(Item (BrokenLink dangle (\"\" gone)))"
        );
    }

    #[test]
    fn byte_for_byte_round_trip() {
        let p = abs_dir("/a/./b/../c").unwrap();
        let printed = p.to_sexp().to_string();
        let read = AbsDir::from_sexp(&printed.parse().unwrap()).unwrap();
        assert_eq!(read, p);
        assert_eq!(read.to_sexp().to_string(), printed);
    }

    #[test]
    fn link_targets_round_trip_either_anchor() {
        let relative = rel_dir("b/c").unwrap().into_term();
        let absolute = abs_dir("/b/c").unwrap().into_term();
        for target in [relative, absolute] {
            let term = Term::Item(Item::Link(Name::new("l").unwrap(), Box::new(target)));
            let sexp = term.to_sexp();
            let read = Term::from_sexp(&sexp).unwrap();
            assert_eq!(read, term);
            assert_eq!(read.to_sexp().to_string(), sexp.to_string());
        }
    }

    #[test]
    fn quoted_atoms_survive() {
        let sexp = Sexp::atom("with space");
        let printed = sexp.to_string();
        assert_eq!(printed, "\"with space\"");
        assert_eq!(printed.parse::<Sexp>().unwrap(), sexp);
    }

    #[test]
    fn reader_rejects_trailing_garbage() {
        assert_eq!("(Item Root) x".parse::<Sexp>(), Err(SexpError::Trailing));
    }

    #[test]
    fn reader_rejects_wrong_shapes() {
        let sexp: Sexp = "(Item (Dir a b))".parse().unwrap();
        assert!(matches!(
            Term::from_sexp(&sexp),
            Err(SexpError::Malformed { .. })
        ));
    }

    #[test]
    fn path_reader_checks_the_kind() {
        let sexp = abs_dir("/a").unwrap().to_sexp();
        assert!(matches!(
            crate::path::RelDir::from_sexp(&sexp),
            Err(SexpError::InvalidPath(_))
        ));
    }
}
