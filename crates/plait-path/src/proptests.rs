//! Property-based tests for the path algebra.
//!
//! The unit tests next to each module pin the worked examples; these cover
//! the algebraic laws over generated terms, links included.

use proptest::prelude::*;

use crate::name::Name;
use crate::path::{abs_dir, rel_dir, AbsDir, RelDir, RelFile};
use crate::term::{Item, Term};

fn name_strategy() -> impl Strategy<Value = Name> {
    "[a-z][a-z0-9]{0,6}".prop_map(|s| Name::new(s).unwrap())
}

fn segment_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[a-z][a-z0-9]{0,6}",
        1 => Just(".".to_string()),
        1 => Just("..".to_string()),
        1 => Just(String::new()),
    ]
}

fn path_string_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(segment_strategy(), 1..6).prop_map(|segs| segs.join("/"))
}

fn term_from_items(items: Vec<Item>) -> Term {
    let mut rev = items.into_iter().rev();
    let mut term = Term::Item(rev.next().expect("generated item lists are non-empty"));
    for item in rev {
        term = Term::Cons(item, Box::new(term));
    }
    term
}

fn dir_item_strategy(depth: u32) -> BoxedStrategy<Item> {
    if depth == 0 {
        prop_oneof![
            4 => name_strategy().prop_map(Item::Dir),
            1 => Just(Item::Dot),
            1 => Just(Item::Dotdot),
        ]
        .boxed()
    } else {
        let rel_target = rel_dir_term_strategy(depth - 1);
        let abs_target =
            rel_dir_term_strategy(depth - 1).prop_map(|t| Term::Cons(Item::Root, Box::new(t)));
        prop_oneof![
            4 => name_strategy().prop_map(Item::Dir),
            1 => Just(Item::Dot),
            1 => Just(Item::Dotdot),
            1 => (name_strategy(), rel_target).prop_map(|(n, t)| Item::Link(n, Box::new(t))),
            1 => (name_strategy(), abs_target).prop_map(|(n, t)| Item::Link(n, Box::new(t))),
        ]
        .boxed()
    }
}

fn rel_dir_term_strategy(depth: u32) -> BoxedStrategy<Term> {
    prop::collection::vec(dir_item_strategy(depth), 1..5)
        .prop_map(term_from_items)
        .boxed()
}

fn rel_dir_strategy() -> impl Strategy<Value = RelDir> {
    rel_dir_term_strategy(2).prop_map(|t| RelDir::from_term(t).unwrap())
}

fn abs_dir_strategy() -> impl Strategy<Value = AbsDir> {
    prop_oneof![
        1 => Just(AbsDir::root()),
        6 => rel_dir_term_strategy(2)
            .prop_map(|t| AbsDir::from_term(Term::Cons(Item::Root, Box::new(t))).unwrap()),
    ]
}

fn rel_file_strategy() -> impl Strategy<Value = RelFile> {
    let broken_piece = prop_oneof![
        3 => "[a-z]{1,4}",
        1 => Just(String::new()),
    ];
    let tail = prop_oneof![
        3 => name_strategy().prop_map(Item::File),
        1 => (
            name_strategy(),
            prop::collection::vec(broken_piece, 1..4)
        )
            .prop_map(|(n, parts)| Item::BrokenLink(n, parts)),
        1 => (name_strategy(), name_strategy()).prop_map(|(n, t)| {
            Item::Link(n, Box::new(Term::Item(Item::File(t))))
        }),
    ];
    (prop::collection::vec(dir_item_strategy(1), 0..4), tail).prop_map(|(mut items, tail)| {
        items.push(tail);
        RelFile::from_term(term_from_items(items)).unwrap()
    })
}

proptest! {
    // Parsing a printed path gives back an equivalent path.
    #[test]
    fn printed_relative_paths_parse_back(input in path_string_strategy()) {
        if let Ok(p) = rel_dir(&input) {
            let reparsed = rel_dir(&p.to_string()).unwrap();
            prop_assert!(p.equivalent(&reparsed));
        }
    }

    #[test]
    fn printed_absolute_paths_parse_back(input in path_string_strategy()) {
        if let Ok(p) = abs_dir(&format!("/{input}")) {
            let reparsed = abs_dir(&p.to_string()).unwrap();
            prop_assert!(p.equivalent(&reparsed));
        }
    }

    // normalize(normalize(p)) == normalize(p)
    #[test]
    fn normalize_is_idempotent_rel(p in rel_dir_strategy()) {
        let once = p.normalize();
        prop_assert_eq!(once.normalize(), once);
    }

    #[test]
    fn normalize_is_idempotent_abs(p in abs_dir_strategy()) {
        let once = p.normalize();
        prop_assert_eq!(once.normalize(), once);
    }

    // is_normalized(normalize(p))
    #[test]
    fn normalize_output_is_normalized(p in rel_dir_strategy()) {
        prop_assert!(p.normalize().is_normalized());
    }

    // Equivalence is reflexive, symmetric and transitive.
    #[test]
    fn equivalence_laws(p in rel_dir_strategy(), q in rel_dir_strategy()) {
        prop_assert!(p.equivalent(&p));
        prop_assert_eq!(p.equivalent(&q), q.equivalent(&p));

        let dotted = p.concat(&RelDir::current());
        let double_dotted = dotted.concat(&RelDir::current());
        prop_assert!(p.equivalent(&dotted));
        prop_assert!(dotted.equivalent(&double_dotted));
        prop_assert!(p.equivalent(&double_dotted));
    }

    // Appending or prepending `.` changes nothing after normalization.
    #[test]
    fn dot_is_a_concat_identity(p in rel_dir_strategy()) {
        prop_assert!(p.concat(&RelDir::current()).equivalent(&p));
        prop_assert!(RelDir::current().concat(&p).equivalent(&p));
    }

    // parent(concat(p, file)) recovers a normalized p that does not end
    // in `..`.
    #[test]
    fn parent_undoes_a_file_child(p in abs_dir_strategy(), n in name_strategy()) {
        let normalized = p.normalize();
        prop_assume!(!matches!(normalized.last(), Item::Dotdot));
        let file = RelFile::from_term(Term::Item(Item::File(n))).unwrap();
        prop_assert_eq!(normalized.concat(&file).parent(), normalized);
    }

    // resolve leaves no link items behind.
    #[test]
    fn resolve_is_link_free(p in abs_dir_strategy()) {
        prop_assert!(!p.resolve().has_link());
    }

    // Serialized round trip is byte-for-byte.
    #[test]
    fn sexp_round_trip_rel_files(p in rel_file_strategy()) {
        let printed = p.to_sexp().to_string();
        let read = RelFile::from_sexp(&printed.parse().unwrap()).unwrap();
        prop_assert_eq!(&read, &p);
        prop_assert_eq!(read.to_sexp().to_string(), printed);
    }

    #[test]
    fn sexp_round_trip_abs_dirs(p in abs_dir_strategy()) {
        let printed = p.to_sexp().to_string();
        let read = AbsDir::from_sexp(&printed.parse().unwrap()).unwrap();
        prop_assert_eq!(&read, &p);
        prop_assert_eq!(read.to_sexp().to_string(), printed);
    }
}
