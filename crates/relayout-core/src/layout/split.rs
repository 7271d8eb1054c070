//! Splitting gaps between a node, its parent and its siblings

use tracing::debug;

use super::rules::{split_index, Gap};
use super::Layout;
use crate::tree::{Node, NodeKind, Tag};

/// Two adjacent siblings and their parent
#[derive(Debug, Clone, Copy)]
pub struct Junction<'n> {
    pub parent: &'n Node,
    pub left: &'n Node,
    pub right: &'n Node,
}

/// Split the gap between two siblings into the left one's trailing layout
/// and the right one's leading layout
pub fn split_between(raw: &str, junction: Junction<'_>) -> (Layout, Layout) {
    let gap = Gap::new(raw);

    let index = match junction_override(&gap, junction) {
        Some(index) => index,
        None => match split_index(&gap) {
            Some(found) => found.index,
            None => {
                debug!(
                    parent = %junction.parent.tag(),
                    left = %junction.left.tag(),
                    right = %junction.right.tag(),
                    gap = raw,
                    "no layout rule matches gap, keeping it on the left"
                );
                raw.len()
            }
        },
    };

    let index = gap.snap(index);
    split_stripping_commas(&gap, index)
}

/// Split the gap from a parent's start to its first child into the parent's
/// own prefix and the child's leading layout
pub fn split_parent_leading(parent: &Node, raw: &str) -> (Layout, Layout) {
    let gap = Gap::new(raw);

    let index = if parent.is_definition() {
        raw.len()
    } else if let Some(brace) = gap.masked().find('{') {
        brace + 1
    } else {
        gap.after_last_syntactic().unwrap_or(0)
    };

    split_stripping_commas(&gap, gap.snap(index))
}

/// Split the gap from a parent's last child to its end into the child's
/// trailing layout and the parent's own suffix
pub fn split_parent_trailing(_parent: &Node, raw: &str) -> (Layout, Layout) {
    let gap = Gap::new(raw);
    let masked = gap.masked();

    let first = gap.first_syntactic().unwrap_or(raw.len());
    let index = match masked[..first].rfind('\n') {
        Some(nl) if nl > 0 && masked.as_bytes()[nl - 1] == b'\r' => nl - 1,
        Some(nl) => nl,
        None => first,
    };

    split_stripping_commas(&gap, gap.snap(index))
}

fn junction_override(gap: &Gap<'_>, junction: Junction<'_>) -> Option<usize> {
    let Junction {
        parent,
        left,
        right,
    } = junction;
    let masked = gap.masked();

    if left.tag() == Tag::ModifierTree {
        // keywords after a modifier belong to what follows
        return Some(0);
    }

    if let NodeKind::Match { selector, .. } = parent.kind() {
        if std::ptr::eq(&**selector, left) && right.tag() == Tag::Case {
            return masked.find('{').map(|brace| brace + 1);
        }
    }

    if left.is_definition() && right.is_definition() {
        if let Some(nl) = masked.find('\n') {
            let nl = if nl > 0 && masked.as_bytes()[nl - 1] == b'\r' {
                nl - 1
            } else {
                nl
            };
            return Some(nl);
        }
        return masked.find(',');
    }

    if let NodeKind::Def {
        vparamss, tpt, rhs, ..
    } = parent.kind()
    {
        let last_param = vparamss.iter().flatten().last();
        let follows = |slot: &Option<crate::tree::Tree>| {
            slot.as_ref().is_some_and(|t| std::ptr::eq(&**t, right))
        };
        if last_param.is_some_and(|p| std::ptr::eq(&**p, left)) && (follows(tpt) || follows(rhs))
        {
            return masked.find(['=', '{']);
        }
    }

    None
}

fn split_stripping_commas(gap: &Gap<'_>, index: usize) -> (Layout, Layout) {
    let raw = gap.raw();
    let masked = gap.masked();
    let (left, right) = raw.split_at(index);

    let left = match masked[..index].trim_end().strip_suffix(',') {
        Some(kept) => format!("{}{}", &left[..kept.len()], &left[kept.len() + 1..]),
        None => left.to_string(),
    };

    let right_masked = &masked[index..];
    let pad = right_masked.len() - right_masked.trim_start().len();
    let right = if right_masked[pad..].starts_with(',') {
        format!("{}{}", &right[..pad], &right[pad + 1..])
    } else {
        right.to_string()
    };

    (Layout::new(left), Layout::new(right))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::SourceFile;
    use crate::tree::{Modifier, ModifierToken, Name, Tree};

    fn ident(source: &SourceFile, name: &str, start: u32) -> Tree {
        Node::at(
            NodeKind::Ident { name: name.into() },
            source.pos(start, start + name.len() as u32),
        )
    }

    fn strings(pair: (Layout, Layout)) -> (String, String) {
        (pair.0.as_str().to_string(), pair.1.as_str().to_string())
    }

    fn block(source: &SourceFile) -> Tree {
        Node::at(NodeKind::Block { stats: vec![] }, source.pos(0, 1))
    }

    #[test]
    fn test_sibling_split_partitions_gap() {
        let source = SourceFile::new("A.scala", "a b");
        let (a, b) = (ident(&source, "a", 0), ident(&source, "b", 2));
        let parent = block(&source);
        let junction = Junction {
            parent: &parent,
            left: &a,
            right: &b,
        };

        for gap in [" ", "\n  ", " // c\n  ", "\n  /* d */\n  ", ") = ", " else "] {
            let (left, right) = strings(split_between(gap, junction));
            assert_eq!(format!("{}{}", left, right), gap);
        }
    }

    #[test]
    fn test_commas_are_stripped() {
        let source = SourceFile::new("A.scala", "a b");
        let (a, b) = (ident(&source, "a", 0), ident(&source, "b", 2));
        let parent = block(&source);
        let junction = Junction {
            parent: &parent,
            left: &a,
            right: &b,
        };

        assert_eq!(
            strings(split_between(", ", junction)),
            ("".to_string(), " ".to_string())
        );
        assert_eq!(
            strings(split_between(",\n  ", junction)),
            ("".to_string(), "\n  ".to_string())
        );
        assert_eq!(
            strings(split_between(" /* , */ ,\n", junction)),
            (" /* , */ ".to_string(), "\n".to_string())
        );
    }

    #[test]
    fn test_trailing_comment_stays_left() {
        let source = SourceFile::new("A.scala", "a b");
        let (a, b) = (ident(&source, "a", 0), ident(&source, "b", 2));
        let parent = block(&source);
        let junction = Junction {
            parent: &parent,
            left: &a,
            right: &b,
        };

        assert_eq!(
            strings(split_between(" // why\n  ", junction)),
            (" // why".to_string(), "\n  ".to_string())
        );
    }

    #[test]
    fn test_definitions_split_at_newline() {
        let source = SourceFile::new("A.scala", "val a = 1\nval b = 2");
        let val = |name: &str, start: u32| {
            Node::at(
                NodeKind::Val {
                    mods: vec![],
                    name: Name::synthetic(name),
                    tpt: None,
                    rhs: None,
                },
                source.pos(start, start + 9),
            )
        };
        let (a, b) = (val("a", 0), val("b", 10));
        let parent = block(&source);
        let junction = Junction {
            parent: &parent,
            left: &a,
            right: &b,
        };

        assert_eq!(
            strings(split_between(" // one = 1\n  ", junction)),
            (" // one = 1".to_string(), "\n  ".to_string())
        );
        assert_eq!(
            strings(split_between("; ", junction)),
            ("; ".to_string(), "".to_string())
        );
    }

    #[test]
    fn test_definitions_split_at_comma() {
        let source = SourceFile::new("A.scala", "val a = 1, b = 2");
        let val = |name: &str, start: u32, end: u32| {
            Node::at(
                NodeKind::Val {
                    mods: vec![],
                    name: Name::synthetic(name),
                    tpt: None,
                    rhs: None,
                },
                source.pos(start, end),
            )
        };
        let (a, b) = (val("a", 0, 9), val("b", 11, 16));
        let parent = block(&source);
        let junction = Junction {
            parent: &parent,
            left: &a,
            right: &b,
        };

        assert_eq!(
            strings(split_between(", ", junction)),
            ("".to_string(), " ".to_string())
        );
        assert_eq!(
            strings(split_between(" /* one */, ", junction)),
            (" /* one */".to_string(), " ".to_string())
        );
    }

    #[test]
    fn test_match_selector_keeps_brace() {
        let source = SourceFile::new("A.scala", "x match {\n  case _ => y\n}");
        let selector = ident(&source, "x", 0);
        let pat = ident(&source, "_", 17);
        let body = ident(&source, "y", 22);
        let case = Node::at(
            NodeKind::Case {
                pat,
                guard: None,
                body,
            },
            source.pos(12, 23),
        );
        let parent = Node::at(
            NodeKind::Match {
                selector: selector.clone(),
                cases: vec![case.clone()],
            },
            source.pos(0, 25),
        );
        let junction = Junction {
            parent: &parent,
            left: &selector,
            right: &case,
        };

        assert_eq!(
            strings(split_between(" match {\n  ", junction)),
            (" match {".to_string(), "\n  ".to_string())
        );
    }

    #[test]
    fn test_modifier_gap_goes_right() {
        let source = SourceFile::new("A.scala", "private val x");
        let val = Node::at(
            NodeKind::Val {
                mods: vec![ModifierToken::new(Modifier::Private, Some(source.pos(0, 7)))],
                name: Name::new("x", Some(source.pos(12, 13))),
                tpt: None,
                rhs: None,
            },
            source.pos(0, 13),
        );
        let children = val.children();
        let junction = Junction {
            parent: &val,
            left: &children[0],
            right: &children[1],
        };

        assert_eq!(
            strings(split_between(" val ", junction)),
            ("".to_string(), " val ".to_string())
        );
    }

    #[test]
    fn test_last_param_before_body() {
        let source = SourceFile::new("A.scala", "def f(a: A) = a");
        let param = Node::at(
            NodeKind::Val {
                mods: vec![],
                name: Name::new("a", Some(source.pos(6, 7))),
                tpt: Some(ident(&source, "A", 9)),
                rhs: None,
            },
            source.pos(6, 10),
        );
        let rhs = ident(&source, "a", 14);
        let def = Node::at(
            NodeKind::Def {
                mods: vec![],
                name: Name::new("f", Some(source.pos(4, 5))),
                tparams: vec![],
                vparamss: vec![vec![param.clone()]],
                tpt: None,
                rhs: Some(rhs.clone()),
            },
            source.pos(0, 15),
        );
        let junction = Junction {
            parent: &def,
            left: &param,
            right: &rhs,
        };

        assert_eq!(
            strings(split_between(") = ", junction)),
            (") ".to_string(), "= ".to_string())
        );
    }

    #[test]
    fn test_parent_leading_split() {
        let source = SourceFile::new("A.scala", "x");
        let block = block(&source);
        let apply = Node::at(
            NodeKind::Apply {
                fun: ident(&source, "x", 0),
                args: vec![],
            },
            source.pos(0, 1),
        );
        let def = Node::at(
            NodeKind::TypeDef {
                mods: vec![],
                name: Name::synthetic("T"),
                tparams: vec![],
                rhs: None,
            },
            source.pos(0, 1),
        );

        assert_eq!(
            strings(split_parent_leading(&block, "{ // start\n  ")),
            ("{".to_string(), " // start\n  ".to_string())
        );
        assert_eq!(
            strings(split_parent_leading(&apply, "new  ")),
            ("new".to_string(), "  ".to_string())
        );
        assert_eq!(
            strings(split_parent_leading(&def, "type ")),
            ("type ".to_string(), "".to_string())
        );
        assert_eq!(
            strings(split_parent_leading(&block, "")),
            ("".to_string(), "".to_string())
        );
    }

    #[test]
    fn test_parent_trailing_split() {
        let source = SourceFile::new("A.scala", "x");
        let block = block(&source);

        assert_eq!(
            strings(split_parent_trailing(&block, " // end\n}")),
            (" // end".to_string(), "\n}".to_string())
        );
        assert_eq!(
            strings(split_parent_trailing(&block, " }")),
            (" ".to_string(), "}".to_string())
        );
        assert_eq!(
            strings(split_parent_trailing(&block, ")")),
            ("".to_string(), ")".to_string())
        );
        assert_eq!(
            strings(split_parent_trailing(&block, "\n  \n}")),
            ("\n  ".to_string(), "\n}".to_string())
        );
        assert_eq!(
            strings(split_parent_trailing(&block, "  ")),
            ("  ".to_string(), "".to_string())
        );
    }
}
