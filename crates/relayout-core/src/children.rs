//! Structural child extraction
//!
//! Produces the ordered list of a node's children as they appear in source.
//! Names and modifiers that carry a position become pseudo-nodes, and a
//! template's mixed body is split into its source zones.

use crate::position::Pos;
use crate::tree::{Modifier, ModifierToken, Name, Node, NodeKind, Tree};

/// Children of `node` in source order, absent slots omitted
pub(crate) fn structural_children(node: &Node) -> Vec<Tree> {
    let mut out = Vec::new();

    match node.kind() {
        NodeKind::Package { pid, stats } => {
            out.push(pid.clone());
            out.extend(stats.iter().cloned());
        }
        NodeKind::Class {
            mods,
            name,
            tparams,
            template,
        } => {
            push_modifiers(&mut out, mods);
            push_name(&mut out, name);
            out.extend(tparams.iter().cloned());
            out.push(template.clone());
        }
        NodeKind::Module {
            mods,
            name,
            template,
        } => {
            push_modifiers(&mut out, mods);
            push_name(&mut out, name);
            out.push(template.clone());
        }
        NodeKind::Template {
            parents,
            super_args,
            self_type,
            body,
        } => template_zones(&mut out, parents, super_args, self_type.as_ref(), body),
        NodeKind::Val {
            mods,
            name,
            tpt,
            rhs,
        } => {
            push_modifiers(&mut out, mods);
            push_name(&mut out, name);
            out.extend(tpt.iter().cloned());
            out.extend(rhs.iter().cloned());
        }
        NodeKind::Def {
            mods,
            name,
            tparams,
            vparamss,
            tpt,
            rhs,
        } => {
            push_modifiers(&mut out, mods);
            push_name(&mut out, name);
            out.extend(tparams.iter().cloned());
            out.extend(vparamss.iter().flatten().cloned());
            out.extend(tpt.iter().cloned());
            out.extend(rhs.iter().cloned());
        }
        NodeKind::TypeDef {
            mods,
            name,
            tparams,
            rhs,
        } => {
            push_modifiers(&mut out, mods);
            push_name(&mut out, name);
            out.extend(tparams.iter().cloned());
            out.extend(rhs.iter().cloned());
        }
        NodeKind::Ident { .. }
        | NodeKind::Literal { .. }
        | NodeKind::NameTree { .. }
        | NodeKind::ModifierTree { .. } => {}
        NodeKind::This { qual } => {
            if let Some(qual) = qual {
                push_name(&mut out, qual);
            }
        }
        NodeKind::Select { qualifier, name } => {
            out.push(qualifier.clone());
            push_name(&mut out, name);
        }
        NodeKind::Apply { fun, args } | NodeKind::SuperCall { fun, args } => {
            out.push(fun.clone());
            out.extend(args.iter().cloned());
        }
        NodeKind::New { tpt } => out.push(tpt.clone()),
        NodeKind::Typed { expr, tpt } => {
            out.push(expr.clone());
            out.push(tpt.clone());
        }
        NodeKind::Match { selector, cases } => {
            out.push(selector.clone());
            out.extend(cases.iter().cloned());
        }
        NodeKind::Case { pat, guard, body } => {
            out.push(pat.clone());
            out.extend(guard.iter().cloned());
            out.push(body.clone());
        }
        NodeKind::Bind { name, body } => {
            push_name(&mut out, name);
            out.push(body.clone());
        }
        NodeKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            out.push(cond.clone());
            out.push(then_branch.clone());
            out.extend(else_branch.iter().cloned());
        }
        NodeKind::Function { params, body } => {
            out.extend(params.iter().cloned());
            out.push(body.clone());
        }
        NodeKind::Import { expr, selectors } => {
            out.push(expr.clone());
            out.extend(selectors.iter().cloned());
        }
        NodeKind::ImportSelector { name, rename } => {
            push_name(&mut out, name);
            if let Some(rename) = rename {
                push_name(&mut out, rename);
            }
        }
        NodeKind::Block { stats } => out.extend(stats.iter().cloned()),
        NodeKind::SelfType { name, tpt } => {
            push_name(&mut out, name);
            out.extend(tpt.iter().cloned());
        }
    }

    out
}

fn push_name(out: &mut Vec<Tree>, name: &Name) {
    if let Some(pos) = name.pos {
        out.push(Node::at(
            NodeKind::NameTree {
                name: name.text.clone(),
            },
            pos,
        ));
    }
}

fn push_modifiers(out: &mut Vec<Tree>, mods: &[ModifierToken]) {
    for token in mods {
        if let Some(pos) = token.pos {
            out.push(Node::at(NodeKind::ModifierTree { flag: token.flag }, pos));
        }
    }
}

/// Constructor parameters, early initializers, parents, then self type and members
fn template_zones(
    out: &mut Vec<Tree>,
    parents: &[Tree],
    super_args: &[Tree],
    self_type: Option<&Tree>,
    body: &[Tree],
) {
    let mut params = Vec::new();
    let mut early = Vec::new();
    let mut members: Vec<Tree> = self_type.into_iter().cloned().collect();

    for stat in body {
        if stat.has_modifier(Modifier::ParamAccessor) {
            params.push(stat.clone());
        } else if stat.has_modifier(Modifier::PreSuper) {
            early.push(stat.clone());
        } else {
            members.push(stat.clone());
        }
    }

    let mut parent_zone = Vec::with_capacity(parents.len());
    match parents.split_first() {
        Some((first, rest)) if !super_args.is_empty() => {
            parent_zone.push(super_call(first, super_args));
            parent_zone.extend(rest.iter().cloned());
        }
        _ => parent_zone.extend(parents.iter().cloned()),
    }

    for mut zone in [params, early, parent_zone, members] {
        sort_by_start(&mut zone);
        out.append(&mut zone);
    }
}

/// Reify the first parent applied to the super constructor arguments
fn super_call(parent: &Tree, args: &[Tree]) -> Tree {
    let pos = match (parent.pos(), args.last().and_then(|arg| arg.pos())) {
        (Some(start), Some(end)) => Some(Pos::range(
            start.file(),
            start.start() as u32,
            end.end() as u32,
        )),
        _ => None,
    };

    Node::new(
        NodeKind::SuperCall {
            fun: parent.clone(),
            args: args.to_vec(),
        },
        pos,
    )
}

/// Sort a zone by start offset. Zones holding synthesized members keep the
/// order the transformation gave them.
fn sort_by_start(zone: &mut [Tree]) {
    if zone.iter().all(|t| t.pos().is_some()) {
        zone.sort_by_key(|t| t.pos().map(|p| p.start()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::SourceFile;
    use crate::tree::{same, Tag};

    fn ident(source: &SourceFile, name: &str, start: u32) -> Tree {
        Node::at(
            NodeKind::Ident { name: name.into() },
            source.pos(start, start + name.len() as u32),
        )
    }

    #[test]
    fn test_leaf_has_no_children() {
        let source = SourceFile::new("A.scala", "x");
        assert!(ident(&source, "x", 0).children().is_empty());
    }

    #[test]
    fn test_val_children_include_positioned_pseudo_nodes() {
        let source = SourceFile::new("A.scala", "private val x: T = y");
        let val = Node::at(
            NodeKind::Val {
                mods: vec![
                    ModifierToken::new(Modifier::Private, Some(source.pos(0, 7))),
                    ModifierToken::new(Modifier::Final, None),
                ],
                name: Name::new("x", Some(source.pos(12, 13))),
                tpt: Some(ident(&source, "T", 15)),
                rhs: Some(ident(&source, "y", 19)),
            },
            source.pos(0, 20),
        );

        let tags: Vec<Tag> = val.children().iter().map(|c| c.tag()).collect();
        assert_eq!(
            tags,
            vec![Tag::ModifierTree, Tag::NameTree, Tag::Ident, Tag::Ident]
        );
    }

    #[test]
    fn test_unpositioned_name_is_omitted() {
        let source = SourceFile::new("A.scala", "a");
        let select = Node::synthetic(NodeKind::Select {
            qualifier: ident(&source, "a", 0),
            name: Name::synthetic("b"),
        });
        assert_eq!(select.children().len(), 1);
    }

    #[test]
    fn test_children_are_cached() {
        let source = SourceFile::new("A.scala", "a.b");
        let select = Node::at(
            NodeKind::Select {
                qualifier: ident(&source, "a", 0),
                name: Name::new("b", Some(source.pos(2, 3))),
            },
            source.pos(0, 3),
        );

        let first = select.children()[1].clone();
        let second = select.children()[1].clone();
        assert!(same(&first, &second));
    }

    #[test]
    fn test_template_zones() {
        let source = SourceFile::new("A.scala", "(p: Int) extends B(p) with C { m }");
        let param = |name: &str, start: u32| {
            Node::at(
                NodeKind::Val {
                    mods: vec![ModifierToken::new(Modifier::ParamAccessor, None)],
                    name: Name::new(name, Some(source.pos(start, start + 1))),
                    tpt: Some(ident(&source, "Int", 4)),
                    rhs: None,
                },
                source.pos(start, 7),
            )
        };
        let b = ident(&source, "B", 17);
        let arg = ident(&source, "p", 19);
        let c = ident(&source, "C", 27);
        let member = ident(&source, "m", 31);

        let template = Node::at(
            NodeKind::Template {
                parents: vec![b.clone(), c.clone()],
                super_args: vec![arg.clone()],
                self_type: None,
                // members listed before the parameter on purpose
                body: vec![member.clone(), param("p", 1)],
            },
            source.pos(0, 34),
        );

        let children = template.children();
        let tags: Vec<Tag> = children.iter().map(|c| c.tag()).collect();
        assert_eq!(tags, vec![Tag::Val, Tag::SuperCall, Tag::Ident, Tag::Ident]);

        let call = &children[1];
        let pos = call.pos().unwrap();
        assert_eq!((pos.start(), pos.end()), (17, 20));
        assert_eq!(source.slice(&pos).unwrap(), "B(p");
        assert!(same(&call.children()[0], &b));
        assert!(same(&call.children()[1], &arg));
        assert!(same(&children[2], &c));
        assert!(same(&children[3], &member));
    }

    #[test]
    fn test_template_without_super_args_keeps_parents() {
        let source = SourceFile::new("A.scala", "extends B");
        let b = ident(&source, "B", 8);
        let template = Node::at(
            NodeKind::Template {
                parents: vec![b.clone()],
                super_args: vec![],
                self_type: None,
                body: vec![],
            },
            source.pos(0, 9),
        );
        assert_eq!(template.children().len(), 1);
        assert!(same(&template.children()[0], &b));
    }

    #[test]
    fn test_synthesized_members_keep_given_order() {
        let source = SourceFile::new("A.scala", "{ a }");
        let a = ident(&source, "a", 2);
        let fresh = Node::synthetic(NodeKind::Ident { name: "z".into() });
        let template = Node::at(
            NodeKind::Template {
                parents: vec![],
                super_args: vec![],
                self_type: None,
                body: vec![fresh.clone(), a.clone()],
            },
            source.pos(0, 5),
        );
        assert!(same(&template.children()[0], &fresh));
        assert!(same(&template.children()[1], &a));
    }
}
