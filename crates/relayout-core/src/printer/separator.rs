//! Separators between adjacent children of a rebuilt node

use crate::tree::{same, Modifier, Node, NodeKind, Tag, Tree};

/// Separator expected between `left` and `right` inside `parent`
///
/// `line_break` is the line ending followed by the statement indentation.
pub(crate) fn separator(parent: &Node, left: &Tree, right: &Tree, line_break: &str) -> String {
    let sep = match parent.kind() {
        NodeKind::Apply { fun, .. } | NodeKind::SuperCall { fun, .. } => {
            if same(fun, left) {
                "("
            } else {
                ", "
            }
        }
        NodeKind::Block { .. } | NodeKind::Package { .. } => return line_break.to_string(),
        NodeKind::Template { parents, .. } => {
            let is_parent = |node: &Tree| within(parents, node) || node.tag() == Tag::SuperCall;
            let is_param = |node: &Tree| node.has_modifier(Modifier::ParamAccessor);
            if is_param(left) && is_param(right) {
                ", "
            } else if is_parent(right) && is_parent(left) {
                " with "
            } else if is_parent(right) {
                " extends "
            } else {
                return line_break.to_string();
            }
        }
        NodeKind::Match { selector, .. } => {
            if same(selector, left) {
                " match {"
            } else {
                return line_break.to_string();
            }
        }
        NodeKind::Case { pat, guard, .. } => {
            if same(pat, left) && is_opt(guard, right) {
                " if "
            } else {
                " => "
            }
        }
        NodeKind::If { cond, .. } => {
            if same(cond, left) {
                " "
            } else {
                " else "
            }
        }
        NodeKind::Function { body, .. } => {
            if same(body, right) {
                " => "
            } else {
                ", "
            }
        }
        NodeKind::Select { .. } => ".",
        NodeKind::Typed { .. } | NodeKind::SelfType { .. } => ": ",
        NodeKind::Bind { .. } => " @ ",
        NodeKind::Import { expr, .. } => {
            if same(expr, left) {
                "."
            } else {
                ", "
            }
        }
        NodeKind::ImportSelector { .. } => " => ",
        NodeKind::Val { tpt, rhs, .. } => {
            if is_opt(rhs, right) {
                " = "
            } else if is_opt(tpt, right) {
                ": "
            } else {
                " "
            }
        }
        NodeKind::Def {
            tparams,
            vparamss,
            tpt,
            rhs,
            ..
        } => {
            let params: Vec<Tree> = vparamss.iter().flatten().cloned().collect();
            let same_list = vparamss
                .iter()
                .any(|list| within(list, left) && within(list, right));
            if is_opt(rhs, right) {
                " = "
            } else if is_opt(tpt, right) {
                ": "
            } else if tparams.first().is_some_and(|t| same(t, right)) {
                "["
            } else if within(tparams, left) && within(tparams, right) {
                ", "
            } else if same_list {
                ", "
            } else if within(&params, right) {
                "("
            } else {
                " "
            }
        }
        NodeKind::Class { tparams, .. } | NodeKind::TypeDef { tparams, .. } => {
            if tparams.first().is_some_and(|t| same(t, right)) {
                "["
            } else if within(tparams, left) && within(tparams, right) {
                ", "
            } else if matches!(parent.kind(), NodeKind::TypeDef { rhs: Some(r), .. } if same(r, right))
            {
                " = "
            } else {
                " "
            }
        }
        _ => " ",
    };
    sep.to_string()
}

/// Separator expected between a parent's own prefix and its first child
///
/// Only statement sequences open with one: the first statement of a block
/// or the first member of a template body starts on its own line.
pub(crate) fn opening_separator(parent: &Node, first: &Tree, line_break: &str) -> Option<String> {
    match parent.kind() {
        NodeKind::Block { .. } => Some(line_break.to_string()),
        NodeKind::Template { parents, .. } => {
            let heads_body = !within(parents, first)
                && first.tag() != Tag::SuperCall
                && !first.has_modifier(Modifier::ParamAccessor);
            heads_body.then(|| line_break.to_string())
        }
        _ => None,
    }
}

fn is_opt(slot: &Option<Tree>, node: &Tree) -> bool {
    slot.as_ref().is_some_and(|s| same(s, node))
}

fn within(slots: &[Tree], node: &Tree) -> bool {
    slots.iter().any(|s| same(s, node))
}

/// Part of `separator` still missing at the junction of `left` and `right`
///
/// Nothing is inserted when either side already carries the separator's
/// non-blank core. Whitespace the fragments already have is not doubled.
/// Returns the text to insert and `right`, minus blanks that would follow
/// an opener such as `(` carried by `left`.
pub(crate) fn glue<'r>(left: &str, separator: &str, right: &'r str) -> (String, &'r str) {
    let core = separator.trim();
    let left_pad = &left[left.trim_end().len()..];
    let right_pad = &right[..right.len() - right.trim_start().len()];

    if core.is_empty() {
        let satisfied = if separator.contains('\n') {
            left_pad.contains('\n') || right_pad.contains('\n')
        } else {
            left.is_empty() || !left_pad.is_empty() || !right_pad.is_empty()
        };
        let insert = if satisfied { "" } else { separator };
        return (insert.to_string(), right);
    }

    if left.ends_with(core) && !separator.ends_with(char::is_whitespace) {
        return (String::new(), right.trim_start_matches([' ', '\t']));
    }

    if left.trim_end().ends_with(core) || right.trim_start().starts_with(core) {
        return (String::new(), right);
    }

    let mut sep = separator;
    if !left_pad.is_empty() {
        sep = sep.trim_start();
    }
    if !right_pad.is_empty() {
        sep = sep.trim_end();
    }
    (sep.to_string(), right)
}
