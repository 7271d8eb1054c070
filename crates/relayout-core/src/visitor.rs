//! Depth-first traversal over structural children
//!
//! Implementors decide per node whether to descend, and can stop the whole
//! walk early once they have what they need.

use crate::tree::Tree;

/// Trait for walking program trees parents-before-children
pub trait Visitor {
    /// Called for each node. Return `true` to continue into its children.
    fn visit_node(&mut self, _node: &Tree) -> bool {
        true
    }

    /// Return `true` to end the walk
    fn is_done(&self) -> bool {
        false
    }
}

/// Walk `root` and its structural children in source order
pub fn visit<V: Visitor + ?Sized>(visitor: &mut V, root: &Tree) {
    traverse(visitor, root);
}

fn traverse<V: Visitor + ?Sized>(visitor: &mut V, node: &Tree) {
    if visitor.is_done() || !visitor.visit_node(node) {
        return;
    }
    for child in node.children() {
        if visitor.is_done() {
            return;
        }
        traverse(visitor, child);
    }
}
