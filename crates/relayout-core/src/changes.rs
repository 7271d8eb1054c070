//! Discovery of the original regions an edit touches
//!
//! The edited tree is walked top-down next to the original. Sub-trees the
//! transformation handed back untouched are pruned, nodes whose own content
//! changed become regions, and a statement replaced inside a block is
//! narrowed to just that statement.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::locator::{CompilationUnits, Locator};
use crate::position::Pos;
use crate::tree::{node_key, Node, Tree};

/// Nodes of a region considered modified, keyed by identity
#[derive(Debug, Default, Clone)]
pub struct ChangedSet {
    keys: HashSet<usize>,
    // keeps the keyed nodes alive so their addresses stay unique
    nodes: Vec<Tree>,
}

impl ChangedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, node: &Tree) -> bool {
        let inserted = self.keys.insert(node_key(node));
        if inserted {
            self.nodes.push(node.clone());
        }
        inserted
    }

    pub fn contains(&self, node: &Tree) -> bool {
        self.keys.contains(&node_key(node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tree> {
        self.nodes.iter()
    }
}

/// One region of the original source that must be regenerated
#[derive(Debug, Clone)]
pub struct ChangeRecord {
    /// Highest edited node covering every change of the region
    pub top: Tree,
    /// Original range to replace
    pub range: Pos,
    pub changed: ChangedSet,
}

/// An edited node paired with its original
#[derive(Debug, Clone)]
pub struct Counterpart<'t> {
    edited: &'t Tree,
    original: Tree,
}

impl<'t> Counterpart<'t> {
    pub fn edited(&self) -> &'t Tree {
        self.edited
    }

    pub fn original(&self) -> &Tree {
        &self.original
    }

    /// The edited node is the original instance itself
    pub fn is_unchanged(&self) -> bool {
        Arc::ptr_eq(self.edited, &self.original)
    }

    pub fn internally_changed(&self) -> bool {
        self.edited.content_differs(&self.original)
    }

    /// Child lists differ by position or kind, pairwise
    pub fn children_changed(&self) -> bool {
        let ours = self.edited.children();
        let theirs = self.original.children();
        ours.len() != theirs.len()
            || ours
                .iter()
                .zip(theirs)
                .any(|(edited, original)| !edited.same_slot(original))
    }
}

/// Finds the regions of an edited tree that need regeneration
pub struct ChangeDiscoverer<'u, U: ?Sized> {
    locator: Locator<'u, U>,
}

impl<'u, U: CompilationUnits + ?Sized> ChangeDiscoverer<'u, U> {
    pub fn new(locator: Locator<'u, U>) -> Self {
        Self { locator }
    }

    pub fn counterpart<'t>(&self, edited: &'t Tree) -> Option<Counterpart<'t>> {
        self.locator
            .original_of(edited)
            .map(|original| Counterpart { edited, original })
    }

    pub fn is_unchanged(&self, node: &Tree) -> bool {
        self.counterpart(node).is_some_and(|cp| cp.is_unchanged())
    }

    /// Nodes without an original count as changed
    pub fn is_internally_changed(&self, node: &Tree) -> bool {
        self.counterpart(node)
            .map_or(true, |cp| cp.internally_changed())
    }

    /// Non-overlapping regions sorted by start offset
    pub fn find_changes(&self, root: &Tree) -> Vec<ChangeRecord> {
        let mut regions = Vec::new();
        self.search(root, &mut regions);
        let merged = merge_regions(regions);
        debug!(regions = merged.len(), "discovered changes");
        merged
    }

    fn search(&self, node: &Tree, out: &mut Vec<ChangeRecord>) {
        let Some(cp) = self.counterpart(node) else {
            // reached only below a region or for an unpositioned root
            debug!(tag = %node.tag(), "skipping node without original");
            return;
        };
        if cp.is_unchanged() {
            return;
        }
        let Some(range) = cp.original().pos() else {
            return;
        };

        if cp.internally_changed() {
            out.push(self.region(node, range));
            for child in node.children() {
                self.search(child, out);
            }
        } else if cp.children_changed() {
            match narrow(&cp) {
                Some(index) => {
                    let edited = node.children();
                    let original = &cp.original().children()[index];
                    // narrowing requires the original child to be positioned
                    let child_range = original.pos().unwrap_or(range);
                    debug!(
                        tag = %node.tag(),
                        index,
                        start = child_range.start(),
                        end = child_range.end(),
                        "narrowed region to replaced statement"
                    );
                    out.push(self.region(&edited[index], child_range));
                    for (i, child) in edited.iter().enumerate() {
                        if i != index {
                            self.search(child, out);
                        }
                    }
                }
                None => out.push(self.region(node, range)),
            }
        } else {
            for child in node.children() {
                self.search(child, out);
            }
        }
    }

    fn region(&self, top: &Tree, range: Pos) -> ChangeRecord {
        let mut changed = ChangedSet::new();
        self.collect_changed(top, &mut changed);
        debug!(
            tag = %top.tag(),
            start = range.start(),
            end = range.end(),
            changed = changed.len(),
            "region"
        );
        ChangeRecord {
            top: top.clone(),
            range,
            changed,
        }
    }

    fn collect_changed(&self, node: &Tree, changed: &mut ChangedSet) {
        match self.counterpart(node) {
            None => {
                changed.insert(node);
            }
            Some(cp) if cp.is_unchanged() => return,
            Some(cp) => {
                if cp.internally_changed() || cp.children_changed() {
                    changed.insert(node);
                }
            }
        }
        for child in node.children() {
            self.collect_changed(child, changed);
        }
    }
}

/// Index of the single replaced statement of a sequence container
fn narrow(cp: &Counterpart<'_>) -> Option<usize> {
    let edited: &Node = cp.edited();
    if !edited.is_sequence() {
        return None;
    }

    let ours = edited.children();
    let theirs = cp.original().children();
    if ours.len() != theirs.len() {
        return None;
    }

    let mut differing = ours
        .iter()
        .zip(theirs)
        .enumerate()
        .filter(|(_, (a, b))| !a.same_slot(b));

    match (differing.next(), differing.next()) {
        (Some((index, (edited, original))), None)
            if edited.pos().is_none() && original.pos().is_some() =>
        {
            Some(index)
        }
        _ => None,
    }
}

/// Drop regions nested in or duplicating another, then sort by start
pub fn merge_regions(regions: Vec<ChangeRecord>) -> Vec<ChangeRecord> {
    let ranges: Vec<Pos> = regions.iter().map(|r| r.range).collect();

    let mut merged: Vec<ChangeRecord> = regions
        .into_iter()
        .enumerate()
        .filter(|(i, _)| {
            let range = &ranges[*i];
            let nested = ranges.iter().any(|other| other.properly_includes(range));
            let duplicate = ranges[..*i]
                .iter()
                .any(|other| other.includes(range) && range.includes(other));
            !nested && !duplicate
        })
        .map(|(_, region)| region)
        .collect();

    merged.sort_by_key(|r| r.range.start());
    merged
}
