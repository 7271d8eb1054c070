//! Mapping edited nodes back to the original tree
//!
//! An edited node that kept its position is matched against the original
//! compilation unit by position and kind. Nodes without a position are
//! synthesized and have no counterpart.

use std::collections::HashMap;
use std::sync::Arc;

use mago_database::file::FileId;
use tracing::trace;

use crate::position::{Pos, SourceFile};
use crate::tree::{Node, Tree};
use crate::visitor::{visit, Visitor};

/// Lookup of original trees and buffers by file
pub trait CompilationUnits {
    fn tree_for_file(&self, file: FileId) -> Option<Tree>;
    fn source_for_file(&self, file: FileId) -> Option<&SourceFile>;
}

/// A parsed compilation unit
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    pub source: SourceFile,
    pub root: Tree,
}

/// In-memory set of compilation units
#[derive(Debug, Default)]
pub struct UnitSet {
    units: HashMap<FileId, CompilationUnit>,
}

impl UnitSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit, replacing any previous one for the same file
    pub fn insert(&mut self, source: SourceFile, root: Tree) {
        self.units
            .insert(source.id(), CompilationUnit { source, root });
    }

    pub fn with_unit(mut self, source: SourceFile, root: Tree) -> Self {
        self.insert(source, root);
        self
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl CompilationUnits for UnitSet {
    fn tree_for_file(&self, file: FileId) -> Option<Tree> {
        self.units.get(&file).map(|unit| unit.root.clone())
    }

    fn source_for_file(&self, file: FileId) -> Option<&SourceFile> {
        self.units.get(&file).map(|unit| &unit.source)
    }
}

/// Finds original counterparts of edited nodes
pub struct Locator<'u, U: ?Sized> {
    units: &'u U,
}

impl<U: ?Sized> Clone for Locator<'_, U> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<U: ?Sized> Copy for Locator<'_, U> {}

impl<'u, U: CompilationUnits + ?Sized> Locator<'u, U> {
    pub fn new(units: &'u U) -> Self {
        Self { units }
    }

    pub fn units(&self) -> &'u U {
        self.units
    }

    /// The original node with the same position and kind as `node`
    ///
    /// When several original nodes share the position (a wrapper and its
    /// only child, say), the most deeply nested one of the right kind wins.
    pub fn original_of(&self, node: &Node) -> Option<Tree> {
        let query = node.pos()?;
        let root = self.units.tree_for_file(query.file())?;

        let mut finder = RangeFinder {
            query,
            candidates: Vec::new(),
        };
        visit(&mut finder, &root);

        let found = finder
            .candidates
            .into_iter()
            .rev()
            .find(|candidate| candidate.tag() == node.tag());

        trace!(
            tag = %node.tag(),
            start = query.start(),
            end = query.end(),
            hit = found.is_some(),
            "locate original"
        );
        found
    }

    /// The node whose structural children contain `original`
    pub fn original_parent_of(&self, original: &Tree) -> Option<Tree> {
        let pos = original.pos()?;
        let root = self.units.tree_for_file(pos.file())?;

        let mut finder = ParentFinder {
            target: original.clone(),
            target_pos: pos,
            parent: None,
        };
        visit(&mut finder, &root);
        finder.parent
    }

    pub fn source_for(&self, pos: &Pos) -> Option<&'u SourceFile> {
        self.units.source_for_file(pos.file())
    }
}

struct RangeFinder {
    query: Pos,
    candidates: Vec<Tree>,
}

impl Visitor for RangeFinder {
    fn visit_node(&mut self, node: &Tree) -> bool {
        match node.pos() {
            Some(pos) => {
                if pos.same_range(&self.query) {
                    self.candidates.push(node.clone());
                }
                pos.includes(&self.query)
            }
            None => true,
        }
    }
}

struct ParentFinder {
    target: Tree,
    target_pos: Pos,
    parent: Option<Tree>,
}

impl Visitor for ParentFinder {
    fn visit_node(&mut self, node: &Tree) -> bool {
        if let Some(pos) = node.pos() {
            if !pos.includes(&self.target_pos) {
                return false;
            }
        }
        if node
            .children()
            .iter()
            .any(|child| Arc::ptr_eq(child, &self.target))
        {
            self.parent = Some(node.clone());
        }
        true
    }

    fn is_done(&self) -> bool {
        self.parent.is_some()
    }
}
