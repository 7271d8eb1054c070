//! relayout-core: Layout-preserving source regeneration
//!
//! This crate provides:
//! - `Tree`/`Node`: positioned program trees shared by identity
//! - `Locator`: finds the original node behind an edited one
//! - `ChangeDiscoverer`: minimal regions of an edited tree that need reprinting
//! - `layout`: recovery of the whitespace and comments around original nodes
//! - `ReusingPrinter`/`regenerate()`: prints changed regions as text edits
//! - `apply_edits()`: applies the edits to the original buffer
//! - `interchange`: JSON loading of original and edited trees

mod children;
pub mod changes;
pub mod config;
mod edit;
pub mod error;
pub mod interchange;
pub mod layout;
pub mod locator;
pub mod position;
pub mod printer;
pub mod tree;
pub mod visitor;

pub use changes::{merge_regions, ChangeDiscoverer, ChangeRecord, ChangedSet};
pub use config::{IndentStyle, LineEnding, RegenConfig};
pub use edit::{apply_edits, Edit, EditError};
pub use error::{PrintError, RegenError};
pub use interchange::{load_edited, load_original, LoadedTree};
pub use layout::Layout;
pub use locator::{CompilationUnit, CompilationUnits, Locator, UnitSet};
pub use position::{Pos, SourceFile};
pub use printer::{
    regenerate, Diagnostic, FallbackPrinter, PrettyPrinter, Regeneration, ReusingPrinter,
};
pub use tree::{same, Constant, Modifier, ModifierToken, Name, Node, NodeKind, Tag, Tree};
pub use visitor::{visit, Visitor};
