//! Printing that reuses original source text
//!
//! Unchanged sub-trees are spliced from the original buffer together with
//! their comments and whitespace. Changed nodes are rebuilt from their
//! children, and nodes a transformation created are handed to a
//! [`FallbackPrinter`].

mod pretty;
mod separator;

use tracing::warn;

pub use pretty::PrettyPrinter;

use crate::changes::{ChangeDiscoverer, ChangeRecord, ChangedSet};
use crate::config::RegenConfig;
use crate::edit::Edit;
use crate::error::{PrintError, RegenError};
use crate::layout::{self, indent_lines, reindent, Layout};
use crate::locator::{CompilationUnits, Locator};
use crate::position::{indentation_at, Pos, SourceFile};
use crate::tree::{same, Node, NodeKind, Tag, Tree};
use separator::{glue, opening_separator, separator};

/// Renders nodes that have no original text
pub trait FallbackPrinter {
    fn print(&self, node: &Node) -> Result<String, PrintError>;
}

/// Printed text of a node with its surrounding layout
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragment {
    pub leading: Layout,
    pub center: String,
    pub trailing: Layout,
    /// The center came from the fallback printer
    pub fresh: bool,
}

impl Fragment {
    fn fresh(center: String) -> Self {
        Self {
            center,
            fresh: true,
            ..Self::default()
        }
    }

    /// Leading layout, center and trailing layout joined
    pub fn text(&self) -> String {
        format!("{}{}{}", self.leading, self.center, self.trailing)
    }
}

/// A node the fallback printer could not render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: Tag,
    pub message: String,
}

/// Output of a regeneration
#[derive(Debug, Clone, Default)]
pub struct Regeneration {
    pub edits: Vec<Edit>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Regeneration {
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}

/// Prints edited trees, reusing original text wherever it is still valid
pub struct ReusingPrinter<'a, U: ?Sized, F: ?Sized> {
    locator: Locator<'a, U>,
    fallback: &'a F,
    config: &'a RegenConfig,
    diagnostics: Vec<Diagnostic>,
}

impl<'a, U, F> ReusingPrinter<'a, U, F>
where
    U: CompilationUnits + ?Sized,
    F: FallbackPrinter + ?Sized,
{
    pub fn new(locator: Locator<'a, U>, fallback: &'a F, config: &'a RegenConfig) -> Self {
        Self {
            locator,
            fallback,
            config,
            diagnostics: Vec::new(),
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Print `node`, treating the nodes in `changed` as modified
    pub fn print(&mut self, node: &Tree, changed: &ChangedSet) -> Result<Fragment, RegenError> {
        self.print_in(node, changed, None)
    }

    /// Replacement text for the original range of a change
    pub fn print_region(&mut self, change: &ChangeRecord) -> Result<String, RegenError> {
        let fragment = self.print(&change.top, &change.changed)?;
        if !fragment.fresh {
            return Ok(fragment.center);
        }
        let source = self.source_for(&change.range)?;
        let indent = indentation_at(source.text(), change.range.start());
        Ok(indent_lines(&fragment.center, indent))
    }

    /// `context` is the original of the edited parent, if it has one
    fn print_in(
        &mut self,
        node: &Tree,
        changed: &ChangedSet,
        context: Option<&Tree>,
    ) -> Result<Fragment, RegenError> {
        let Some(original) = self.locator.original_of(node) else {
            return Ok(Fragment::fresh(self.print_new(node)));
        };
        let Some(pos) = original.pos() else {
            return Ok(Fragment::fresh(self.print_new(node)));
        };

        let (leading, trailing) = layout::reconstruct(&self.locator, &original)?;
        let center = if is_pristine(node, &original, changed) {
            self.source_for(&pos)?.slice(&pos)?.to_string()
        } else {
            self.print_changed(node, &original, pos, changed)?
        };

        let fragment = Fragment {
            leading,
            center,
            trailing,
            fresh: false,
        };
        self.relocate(fragment, &original, context)
    }

    /// Parent prefix, children joined with separators, parent suffix
    fn print_changed(
        &mut self,
        node: &Tree,
        original: &Tree,
        pos: Pos,
        changed: &ChangedSet,
    ) -> Result<String, RegenError> {
        let children = node.children();
        if children.is_empty() {
            return Ok(self.print_leaf(node));
        }

        let source = self.source_for(&pos)?;
        let Some((prefix, suffix)) = layout::parent_affixes(source, original)? else {
            return Ok(self.print_new(node));
        };

        let base = indentation_at(source.text(), pos.start()).to_string();
        let line_break = format!(
            "{}{}",
            self.config.line_ending.as_str(),
            self.child_indent(source, original, &base)
        );

        let mut out = prefix.to_string();
        for (i, child) in children.iter().enumerate() {
            let fragment = self.print_in(child, changed, Some(original))?;
            let full = fragment.text();
            let mut text = full.as_str();

            let expected = if i > 0 {
                Some(separator(node, &children[i - 1], child, &line_break))
            } else if fragment.fresh {
                opening_separator(node, child, &line_break)
            } else {
                None
            };
            if let Some(expected) = expected {
                let (insert, rest) = glue(&out, &expected, text);
                out.push_str(&insert);
                text = rest;
            }

            if fragment.fresh {
                let indent = current_indent(&out, &base);
                out.push_str(&indent_lines(text, &indent));
            } else {
                out.push_str(text);
            }
        }
        out.push_str(suffix.as_str());
        Ok(out)
    }

    /// Leaves print their own content
    fn print_leaf(&mut self, node: &Tree) -> String {
        match node.kind() {
            NodeKind::Ident { name } | NodeKind::NameTree { name } => name.clone(),
            NodeKind::Literal { value } => value.to_string(),
            NodeKind::This { qual: None } => "this".to_string(),
            _ => self.print_new(node),
        }
    }

    fn print_new(&mut self, node: &Node) -> String {
        match self.fallback.print(node) {
            Ok(text) => text,
            Err(err) => {
                warn!(kind = %node.tag(), error = %err, "fallback printer failed, emitting placeholder");
                self.diagnostics.push(Diagnostic {
                    kind: node.tag(),
                    message: err.to_string(),
                });
                format!("/* {} */", node.tag())
            }
        }
    }

    /// Reindent a reused fragment that moved to another enclosing node
    fn relocate(
        &self,
        fragment: Fragment,
        original: &Tree,
        context: Option<&Tree>,
    ) -> Result<Fragment, RegenError> {
        let Some(context) = context else {
            return Ok(fragment);
        };
        let Some(parent) = self.locator.original_parent_of(original) else {
            return Ok(fragment);
        };
        if same(&parent, context) {
            return Ok(fragment);
        }

        let text = fragment.text();
        if !text.contains('\n') {
            return Ok(fragment);
        }
        let (Some(from), Some(to)) = (parent.pos(), context.pos()) else {
            return Ok(fragment);
        };

        let from = indentation_at(self.source_for(&from)?.text(), from.start());
        let to = indentation_at(self.source_for(&to)?.text(), to.start());
        if from == to {
            return Ok(fragment);
        }

        Ok(Fragment {
            center: reindent(&text, from, to),
            ..Fragment::default()
        })
    }

    /// Indentation of statements inside `original`
    fn child_indent(&self, source: &SourceFile, original: &Tree, base: &str) -> String {
        let first = original.children().iter().find_map(|c| c.layout_pos());
        if let Some(first) = first {
            if let Some(head) = source.text().get(..first.start()) {
                let line_start = head.rfind('\n').map_or(0, |nl| nl + 1);
                let before = &head[line_start..];
                if line_start > 0 && before.trim().is_empty() {
                    return before.to_string();
                }
            }
        }
        format!("{}{}", base, self.config.indent.unit())
    }

    fn source_for(&self, pos: &Pos) -> Result<&'a SourceFile, RegenError> {
        self.locator
            .source_for(pos)
            .ok_or(RegenError::MissingSource(pos.file()))
    }
}

/// Identical to its original, or rebuilt without any change underneath
fn is_pristine(node: &Tree, original: &Tree, changed: &ChangedSet) -> bool {
    if same(node, original) {
        return true;
    }
    if changed.contains(node) || !node.same_shape(original) {
        return false;
    }
    let ours = node.children();
    let theirs = original.children();
    ours.len() == theirs.len()
        && ours
            .iter()
            .zip(theirs)
            .all(|(a, b)| a.same_slot(b) && is_pristine(a, b, changed))
}

/// Indentation of the line `text` ends on, `base` while still on the first line
fn current_indent(text: &str, base: &str) -> String {
    if text.contains('\n') {
        indentation_at(text, text.len()).to_string()
    } else {
        base.to_string()
    }
}

/// Regenerate the text of every region an edited tree changes
///
/// Returns one edit per region, replacing the region's original range.
/// An edited tree identical to its original produces no edits.
pub fn regenerate<U, F>(
    units: &U,
    fallback: &F,
    config: &RegenConfig,
    edited_root: &Tree,
) -> Result<Regeneration, RegenError>
where
    U: CompilationUnits + ?Sized,
    F: FallbackPrinter + ?Sized,
{
    let locator = Locator::new(units);
    if locator.original_of(edited_root).is_none() {
        return Err(RegenError::NoOriginal);
    }

    let changes = ChangeDiscoverer::new(locator).find_changes(edited_root);
    let mut printer = ReusingPrinter::new(locator, fallback, config);

    let mut edits = Vec::with_capacity(changes.len());
    for change in &changes {
        let text = printer.print_region(change)?;
        edits.push(Edit::new(
            change.range.span(),
            text,
            format!("Regenerate {}", change.top.tag()),
        ));
    }

    Ok(Regeneration {
        edits,
        diagnostics: printer.into_diagnostics(),
    })
}
