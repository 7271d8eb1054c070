//! Layout reconstruction
//!
//! The whitespace and comments around an original node are recovered from
//! the gaps between it, its parent's bounds and its positioned siblings.
//! Every gap is split exactly once, so adjacent layouts never share text.

mod indent;
mod rules;
mod split;

use std::fmt;
use std::ops::Add;

pub use indent::{indent_lines, reindent};
pub use rules::{comment_spans, split_index, Gap, RuleMatch, Tier};
pub use split::{split_between, split_parent_leading, split_parent_trailing, Junction};

use crate::error::RegenError;
use crate::locator::{CompilationUnits, Locator};
use crate::position::SourceFile;
use crate::tree::{same, Tree};

/// A run of whitespace and comments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Layout {
    text: String,
}

impl Layout {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn has_comment(&self) -> bool {
        !comment_spans(&self.text).is_empty()
    }

    pub fn contains_newline(&self) -> bool {
        self.text.contains('\n')
    }

    pub fn split_at(&self, index: usize) -> (Layout, Layout) {
        let (left, right) = self.text.split_at(index);
        (Layout::new(left), Layout::new(right))
    }
}

impl Add for Layout {
    type Output = Layout;

    fn add(mut self, rhs: Layout) -> Layout {
        self.text.push_str(&rhs.text);
        self
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Text between two offsets, empty when they cross
pub(crate) fn gap(source: &SourceFile, from: usize, to: usize) -> Result<&str, RegenError> {
    if from >= to {
        return Ok("");
    }
    source.slice_range(from, to)
}

/// Leading and trailing layout of an original node
pub fn reconstruct<U: CompilationUnits + ?Sized>(
    locator: &Locator<'_, U>,
    original: &Tree,
) -> Result<(Layout, Layout), RegenError> {
    let Some(pos) = original.layout_pos() else {
        return Ok((Layout::empty(), Layout::empty()));
    };
    let source = locator
        .source_for(&pos)
        .ok_or(RegenError::MissingSource(pos.file()))?;

    let parent = locator.original_parent_of(original);
    let Some((parent, parent_pos)) = parent.and_then(|p| p.layout_pos().map(|pp| (p, pp))) else {
        let leading = gap(source, 0, pos.start())?;
        let trailing = gap(source, pos.end(), source.len())?;
        return Ok((Layout::new(leading), Layout::new(trailing)));
    };

    let siblings: Vec<&Tree> = parent
        .children()
        .iter()
        .filter(|child| child.layout_pos().is_some())
        .collect();
    let Some(index) = siblings.iter().position(|s| same(s, original)) else {
        return Ok((Layout::empty(), Layout::empty()));
    };

    let leading = match index.checked_sub(1).map(|i| siblings[i]) {
        Some(left) => {
            let from = left.pos().map_or(parent_pos.start(), |p| p.end());
            let raw = gap(source, from, pos.start())?;
            split_between(
                raw,
                Junction {
                    parent: &parent,
                    left,
                    right: original,
                },
            )
            .1
        }
        None => {
            let raw = gap(source, parent_pos.start(), pos.start())?;
            split_parent_leading(&parent, raw).1
        }
    };

    let trailing = match siblings.get(index + 1) {
        Some(right) => {
            let to = right.pos().map_or(parent_pos.end(), |p| p.start());
            let raw = gap(source, pos.end(), to)?;
            split_between(
                raw,
                Junction {
                    parent: &parent,
                    left: original,
                    right,
                },
            )
            .0
        }
        None => {
            let raw = gap(source, pos.end(), parent_pos.end())?;
            split_parent_trailing(&parent, raw).0
        }
    };

    Ok((leading, trailing))
}

/// A parent's own text before its first and after its last positioned child
pub fn parent_affixes(
    source: &SourceFile,
    parent: &Tree,
) -> Result<Option<(Layout, Layout)>, RegenError> {
    let Some(pos) = parent.layout_pos() else {
        return Ok(None);
    };
    let mut positioned = parent.children().iter().filter_map(|c| c.layout_pos());
    let Some(first) = positioned.next() else {
        return Ok(None);
    };
    let last = positioned.last().unwrap_or(first);

    let prefix = split_parent_leading(parent, gap(source, pos.start(), first.start())?).0;
    let suffix = split_parent_trailing(parent, gap(source, last.end(), pos.end())?).1;
    Ok(Some((prefix, suffix)))
}
