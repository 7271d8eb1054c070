//! Source buffers and node positions
//!
//! A [`Pos`] is a `mago_span::Span` (file, start, end) extended with the
//! `point` offset a parser reports for a node's focus token and a
//! `transparent` flag. Transparent positions take part in lookups but never
//! anchor layout.

use std::fmt;
use std::sync::Arc;

use mago_database::file::FileId;
use mago_span::{Position, Span};

use crate::error::RegenError;

/// Immutable text of one compilation unit
#[derive(Debug, Clone)]
pub struct SourceFile {
    id: FileId,
    name: String,
    text: Arc<str>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, text: impl Into<Arc<str>>) -> Self {
        let name = name.into();
        Self {
            id: FileId::new(&name),
            name,
            text: text.into(),
        }
    }

    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Text covered by `pos`, checked against the buffer bounds
    pub fn slice(&self, pos: &Pos) -> Result<&str, RegenError> {
        self.slice_range(pos.start(), pos.end())
    }

    /// Text between two offsets, checked against the buffer bounds
    pub fn slice_range(&self, start: usize, end: usize) -> Result<&str, RegenError> {
        let len = self.text.len();
        if start > end
            || end > len
            || !self.text.is_char_boundary(start)
            || !self.text.is_char_boundary(end)
        {
            return Err(RegenError::PositionOutOfBounds { start, end, len });
        }
        Ok(&self.text[start..end])
    }

    /// Build a position inside this file
    pub fn pos(&self, start: u32, end: u32) -> Pos {
        Pos::range(self.id, start, end)
    }
}

/// Position of a node in a source buffer
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pos {
    span: Span,
    point: u32,
    transparent: bool,
}

impl Pos {
    pub fn new(file: FileId, start: u32, point: u32, end: u32) -> Self {
        debug_assert!(start <= end, "position start {start} after end {end}");
        Self {
            span: Span::new(file, Position::new(start), Position::new(end)),
            point,
            transparent: false,
        }
    }

    /// Position whose point coincides with its start
    pub fn range(file: FileId, start: u32, end: u32) -> Self {
        Self::new(file, start, start, end)
    }

    pub fn into_transparent(mut self) -> Self {
        self.transparent = true;
        self
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn file(&self) -> FileId {
        self.span.file_id
    }

    pub fn start(&self) -> usize {
        self.span.start.offset as usize
    }

    pub fn point(&self) -> usize {
        self.point as usize
    }

    pub fn end(&self) -> usize {
        self.span.end.offset as usize
    }

    pub fn is_transparent(&self) -> bool {
        self.transparent
    }

    /// Same file, start, point and end. Transparency is ignored.
    pub fn same_range(&self, other: &Pos) -> bool {
        self.file() == other.file()
            && self.start() == other.start()
            && self.point == other.point
            && self.end() == other.end()
    }

    /// `other` lies within this position (bounds may coincide)
    pub fn includes(&self, other: &Pos) -> bool {
        self.file() == other.file() && self.start() <= other.start() && other.end() <= self.end()
    }

    /// `other` lies within this position and does not cover the same offsets
    pub fn properly_includes(&self, other: &Pos) -> bool {
        self.includes(other) && (self.start(), self.end()) != (other.start(), other.end())
    }

    /// The two positions share at least one offset
    pub fn overlaps(&self, other: &Pos) -> bool {
        self.file() == other.file() && self.start() < other.end() && other.start() < self.end()
    }
}

impl fmt::Debug for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{}", self.start(), self.end())?;
        if self.point as usize != self.start() {
            write!(f, " @{}", self.point)?;
        }
        if self.transparent {
            write!(f, " transparent")?;
        }
        write!(f, "]")
    }
}

/// Leading whitespace of the line containing `offset`
///
/// An offset inside a multi-byte character counts as that character's start.
pub fn indentation_at(text: &str, offset: usize) -> &str {
    let mut offset = offset.min(text.len());
    while !text.is_char_boundary(offset) {
        offset -= 1;
    }
    let line_start = text[..offset].rfind('\n').map_or(0, |i| i + 1);
    let line = &text[line_start..];
    let width = line
        .find(|c: char| c != ' ' && c != '\t')
        .unwrap_or(line.len());
    &line[..width]
}

/// Convert a byte offset to 1-based line and column numbers
pub fn offset_to_line_column(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;

    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }

    (line, column)
}
