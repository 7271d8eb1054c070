//! Errors raised while regenerating source text

use mago_database::file::FileId;
use thiserror::Error;

use crate::tree::Tag;

/// Errors that abort a regeneration
#[derive(Error, Debug)]
pub enum RegenError {
    #[error("Unknown node kind '{0}'")]
    UnknownKind(String),

    #[error("Edited root has no counterpart in the original tree")]
    NoOriginal,

    #[error("No source buffer registered for file {0:?}")]
    MissingSource(FileId),

    #[error("Position {start}..{end} out of bounds for source length {len}")]
    PositionOutOfBounds { start: usize, end: usize, len: usize },

    #[error("Malformed tree document: {0}")]
    Interchange(String),
}

impl From<serde_json::Error> for RegenError {
    fn from(err: serde_json::Error) -> Self {
        RegenError::Interchange(err.to_string())
    }
}

/// Failure of a fallback printer to render a node
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrintError {
    #[error("Cannot print {0} nodes")]
    Unsupported(Tag),
}
