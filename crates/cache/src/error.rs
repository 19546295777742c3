//! Error types for the row cache

use crate::sync::SyncConflict;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Structural / programmer errors; never mutate cache state
    #[error("Index out of range: {0}")]
    InvalidIndex(String),

    #[error("Missing parameter: {index}")]
    IncompleteBinding { index: usize },

    #[error("Invalid cursor state: {0}")]
    InvalidCursorState(String),

    #[error("Cursor position {position} out of range for {size} visible rows")]
    CursorOutOfRange { position: i64, size: usize },

    // Population errors
    #[error("Population failed: {0}")]
    Population(String),

    // Synchronization errors; carries every conflict found in the pass
    #[error("Synchronization failed with {} conflict(s)", .0.len())]
    SyncConflicts(Vec<SyncConflict>),

    // Opaque pass-through from a source or writer adapter
    #[error("Adapter error: {0}")]
    Adapter(String),
}
