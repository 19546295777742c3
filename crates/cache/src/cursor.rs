//! Cursor state machine

use crate::row::CachedRow;

/// Where the cursor sits relative to the row arena.
///
/// `OnRow` carries the arena index of the row under the cursor, which may be
/// hidden from navigation (a row the caller just soft-deleted stays under the
/// cursor until the next move). `OnInsertRow` carries the pending draft and
/// the position to restore when the caller moves back.
#[derive(Debug, Clone, PartialEq)]
pub enum CursorState {
    BeforeFirst,
    OnRow(usize),
    AfterLast,
    OnInsertRow(Box<InsertDraft>),
}

/// Draft row under construction plus the position to resume at
#[derive(Debug, Clone, PartialEq)]
pub struct InsertDraft {
    pub(crate) row: CachedRow,
    /// Never `OnInsertRow`; entering the insert row twice is rejected
    pub(crate) resume: CursorState,
}
