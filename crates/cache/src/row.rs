//! Cached row arena entries
//!
//! Rows live in a flat arena with a status tag; deletion flips the tag
//! rather than removing the entry, so row identity stays stable across
//! status changes and cursor traversal filters on visibility instead.

use rowmirror_value::{Row, Value};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a cached row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowStatus {
    /// Matches the source as of the last population or successful sync
    Unmodified,
    /// Staged locally, not yet written to the source
    Inserted,
    /// At least one column touched since the original snapshot was taken
    UpdatedSet,
    /// Soft-deleted; retained in the arena until sync or undo
    Deleted,
}

/// One arena entry: current values, the original snapshot, and lifecycle tag
#[derive(Debug, Clone, PartialEq)]
pub struct CachedRow {
    /// Values as staged by the caller
    pub(crate) current: Row,
    /// Last values known to match the source; baseline for conflict checks
    pub(crate) original: Row,
    pub(crate) status: RowStatus,
    /// Per-column touched flags; set by `set_column` regardless of whether
    /// the new value differs, matching the original tracking semantics
    pub(crate) updated: Vec<bool>,
}

impl CachedRow {
    /// Row materialized from the source: snapshot equals current values
    pub(crate) fn from_source(values: Row) -> Self {
        let width = values.len();
        Self {
            current: values.clone(),
            original: values,
            status: RowStatus::Unmodified,
            updated: vec![false; width],
        }
    }

    /// All-null insert draft of the given width
    pub(crate) fn draft(width: usize) -> Self {
        Self {
            current: vec![Value::Null; width],
            original: vec![Value::Null; width],
            status: RowStatus::Inserted,
            updated: vec![false; width],
        }
    }

    pub(crate) fn width(&self) -> usize {
        self.current.len()
    }

    pub(crate) fn set_column(&mut self, col: usize, value: Value) {
        self.current[col] = value;
        self.updated[col] = true;
        if self.status == RowStatus::Unmodified {
            self.status = RowStatus::UpdatedSet;
        }
    }

    /// Commit current values as the new original snapshot
    pub(crate) fn accept_current(&mut self) {
        self.original = self.current.clone();
        self.status = RowStatus::Unmodified;
        self.updated.fill(false);
    }

    /// Revert current values to the original snapshot
    pub(crate) fn revert_to_original(&mut self) {
        self.current = self.original.clone();
        self.status = RowStatus::Unmodified;
        self.updated.fill(false);
    }

    pub fn current(&self) -> &Row {
        &self.current
    }

    pub fn original(&self) -> &Row {
        &self.original
    }

    pub fn status(&self) -> RowStatus {
        self.status
    }
}
