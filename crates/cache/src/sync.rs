//! Optimistic synchronization pass
//!
//! Walks every pending row in arena order and reconciles it through the
//! writer adapter. A row whose original snapshot no longer matches the
//! source's live value is a conflict; conflicts are collected, never
//! fail-fast, so one pass reports every drifted row at once. Rows that do
//! reconcile keep their new clean state even when the pass as a whole fails.

use crate::adapter::RowWriter;
use crate::error::{Error, Result};
use crate::row::{CachedRow, RowStatus};
use rowmirror_value::Row;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One row that failed reconciliation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConflict {
    /// Arena index of the row at the start of the pass
    pub row: usize,
    /// The source's live value; `None` if the row vanished at the source or
    /// the conflicting operation was an insert
    pub source_snapshot: Option<Row>,
    /// The values this cache tried to persist
    pub attempted: Row,
}

/// Single reconciliation pass over the arena
pub(crate) struct SyncSession<'a, W: RowWriter> {
    writer: &'a mut W,
    key_columns: &'a [usize],
    conflicts: Vec<SyncConflict>,
    /// Arena indices of deleted rows the writer confirmed; removed after the pass
    reconciled_deletes: Vec<usize>,
}

impl<'a, W: RowWriter> SyncSession<'a, W> {
    pub(crate) fn new(writer: &'a mut W, key_columns: &'a [usize]) -> Self {
        Self {
            writer,
            key_columns,
            conflicts: Vec::new(),
            reconciled_deletes: Vec::new(),
        }
    }

    /// Reconcile every pending row, then either succeed or surface the
    /// batched conflicts. Adapter read failures propagate immediately; they
    /// are infrastructure faults, not drift.
    pub(crate) fn run(mut self, rows: &mut Vec<CachedRow>) -> Result<()> {
        for index in 0..rows.len() {
            match rows[index].status() {
                RowStatus::Unmodified => {}
                RowStatus::Inserted => self.sync_insert(index, &mut rows[index]),
                RowStatus::UpdatedSet => self.sync_update(index, &mut rows[index])?,
                RowStatus::Deleted => self.sync_delete(index, &rows[index])?,
            }
        }

        // Physically drop rows whose deletion the source accepted, highest
        // index first so earlier indices stay valid
        for index in self.reconciled_deletes.into_iter().rev() {
            rows.remove(index);
        }

        if self.conflicts.is_empty() {
            Ok(())
        } else {
            debug!(conflicts = self.conflicts.len(), "synchronization pass found conflicts");
            Err(Error::SyncConflicts(self.conflicts))
        }
    }

    fn sync_insert(&mut self, index: usize, row: &mut CachedRow) {
        match self.writer.insert(row.current()) {
            Ok(()) => row.accept_current(),
            Err(_) => self.conflicts.push(SyncConflict {
                row: index,
                source_snapshot: None,
                attempted: row.current().clone(),
            }),
        }
    }

    fn sync_update(&mut self, index: usize, row: &mut CachedRow) -> Result<()> {
        let live = self
            .writer
            .current_value_at(self.key_columns, row.original())?;
        match live {
            Some(source) if source == *row.original() => {
                match self
                    .writer
                    .update(self.key_columns, row.original(), row.current())
                {
                    Ok(()) => row.accept_current(),
                    Err(_) => self.conflicts.push(SyncConflict {
                        row: index,
                        source_snapshot: Some(source),
                        attempted: row.current().clone(),
                    }),
                }
            }
            drifted => self.conflicts.push(SyncConflict {
                row: index,
                source_snapshot: drifted,
                attempted: row.current().clone(),
            }),
        }
        Ok(())
    }

    fn sync_delete(&mut self, index: usize, row: &CachedRow) -> Result<()> {
        let live = self
            .writer
            .current_value_at(self.key_columns, row.original())?;
        match live {
            Some(source) if source == *row.original() => {
                match self.writer.delete(self.key_columns, row.original()) {
                    Ok(()) => self.reconciled_deletes.push(index),
                    Err(_) => self.conflicts.push(SyncConflict {
                        row: index,
                        source_snapshot: Some(source),
                        attempted: row.current().clone(),
                    }),
                }
            }
            drifted => self.conflicts.push(SyncConflict {
                row: index,
                source_snapshot: drifted,
                attempted: row.current().clone(),
            }),
        }
        Ok(())
    }
}
