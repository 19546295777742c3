//! The disconnected row cache
//!
//! `RowCache` mirrors one page of a remote result, lets the caller stage
//! inserts, updates, and deletes while disconnected, and hands the staged
//! rows to a synchronization pass on demand. The cursor walks visible rows
//! only; soft-deleted rows stay in the arena but are skipped unless
//! `show_deleted` is set or a visibility predicate says otherwise.
//!
//! Single-owner model: one logical owner navigates and edits at a time.
//! Shared handles (`into_shared`) serialize access through a lock; a deep
//! copy (`create_copy`) is fully independent.

use crate::adapter::{RowSource, RowWriter};
use crate::cursor::{CursorState, InsertDraft};
use crate::error::{Error, Result};
use crate::listener::{CacheListener, ListenerSet};
use crate::page::PageWindow;
use crate::params::{Parameter, ParameterStore};
use crate::row::{CachedRow, RowStatus};
use crate::shared::SharedRowCache;
use crate::sync::SyncSession;
use rowmirror_value::{Row, Value};
use std::sync::Arc;
use tracing::debug;

/// Per-row acceptance test installed by filtering extensions
pub type VisibilityPredicate = Arc<dyn Fn(&CachedRow) -> bool + Send + Sync>;

pub struct RowCache {
    command: Option<String>,
    params: ParameterStore,
    rows: Vec<CachedRow>,
    cursor: CursorState,
    page: PageWindow,
    /// Column count of the populated result; 0 until first population
    column_count: usize,
    table_name: Option<String>,
    key_columns: Vec<usize>,
    match_columns: Vec<usize>,
    show_deleted: bool,
    visibility: Option<VisibilityPredicate>,
    listeners: ListenerSet,
}

impl Default for RowCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RowCache {
    pub fn new() -> Self {
        Self {
            command: None,
            params: ParameterStore::new(),
            rows: Vec::new(),
            cursor: CursorState::BeforeFirst,
            page: PageWindow::new(),
            column_count: 0,
            table_name: None,
            key_columns: Vec::new(),
            match_columns: Vec::new(),
            show_deleted: false,
            visibility: None,
            listeners: ListenerSet::default(),
        }
    }

    // ------------------------------------------------------------------
    // Command & parameter binding
    // ------------------------------------------------------------------

    /// Replace the population command. Always clears bound parameters; the
    /// old bindings were positional against the old text.
    pub fn set_command(&mut self, command: impl Into<String>) {
        self.command = Some(command.into());
        self.params.clear();
    }

    pub fn command(&self) -> Option<&str> {
        self.command.as_deref()
    }

    /// Bind a placeholder value at 1-based `index`
    pub fn set_parameter(&mut self, index: usize, param: Parameter) -> Result<()> {
        self.params.set(index, param)
    }

    pub fn clear_parameters(&mut self) {
        self.params.clear();
    }

    // ------------------------------------------------------------------
    // Population & paging
    // ------------------------------------------------------------------

    pub fn page_size(&self) -> usize {
        self.page.page_size()
    }

    pub fn set_page_size(&mut self, size: usize) -> Result<()> {
        self.page.set_page_size(size)
    }

    pub fn max_rows(&self) -> usize {
        self.page.max_rows()
    }

    pub fn set_max_rows(&mut self, max: usize) -> Result<()> {
        self.page.set_max_rows(max)
    }

    /// Execute the command through `source` and materialize the first page,
    /// starting at `start` in the logical result.
    ///
    /// Replaces the arena wholesale: staged edits on the prior contents are
    /// lost, without any interaction with the source. The cursor resets to
    /// before the first row.
    pub fn populate<S: RowSource>(&mut self, source: &mut S, start: usize) -> Result<()> {
        let command = self
            .command
            .clone()
            .ok_or_else(|| Error::InvalidCursorState("no command set".to_string()))?;
        let params = self.params.snapshot()?;
        let limit = self.page.first_fetch_limit();

        let fetched = source
            .fetch_page(&command, &params, start, limit)
            .map_err(|e| Error::Population(e.to_string()))?;

        self.install_page(fetched, limit)?;
        self.page.begin(start);
        debug!(rows = self.rows.len(), offset = start, "populated cache");
        Ok(())
    }

    /// Populate from offset 0 using the stored command and parameters
    pub fn execute<S: RowSource>(&mut self, source: &mut S) -> Result<()> {
        self.populate(source, 0)
    }

    /// Fetch and materialize the next page. Returns `false` when the source
    /// has no further rows; the current page stays materialized in that case.
    ///
    /// Staged edits on the page being replaced are lost, without any
    /// interaction with the source.
    pub fn next_page<S: RowSource>(&mut self, source: &mut S) -> Result<bool> {
        if !self.page.is_populated() {
            return Err(Error::InvalidCursorState(
                "next_page called before populate".to_string(),
            ));
        }
        let Some((offset, limit)) = self.page.advance() else {
            return Ok(false);
        };
        self.turn_page(source, offset, limit)
    }

    /// Fetch and materialize the previous page, clamped at the first page.
    /// Returns `false` when already on the first page.
    pub fn previous_page<S: RowSource>(&mut self, source: &mut S) -> Result<bool> {
        if !self.page.is_populated() {
            return Err(Error::InvalidCursorState(
                "previous_page called before populate".to_string(),
            ));
        }
        let Some((offset, limit)) = self.page.retreat() else {
            return Ok(false);
        };
        self.turn_page(source, offset, limit)
    }

    fn turn_page<S: RowSource>(
        &mut self,
        source: &mut S,
        offset: usize,
        limit: usize,
    ) -> Result<bool> {
        let command = self
            .command
            .clone()
            .ok_or_else(|| Error::InvalidCursorState("no command set".to_string()))?;
        let params = self.params.snapshot()?;

        let fetched = source
            .fetch_page(&command, &params, offset, limit)
            .map_err(|e| Error::Population(e.to_string()))?;

        if fetched.is_empty() {
            // Boundary policy: leave the prior page materialized
            return Ok(false);
        }

        self.install_page(fetched, limit)?;
        self.page.commit_offset(offset);
        debug!(rows = self.rows.len(), offset, "turned page");
        Ok(true)
    }

    fn install_page(&mut self, mut fetched: Vec<Row>, limit: usize) -> Result<()> {
        if limit > 0 && fetched.len() > limit {
            // Documented silent policy: rows past the configured limit are
            // dropped, not an error
            debug!(
                dropped = fetched.len() - limit,
                "truncating rows past the configured limit"
            );
            fetched.truncate(limit);
        }

        if let Some(first) = fetched.first() {
            let width = first.len();
            if fetched.iter().any(|row| row.len() != width) {
                return Err(Error::Population(
                    "source returned rows of differing widths".to_string(),
                ));
            }
            self.column_count = width;
        }

        self.rows = fetched.into_iter().map(CachedRow::from_source).collect();
        self.cursor = CursorState::BeforeFirst;
        self.listeners.cache_replaced();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Visibility
    // ------------------------------------------------------------------

    pub fn show_deleted(&self) -> bool {
        self.show_deleted
    }

    pub fn set_show_deleted(&mut self, show: bool) {
        self.show_deleted = show;
    }

    /// Install a row-acceptance test in place of the deleted-row check.
    /// Consumed by filtering extensions; the cursor skips rejected rows.
    pub fn set_visibility_predicate(&mut self, pred: VisibilityPredicate) {
        self.visibility = Some(pred);
    }

    /// Restore the default deleted-row visibility test
    pub fn clear_visibility_predicate(&mut self) {
        self.visibility = None;
    }

    fn is_visible(&self, row: &CachedRow) -> bool {
        match &self.visibility {
            Some(pred) => pred(row),
            None => self.show_deleted || row.status != RowStatus::Deleted,
        }
    }

    fn visible_positions(&self) -> Vec<usize> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| self.is_visible(row))
            .map(|(index, _)| index)
            .collect()
    }

    // ------------------------------------------------------------------
    // Cursor navigation
    // ------------------------------------------------------------------

    /// Number of rows held in the cache, soft-deleted rows included
    pub fn size(&self) -> usize {
        self.rows.len()
    }

    fn reject_insert_row(&self, op: &str) -> Result<()> {
        if matches!(self.cursor, CursorState::OnInsertRow(_)) {
            return Err(Error::InvalidCursorState(format!(
                "{} is not valid on the insert row",
                op
            )));
        }
        Ok(())
    }

    fn move_cursor(&mut self, state: CursorState) {
        self.cursor = state;
        self.listeners.cursor_moved();
    }

    pub fn before_first(&mut self) -> Result<()> {
        self.reject_insert_row("before_first")?;
        self.move_cursor(CursorState::BeforeFirst);
        Ok(())
    }

    pub fn after_last(&mut self) -> Result<()> {
        self.reject_insert_row("after_last")?;
        self.move_cursor(CursorState::AfterLast);
        Ok(())
    }

    /// Move to the first visible row; `false` if there are none
    pub fn first(&mut self) -> Result<bool> {
        self.reject_insert_row("first")?;
        match self.visible_positions().first().copied() {
            Some(index) => {
                self.move_cursor(CursorState::OnRow(index));
                Ok(true)
            }
            None => {
                self.move_cursor(CursorState::BeforeFirst);
                Ok(false)
            }
        }
    }

    /// Move to the last visible row; `false` if there are none
    pub fn last(&mut self) -> Result<bool> {
        self.reject_insert_row("last")?;
        match self.visible_positions().last().copied() {
            Some(index) => {
                self.move_cursor(CursorState::OnRow(index));
                Ok(true)
            }
            None => {
                self.move_cursor(CursorState::AfterLast);
                Ok(false)
            }
        }
    }

    /// Advance to the next visible row; `false` once past the last
    pub fn next(&mut self) -> Result<bool> {
        self.reject_insert_row("next")?;
        let from = match self.cursor {
            CursorState::BeforeFirst => None,
            CursorState::OnRow(index) => Some(index),
            CursorState::AfterLast => {
                return Ok(false);
            }
            CursorState::OnInsertRow(_) => unreachable!(),
        };
        let target = self
            .rows
            .iter()
            .enumerate()
            .skip(from.map_or(0, |i| i + 1))
            .find(|(_, row)| self.is_visible(row))
            .map(|(index, _)| index);
        match target {
            Some(index) => {
                self.move_cursor(CursorState::OnRow(index));
                Ok(true)
            }
            None => {
                self.move_cursor(CursorState::AfterLast);
                Ok(false)
            }
        }
    }

    /// Step back to the previous visible row; `false` once before the first
    pub fn previous(&mut self) -> Result<bool> {
        self.reject_insert_row("previous")?;
        let until = match self.cursor {
            CursorState::BeforeFirst => {
                return Ok(false);
            }
            CursorState::OnRow(index) => index,
            CursorState::AfterLast => self.rows.len(),
            CursorState::OnInsertRow(_) => unreachable!(),
        };
        let target = self.rows[..until]
            .iter()
            .enumerate()
            .rev()
            .find(|(_, row)| self.is_visible(row))
            .map(|(index, _)| index);
        match target {
            Some(index) => {
                self.move_cursor(CursorState::OnRow(index));
                Ok(true)
            }
            None => {
                self.move_cursor(CursorState::BeforeFirst);
                Ok(false)
            }
        }
    }

    /// Jump to the `position`-th visible row: positive counts from the
    /// start, negative from the end. The two sentinel positions one past
    /// either boundary land before-first / after-last and return `false`;
    /// anything further out is `CursorOutOfRange`.
    pub fn absolute(&mut self, position: i64) -> Result<bool> {
        self.reject_insert_row("absolute")?;
        let visible = self.visible_positions();
        let count = visible.len() as i64;

        let out_of_range = || Error::CursorOutOfRange {
            position,
            size: visible.len(),
        };

        if position == 0 {
            return Err(out_of_range());
        }
        if position >= 1 && position <= count {
            let index = visible[(position - 1) as usize];
            self.move_cursor(CursorState::OnRow(index));
            Ok(true)
        } else if position == count + 1 {
            self.move_cursor(CursorState::AfterLast);
            Ok(false)
        } else if position <= -1 && position >= -count {
            let index = visible[(count + position) as usize];
            self.move_cursor(CursorState::OnRow(index));
            Ok(true)
        } else if position == -(count + 1) {
            self.move_cursor(CursorState::BeforeFirst);
            Ok(false)
        } else {
            Err(out_of_range())
        }
    }

    /// Park the cursor on a fresh all-null insert draft
    pub fn move_to_insert_row(&mut self) -> Result<()> {
        self.reject_insert_row("move_to_insert_row")?;
        if self.column_count == 0 {
            return Err(Error::InvalidCursorState(
                "cache has no column layout before population".to_string(),
            ));
        }
        let draft = InsertDraft {
            row: CachedRow::draft(self.column_count),
            resume: self.cursor.clone(),
        };
        self.move_cursor(CursorState::OnInsertRow(Box::new(draft)));
        Ok(())
    }

    /// Leave the insert row, discarding the draft, and restore the position
    /// held before `move_to_insert_row`
    pub fn move_to_current_row(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.cursor, CursorState::BeforeFirst) {
            CursorState::OnInsertRow(draft) => {
                self.move_cursor(draft.resume);
                Ok(())
            }
            other => {
                self.cursor = other;
                Err(Error::InvalidCursorState(
                    "move_to_current_row is only valid on the insert row".to_string(),
                ))
            }
        }
    }

    // ------------------------------------------------------------------
    // Row access
    // ------------------------------------------------------------------

    fn current_index(&self) -> Result<usize> {
        match self.cursor {
            CursorState::OnRow(index) => Ok(index),
            _ => Err(Error::InvalidCursorState(
                "cursor is not on a row".to_string(),
            )),
        }
    }

    fn current_row(&self) -> Result<&CachedRow> {
        match &self.cursor {
            CursorState::OnRow(index) => Ok(&self.rows[*index]),
            CursorState::OnInsertRow(draft) => Ok(&draft.row),
            _ => Err(Error::InvalidCursorState(
                "cursor is not on a row".to_string(),
            )),
        }
    }

    fn check_column(&self, row: &CachedRow, col: usize) -> Result<()> {
        if col >= row.width() {
            return Err(Error::InvalidIndex(format!(
                "column {} out of range for {} columns",
                col,
                row.width()
            )));
        }
        Ok(())
    }

    /// Read one cell of the current row (or insert draft)
    pub fn get(&self, col: usize) -> Result<&Value> {
        let row = self.current_row()?;
        self.check_column(row, col)?;
        Ok(&row.current()[col])
    }

    /// Current values of the row under the cursor
    pub fn row(&self) -> Result<&Row> {
        Ok(self.current_row()?.current())
    }

    /// Lifecycle status of the row under the cursor
    pub fn status(&self) -> Result<RowStatus> {
        Ok(self.current_row()?.status())
    }

    /// Whether `col` of the current row was touched since its snapshot.
    /// Set by `update_column` regardless of whether the value changed.
    pub fn column_updated(&self, col: usize) -> Result<bool> {
        let row = self.current_row()?;
        self.check_column(row, col)?;
        Ok(row.updated[col])
    }

    /// The original snapshot of the row under the cursor
    pub fn get_original_row(&self) -> Result<Row> {
        let index = self.current_index()?;
        Ok(self.rows[index].original().clone())
    }

    // ------------------------------------------------------------------
    // Row staging
    // ------------------------------------------------------------------

    /// Stage a new value for `col` of the current row or insert draft.
    /// Never touches the original snapshot.
    pub fn update_column(&mut self, col: usize, value: Value) -> Result<()> {
        match &mut self.cursor {
            CursorState::OnRow(index) => {
                let index = *index;
                self.check_column(&self.rows[index], col)?;
                self.rows[index].set_column(col, value);
                Ok(())
            }
            CursorState::OnInsertRow(draft) => {
                if col >= draft.row.width() {
                    return Err(Error::InvalidIndex(format!(
                        "column {} out of range for {} columns",
                        col,
                        draft.row.width()
                    )));
                }
                draft.row.set_column(col, value);
                Ok(())
            }
            _ => Err(Error::InvalidCursorState(
                "update_column requires the cursor on a row or the insert row".to_string(),
            )),
        }
    }

    /// Finalize the pending edit. On the insert row, the draft is appended
    /// at the end of the arena (the fixed placement rule) and the cursor
    /// lands on it; on an ordinary row this acknowledges the staged update.
    pub fn commit_row(&mut self) -> Result<()> {
        match std::mem::replace(&mut self.cursor, CursorState::BeforeFirst) {
            CursorState::OnInsertRow(draft) => {
                self.rows.push(draft.row);
                self.cursor = CursorState::OnRow(self.rows.len() - 1);
                self.listeners.row_changed();
                Ok(())
            }
            CursorState::OnRow(index) => {
                self.cursor = CursorState::OnRow(index);
                self.listeners.row_changed();
                Ok(())
            }
            other => {
                self.cursor = other;
                Err(Error::InvalidCursorState(
                    "commit_row requires the cursor on a row or the insert row".to_string(),
                ))
            }
        }
    }

    /// Soft-delete the current row: the entry stays in the arena, tagged
    /// `Deleted`, until synchronization or `undo_delete`
    pub fn delete_row(&mut self) -> Result<()> {
        let index = self.current_index()?;
        self.rows[index].status = RowStatus::Deleted;
        self.listeners.row_changed();
        Ok(())
    }

    /// Remove a locally inserted row entirely
    pub fn undo_insert(&mut self) -> Result<()> {
        let index = self.current_index()?;
        if self.rows[index].status != RowStatus::Inserted {
            return Err(Error::InvalidCursorState(
                "undo_insert requires a row with Inserted status".to_string(),
            ));
        }
        self.remove_row_at(index);
        Ok(())
    }

    /// Revert a soft delete
    pub fn undo_delete(&mut self) -> Result<()> {
        let index = self.current_index()?;
        if self.rows[index].status != RowStatus::Deleted {
            return Err(Error::InvalidCursorState(
                "undo_delete requires a row with Deleted status".to_string(),
            ));
        }
        self.rows[index].status = RowStatus::Unmodified;
        self.listeners.row_changed();
        Ok(())
    }

    /// Discard staged updates on the current row, restoring the snapshot
    pub fn undo_update(&mut self) -> Result<()> {
        let index = self.current_index()?;
        if self.rows[index].status != RowStatus::UpdatedSet {
            return Err(Error::InvalidCursorState(
                "undo_update requires a row with UpdatedSet status".to_string(),
            ));
        }
        self.rows[index].revert_to_original();
        self.listeners.row_changed();
        Ok(())
    }

    /// Commit the current row's values as its new original snapshot. On a
    /// soft-deleted row this makes the deletion final and drops the entry.
    pub fn set_original_row(&mut self) -> Result<()> {
        let index = self.current_index()?;
        if self.rows[index].status == RowStatus::Deleted {
            self.remove_row_at(index);
        } else {
            self.rows[index].accept_current();
            self.listeners.row_changed();
        }
        Ok(())
    }

    /// Revert the whole cache to its original snapshots: staged inserts are
    /// dropped, every other row is restored, and the cursor resets
    pub fn restore_original(&mut self) -> Result<()> {
        self.rows.retain(|row| row.status != RowStatus::Inserted);
        for row in &mut self.rows {
            row.revert_to_original();
        }
        self.cursor = CursorState::BeforeFirst;
        self.listeners.cache_replaced();
        Ok(())
    }

    /// Drop all rows without touching the source. Staged edits are lost.
    pub fn release(&mut self) {
        self.rows.clear();
        self.cursor = CursorState::BeforeFirst;
        self.page.reset();
        self.listeners.cache_replaced();
    }

    /// Remove the arena entry at `index` and re-park the cursor on the
    /// nearest preceding visible row, or before-first
    fn remove_row_at(&mut self, index: usize) {
        self.rows.remove(index);
        let target = self.rows[..index]
            .iter()
            .enumerate()
            .rev()
            .find(|(_, row)| self.is_visible(row))
            .map(|(i, _)| i);
        self.cursor = match target {
            Some(i) => CursorState::OnRow(i),
            None => CursorState::BeforeFirst,
        };
        self.listeners.row_changed();
    }

    // ------------------------------------------------------------------
    // Synchronization
    // ------------------------------------------------------------------

    /// Reconcile every pending row with the source through `writer`.
    ///
    /// Conflicts are batched: the pass always visits every pending row, and
    /// rows that reconcile keep their clean state even when the call then
    /// fails with the collected conflicts. Resolve and call again.
    pub fn accept_changes<W: RowWriter>(&mut self, writer: &mut W) -> Result<()> {
        debug!(rows = self.rows.len(), "starting synchronization pass");
        let before = self.rows.len();
        let outcome = SyncSession::new(writer, &self.key_columns).run(&mut self.rows);
        if self.rows.len() != before {
            // Confirmed deletes shifted arena indices under the cursor
            self.cursor = CursorState::BeforeFirst;
        }
        outcome
    }

    /// Pass-through to the writer's transaction commit; no cache-side effect
    pub fn commit<W: RowWriter>(&self, writer: &mut W) -> Result<()> {
        writer.commit()
    }

    /// Pass-through to the writer's transaction rollback; no cache-side effect
    pub fn rollback<W: RowWriter>(&self, writer: &mut W) -> Result<()> {
        writer.rollback()
    }

    /// Pass-through rollback to a named savepoint
    pub fn rollback_to<W: RowWriter>(&self, writer: &mut W, savepoint: &str) -> Result<()> {
        writer.rollback_to(savepoint)
    }

    // ------------------------------------------------------------------
    // Metadata & hooks
    // ------------------------------------------------------------------

    pub fn table_name(&self) -> Option<&str> {
        self.table_name.as_deref()
    }

    pub fn set_table_name(&mut self, name: impl Into<String>) {
        self.table_name = Some(name.into());
    }

    pub fn key_columns(&self) -> &[usize] {
        &self.key_columns
    }

    pub fn set_key_columns(&mut self, columns: Vec<usize>) -> Result<()> {
        self.check_column_set(&columns)?;
        self.key_columns = columns;
        Ok(())
    }

    /// Join-key columns consumed by an external join component; stored and
    /// validated only
    pub fn match_columns(&self) -> &[usize] {
        &self.match_columns
    }

    pub fn set_match_columns(&mut self, columns: Vec<usize>) -> Result<()> {
        self.check_column_set(&columns)?;
        self.match_columns = columns;
        Ok(())
    }

    fn check_column_set(&self, columns: &[usize]) -> Result<()> {
        // Before population the layout is unknown; indices are taken on trust
        if self.column_count == 0 {
            return Ok(());
        }
        for &col in columns {
            if col >= self.column_count {
                return Err(Error::InvalidIndex(format!(
                    "column {} out of range for {} columns",
                    col, self.column_count
                )));
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Listeners, sharing, copying
    // ------------------------------------------------------------------

    pub fn add_listener(&mut self, listener: Arc<dyn CacheListener>) {
        self.listeners.add(listener);
    }

    pub fn remove_listener(&mut self, listener: &Arc<dyn CacheListener>) {
        self.listeners.remove(listener);
    }

    /// Wrap this cache in a cloneable handle whose users serialize access
    pub fn into_shared(self) -> SharedRowCache {
        SharedRowCache::new(self)
    }

    /// Fully independent deep copy. Listeners are not carried over.
    pub fn create_copy(&self) -> RowCache {
        RowCache {
            command: self.command.clone(),
            params: self.params.clone(),
            rows: self.rows.clone(),
            cursor: self.cursor.clone(),
            page: self.page.clone(),
            column_count: self.column_count,
            table_name: self.table_name.clone(),
            key_columns: self.key_columns.clone(),
            match_columns: self.match_columns.clone(),
            show_deleted: self.show_deleted,
            visibility: self.visibility.clone(),
            listeners: ListenerSet::default(),
        }
    }
}
