//! Page window over the logical result
//!
//! Tracks which contiguous slice of the source's result is materialized:
//! the page size, the absolute source offset of the current page, and the
//! overall max-rows budget counted from the offset population started at.
//! A fetch limit of 0 means unbounded at the adapter boundary.

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct PageWindow {
    /// Rows per page; 0 = the whole result is one page
    page_size: usize,
    /// Total rows ever materialized across pages; 0 = unbounded
    max_rows: usize,
    /// Source offset population started at; the max-rows budget counts from here
    base: usize,
    /// Source offset of the currently materialized page
    offset: usize,
    populated: bool,
}

impl PageWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn set_page_size(&mut self, size: usize) -> Result<()> {
        if self.max_rows > 0 && size > self.max_rows {
            return Err(Error::InvalidIndex(format!(
                "page size {} cannot exceed max rows {}",
                size, self.max_rows
            )));
        }
        self.page_size = size;
        Ok(())
    }

    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    pub fn set_max_rows(&mut self, max: usize) -> Result<()> {
        if max > 0 && self.page_size > max {
            return Err(Error::InvalidIndex(format!(
                "max rows {} cannot be below page size {}",
                max, self.page_size
            )));
        }
        self.max_rows = max;
        Ok(())
    }

    pub fn source_offset(&self) -> usize {
        self.offset
    }

    pub(crate) fn is_populated(&self) -> bool {
        self.populated
    }

    /// Fetch limit for a fresh population
    pub(crate) fn first_fetch_limit(&self) -> usize {
        if self.page_size == 0 {
            self.max_rows
        } else if self.max_rows > 0 {
            self.page_size.min(self.max_rows)
        } else {
            self.page_size
        }
    }

    /// Record a successful fresh population at `start`
    pub(crate) fn begin(&mut self, start: usize) {
        self.base = start;
        self.offset = start;
        self.populated = true;
    }

    /// Offset and limit for the next page, if one can exist within budget
    pub(crate) fn advance(&self) -> Option<(usize, usize)> {
        if !self.populated || self.page_size == 0 {
            return None;
        }
        let next = self.offset + self.page_size;
        let used = next - self.base;
        if self.max_rows > 0 && used >= self.max_rows {
            return None;
        }
        let mut limit = self.page_size;
        if self.max_rows > 0 {
            limit = limit.min(self.max_rows - used);
        }
        Some((next, limit))
    }

    /// Offset and limit for the previous page, clamped at the first page
    pub(crate) fn retreat(&self) -> Option<(usize, usize)> {
        if !self.populated || self.page_size == 0 || self.offset <= self.base {
            return None;
        }
        let prev = self.base.max(self.offset.saturating_sub(self.page_size));
        Some((prev, self.page_size))
    }

    /// Record that the page at `offset` is now the materialized one
    pub(crate) fn commit_offset(&mut self, offset: usize) {
        self.offset = offset;
    }

    pub(crate) fn reset(&mut self) {
        self.base = 0;
        self.offset = 0;
        self.populated = false;
    }
}
