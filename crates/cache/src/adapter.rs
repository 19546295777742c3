//! Source and writer adapter traits
//!
//! The cache never talks to a wire protocol itself; these two seams are the
//! only places I/O happens. Implementations own connection management,
//! timeouts, and cancellation, and surface failures as `Error::Adapter`.

use crate::error::Result;
use crate::params::Parameter;
use rowmirror_value::Row;

/// Executes the population command and serves pages of the result.
pub trait RowSource {
    /// Fetch up to `limit` rows starting at `offset` (0-based into the
    /// logical result). `limit == 0` means no limit.
    fn fetch_page(
        &mut self,
        command: &str,
        params: &[Parameter],
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Row>>;
}

/// Applies staged changes to the backing source and reads it back for
/// conflict comparison. `key_columns` identify the row at the source.
pub trait RowWriter {
    fn insert(&mut self, row: &Row) -> Result<()>;

    fn update(&mut self, key_columns: &[usize], original: &Row, current: &Row) -> Result<()>;

    fn delete(&mut self, key_columns: &[usize], original: &Row) -> Result<()>;

    /// Live read of the row `original` identifies; `None` if it no longer
    /// exists at the source.
    fn current_value_at(&mut self, key_columns: &[usize], original: &Row) -> Result<Option<Row>>;

    fn commit(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;

    fn rollback_to(&mut self, savepoint: &str) -> Result<()>;
}
