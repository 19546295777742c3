//! A disconnected, updatable row cache
//!
//! Mirrors a page of rows fetched from a remote tabular source, lets the
//! caller stage inserts, updates, and deletes while disconnected, and
//! reconciles the staged changes back under optimistic concurrency:
//! - Positional parameter binding for the population command
//! - Cursor navigation over visible rows with soft-delete and paging
//! - Batched conflict reporting with partial-progress synchronization
//!
//! The wire protocol lives behind the `RowSource`/`RowWriter` adapter
//! traits; the cache itself is purely in-memory and single-owner.

mod adapter;
mod cache;
mod cursor;
mod error;
mod listener;
mod page;
mod params;
mod row;
mod shared;
mod sync;

pub use adapter::{RowSource, RowWriter};
pub use cache::{RowCache, VisibilityPredicate};
pub use cursor::{CursorState, InsertDraft};
pub use error::{Error, Result};
pub use listener::CacheListener;
pub use page::PageWindow;
pub use params::{Parameter, ParameterStore, StreamKind};
pub use row::{CachedRow, RowStatus};
pub use shared::SharedRowCache;
pub use sync::SyncConflict;

// Re-export the cell types for convenience
pub use rowmirror_value::{Row, Value};
