//! Cell value types for the rowmirror cache
//!
//! A cached row is a flat vector of `Value` cells. The variants cover the
//! scalar SQL types a disconnected cache round-trips to its source; schema
//! bookkeeping (precision, column names) lives with the adapters, not here.

mod types;

pub use types::{Row, Value};
