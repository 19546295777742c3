//! The `Value` cell type and `Row` alias

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A row of cells, in column order
pub type Row = Vec<Value>;

/// One cell of a cached row
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    // Null
    Null,
    // Boolean
    Bool(bool),
    // Integer types
    I32(i32),
    I64(i64),
    // Float
    F64(f64),
    // Exact numeric
    Decimal(Decimal),
    // String
    Str(String),
    // Date/Time types
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    // Special types
    Uuid(Uuid),
    Bytea(Vec<u8>),
    // JSON (schemaless)
    Json(serde_json::Value),
}

impl Value {
    /// Create a null value
    pub fn null() -> Self {
        Value::Null
    }

    /// Create an I64 value (most common integer type)
    pub fn integer(i: i64) -> Self {
        Value::I64(i)
    }

    /// Create a string value
    pub fn string<S: Into<String>>(s: S) -> Self {
        Value::Str(s.into())
    }

    /// Create a boolean value
    pub fn boolean(b: bool) -> Self {
        Value::Bool(b)
    }

    /// Create a float value
    pub fn float(f: f64) -> Self {
        Value::F64(f)
    }

    /// Create a bytes value
    pub fn bytes(b: Vec<u8>) -> Self {
        Value::Bytea(b)
    }

    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if value is any integer type
    pub fn is_integer(&self) -> bool {
        matches!(self, Value::I32(_) | Value::I64(_))
    }

    /// Check if value is numeric (integer, float, or decimal)
    pub fn is_numeric(&self) -> bool {
        self.is_integer() || matches!(self, Value::F64(_) | Value::Decimal(_))
    }

    /// Check if value is a string
    pub fn is_string(&self) -> bool {
        matches!(self, Value::Str(_))
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::F64(_) => "f64",
            Value::Decimal(_) => "decimal",
            Value::Str(_) => "string",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::Timestamp(_) => "timestamp",
            Value::Uuid(_) => "uuid",
            Value::Bytea(_) => "bytea",
            Value::Json(_) => "json",
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({:?})", b),
            Value::I32(i) => write!(f, "I32({:?})", i),
            Value::I64(i) => write!(f, "I64({:?})", i),
            Value::F64(fl) => write!(f, "F64({:?})", fl),
            Value::Decimal(d) => write!(f, "Decimal({:?})", d),
            Value::Str(s) => write!(f, "Str({:?})", s),
            Value::Date(d) => write!(f, "Date({:?})", d),
            Value::Time(t) => write!(f, "Time({:?})", t),
            Value::Timestamp(ts) => write!(f, "Timestamp({:?})", ts),
            Value::Uuid(u) => write!(f, "Uuid({:?})", u),
            Value::Bytea(b) => write!(f, "Bytea({} bytes)", b.len()),
            Value::Json(j) => write!(f, "Json({:?})", j),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::I32(i) => write!(f, "{}", i),
            Value::I64(i) => write!(f, "{}", i),
            Value::F64(fl) => write!(f, "{}", fl),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Str(s) => write!(f, "{}", s),
            Value::Date(d) => write!(f, "{}", d),
            Value::Time(t) => write!(f, "{}", t),
            Value::Timestamp(ts) => write!(f, "{}", ts),
            Value::Uuid(u) => write!(f, "{}", u),
            Value::Bytea(b) => write!(f, "<{} bytes>", b.len()),
            Value::Json(j) => write!(f, "{}", j),
        }
    }
}
