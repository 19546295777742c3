//! Positional parameter store for the population command
//!
//! Callers address placeholders 1-based, as the command text does; slots are
//! held 0-based internally. Parameters may be set in any order, but retrieval
//! requires a dense sequence: a gap anywhere below the highest set index
//! fails the snapshot, because the source adapter cannot bind around a hole.

use crate::error::{Error, Result};
use chrono::FixedOffset;
use rowmirror_value::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Interpretation of a stream-valued parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamKind {
    Ascii,
    Binary,
    Unicode,
    Character,
}

/// One bound placeholder value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Parameter {
    /// Typed SQL NULL; `type_name` names a user-defined type where relevant
    Null {
        sql_type: i32,
        type_name: Option<String>,
    },
    /// Plain scalar value
    Scalar(Value),
    /// Stream contents captured up front, with the length the caller declared
    Stream {
        data: Vec<u8>,
        declared_len: usize,
        kind: StreamKind,
    },
    /// Date/time value paired with the offset the driver should apply
    Calendared {
        value: Value,
        #[serde(with = "offset_secs")]
        offset: FixedOffset,
    },
    /// Value to be converted to a target SQL type, optionally with a scale
    Object {
        value: Value,
        target_type: String,
        scale: Option<u32>,
    },
}

/// `FixedOffset` carries no serde impls; round-trip it through its
/// seconds-east-of-UTC representation
mod offset_secs {
    use chrono::FixedOffset;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(offset: &FixedOffset, ser: S) -> Result<S::Ok, S::Error> {
        offset.local_minus_utc().serialize(ser)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<FixedOffset, D::Error> {
        let secs = i32::deserialize(de)?;
        FixedOffset::east_opt(secs)
            .ok_or_else(|| serde::de::Error::custom("offset out of range"))
    }
}

/// Stores positional placeholder values for the population command.
///
/// Pure bookkeeping: the only consumer is the source adapter, which receives
/// the dense snapshot when the command executes.
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    /// Slot (0-based) to bound value; callers address slots 1-based
    slots: HashMap<usize, Parameter>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `param` at 1-based `index`, replacing any prior binding there.
    ///
    /// No upper bound is enforced; gaps are caught at `snapshot` time.
    pub fn set(&mut self, index: usize, param: Parameter) -> Result<()> {
        if index == 0 {
            return Err(Error::InvalidIndex(
                "parameter index must be 1 or greater".to_string(),
            ));
        }
        self.slots.insert(index - 1, param);
        Ok(())
    }

    /// Remove every binding. Called whenever the command text is replaced.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Number of bound slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Return all bound values ordered by index, 0-based in the result.
    ///
    /// Fails with `IncompleteBinding` naming the first unset 1-based index
    /// if the bindings are not dense up to the highest set index.
    pub fn snapshot(&self) -> Result<Vec<Parameter>> {
        let mut out = Vec::with_capacity(self.slots.len());
        for slot in 0..self.slots.len() {
            match self.slots.get(&slot) {
                Some(param) => out.push(param.clone()),
                None => return Err(Error::IncompleteBinding { index: slot + 1 }),
            }
        }
        Ok(out)
    }
}
