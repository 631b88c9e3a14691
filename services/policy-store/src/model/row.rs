//! Fixed-width policy row.
//!
//! # Purpose
//! One row of the `CasbinRule` table: a store-assigned id, a type tag and six
//! nullable positional fields.
use serde::{Deserialize, Serialize};

/// Number of positional fields a row can hold.
pub const FIELD_COUNT: usize = 6;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct PolicyRow {
    /// Assigned by the store on insert; `None` for rows not yet persisted.
    pub id: Option<i32>,
    pub ptype: Option<String>,
    pub fields: [Option<String>; FIELD_COUNT],
}

impl PolicyRow {
    /// Field value at `index`, treating NULL and the empty string alike.
    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields
            .get(index)
            .and_then(|value| value.as_deref())
            .filter(|value| !value.is_empty())
    }

    /// Count of leading non-empty fields starting at the first column.
    pub fn arity(&self) -> usize {
        (0..FIELD_COUNT)
            .take_while(|index| self.field(*index).is_some())
            .count()
    }

    /// True when a non-empty field follows an empty one.
    pub fn has_gap(&self) -> bool {
        let arity = self.arity();
        (arity..FIELD_COUNT).any(|index| self.field(index).is_some())
    }
}
