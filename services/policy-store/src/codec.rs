//! Row codec: variable-arity policy tuples <-> fixed-width rows.
//!
//! # Key invariants
//! - `encode` writes fields `0..n` in order and leaves the rest NULL; more than
//!   [`FIELD_COUNT`] fields, or an empty field, is rejected before any store
//!   I/O. An empty field would read back as the end of the rule.
//! - `decode` reads fields from the first column up to the first empty one.
//!   Anything after a gap is not part of the rule; it is dropped, not reported
//!   as an error.
use crate::error::{PolicyError, PolicyResult};
use crate::model::{FIELD_COUNT, PolicyRow, PolicyTuple};

pub fn encode<S: AsRef<str>>(ptype: &str, rule: &[S]) -> PolicyResult<PolicyRow> {
    if rule.len() > FIELD_COUNT {
        return Err(PolicyError::ArityExceeded {
            len: rule.len(),
            max: FIELD_COUNT,
        });
    }
    if let Some(index) = rule.iter().position(|value| value.as_ref().is_empty()) {
        return Err(PolicyError::EmptyField { index });
    }
    let mut row = PolicyRow {
        id: None,
        ptype: Some(ptype.to_string()),
        ..PolicyRow::default()
    };
    for (slot, value) in row.fields.iter_mut().zip(rule) {
        *slot = Some(value.as_ref().to_string());
    }
    Ok(row)
}

pub fn encode_tuple(tuple: &PolicyTuple) -> PolicyResult<PolicyRow> {
    encode(&tuple.ptype, &tuple.rule)
}

pub fn decode(row: &PolicyRow) -> PolicyResult<PolicyTuple> {
    let ptype = row
        .ptype
        .as_deref()
        .filter(|ptype| !ptype.is_empty())
        .ok_or_else(|| PolicyError::MalformedRow {
            id: row.id,
            reason: "missing ptype".to_string(),
        })?;
    if row.has_gap() {
        tracing::debug!(id = ?row.id, ptype, "dropping policy fields past a gap");
    }
    let rule = (0..row.arity())
        .filter_map(|index| row.field(index))
        .map(str::to_string)
        .collect();
    Ok(PolicyTuple {
        ptype: ptype.to_string(),
        rule,
    })
}

/// Policy line form of a stored row, e.g. `p, alice, data1, read`.
pub fn render_line(row: &PolicyRow) -> PolicyResult<String> {
    decode(row).map(|tuple| tuple.to_string())
}
