//! Sparse, positionally offset match filters.
//!
//! A caller supplies a tag, a starting field index and a list of values. The
//! value at position `k` constrains column `field_index + k`; empty values
//! leave their column unconstrained. The result is a conjunction of
//! per-column equalities plus the tag equality, which stores evaluate either
//! as SQL predicates or in process via [`RowFilter::matches`].
use crate::model::{FIELD_COUNT, PolicyRow};
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldConstraint {
    /// Column index in `0..FIELD_COUNT`.
    pub index: usize,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowFilter {
    pub ptype: String,
    pub constraints: Vec<FieldConstraint>,
}

impl RowFilter {
    pub fn matches(&self, row: &PolicyRow) -> bool {
        row.ptype.as_deref() == Some(self.ptype.as_str())
            && self.constraints.iter().all(|constraint| {
                row.fields
                    .get(constraint.index)
                    .and_then(|value| value.as_deref())
                    == Some(constraint.value.as_str())
            })
    }
}

/// Stored columns covered by a value list of length `len` starting at
/// `field_index`. Positions past the last column are cut off.
fn window(field_index: usize, len: usize) -> Range<usize> {
    let end = field_index.saturating_add(len).min(FIELD_COUNT);
    field_index.min(FIELD_COUNT)..end
}

/// Build the filter for `(ptype, field_index, values)`.
///
/// Returns `None` when `values` is empty: an empty pattern must never turn
/// into a tag-wide delete. Values that would land past the last stored column
/// constrain nothing.
pub fn build_filter<S: AsRef<str>>(
    ptype: &str,
    field_index: usize,
    values: &[S],
) -> Option<RowFilter> {
    if values.is_empty() {
        return None;
    }
    let constraints = window(field_index, values.len())
        .zip(values)
        .filter(|(_, value)| !value.as_ref().is_empty())
        .map(|(index, value)| FieldConstraint {
            index,
            value: value.as_ref().to_string(),
        })
        .collect();
    Some(RowFilter {
        ptype: ptype.to_string(),
        constraints,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode;

    fn constraint(index: usize, value: &str) -> FieldConstraint {
        FieldConstraint {
            index,
            value: value.to_string(),
        }
    }

    #[test]
    fn empty_values_emit_no_filter() {
        assert_eq!(build_filter::<&str>("p", 0, &[]), None);
        assert_eq!(build_filter::<&str>("p", 3, &[]), None);
    }

    #[test]
    fn empty_values_are_skipped() {
        let filter = build_filter("p", 0, &["alice", "", "doc1"])
            .expect("filter");
        assert_eq!(filter.ptype, "p");
        assert_eq!(
            filter.constraints,
            vec![constraint(0, "alice"), constraint(2, "doc1")]
        );
    }

    #[test]
    fn offset_shifts_columns() {
        let filter = build_filter("g", 1, &["admin"])
            .expect("filter");
        assert_eq!(filter.constraints, vec![constraint(1, "admin")]);
    }

    #[test]
    fn window_boundaries() {
        let full = build_filter("p", 0, &["a", "b", "c", "d", "e", "f"])
            .expect("filter");
        assert_eq!(full.constraints.len(), FIELD_COUNT);

        let last = build_filter("p", 5, &["f"]).expect("filter");
        assert_eq!(last.constraints, vec![constraint(5, "f")]);

        let clipped = build_filter("p", 4, &["a", "b", "c"])
            .expect("filter");
        assert_eq!(clipped.constraints, vec![constraint(4, "a"), constraint(5, "b")]);

        let trailing_empty = build_filter("p", 5, &["b", ""])
            .expect("filter");
        assert_eq!(trailing_empty.constraints, vec![constraint(5, "b")]);

        let past_end = build_filter("p", 6, &["x"]).expect("filter");
        assert!(past_end.constraints.is_empty());
        let far_past_end = build_filter("p", usize::MAX, &["x"])
            .expect("filter");
        assert!(far_past_end.constraints.is_empty());
    }

    #[test]
    fn all_empty_values_constrain_only_the_tag() {
        let filter = build_filter("p", 0, &["", ""]).expect("filter");
        assert!(filter.constraints.is_empty());
    }

    #[test]
    fn matches_checks_tag_and_constraints() {
        let filter = build_filter("p", 0, &["alice", "", "doc1"])
            .expect("filter");
        let hit = encode("p", &["alice", "anything", "doc1", "extra"]).expect("row");
        let wrong_field = encode("p", &["alice", "anything", "doc2"]).expect("row");
        let wrong_tag = encode("p2", &["alice", "anything", "doc1"]).expect("row");
        let short = encode("p", &["alice"]).expect("row");
        assert!(filter.matches(&hit));
        assert!(!filter.matches(&wrong_field));
        assert!(!filter.matches(&wrong_tag));
        assert!(!filter.matches(&short));
    }
}
