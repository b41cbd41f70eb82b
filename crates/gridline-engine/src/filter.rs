//! Conjunctive row filtering over record fields.
//!
//! Filtering composes with sorting at the façade: the visible row sequence
//! is the sort permutation with non-matching logical rows dropped, so
//! toggling a filter never disturbs relative order.

use std::cmp::Ordering;

use gridline_common::{FieldPath, Record, Value};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::locale::Locale;
use crate::sort::compare_values;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    Equals,
    NotEquals,
    /// Case-folded substring match; non-text values never match.
    Contains,
    GreaterThan,
    LessThan,
    IsNull,
    NotNull,
}

/// One predicate on a dotted field. The path is compiled at construction.
#[derive(Debug, Clone)]
pub struct FilterCondition {
    field: String,
    path: FieldPath,
    pub op: FilterOp,
    pub operand: Value,
}

impl FilterCondition {
    pub fn new<S: Into<String>>(field: S, op: FilterOp, operand: Value) -> Self {
        let field = field.into();
        let path = FieldPath::parse(field.as_str());
        Self {
            field,
            path,
            op,
            operand,
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn matches(&self, record: &Record, locale: &Locale) -> bool {
        let value = record.resolve(&self.path).filter(|v| !v.is_null());
        match self.op {
            FilterOp::IsNull => value.is_none(),
            FilterOp::NotNull => value.is_some(),
            FilterOp::Equals => {
                value.is_some_and(|v| compare_values(v, &self.operand, locale) == Ordering::Equal)
            }
            FilterOp::NotEquals => {
                value.is_none_or(|v| compare_values(v, &self.operand, locale) != Ordering::Equal)
            }
            FilterOp::GreaterThan => {
                value.is_some_and(|v| compare_values(v, &self.operand, locale) == Ordering::Greater)
            }
            FilterOp::LessThan => {
                value.is_some_and(|v| compare_values(v, &self.operand, locale) == Ordering::Less)
            }
            FilterOp::Contains => match (value.and_then(Value::as_text), self.operand.as_text()) {
                (Some(haystack), Some(needle)) => locale
                    .fold_case_invariant(haystack)
                    .contains(&locale.fold_case_invariant(needle)),
                _ => false,
            },
        }
    }
}

/// All conditions must match (conjunction). An empty set passes every row.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    conditions: Vec<FilterCondition>,
}

impl FilterSet {
    pub fn new(conditions: Vec<FilterCondition>) -> Self {
        Self { conditions }
    }

    pub fn conditions(&self) -> &[FilterCondition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn matches(&self, record: &Record, locale: &Locale) -> bool {
        self.conditions.iter().all(|c| c.matches(record, locale))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records() -> Vec<Record> {
        vec![
            Record::new().with("name", "Widget").with("qty", 10i64),
            Record::new().with("name", "Gadget").with("qty", 3i64),
            Record::new().with("name", "widget pro").with("qty", 25i64),
            Record::new().with("qty", 7i64),
        ]
    }

    fn matching(set: &FilterSet) -> Vec<usize> {
        let locale = Locale::invariant();
        records()
            .iter()
            .enumerate()
            .filter(|(_, r)| set.matches(r, &locale))
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn contains_is_case_folded() {
        let set = FilterSet::new(vec![FilterCondition::new(
            "name",
            FilterOp::Contains,
            Value::Text("WIDGET".into()),
        )]);
        assert_eq!(matching(&set), vec![0, 2]);
    }

    #[test]
    fn numeric_threshold() {
        let set = FilterSet::new(vec![FilterCondition::new(
            "qty",
            FilterOp::GreaterThan,
            Value::Int(5),
        )]);
        assert_eq!(matching(&set), vec![0, 2, 3]);
    }

    #[test]
    fn conjunction_of_conditions() {
        let set = FilterSet::new(vec![
            FilterCondition::new("qty", FilterOp::GreaterThan, Value::Int(5)),
            FilterCondition::new("name", FilterOp::NotNull, Value::Null),
        ]);
        assert_eq!(matching(&set), vec![0, 2]);
    }

    #[test]
    fn null_predicates() {
        let set = FilterSet::new(vec![FilterCondition::new(
            "name",
            FilterOp::IsNull,
            Value::Null,
        )]);
        assert_eq!(matching(&set), vec![3]);
    }

    #[test]
    fn not_equals_includes_missing_fields() {
        let set = FilterSet::new(vec![FilterCondition::new(
            "name",
            FilterOp::NotEquals,
            Value::Text("Widget".into()),
        )]);
        assert_eq!(matching(&set), vec![1, 2, 3]);
    }

    #[test]
    fn empty_set_passes_everything() {
        assert_eq!(matching(&FilterSet::default()), vec![0, 1, 2, 3]);
    }
}
