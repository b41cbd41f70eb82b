//! Permutation-producing stable sort with composed comparators.

use std::cmp::Ordering;

use gridline_common::{FieldPath, Record, Value};

use crate::locale::Locale;

use super::model::{NullOrdering, SortDirection, SortModel, SortOptions, ValueComparator};

struct CompiledKey {
    path: FieldPath,
    descending: bool,
    comparator: Option<ValueComparator>,
}

/// Sort `rows` under `model`, returning the permutation whose i-th entry is
/// the logical row shown at visual position i.
///
/// - Stable: rows equal under every key keep their input order
///   (`slice::sort_by` is a stable adaptive mergesort, O(n log n) worst case).
/// - Non-mutating: `rows` is never reordered.
/// - Empty model: identity.
/// - Keys beyond the model's column limit are ignored.
pub fn sort_permutation(rows: &[Record], model: &SortModel, opts: &SortOptions) -> Vec<u32> {
    let mut permutation: Vec<u32> = (0..rows.len() as u32).collect();
    if model.is_empty() {
        return permutation;
    }
    // Compile each key's dotted path once; resolution is then per-row work.
    let keys: Vec<CompiledKey> = model
        .columns()
        .iter()
        .take(model.max_columns())
        .map(|c| CompiledKey {
            path: FieldPath::parse(&c.field),
            descending: c.direction == SortDirection::Descending,
            comparator: c.comparator.clone(),
        })
        .collect();

    permutation.sort_by(|&a, &b| compare_rows(&rows[a as usize], &rows[b as usize], &keys, opts));
    permutation
}

fn compare_rows(a: &Record, b: &Record, keys: &[CompiledKey], opts: &SortOptions) -> Ordering {
    for key in keys {
        let ord = compare_key(a.resolve(&key.path), b.resolve(&key.path), key, opts);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn compare_key(
    a: Option<&Value>,
    b: Option<&Value>,
    key: &CompiledKey,
    opts: &SortOptions,
) -> Ordering {
    // Unresolved paths and explicit nulls are the same thing here.
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => match opts.null_ordering {
            NullOrdering::NullsLast => Ordering::Greater,
            NullOrdering::NullsSmallest => directed(Ordering::Less, key),
        },
        (Some(_), None) => match opts.null_ordering {
            NullOrdering::NullsLast => Ordering::Less,
            NullOrdering::NullsSmallest => directed(Ordering::Greater, key),
        },
        (Some(a), Some(b)) => {
            let ord = match &key.comparator {
                Some(custom) => custom(a, b),
                None => compare_values(a, b, &opts.locale),
            };
            directed(ord, key)
        }
    }
}

fn directed(ord: Ordering, key: &CompiledKey) -> Ordering {
    if key.descending { ord.reverse() } else { ord }
}

/// Auto comparator dispatching on runtime value kind: numbers numerically
/// (`Int` and `Number` compare cross-kind), text via the invariant locale,
/// `false < true`, timestamps chronologically. Mismatched kinds fall back to
/// a fixed kind ranking so the order stays total.
pub fn compare_values(a: &Value, b: &Value, locale: &Locale) -> Ordering {
    if let (Some(x), Some(y)) = (a.as_number(), b.as_number()) {
        return x.total_cmp(&y);
    }
    match (a, b) {
        (Value::Text(x), Value::Text(y)) => locale.compare_text(x, y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Timestamp(x), Value::Timestamp(y)) => x.cmp(y),
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

fn kind_rank(v: &Value) -> u8 {
    match v {
        Value::Int(_) | Value::Number(_) => 0,
        Value::Text(_) => 1,
        Value::Bool(_) => 2,
        Value::Timestamp(_) => 3,
        Value::Null => 4,
    }
}

/// The permutation that restores original order:
/// `invert(p)[p[i]] == i`.
pub fn invert_permutation(p: &[u32]) -> Vec<u32> {
    let mut inverse = vec![0u32; p.len()];
    for (visual, &logical) in p.iter().enumerate() {
        inverse[logical as usize] = visual as u32;
    }
    inverse
}

/// Materialize `items` in permutation order.
pub fn apply_permutation<T: Clone>(p: &[u32], items: &[T]) -> Vec<T> {
    p.iter().map(|&i| items[i as usize].clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sort::SortColumn;
    use std::rc::Rc;

    fn rows() -> Vec<Record> {
        vec![
            Record::new().with("dept", "Sales").with("n", 3i64),
            Record::new().with("dept", "Eng").with("n", 1i64),
            Record::new().with("dept", "Sales").with("n", 2i64),
        ]
    }

    #[test]
    fn empty_model_is_identity() {
        let model = SortModel::new();
        let p = sort_permutation(&rows(), &model, &SortOptions::default());
        assert_eq!(p, vec![0, 1, 2]);
    }

    #[test]
    fn single_key_ascending() {
        let mut model = SortModel::new();
        model.add_column(SortColumn::ascending("dept"));
        let p = sort_permutation(&rows(), &model, &SortOptions::default());
        // Eng first; the two Sales rows keep input order (stability).
        assert_eq!(p, vec![1, 0, 2]);
    }

    #[test]
    fn descending_reverses_but_keeps_stability() {
        let mut model = SortModel::new();
        model.add_column(SortColumn::descending("dept"));
        let p = sort_permutation(&rows(), &model, &SortOptions::default());
        assert_eq!(p, vec![0, 2, 1]);
    }

    #[test]
    fn nulls_sort_last_regardless_of_direction() {
        let data = vec![
            Record::new().with("v", Value::Null),
            Record::new().with("v", 2i64),
            Record::new(),
            Record::new().with("v", 1i64),
        ];
        let mut model = SortModel::new();
        model.add_column(SortColumn::ascending("v"));
        let p = sort_permutation(&data, &model, &SortOptions::default());
        assert_eq!(p, vec![3, 1, 0, 2]);

        let mut model = SortModel::new();
        model.add_column(SortColumn::descending("v"));
        let p = sort_permutation(&data, &model, &SortOptions::default());
        assert_eq!(p, vec![1, 3, 0, 2]);
    }

    #[test]
    fn nulls_smallest_moves_with_direction() {
        let data = vec![
            Record::new().with("v", 2i64),
            Record::new(),
            Record::new().with("v", 1i64),
        ];
        let opts = SortOptions {
            null_ordering: NullOrdering::NullsSmallest,
            ..SortOptions::default()
        };
        let mut model = SortModel::new();
        model.add_column(SortColumn::ascending("v"));
        assert_eq!(sort_permutation(&data, &model, &opts), vec![1, 2, 0]);

        let mut model = SortModel::new();
        model.add_column(SortColumn::descending("v"));
        assert_eq!(sort_permutation(&data, &model, &opts), vec![0, 2, 1]);
    }

    #[test]
    fn cross_kind_numbers_compare_numerically() {
        let data = vec![
            Record::new().with("v", 2.5f64),
            Record::new().with("v", 2i64),
            Record::new().with("v", 3i64),
        ];
        let mut model = SortModel::new();
        model.add_column(SortColumn::ascending("v"));
        let p = sort_permutation(&data, &model, &SortOptions::default());
        assert_eq!(p, vec![1, 0, 2]);
    }

    #[test]
    fn custom_comparator_overrides_auto() {
        // Order by text length instead of lexicographically.
        let data = vec![
            Record::new().with("v", "aaa"),
            Record::new().with("v", "z"),
            Record::new().with("v", "bb"),
        ];
        let by_len: ValueComparator = Rc::new(|a, b| {
            let la = a.as_text().map_or(0, str::len);
            let lb = b.as_text().map_or(0, str::len);
            la.cmp(&lb)
        });
        let mut model = SortModel::new();
        model.add_column(SortColumn::ascending("v").with_comparator(by_len));
        let p = sort_permutation(&data, &model, &SortOptions::default());
        assert_eq!(p, vec![1, 2, 0]);
    }

    #[test]
    fn dotted_paths_resolve_into_nested_records() {
        let data = vec![
            Record::new().with_nested("addr", Record::new().with("city", "Oslo")),
            Record::new().with_nested("addr", Record::new().with("city", "Bergen")),
            Record::new(), // missing path sorts last
        ];
        let mut model = SortModel::new();
        model.add_column(SortColumn::ascending("addr.city"));
        let p = sort_permutation(&data, &model, &SortOptions::default());
        assert_eq!(p, vec![1, 0, 2]);
    }

    #[test]
    fn invert_restores_original_order() {
        let data = vec![
            Record::new().with("v", 3i64),
            Record::new().with("v", 1i64),
            Record::new().with("v", 2i64),
        ];
        let mut model = SortModel::new();
        model.add_column(SortColumn::ascending("v"));
        let p = sort_permutation(&data, &model, &SortOptions::default());
        let sorted = apply_permutation(&p, &data);
        let restored = apply_permutation(&invert_permutation(&p), &sorted);
        assert_eq!(restored, data);
    }
}
