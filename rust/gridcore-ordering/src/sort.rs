//! Stable, type-aware sort of row positions by an aligned value vector.

use std::{borrow::Cow, cmp::Ordering};

use gridcore_text_index::Value;
use ordered_float::OrderedFloat;

use crate::Permutation;

/// How the values of a sort vector are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortMode {
    /// Values compare as `f64`. Absent values, NaN and text that does not parse
    /// as a number compare as negative infinity.
    Numeric,
    /// Values compare by their string form, ordinally. Absent values compare as
    /// the empty string.
    Lexicographic,
}

/// Picks the comparison mode from the first non-null value, scanning in row
/// order. A vector with no present values sorts numerically (all keys tie).
pub fn detect_sort_mode(values: &[Value]) -> SortMode {
    match values.iter().find(|v| !v.is_null()) {
        Some(Value::Text(_)) => SortMode::Lexicographic,
        _ => SortMode::Numeric,
    }
}

/// Returns the row positions `0..values.len()` ordered by `values`.
///
/// `descending` inverts the value comparison only; equal values always keep
/// ascending row order, so the sort is stable in both directions.
pub fn sort_by_vector(values: &[Value], descending: bool) -> Permutation {
    if values.is_empty() {
        return Permutation::new();
    }
    let mode = detect_sort_mode(values);
    log::debug!(
        "sorting {} rows, mode: {mode:?}, descending: {descending}",
        values.len()
    );
    match mode {
        SortMode::Numeric => {
            let keys: Vec<OrderedFloat<f64>> = values.iter().map(numeric_key).collect();
            sort_keys(&keys, descending)
        }
        SortMode::Lexicographic => {
            let keys: Vec<Cow<str>> = values.iter().map(lexicographic_key).collect();
            sort_keys(&keys, descending)
        }
    }
}

fn numeric_key(value: &Value) -> OrderedFloat<f64> {
    match value.as_f64() {
        Some(v) if !v.is_nan() => OrderedFloat(v),
        _ => OrderedFloat(f64::NEG_INFINITY),
    }
}

fn lexicographic_key(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Text(s) => Cow::Borrowed(s.as_str()),
        Value::Null => Cow::Borrowed(""),
        other => Cow::Owned(other.to_string()),
    }
}

fn sort_keys<K: Ord>(keys: &[K], descending: bool) -> Permutation {
    let mut indices: Vec<u32> = (0..keys.len() as u32).collect();
    indices.sort_unstable_by(|&a, &b| {
        let ord = keys[a as usize].cmp(&keys[b as usize]);
        let ord = if descending { ord.reverse() } else { ord };
        ord.then_with(|| a.cmp(&b))
    });
    Permutation::from(indices)
}

/// Compares two values the way [`sort_by_vector`] would in `mode`.
pub fn compare_values(left: &Value, right: &Value, mode: SortMode) -> Ordering {
    match mode {
        SortMode::Numeric => numeric_key(left).cmp(&numeric_key(right)),
        SortMode::Lexicographic => lexicographic_key(left).cmp(&lexicographic_key(right)),
    }
}
