//! Structural normalization of raw stored values into relational tuples.
//!
//! Every nesting level contributes one or more columns. Sequences combine their
//! first element with the rest as a cross product, mappings treat each entry as
//! an independent group of rows.
//!
//! ```text
//! "str10"                         -> [str10]
//! [1, 2]                          -> [1] [2]
//! {"k": 1, "j": [2, 3]}           -> [k,1] [j,2] [j,3]
//! {"id0": [{"0": 1}, [11, 12]]}   -> [id0,0,1,11] [id0,0,1,12]
//! ```

use super::{Primitive, RawValue, Tuple};

/// Flatten a raw value into tuples.
///
/// The set of tuples is fully determined by the input. Enumeration order is
/// reproducible for identical input, and follows the traversal described on
/// the private helpers below.
pub fn normalize(value: &RawValue) -> Vec<Tuple> {
    match value {
        RawValue::Primitive(p) => vec![Tuple::new(vec![p.clone()])],
        RawValue::Sequence(items) => normalize_sequence(items),
        RawValue::Mapping(entries) => normalize_mapping(entries),
    }
}

/// `[first, ..rest]` is `first` crossed with the rows of `rest`, down to the
/// longest all-primitive suffix, which contributes one single-column row per
/// element. The fold runs right to left so sequence length never adds stack depth.
fn normalize_sequence(items: &[RawValue]) -> Vec<Tuple> {
    let suffix_start = items
        .iter()
        .rposition(|item| !item.is_primitive())
        .map_or(0, |pos| pos + 1);

    let mut rows: Vec<Tuple> = items[suffix_start..]
        .iter()
        .filter_map(RawValue::as_primitive)
        .map(|p| Tuple::new(vec![p.clone()]))
        .collect();

    for item in items[..suffix_start].iter().rev() {
        rows = cross_product(normalize(item), rows);
    }
    rows
}

fn normalize_mapping(entries: &[(Primitive, RawValue)]) -> Vec<Tuple> {
    if entries.is_empty() {
        return Vec::new();
    }

    if entries
        .iter()
        .all(|(_, v)| v.is_primitive() || v.is_primitive_sequence())
    {
        return primitive_pairs(entries);
    }

    if let [(key, value)] = entries {
        return unwrap_entry(key, value);
    }

    // Sibling entries are alternative row groups
    entries
        .iter()
        .flat_map(|entry| normalize_mapping(std::slice::from_ref(entry)))
        .collect()
}

/// `{k: v}` or `{k: [v1, v2]}` with primitive values: one `[k, v]` row per value.
fn primitive_pairs(entries: &[(Primitive, RawValue)]) -> Vec<Tuple> {
    let mut rows = Vec::new();
    for (key, value) in entries {
        match value {
            RawValue::Primitive(p) => rows.push(Tuple::new(vec![key.clone(), p.clone()])),
            RawValue::Sequence(items) => {
                for item in items.iter().filter_map(RawValue::as_primitive) {
                    rows.push(Tuple::new(vec![key.clone(), item.clone()]));
                }
            }
            // excluded by the caller
            RawValue::Mapping(_) => {}
        }
    }
    rows
}

/// A single entry with a composite value becomes the sequence `[key, ..value]`.
fn unwrap_entry(key: &Primitive, value: &RawValue) -> Vec<Tuple> {
    let mut items = vec![RawValue::Primitive(key.clone())];
    match value {
        RawValue::Sequence(inner) => items.extend(inner.iter().cloned()),
        other => items.push(other.clone()),
    }
    normalize_sequence(&items)
}

/// Merge the rows of a sequence head (`left`) with the rows of its tail (`right`).
///
/// Each merged row is `left ++ right`. Rows are enumerated with `right` in the
/// outer loop and `left` in the inner loop.
fn cross_product(left: Vec<Tuple>, right: Vec<Tuple>) -> Vec<Tuple> {
    if left.is_empty() {
        return right;
    }
    if right.is_empty() {
        return left;
    }

    let mut rows = Vec::with_capacity(left.len() * right.len());
    for r in &right {
        for l in &left {
            rows.push(l.concat(r));
        }
    }
    rows
}
