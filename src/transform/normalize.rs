//! Schema normalizer for Hacker News items
//!
//! Items arrive in one of two shapes:
//!
//! | Shape A (search API) | Shape B (canonical) |
//! |----------------------|---------------------|
//! | `author` | `by` |
//! | `points` | `score` |
//! | `num_comments` | `descendants` |
//! | `created_at_i` | `time` |
//! | `children` | `_comments` |
//!
//! Normalization maps shape A onto shape B field by field, only where the
//! shape B field is absent, and recurses into the comment list. This is the
//! single place a descendant count is derived, so it must see the untrimmed
//! tree. The transform is idempotent.

use serde_json::{Map, Value};

/// Normalizes one raw item (and its comment tree) to the canonical shape
///
/// An item carrying neither `author` nor `by` is not recognized and comes
/// back unchanged.
pub fn normalize_item(item: Value) -> Value {
    let Value::Object(mut map) = item else {
        return item;
    };

    if !map.contains_key("author") && !map.contains_key("by") {
        return Value::Object(map);
    }

    rename_field(&mut map, "author", "by", false);
    rename_field(&mut map, "points", "score", true);
    rename_field(&mut map, "num_comments", "descendants", true);
    rename_field(&mut map, "created_at_i", "time", true);

    if let Some(children) = map.remove("children") {
        map.insert("_comments".to_string(), normalize_list(children));
    } else if let Some(comments) = map.remove("_comments") {
        map.insert("_comments".to_string(), normalize_list(comments));
    }

    if !map.contains_key("descendants") {
        if let Some(Value::Array(comments)) = map.get("_comments") {
            let count = count_descendants(comments);
            map.insert("descendants".to_string(), Value::from(count));
        }
    }

    Value::Object(map)
}

/// Counts every node of a comment list, recursively
///
/// Works on both `children` and `_comments` trees so it can run before or
/// after normalization. Null entries are not comments.
pub fn count_descendants(comments: &[Value]) -> u64 {
    comments
        .iter()
        .filter(|c| !c.is_null())
        .map(|c| 1 + count_descendants(child_list(c)))
        .sum()
}

fn child_list(node: &Value) -> &[Value] {
    let non_empty = |key: &str| match node.get(key) {
        Some(Value::Array(list)) if !list.is_empty() => Some(list.as_slice()),
        _ => None,
    };
    non_empty("children")
        .or_else(|| non_empty("_comments"))
        .unwrap_or(&[])
}

/// Moves `from` to `to` unless `to` is already present
fn rename_field(map: &mut Map<String, Value>, from: &str, to: &str, zero_if_null: bool) {
    if map.contains_key(to) {
        return;
    }
    if let Some(value) = map.remove(from) {
        let value = if zero_if_null && value.is_null() {
            Value::from(0)
        } else {
            value
        };
        map.insert(to.to_string(), value);
    }
}

fn normalize_list(list: Value) -> Value {
    match list {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .filter(|c| !c.is_null())
                .map(normalize_item)
                .collect(),
        ),
        _ => Value::Array(Vec::new()),
    }
}
