//! Conversion between JSON values and the leaf rows they are stored as.
//!
//! Every scalar in the tree is one `(path, value)` leaf. Objects exist only
//! through their leaves, so an empty object and `null` both mean "nothing
//! here". Arrays are stored as objects keyed by index.

use serde_json::{Map, Value};

use crate::error::Result;
use crate::path::DbPath;

/// Append the leaves of `value`, rooted at `base`, to `out`.
pub fn flatten(base: &DbPath, value: &Value, out: &mut Vec<(DbPath, Value)>) -> Result<()> {
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (key, child) in map {
                flatten(&base.child(key)?, child, out)?;
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                flatten(&base.child(index.to_string())?, child, out)?;
            }
        }
        scalar => out.push((base.clone(), scalar.clone())),
    }
    Ok(())
}

/// Rebuild the value at `base` from leaves at or below it.
///
/// Leaves outside `base` are ignored. Returns `None` when nothing is stored.
pub fn assemble<I>(base: &DbPath, leaves: I) -> Option<Value>
where
    I: IntoIterator<Item = (DbPath, Value)>,
{
    let mut root: Option<Value> = None;

    for (path, value) in leaves {
        if !base.is_ancestor_or_self_of(&path) {
            continue;
        }
        let relative = &path.segments()[base.depth()..];
        if relative.is_empty() {
            return Some(value);
        }

        let mut node = root.get_or_insert_with(|| Value::Object(Map::new()));
        for segment in &relative[..relative.len() - 1] {
            node = as_object(node)
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        if let Some(last) = relative.last() {
            as_object(node).insert(last.clone(), value);
        }
    }

    root
}

fn as_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced by an object"),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn path(s: &str) -> DbPath {
        DbPath::parse(s).unwrap()
    }

    #[test]
    fn flatten_emits_one_leaf_per_scalar() {
        let mut leaves = Vec::new();
        flatten(
            &path("users/u1"),
            &json!({ "name": "Ann", "email": "ann@example.com", "extra": {} }),
            &mut leaves,
        )
        .unwrap();
        leaves.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            leaves,
            vec![
                (path("users/u1/email"), json!("ann@example.com")),
                (path("users/u1/name"), json!("Ann")),
            ]
        );
    }

    #[test]
    fn flatten_rejects_forbidden_keys() {
        let mut leaves = Vec::new();
        assert!(flatten(&path("users"), &json!({ "a.b": 1 }), &mut leaves).is_err());
    }

    #[test]
    fn assemble_nests_leaves_under_base() {
        let leaves = vec![
            (path("chats/a_b/m1/text"), json!("hi")),
            (path("chats/a_b/m1/seen"), json!(false)),
            (path("chats/a_c/m2/text"), json!("yo")),
            (path("users/a/name"), json!("A")),
        ];
        let value = assemble(&path("chats"), leaves).unwrap();
        assert_eq!(
            value,
            json!({
                "a_b": { "m1": { "text": "hi", "seen": false } },
                "a_c": { "m2": { "text": "yo" } },
            })
        );
    }

    #[test]
    fn assemble_scalar_and_missing() {
        let leaves = vec![(path("chats/a_b/m1/seen"), json!(true))];
        assert_eq!(
            assemble(&path("chats/a_b/m1/seen"), leaves.clone()),
            Some(json!(true))
        );
        assert_eq!(assemble(&path("users"), leaves), None);
    }

    #[test]
    fn arrays_become_index_keyed_objects() {
        let mut leaves = Vec::new();
        flatten(&path("list"), &json!(["x", "y"]), &mut leaves).unwrap();
        assert_eq!(
            assemble(&path("list"), leaves),
            Some(json!({ "0": "x", "1": "y" }))
        );
    }
}
