//! Path operations over a room's JSON document.

use serde_json::{Map, Value};

use crate::dao::storage::TreeError;

/// Read the node at `segments`, if present.
pub fn value_at<'a>(root: &'a Value, segments: &[String]) -> Option<&'a Value> {
    segments.iter().try_fold(root, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Replace the node at `segments`, creating intermediate objects as needed.
///
/// Writing `null` removes an object key. An array index equal to the array
/// length appends.
pub fn set_at(root: &mut Value, segments: &[String], value: Value) -> Result<(), TreeError> {
    let Some((last, parents)) = segments.split_last() else {
        *root = value;
        return Ok(());
    };

    let parent = node_mut(root, parents)?;
    if value.is_null() {
        remove_child(parent, last);
        return Ok(());
    }

    *child_mut(parent, last)? = value;
    Ok(())
}

/// Add `value` under the collection at `segments` and return the key it landed on.
///
/// Arrays grow by one and the key is the new index. Objects (or absent nodes)
/// receive the value under `fresh_key()`.
pub fn append_at(
    root: &mut Value,
    segments: &[String],
    value: Value,
    fresh_key: impl FnOnce() -> String,
) -> Result<String, TreeError> {
    let node = node_mut(root, segments)?;
    match node {
        Value::Array(items) => {
            items.push(value);
            Ok((items.len() - 1).to_string())
        }
        Value::Object(map) => {
            let key = fresh_key();
            map.insert(key.clone(), value);
            Ok(key)
        }
        other => {
            let key = fresh_key();
            let mut map = Map::new();
            map.insert(key.clone(), value);
            *other = Value::Object(map);
            Ok(key)
        }
    }
}

fn node_mut<'a>(root: &'a mut Value, segments: &[String]) -> Result<&'a mut Value, TreeError> {
    let mut node = root;
    for segment in segments {
        node = child_mut(node, segment)?;
    }
    Ok(node)
}

fn child_mut<'a>(node: &'a mut Value, segment: &str) -> Result<&'a mut Value, TreeError> {
    if node.is_array() {
        let index = parse_index(segment)?;
        let Value::Array(items) = node else {
            return Err(TreeError::InvalidIndex {
                segment: segment.to_owned(),
            });
        };
        let len = items.len();
        if index == len {
            items.push(Value::Null);
        }
        return items
            .get_mut(index)
            .ok_or(TreeError::IndexOutOfRange { index, len });
    }

    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => Ok(map.entry(segment.to_owned()).or_insert(Value::Null)),
        _ => Err(TreeError::InvalidIndex {
            segment: segment.to_owned(),
        }),
    }
}

fn remove_child(node: &mut Value, segment: &str) {
    match node {
        Value::Object(map) => {
            map.shift_remove(segment);
        }
        Value::Array(items) => {
            if let Some(slot) = segment.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
                *slot = Value::Null;
            }
        }
        _ => {}
    }
}

fn parse_index(segment: &str) -> Result<usize, TreeError> {
    segment.parse().map_err(|_| TreeError::InvalidIndex {
        segment: segment.to_owned(),
    })
}
