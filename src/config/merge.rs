//! Merging and path-based editing of the configuration tree.
//!
//! Layer merges are shallow: a key in the overlay replaces the base value
//! for that key entirely, and nested mappings are not merged recursively.

use crate::error::{ConfigError, Result};
use serde_json::{Map, Value};

/// Shallow-merge `overlay` into `base`: overlay keys win, base-only keys stay.
///
/// A nested mapping in `overlay` replaces the base value for that key.
pub fn shallow_merge(base: &mut Map<String, Value>, overlay: Map<String, Value>) {
    for (key, value) in overlay {
        base.insert(key, value);
    }
}

/// Look up a dotted key path such as `vlm.temperature`.
///
/// Returns `None` when any segment is missing or a parent is not a mapping.
pub fn get_path<'a>(tree: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    let mut segments = key.split('.');
    let first = segments.next()?;
    segments.try_fold(tree.get(first)?, |node, seg| node.as_object()?.get(seg))
}

/// Set the value at a dotted key path, creating intermediate mappings.
///
/// The leaf is overwritten whatever it held. Descending through an existing
/// non-mapping value fails with [`ConfigError::NotAMapping`] and leaves the
/// tree unchanged.
pub fn set_path(tree: &mut Map<String, Value>, key: &str, value: Value) -> Result<()> {
    let segments: Vec<&str> = key.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(ConfigError::InvalidKeyPath {
            key: key.to_string(),
        });
    }
    let (leaf, parents) = segments
        .split_last()
        .ok_or_else(|| ConfigError::InvalidKeyPath {
            key: key.to_string(),
        })?;

    // Check the whole path first so a rejected update leaves no empty
    // mappings behind.
    let mut cursor = Some(&*tree);
    for (depth, seg) in parents.iter().enumerate() {
        let Some(map) = cursor else { break };
        cursor = match map.get(*seg) {
            None => None,
            Some(Value::Object(child)) => Some(child),
            Some(_) => {
                return Err(ConfigError::NotAMapping {
                    path: parents[..=depth].join("."),
                });
            }
        };
    }

    let mut node = tree;
    for seg in parents {
        node = match node
            .entry(seg.to_string())
            .or_insert_with(|| Value::Object(Map::new()))
        {
            Value::Object(child) => child,
            _ => {
                return Err(ConfigError::NotAMapping {
                    path: key.to_string(),
                });
            }
        };
    }
    node.insert(leaf.to_string(), value);
    Ok(())
}
