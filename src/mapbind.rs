//! Storage into generic string-keyed map properties.
//!
//! A map-typed node bypasses descriptor lookup: the next path segment is a
//! literal key and every key is writable. The declared value type decides
//! the multi-value asymmetry once per property: a string-array value type
//! wraps scalar input into a one-element group and stores multi-value
//! input as-is, while a scalar value type narrows multi-value input to its
//! first element (both directions are handled by the coercer's terminal
//! normalization).

use serde_json::{Map, Value};

use crate::{error::BindError, schema::TypeDescriptor};

/// Returns the mutable entry node for `key` inside a map-typed slot,
/// materializing the map itself and a typed default for an absent entry so
/// recursive descent always has a node to continue into.
pub(crate) fn entry_node<'a>(
    slot: &'a mut Value,
    key: &str,
    value_ty: &TypeDescriptor,
) -> Result<&'a mut Value, BindError> {
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    let Value::Object(entries) = slot else {
        return Err(BindError::Schema {
            reason: format!("map entry `{key}` addressed on a non-object slot"),
        });
    };
    Ok(entries
        .entry(key.to_string())
        .or_insert_with(|| crate::expand::default_element(value_ty)))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn absent_bean_entries_are_auto_created() {
        let mut slot = Value::Null;
        let ty = TypeDescriptor::bean::<crate::binder::tests_support::Empty>();
        let node = entry_node(&mut slot, "over", &ty).unwrap();
        assert_eq!(node, &json!({}));
        assert_eq!(slot, json!({ "over": {} }));
    }

    #[test]
    fn existing_entries_are_reused() {
        let mut slot = json!({ "over": { "mystic": "v" } });
        let ty = TypeDescriptor::bean::<crate::binder::tests_support::Empty>();
        let node = entry_node(&mut slot, "over", &ty).unwrap();
        assert_eq!(node, &json!({ "mystic": "v" }));
    }
}
