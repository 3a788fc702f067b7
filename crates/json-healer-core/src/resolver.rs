//! Schema resolution: mapping a stack depth to the sub-schema that governs it.
//!
//! This never parses or validates JSON values. It only walks a [`SchemaNode`]
//! tree the same way the stack was built — `properties[current_key]` for
//! object descents, `items` for array descents — resolving `$ref` at each hop.

use serde_json::Value;

use crate::frame::Frame;
use crate::schema::SchemaNode;

/// Return the sub-schema governing the frame at `stack[depth]`, or `None`
/// ("unknown") if the walk from the root can't reach it.
pub(crate) fn resolve_subschema<'a>(
    schema: &'a SchemaNode,
    stack: &[Frame],
    depth: usize,
) -> Option<&'a Value> {
    let mut current = schema.root();
    for (i, frame) in stack.iter().enumerate().take(depth + 1) {
        current = schema.resolve_ref(current)?;
        if i == depth {
            return Some(current);
        }
        current = if frame.is_object {
            let key = frame.current_key.as_deref()?;
            current.get("properties")?.get(key)?
        } else {
            current.get("items")?
        };
    }
    schema.resolve_ref(current)
}

/// The `required` property names of a governing sub-schema, in declared order.
/// Non-string entries are skipped rather than rejecting the whole list, since a
/// malformed entry shouldn't forfeit injection for the names that are well-formed.
pub(crate) fn required_names(governing: &Value) -> Vec<String> {
    governing
        .get("required")
        .and_then(Value::as_array)
        .map(|names| {
            names
                .iter()
                .filter_map(|v| v.as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}

/// The value to inject for a missing required key: its schema's resolved
/// `default`, or `null` if there is none.
pub(crate) fn default_for_key(schema: &SchemaNode, governing: &Value, key: &str) -> Value {
    governing
        .get("properties")
        .and_then(|properties| properties.get(key))
        .and_then(|property| schema.resolve_ref(property))
        .and_then(|property| property.get("default"))
        .cloned()
        .unwrap_or(Value::Null)
}
