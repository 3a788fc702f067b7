use serde_json::Value;

/// Bound on `$ref` hops, to defend against cyclic fragment references without
/// needing to track a visited set.
const MAX_REF_HOPS: usize = 32;

/// A read-only JSON-Schema-like tree the [`crate::resolver`] walks.
///
/// Only the subset of JSON Schema this system understands is meaningful:
/// `type`, `properties`, `required`, `items`, `default`, `$ref`, and the three
/// conventional `$ref` pools (`definitions`, `$defs`, `components.schemas`).
/// Everything else is carried along but never interpreted.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    root: Value,
}

impl SchemaNode {
    /// Build a schema tree from a raw JSON value (e.g. the `schema` field of an
    /// OpenAI-style `json_schema` response format).
    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    pub(crate) fn root(&self) -> &Value {
        &self.root
    }

    /// Follow `node`'s `$ref` chain (if any) against this tree's root, up to
    /// [`MAX_REF_HOPS`] hops. Returns `None` if a `$ref` segment can't be
    /// resolved, or if the chain doesn't bottom out within the hop bound.
    pub(crate) fn resolve_ref<'a>(&'a self, mut node: &'a Value) -> Option<&'a Value> {
        for _ in 0..MAX_REF_HOPS {
            let Some(pointer) = node.get("$ref").and_then(Value::as_str) else {
                return Some(node);
            };
            node = self.follow_pointer(pointer)?;
        }
        None
    }

    /// Resolve a single fragment-local pointer of the form
    /// `#/definitions/Name`, `#/$defs/Name`, or `#/components/schemas/Name`.
    fn follow_pointer(&self, pointer: &str) -> Option<&Value> {
        let rest = pointer.strip_prefix('#')?.strip_prefix('/')?;
        let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
        if !is_recognized_pool(&segments) {
            return None;
        }
        let mut current = &self.root;
        for segment in &segments {
            current = current.get(segment)?;
        }
        Some(current)
    }
}

fn is_recognized_pool(segments: &[&str]) -> bool {
    match segments.first().copied() {
        Some("definitions") | Some("$defs") => true,
        Some("components") => segments.get(1).copied() == Some("schemas"),
        _ => false,
    }
}
