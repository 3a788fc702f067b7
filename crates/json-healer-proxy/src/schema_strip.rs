//! Recursive removal of `default` keys from a JSON Schema before it is
//! forwarded upstream. Plain `serde_json::Value` surgery, deliberately kept
//! out of `json-healer-core`: it's a proxy-side accommodation for upstream
//! APIs that reject schemas containing `default`, not part of the resolver.

use serde_json::Value;

pub fn strip_defaults(schema: &mut Value) {
    match schema {
        Value::Object(map) => {
            map.remove("default");
            for value in map.values_mut() {
                strip_defaults(value);
            }
        }
        Value::Array(items) => {
            for item in items {
                strip_defaults(item);
            }
        }
        _ => {}
    }
}
