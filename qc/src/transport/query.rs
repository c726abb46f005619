//! Query string construction

use serde_json::Value;

/// Flatten a JSON object into query pairs
///
/// Arrays repeat the key once per element and nulls are skipped. Strings
/// are used as-is; other values use their JSON text.
pub fn query_pairs(params: &Value) -> Vec<(String, String)> {
    let Some(map) = params.as_object() else {
        return Vec::new();
    };

    let mut pairs = Vec::new();
    for (key, value) in map {
        match value {
            Value::Array(items) => {
                pairs.extend(items.iter().filter_map(scalar_text).map(|v| (key.clone(), v)));
            }
            other => {
                if let Some(v) = scalar_text(other) {
                    pairs.push((key.clone(), v));
                }
            }
        }
    }
    pairs
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
