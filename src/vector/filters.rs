//! Construction of namespace-scoped query filters.

use serde_json::{Map, Value, json};

/// Build the payload filter applied to every search.
///
/// The namespace clause is always present so queries can only ever touch one
/// tenant partition; caller-supplied metadata constraints are appended as
/// additional exact-match clauses.
pub fn build_query_filter(namespace: &str, extra: Option<&Map<String, Value>>) -> Value {
    let mut must = vec![json!({
        "key": "namespace",
        "match": { "value": namespace }
    })];

    if let Some(conditions) = extra {
        for (key, value) in conditions {
            must.push(json!({
                "key": key,
                "match": { "value": value }
            }));
        }
    }

    json!({ "must": must })
}
