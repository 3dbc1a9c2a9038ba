/// Per-node parameter overrides ("tweaks")
///
/// A comparison request may carry a `data` list of override records, one per
/// node. Each record is keyed by its own `nodeId` field and applied to every
/// version's graph data before execution; because the override targets a node
/// by logical identifier rather than version-specific structure, the same
/// tweaks value is reused unmodified across all versions of one question.

use serde_json::{Map, Value};
use std::collections::HashMap;

/// Mapping from node identifier to a record of parameter overrides
pub type Tweaks = HashMap<String, Map<String, Value>>;

/// Node ids matching this marker are file-input nodes
pub const FILE_INPUT_MARKER: &str = "InputFile";

/// Parameter under which a file-input node expects its file location
pub const FILE_PATH_PARAM: &str = "file_path";

/// Build the tweaks mapping from the request's override records
///
/// Records without a string `nodeId` are skipped. For file-input nodes the
/// override value is additionally stored as a `file_path` parameter so the
/// node resolves a concrete file location instead of an inline value.
pub fn build(records: &[Value]) -> Tweaks {
    let mut tweaks = Tweaks::new();

    for record in records {
        let Some(fields) = record.as_object() else {
            tracing::warn!("ignoring non-object node override: {}", record);
            continue;
        };
        let Some(node_id) = fields.get("nodeId").and_then(Value::as_str) else {
            tracing::warn!("ignoring node override without nodeId: {}", record);
            continue;
        };

        let mut params: Map<String, Value> = fields
            .iter()
            .filter(|(key, _)| key.as_str() != "nodeId" && key.as_str() != "id")
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        if node_id.contains(FILE_INPUT_MARKER) {
            if let Some(value) = fields.get("value") {
                params.insert(FILE_PATH_PARAM.to_string(), value.clone());
            }
        }

        tweaks.insert(node_id.to_string(), params);
    }

    tweaks
}

/// Merge tweaks into a version's graph data
///
/// Walks the payload's `nodes` array and merges each override object into the
/// matching node's `params`. Nodes without overrides and payloads without a
/// `nodes` array pass through unchanged.
pub fn apply(graph_data: &Value, tweaks: &Tweaks) -> Value {
    let mut graph = graph_data.clone();
    if tweaks.is_empty() {
        return graph;
    }

    let Some(nodes) = graph.get_mut("nodes").and_then(Value::as_array_mut) else {
        return graph;
    };

    for node in nodes {
        let Some(node_id) = node.get("id").and_then(Value::as_str).map(str::to_string) else {
            continue;
        };
        let Some(overrides) = tweaks.get(&node_id) else {
            continue;
        };
        let Some(node_fields) = node.as_object_mut() else {
            continue;
        };

        let params = node_fields
            .entry("params".to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        match params.as_object_mut() {
            Some(existing) => {
                for (key, value) in overrides {
                    existing.insert(key.clone(), value.clone());
                }
            }
            None => *params = Value::Object(overrides.clone()),
        }
    }

    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_overrides_by_node_id() {
        let records = vec![json!({"nodeId": "ChatNode-1", "value": "hello"})];
        let tweaks = build(&records);

        assert_eq!(tweaks.len(), 1);
        assert_eq!(tweaks["ChatNode-1"]["value"], json!("hello"));
        assert!(!tweaks["ChatNode-1"].contains_key("nodeId"));
    }

    #[test]
    fn file_input_nodes_get_file_path() {
        let records = vec![json!({"nodeId": "InputFileNode-3", "value": "/tmp/q.pdf"})];
        let tweaks = build(&records);

        assert_eq!(tweaks["InputFileNode-3"]["value"], json!("/tmp/q.pdf"));
        assert_eq!(tweaks["InputFileNode-3"][FILE_PATH_PARAM], json!("/tmp/q.pdf"));
    }

    #[test]
    fn records_without_node_id_are_skipped() {
        let records = vec![json!({"value": "orphan"}), json!("not an object")];
        assert!(build(&records).is_empty());
    }

    #[test]
    fn apply_merges_params_into_matching_nodes() {
        let graph = json!({
            "nodes": [
                {"id": "a", "params": {"kept": true}},
                {"id": "b", "params": {"value": "old"}}
            ],
            "edges": []
        });
        let tweaks = build(&[json!({"nodeId": "b", "value": "new"})]);

        let tweaked = apply(&graph, &tweaks);
        assert_eq!(tweaked["nodes"][0]["params"], json!({"kept": true}));
        assert_eq!(tweaked["nodes"][1]["params"]["value"], json!("new"));
    }

    #[test]
    fn apply_leaves_opaque_payloads_alone() {
        let graph = json!({"blob": [1, 2, 3]});
        let tweaks = build(&[json!({"nodeId": "x", "value": 1})]);
        assert_eq!(apply(&graph, &tweaks), graph);
    }
}
