/// Graph-definition parsing and structural validation
///
/// Version payloads are opaque to the store, but when a payload declares a
/// `nodes`/`edges` shape it must at least be a well-formed DAG before it is
/// accepted: every edge must reference a known node and the graph must be
/// acyclic. Payloads without that shape pass through untouched.

use anyhow::Result;
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// One node of a declared graph definition
///
/// Only the identity and the override-able params object matter here; node
/// behavior lives in the external graph executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    #[serde(default)]
    pub params: Value,
}

/// Directed connection between two nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
}

/// The declared shape of a structured graph payload
#[derive(Debug, Clone, Deserialize)]
pub struct GraphDef {
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

impl GraphDef {
    /// Try to read a version payload as a structured graph definition
    ///
    /// Returns None for payloads that do not declare a `nodes` array; those
    /// are treated as opaque executor input.
    pub fn try_parse(data: &Value) -> Option<Result<Self>> {
        data.get("nodes")?.as_array()?;
        Some(serde_json::from_value(data.clone()).map_err(Into::into))
    }
}

/// Validate a declared graph definition: known edge endpoints, no cycles
pub fn validate(def: &GraphDef) -> Result<()> {
    let mut graph = DiGraph::<&str, ()>::new();
    let mut node_id_to_index = HashMap::new();

    for node in &def.nodes {
        let index = graph.add_node(node.id.as_str());
        node_id_to_index.insert(node.id.as_str(), index);
    }

    for edge in &def.edges {
        let from = node_id_to_index
            .get(edge.from.as_str())
            .ok_or_else(|| anyhow::anyhow!("edge references unknown node: {}", edge.from))?;
        let to = node_id_to_index
            .get(edge.to.as_str())
            .ok_or_else(|| anyhow::anyhow!("edge references unknown node: {}", edge.to))?;
        graph.add_edge(*from, *to, ());
    }

    if toposort(&graph, None).is_err() {
        return Err(anyhow::anyhow!("graph contains cycles - must be a DAG"));
    }

    Ok(())
}

/// Validate a version payload if it declares a structured graph
pub fn validate_payload(data: &Value) -> Result<()> {
    match GraphDef::try_parse(data) {
        Some(parsed) => validate(&parsed?),
        None => Ok(()),
    }
}
