/// Graph executor boundary
///
/// The graph-evaluation engine is an external collaborator: this module owns
/// only its calling contract. A call hands over the (tweaked) graph data, the
/// substituted inputs, an optional session and a history window; the reply
/// comes back in one of a small set of recognized shapes that the result
/// normalizer reduces to a single answer.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Map, Value};

/// Result shapes a graph executor may return
///
/// A tagged enum instead of shape probing on raw JSON: the executor resolves
/// its reply into a variant exactly once, and the normalizer matches on it.
#[derive(Debug, Clone)]
pub enum ExecutorReply {
    /// Keyed mapping, possibly carrying a `result` entry
    Fields(Map<String, Value>),
    /// Structured reply from a session-aware engine
    Session { result: Value, session_id: String },
    /// Anything else the engine produced
    Raw(Value),
}

impl ExecutorReply {
    /// Classify a raw JSON reply
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => ExecutorReply::Fields(map),
            other => ExecutorReply::Raw(other),
        }
    }
}

/// Calling contract of the external graph-evaluation engine
///
/// Each call is stateless unless a session id is supplied; the engine may
/// internally cache by a fingerprint of (graph, inputs), which concurrent
/// comparison calls are expected to benefit from but never rely on.
#[async_trait]
pub trait GraphExecutor: Send + Sync {
    async fn execute(
        &self,
        graph_data: Value,
        inputs: &Map<String, Value>,
        session_id: Option<&str>,
        history_window: u32,
        flow_id: &str,
    ) -> Result<ExecutorReply>;
}

/// HTTP client for a remotely deployed graph engine
///
/// Posts the evaluation request as JSON to the configured endpoint and
/// classifies the JSON reply.
#[derive(Debug, Clone)]
pub struct HttpGraphExecutor {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpGraphExecutor {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl GraphExecutor for HttpGraphExecutor {
    async fn execute(
        &self,
        graph_data: Value,
        inputs: &Map<String, Value>,
        session_id: Option<&str>,
        history_window: u32,
        flow_id: &str,
    ) -> Result<ExecutorReply> {
        tracing::debug!("dispatching graph execution for flow {} to {}", flow_id, self.endpoint);

        let payload = json!({
            "graph": graph_data,
            "inputs": inputs,
            "session_id": session_id,
            "history_window": history_window,
            "flow_id": flow_id,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        Ok(ExecutorReply::from_value(body))
    }
}
