/// Comparison REST API endpoint
///
/// One route drives the whole batch: the request names the questions, the
/// version ids and the node under comparison; the reply is the
/// question-ordered answer array or a single aggregate failure.

use crate::api::flows::{respond, AppState, Resp};
use crate::compare::AnswerMap;
use crate::flow::types::CompareRequest;
use axum::{extract::State, response::Json, routing::post, Router};

/// Create comparison routes
pub fn create_compare_routes() -> Router<AppState> {
    Router::new().route("/api/flows/compare", post(compare_flow_node))
}

/// POST /api/flows/compare
///
/// Body: { "question_list": [...], "version_list": [...], "node_id": "...",
///         "inputs": { ... } }
async fn compare_flow_node(
    State(state): State<AppState>,
    Json(request): Json<CompareRequest>,
) -> Json<Resp<Vec<AnswerMap>>> {
    respond(state.orchestrator.compare(request).await)
}
