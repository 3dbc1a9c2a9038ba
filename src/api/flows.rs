/// Flow version management REST API endpoints
///
/// Exposes the version lifecycle operations with a uniform response
/// envelope: every reply carries a status code, a human-readable message and
/// an optional payload, so callers can distinguish failure kinds without
/// inspecting HTTP semantics. Caller identity arrives in the X-User-Id
/// header; real authentication happens upstream of this service.

use crate::{
    access::{Caller, SqliteAccessControl},
    compare::ComparisonOrchestrator,
    error::FlowError,
    flow::{
        manager::FlowVersionManager,
        store::SqliteVersionStore,
        types::{FlowCreate, FlowStatus, FlowVersionCreate, FlowVersionPatch},
    },
    runtime::executor::HttpGraphExecutor,
};
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Manager wired with the shipped SQLite store and access control
pub type AppManager = FlowVersionManager<SqliteVersionStore, SqliteAccessControl>;

/// Orchestrator wired with the shipped store and HTTP graph executor
pub type AppOrchestrator = ComparisonOrchestrator<SqliteVersionStore, HttpGraphExecutor>;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<AppManager>,
    pub orchestrator: Arc<AppOrchestrator>,
}

/// Uniform response envelope
#[derive(Debug, Serialize)]
pub struct Resp<T> {
    pub status_code: u32,
    pub status_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> Resp<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            status_code: 200,
            status_message: "SUCCESS".to_string(),
            data: Some(data),
        })
    }

    pub fn failed(error: &FlowError) -> Json<Self> {
        Json(Self {
            status_code: error.code(),
            status_message: error.to_string(),
            data: None,
        })
    }
}

/// Fold a domain result into the envelope
pub fn respond<T: Serialize>(result: Result<T, FlowError>) -> Json<Resp<T>> {
    match result {
        Ok(data) => Resp::ok(data),
        Err(error) => Resp::failed(&error),
    }
}

/// Extract the caller identity from the X-User-Id header
pub fn caller_from(headers: &HeaderMap) -> Result<Caller, FlowError> {
    headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse().ok())
        .map(|user_id| Caller { user_id })
        .ok_or_else(|| FlowError::Unauthorized("missing or invalid X-User-Id header".to_string()))
}

/// Create flow management routes
pub fn create_flow_routes() -> Router<AppState> {
    Router::new()
        .route("/api/flows", get(list_flows).post(create_flow))
        .route(
            "/api/flows/{flow_id}/versions",
            get(list_versions).post(create_version),
        )
        .route("/api/flows/{flow_id}/versions/current", get(current_version))
        .route(
            "/api/flows/{flow_id}/versions/{version_id}/current",
            post(set_current_version),
        )
        .route(
            "/api/versions/{version_id}",
            get(get_version).put(update_version).delete(delete_version),
        )
}

/// Query parameters for the paged flow listing
#[derive(Debug, Deserialize)]
struct ListFlowsQuery {
    name: Option<String>,
    status: Option<i64>,
    page: Option<u32>,
    page_size: Option<u32>,
}

/// GET /api/flows?name=&status=&page=&page_size=
async fn list_flows(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListFlowsQuery>,
) -> Json<Resp<crate::flow::types::FlowPage>> {
    let result = async {
        let caller = caller_from(&headers)?;
        let status = query.status.map(FlowStatus::from_i64).transpose()?;
        state
            .manager
            .list_flows(
                &caller,
                query.name,
                status,
                query.page.unwrap_or(1),
                query.page_size.unwrap_or(10),
            )
            .await
    }
    .await;
    respond(result)
}

/// POST /api/flows
async fn create_flow(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<FlowCreate>,
) -> Json<Resp<crate::flow::types::Flow>> {
    let result = async {
        let caller = caller_from(&headers)?;
        state.manager.create_flow(&caller, payload).await
    }
    .await;
    respond(result)
}

/// GET /api/flows/:flow_id/versions
async fn list_versions(
    State(state): State<AppState>,
    Path(flow_id): Path<String>,
) -> Json<Resp<Vec<crate::flow::types::FlowVersionSummary>>> {
    respond(state.manager.list_versions(&flow_id).await)
}

/// POST /api/flows/:flow_id/versions
async fn create_version(
    State(state): State<AppState>,
    Path(flow_id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<FlowVersionCreate>,
) -> Json<Resp<crate::flow::types::FlowVersion>> {
    let result = async {
        let caller = caller_from(&headers)?;
        state.manager.create_version(&caller, &flow_id, payload).await
    }
    .await;
    respond(result)
}

/// GET /api/flows/:flow_id/versions/current
async fn current_version(
    State(state): State<AppState>,
    Path(flow_id): Path<String>,
) -> Json<Resp<crate::flow::types::FlowVersion>> {
    let result = state
        .manager
        .current_version(&flow_id)
        .await
        .map(|version| (*version).clone());
    respond(result)
}

/// POST /api/flows/:flow_id/versions/:version_id/current
async fn set_current_version(
    State(state): State<AppState>,
    Path((flow_id, version_id)): Path<(String, i64)>,
    headers: HeaderMap,
) -> Json<Resp<()>> {
    let result = async {
        let caller = caller_from(&headers)?;
        state
            .manager
            .set_current_version(&caller, &flow_id, version_id)
            .await
    }
    .await;
    respond(result)
}

/// GET /api/versions/:version_id
async fn get_version(
    State(state): State<AppState>,
    Path(version_id): Path<i64>,
) -> Json<Resp<crate::flow::types::FlowVersion>> {
    respond(state.manager.get_version(version_id).await)
}

/// PUT /api/versions/:version_id
async fn update_version(
    State(state): State<AppState>,
    Path(version_id): Path<i64>,
    headers: HeaderMap,
    Json(patch): Json<FlowVersionPatch>,
) -> Json<Resp<crate::flow::types::FlowVersion>> {
    let result = async {
        let caller = caller_from(&headers)?;
        state.manager.update_version(&caller, version_id, patch).await
    }
    .await;
    respond(result)
}

/// DELETE /api/versions/:version_id
async fn delete_version(
    State(state): State<AppState>,
    Path(version_id): Path<i64>,
    headers: HeaderMap,
) -> Json<Resp<()>> {
    let result = async {
        let caller = caller_from(&headers)?;
        state.manager.delete_version(&caller, version_id).await
    }
    .await;
    respond(result)
}
