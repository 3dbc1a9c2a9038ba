/// Core flow and version type definitions
///
/// Defines the persistent records for flows and their versions plus the
/// request/response shapes used by the comparison engine. Records are
/// serialized to JSON for the API layer and stored row-wise in SQLite.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle status of a flow
///
/// Draft flows can be edited freely; online flows serve production traffic
/// and lock both structural edits to the current version and version
/// switching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowStatus {
    Draft,
    Online,
}

impl FlowStatus {
    /// Integer encoding used by the flows table
    pub fn as_i64(self) -> i64 {
        match self {
            FlowStatus::Draft => 1,
            FlowStatus::Online => 2,
        }
    }

    pub fn from_i64(raw: i64) -> anyhow::Result<Self> {
        match raw {
            1 => Ok(FlowStatus::Draft),
            2 => Ok(FlowStatus::Online),
            other => Err(anyhow::anyhow!("unknown flow status: {}", other)),
        }
    }
}

/// A named, owned workflow graph definition
///
/// The flow row itself carries no graph data; the graph lives in the flow's
/// versions, exactly one of which is marked current at any time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flow {
    /// Opaque flow identifier (uuid hex)
    pub id: String,
    /// Human-readable flow name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Owning user
    pub user_id: i64,
    /// Lifecycle status
    pub status: FlowStatus,
    /// RFC 3339 creation timestamp
    pub create_time: String,
    /// RFC 3339 last-update timestamp
    pub update_time: String,
}

impl Flow {
    /// New draft flow owned by the given user, with a generated id
    pub fn new(name: String, description: String, user_id: i64) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            name,
            description,
            user_id,
            status: FlowStatus::Draft,
            create_time: now.clone(),
            update_time: now,
        }
    }
}

/// One immutable-once-created snapshot of a flow's graph data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowVersion {
    /// Numeric version identifier (autoincrement)
    pub id: i64,
    /// Owning flow
    pub flow_id: String,
    /// Version name, unique within the flow
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Serialized graph definition consumed by the graph executor
    pub data: Value,
    /// Whether this version is the flow's current version
    pub is_current: bool,
    /// Creating user
    pub user_id: i64,
    /// RFC 3339 creation timestamp
    pub create_time: String,
    /// RFC 3339 last-update timestamp
    pub update_time: String,
}

/// Version listing row without the graph payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowVersionSummary {
    pub id: i64,
    pub flow_id: String,
    pub name: String,
    pub description: String,
    pub is_current: bool,
    pub user_id: i64,
    pub create_time: String,
    pub update_time: String,
}

impl From<&FlowVersion> for FlowVersionSummary {
    fn from(version: &FlowVersion) -> Self {
        Self {
            id: version.id,
            flow_id: version.flow_id.clone(),
            name: version.name.clone(),
            description: version.description.clone(),
            is_current: version.is_current,
            user_id: version.user_id,
            create_time: version.create_time.clone(),
            update_time: version.update_time.clone(),
        }
    }
}

/// Fields for creating a new flow through the manager
#[derive(Debug, Clone, Deserialize)]
pub struct FlowCreate {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Fields for creating a new version through the manager
#[derive(Debug, Clone, Deserialize)]
pub struct FlowVersionCreate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub data: Value,
}

/// Partial update of an existing version; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlowVersionPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub data: Option<Value>,
}

/// Batch comparison request: run every question against every version
///
/// `inputs` is the base input template; its key order is significant because
/// the question text replaces the first non-reserved key. The optional `data`
/// entry holds per-node override records consumed by the tweak builder.
#[derive(Debug, Clone, Deserialize)]
pub struct CompareRequest {
    #[serde(default)]
    pub question_list: Vec<String>,
    #[serde(default)]
    pub version_list: Vec<i64>,
    #[serde(default)]
    pub node_id: Option<String>,
    #[serde(default)]
    pub inputs: Map<String, Value>,
}

/// Flow row annotated for a specific caller in the paged flow listing
#[derive(Debug, Clone, Serialize)]
pub struct FlowListing {
    #[serde(flatten)]
    pub flow: Flow,
    /// Display name of the owning user
    pub user_name: String,
    /// Whether the caller may mutate this flow (admin or owner)
    pub write: bool,
    /// All versions of the flow
    pub version_list: Vec<FlowVersionSummary>,
}

/// One page of the flow listing plus the total count under the same filter
#[derive(Debug, Clone, Serialize)]
pub struct FlowPage {
    pub data: Vec<FlowListing>,
    pub total: i64,
}
