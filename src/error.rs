/// Domain error taxonomy for flow version management and comparison
///
/// Every manager precondition failure maps to exactly one variant with a
/// stable numeric code that the API envelope exposes to callers. Storage and
/// other infrastructure faults travel as anyhow errors and surface as
/// `Internal`.

use thiserror::Error;

/// Errors produced by the version manager and the comparison orchestrator
#[derive(Debug, Error)]
pub enum FlowError {
    /// Flow or version does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller lacks the required access grant
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Structural edit or version switch attempted while the flow is online
    #[error("flow {0} is online, edits are locked")]
    OnlineEditLocked(String),

    /// Delete attempted on the version marked current
    #[error("version {0} is the current version and cannot be deleted")]
    CurrentVersionConflict(i64),

    /// Another version of the same flow already uses this name
    #[error("version name already in use: {0}")]
    NameExists(String),

    /// Version data declares a node graph that fails structural validation
    #[error("invalid graph definition: {0}")]
    InvalidGraph(String),

    /// Aggregate failure of a comparison batch, wrapping the first task fault
    #[error("flow comparison failed: {0}")]
    ComparisonFailure(String),

    /// Storage or other infrastructure fault
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl FlowError {
    /// Stable error code carried in the API response envelope
    pub fn code(&self) -> u32 {
        match self {
            FlowError::NotFound(_) => 10404,
            FlowError::Unauthorized(_) => 10403,
            FlowError::OnlineEditLocked(_) => 10910,
            FlowError::CurrentVersionConflict(_) => 10920,
            FlowError::NameExists(_) => 10921,
            FlowError::InvalidGraph(_) => 10922,
            FlowError::ComparisonFailure(_) => 10500,
            FlowError::Internal(_) => 10000,
        }
    }
}

/// Result alias used across the crate's domain APIs
pub type Result<T, E = FlowError> = std::result::Result<T, E>;
