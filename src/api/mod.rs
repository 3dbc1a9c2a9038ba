/// HTTP API layer
///
/// REST endpoints for version lifecycle management and cross-version node
/// comparison. All handlers reply with the uniform response envelope.

// Version lifecycle management endpoints and shared API plumbing
pub mod flows;

// Batch comparison endpoint
pub mod compare;
