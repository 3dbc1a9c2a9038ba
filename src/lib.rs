/// Flowver: versioned flow definitions with cross-version node comparison
///
/// This library manages named, immutable versions of workflow graph
/// definitions (exactly one current per flow) and compares a node's answers
/// across versions for batches of test questions, fanning out bounded
/// concurrent evaluation tasks against an external graph-execution engine.

// Core configuration and setup
pub mod config;

// Domain error taxonomy
pub mod error;

// Access control boundary - admin/owner/role checks for flow operations
pub mod access;

// Flow management layer - records, persistence, registry and lifecycle
pub mod flow;

// Comparison engine - tweaks, orchestration and result normalization
pub mod compare;

// Runtime boundary - graph validation and the executor contract
pub mod runtime;

// HTTP API layer - REST endpoints for management and comparison
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use access::{AccessControl, AccessKind, Caller};
pub use compare::{ComparisonOrchestrator, EXEC_ERROR_ANSWER};
pub use error::FlowError;
pub use flow::{CompareRequest, Flow, FlowStatus, FlowVersion, FlowVersionManager};
pub use runtime::{ExecutorReply, GraphExecutor};
pub use server::start_server;
