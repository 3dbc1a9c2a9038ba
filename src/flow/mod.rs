/// Flow management layer
///
/// This module handles flow and version records, persistence and lifecycle:
/// - Type definitions (Flow, FlowVersion, CompareRequest)
/// - SQLite persistence with sqlx behind the VersionStore trait
/// - Lock-free current-version registry using ArcSwap
/// - The lifecycle manager enforcing the version invariants

// Core flow and version type definitions
pub mod types;

// SQLite persistence layer behind the VersionStore trait
pub mod store;

// Current-version registry using ArcSwap for the production read path
pub mod registry;

// Lifecycle manager enforcing version invariants
pub mod manager;

// Re-export commonly used types
pub use manager::FlowVersionManager;
pub use registry::CurrentVersionRegistry;
pub use store::{SqliteVersionStore, VersionStore};
pub use types::{CompareRequest, Flow, FlowStatus, FlowVersion};
