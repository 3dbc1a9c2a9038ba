/// Runtime boundary to the graph-evaluation engine
///
/// This module owns everything that touches graph structure at runtime:
/// - Structural validation of declared node graphs (petgraph DAG check)
/// - The GraphExecutor calling contract and its reply shapes
/// - The HTTP-backed executor implementation

// Graph-definition parsing and DAG validation
pub mod graph;

// Executor trait, reply shapes and the HTTP implementation
pub mod executor;

// Re-export main types
pub use executor::{ExecutorReply, GraphExecutor, HttpGraphExecutor};
