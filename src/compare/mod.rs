/// Cross-version node comparison engine
///
/// Given a batch of questions and a set of version ids, runs every question
/// through every version's graph and collects one normalized answer per
/// (question, version) pair:
/// - Tweak construction from per-node override records
/// - Bounded concurrent fan-out, one task per question
/// - Reduction of heterogeneous executor replies to scalar answers

// Per-node parameter overrides and their application to graph data
pub mod tweaks;

// Executor reply reduction to a single answer value
pub mod normalizer;

// Concurrent per-question fan-out and ordered fan-in
pub mod orchestrator;

// Re-export main types
pub use normalizer::EXEC_ERROR_ANSWER;
pub use orchestrator::{AnswerMap, ComparisonOrchestrator};
pub use tweaks::Tweaks;
