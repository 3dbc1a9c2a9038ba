/// Result normalization
///
/// Reduces whatever the graph executor returned for one (version, question)
/// pair to a single answer value. Unrecognized shapes are logged and replaced
/// with a sentinel answer; they never fail the surrounding comparison.

use crate::runtime::executor::ExecutorReply;
use serde_json::Value;

/// Sentinel answer substituted when the executor reply cannot be interpreted
pub const EXEC_ERROR_ANSWER: &str = "flow exec error";

/// Reduce an executor reply to one answer value
///
/// Priority order: a keyed mapping carrying a `result` entry, then the
/// session-aware structured reply, then the sentinel.
pub fn normalize(version_id: i64, reply: &ExecutorReply) -> Value {
    match reply {
        ExecutorReply::Fields(map) => match map.get("result") {
            Some(result) => first_answer(version_id, result),
            None => unrecognized(version_id, &Value::Object(map.clone())),
        },
        ExecutorReply::Session { result, .. } => first_answer(version_id, result),
        ExecutorReply::Raw(value) => unrecognized(version_id, value),
    }
}

/// The answer is the result entry's first value, in the mapping's own key
/// order; non-mapping results are taken whole
fn first_answer(version_id: i64, result: &Value) -> Value {
    match result {
        Value::Object(map) => match map.values().next() {
            Some(first) => first.clone(),
            None => unrecognized(version_id, result),
        },
        other => other.clone(),
    }
}

fn unrecognized(version_id: i64, raw: &Value) -> Value {
    tracing::error!("exec flow node error version_id: {}, answer: {}", version_id, raw);
    Value::String(EXEC_ERROR_ANSWER.to_string())
}
