/// Comparison orchestration
///
/// Fans out one concurrent task per question, each task running every
/// requested version through the graph executor, and fans the per-version
/// answers back into a question-ordered slot vector. Fan-out is bounded by a
/// semaphore sized to the deployment's executor capacity.

use crate::compare::{normalizer, tweaks};
use crate::compare::tweaks::Tweaks;
use crate::error::{FlowError, Result};
use crate::flow::store::VersionStore;
use crate::flow::types::{CompareRequest, FlowVersion};
use crate::runtime::executor::GraphExecutor;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Input template keys never used for question substitution
const RESERVED_INPUT_KEYS: [&str; 2] = ["data", "id"];

/// Per-question answer mapping: version id -> normalized answer
pub type AnswerMap = HashMap<i64, Value>;

/// Drives one comparison batch across questions and versions
pub struct ComparisonOrchestrator<S, E> {
    store: Arc<S>,
    executor: Arc<E>,
    /// History window handed to every executor call
    history_window: u32,
    /// Cap on concurrently running question tasks
    max_concurrency: usize,
}

impl<S, E> ComparisonOrchestrator<S, E>
where
    S: VersionStore + 'static,
    E: GraphExecutor + 'static,
{
    pub fn new(store: Arc<S>, executor: Arc<E>, history_window: u32, max_concurrency: usize) -> Self {
        Self {
            store,
            executor,
            history_window,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Compare one node's answers across versions for a batch of questions
    ///
    /// Returns one answer map per question, in question order. An empty
    /// question list, an empty version list or a missing node id yields an
    /// empty result without spawning anything. Versions missing from the
    /// store are absent from the answer maps rather than failing the batch.
    pub async fn compare(&self, request: CompareRequest) -> Result<Vec<AnswerMap>> {
        if request.question_list.is_empty() || request.version_list.is_empty() {
            return Ok(Vec::new());
        }
        let Some(node_id) = request.node_id.as_deref().filter(|id| !id.is_empty()) else {
            return Ok(Vec::new());
        };

        let versions = Arc::new(self.store.list_versions_by_ids(&request.version_list).await?);
        tracing::info!(
            "🔬 comparing node {} across {} versions for {} questions",
            node_id,
            versions.len(),
            request.question_list.len()
        );

        // Slot vector sized up front: slot i belongs exclusively to question
        // i's task, so completion order never affects placement.
        let mut slots: Vec<AnswerMap> = vec![AnswerMap::new(); request.question_list.len()];

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks: JoinSet<anyhow::Result<(usize, AnswerMap)>> = JoinSet::new();

        for (index, question) in request.question_list.iter().enumerate() {
            let question = question.clone();
            let inputs = request.inputs.clone();
            let versions = Arc::clone(&versions);
            let executor = Arc::clone(&self.executor);
            let semaphore = Arc::clone(&semaphore);
            let history_window = self.history_window;

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await?;
                let answers =
                    run_question(executor, versions, inputs, question, history_window).await?;
                Ok((index, answers))
            });
        }

        // Fail fast on the first task fault: dropping the set aborts the
        // in-flight siblings, and no partial answer array escapes.
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok((index, answers))) => slots[index] = answers,
                Ok(Err(cause)) => {
                    tracing::error!("comparison task failed: {}", cause);
                    return Err(FlowError::ComparisonFailure(cause.to_string()));
                }
                Err(join_error) => {
                    return Err(FlowError::ComparisonFailure(join_error.to_string()));
                }
            }
        }

        Ok(slots)
    }
}

/// Execute every version for one question
///
/// Owns a private copy of the input template: the question text replaces the
/// first non-reserved input field in template order (with no candidate field
/// the question is dropped and execution proceeds on the template as-is),
/// then the `data` records are lifted out into tweaks shared by all versions
/// of this question.
async fn run_question<E: GraphExecutor>(
    executor: Arc<E>,
    versions: Arc<Vec<FlowVersion>>,
    mut inputs: Map<String, Value>,
    question: String,
    history_window: u32,
) -> anyhow::Result<AnswerMap> {
    for (key, slot) in inputs.iter_mut() {
        if RESERVED_INPUT_KEYS.contains(&key.as_str()) {
            continue;
        }
        *slot = Value::String(question.clone());
        break;
    }

    let node_tweaks = match inputs.shift_remove("data") {
        Some(Value::Array(records)) => tweaks::build(&records),
        Some(_) | None => Tweaks::new(),
    };

    let mut answers = AnswerMap::with_capacity(versions.len());
    for version in versions.iter() {
        let graph_data = tweaks::apply(&version.data, &node_tweaks);
        let reply = executor
            .execute(graph_data, &inputs, None, history_window, &version.flow_id)
            .await?;
        answers.insert(version.id, normalizer::normalize(version.id, &reply));
    }

    Ok(answers)
}
