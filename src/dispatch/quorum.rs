//! Quorum & Result Evaluation
//!
//! Reduces the per-node responses collected for one dispatched task to a
//! single commit/abort decision plus the caller-visible result, per the
//! task's declared quorum type and result strategy.

use serde_json::Value;

use super::protocol::{NodeResponse, ResponseOutcome};
use crate::cluster::types::NodeId;
use crate::task::types::{QuorumType, ResultStrategy, TaskResult};

/// Outcome of evaluating all responses for one task.
#[derive(Debug, Clone)]
pub struct QuorumDecision {
    /// Whether the operation reached its declared agreement.
    pub committed: bool,
    /// Caller-visible result, reduced per the task's result strategy.
    pub result: TaskResult,
    /// Nodes that executed the forward task successfully. On an uncommitted
    /// decision these are the undo targets.
    pub succeeded: Vec<NodeId>,
    /// Nodes that failed or never answered inside the deadline.
    pub failed: Vec<NodeId>,
}

/// Applies `quorum` and `strategy` to `responses`.
///
/// Responses are expected in arrival order; under `ResultStrategy::Any` the
/// first success is the value the caller observes, regardless of what later
/// reconciliation sees. A node whose own validity check rejected the task is
/// excluded from the expected count: it never voted.
pub fn evaluate(
    quorum: QuorumType,
    strategy: ResultStrategy,
    responses: &[NodeResponse],
    write_quorum: usize,
) -> QuorumDecision {
    let mut succeeded = Vec::new();
    let mut failed = Vec::new();
    let mut success_values = Vec::new();
    let mut abstained = 0usize;

    for response in responses {
        match &response.outcome {
            ResponseOutcome::Success(value) => {
                succeeded.push(response.node.clone());
                success_values.push(value.clone());
            }
            ResponseOutcome::Failure(_) | ResponseOutcome::Unresponsive => {
                failed.push(response.node.clone());
            }
            ResponseOutcome::PreconditionFailed(_) => {
                abstained += 1;
            }
        }
    }

    let expected = responses.len() - abstained;
    let successes = succeeded.len();

    let committed = match quorum {
        QuorumType::All => expected > 0 && successes == expected,
        QuorumType::Majority => successes * 2 > expected,
        QuorumType::None => true,
        QuorumType::WriteQuorum => successes >= write_quorum,
    };

    let result = reduce(strategy, success_values);

    tracing::debug!(
        ?quorum,
        successes,
        expected,
        committed,
        "Quorum evaluated"
    );

    QuorumDecision {
        committed,
        result,
        succeeded,
        failed,
    }
}

fn reduce(strategy: ResultStrategy, mut values: Vec<TaskResult>) -> TaskResult {
    if values.is_empty() {
        return TaskResult::None;
    }

    match strategy {
        ResultStrategy::Any => values.swap_remove(0),
        ResultStrategy::All => {
            TaskResult::Json(Value::Array(values.into_iter().map(to_json).collect()))
        }
        ResultStrategy::Merge => merge(values),
    }
}

/// Merges success values: arrays concatenate, objects merge key-wise, mixed
/// scalars collapse into an array.
fn merge(values: Vec<TaskResult>) -> TaskResult {
    let mut json: Vec<Value> = values.into_iter().map(to_json).collect();

    if json.len() == 1 {
        return TaskResult::Json(json.swap_remove(0));
    }

    if json.iter().all(Value::is_array) {
        let mut merged = Vec::new();
        for value in json {
            if let Value::Array(items) = value {
                merged.extend(items);
            }
        }
        return TaskResult::Json(Value::Array(merged));
    }

    if json.iter().all(Value::is_object) {
        let mut merged = serde_json::Map::new();
        for value in json {
            if let Value::Object(map) = value {
                merged.extend(map);
            }
        }
        return TaskResult::Json(Value::Object(merged));
    }

    TaskResult::Json(Value::Array(json))
}

fn to_json(result: TaskResult) -> Value {
    match result {
        TaskResult::None => Value::Null,
        TaskResult::Bool(b) => Value::Bool(b),
        TaskResult::Text(s) => Value::String(s),
        TaskResult::Json(v) => v,
    }
}
