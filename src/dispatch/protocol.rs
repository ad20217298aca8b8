//! Dispatch Protocol Definitions
//!
//! DTOs exchanged between the coordinator and executing nodes. The task body
//! itself travels in the binary wire form (`task::wire`); these envelopes are
//! what a network transport would frame around it.

use serde::{Deserialize, Serialize};

use crate::cluster::types::NodeId;
use crate::task::types::{RequestId, TaskResult};

/// A dispatched task as it leaves the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRequest {
    pub request_id: RequestId,
    /// Binary task wire form: type tag followed by variant fields.
    pub payload: Vec<u8>,
}

/// What one node reported back for one dispatched task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ResponseOutcome {
    Success(TaskResult),
    /// Execution was attempted and failed (lock timeout, ownership
    /// mismatch, ...). Counts as a vote against the quorum.
    Failure(String),
    /// No response inside the operation deadline. Counts against strict
    /// quorums the same way a failure does.
    Unresponsive,
    /// The node's own validity check rejected the task before execution.
    /// Treated as a non-respondent for quorum purposes, not a vote against.
    PreconditionFailed(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeResponse {
    pub node: NodeId,
    pub outcome: ResponseOutcome,
}

impl NodeResponse {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ResponseOutcome::Success(_))
    }
}
