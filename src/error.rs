//! Crate-Wide Error Taxonomy
//!
//! Every failure the coordination core can surface is a variant here, so callers
//! can distinguish a retryable lock timeout from a coordination bug (ownership
//! mismatch) or a stale cluster view without string matching.

use std::time::Duration;

use thiserror::Error;

use crate::cluster::types::NodeId;
use crate::task::types::RequestId;

#[derive(Debug, Error)]
pub enum CoordinationError {
    /// The acquire deadline elapsed before the resource became free.
    #[error("timeout ({timeout:?}) acquiring exclusive lock on resource '{resource}'")]
    LockTimeout { resource: String, timeout: Duration },

    /// A release was attempted by an identity that does not hold the lock.
    /// The real holder's entry is left untouched.
    #[error("cannot release lock on resource '{resource}': held by {holder:?}, released by {requester}")]
    LockOwnership {
        resource: String,
        holder: Option<NodeId>,
        requester: NodeId,
    },

    /// Pre-execution validity check failed: the coordination state the task
    /// was built against is no longer current (e.g. the lock manager server
    /// changed). The operation is aborted, never executed.
    #[error("stale coordination state: {0}")]
    StaleCoordination(String),

    /// The task's quorum policy was not satisfied by the collected responses.
    #[error("quorum {required} not reached for request {request_id}: {successes}/{expected} nodes succeeded")]
    QuorumNotReached {
        request_id: RequestId,
        required: String,
        successes: usize,
        expected: usize,
    },

    /// A node-local execution failure, fed into quorum evaluation per node.
    #[error("task execution failed on node {node}: {reason}")]
    Execution { node: NodeId, reason: String },

    /// The wire form could not be parsed. The task is never partially
    /// populated; decoding aborts at the first malformed field.
    #[error("malformed task wire data: {0}")]
    Malformed(String),

    /// The deserializer met a type tag no factory constructor is registered for.
    #[error("unknown task type tag {0}")]
    UnknownTaskType(u8),

    /// A target node is not a reachable cluster member.
    #[error("node {0} is not available")]
    NodeUnavailable(NodeId),

    /// A dispatch queue's worker is gone, typically during shutdown. No job
    /// placed after this can ever run.
    #[error("dispatch queue '{0}' is not accepting jobs")]
    QueueClosed(String),

    /// A configuration value could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CoordinationError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, CoordinationError>;
