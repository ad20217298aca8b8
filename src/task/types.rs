use serde::{Deserialize, Serialize};

use crate::cluster::types::NodeId;

/// Identity of one distributed operation.
///
/// An immutable (origin node, sequence) pair. The sequence is monotonically
/// increasing per origin, so the pair is unique across the cluster's lifetime
/// and correlates a task with its responses and any undo issued for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId {
    pub origin: NodeId,
    pub sequence: u64,
}

impl RequestId {
    pub fn new(origin: NodeId, sequence: u64) -> Self {
        Self { origin, sequence }
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.origin, self.sequence)
    }
}

/// Routing class of a task. Determines which dispatch queue the task is
/// serialized on, never the semantics of its execution.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PartitionKey {
    /// The serialized lock queue: lock acquisitions execute strictly one at
    /// a time so competing acquires cannot interleave.
    Lock,
    /// The fast no-lock queue: operations that must never be ordered behind
    /// a pending acquisition, lock releases above all.
    FastNoLock,
    /// General hashed class; tasks with the same hash share a queue and thus
    /// an ordering, unrelated hashes run concurrently.
    Hashed(u32),
}

/// Minimum agreement among responding nodes for a task to be committed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum QuorumType {
    /// Every expected node must report success.
    All,
    /// Strictly more than half of the expected nodes.
    Majority,
    /// No agreement required; the task commits regardless of responses.
    None,
    /// At least the configured write-quorum count.
    WriteQuorum,
}

/// How multiple per-node responses reduce to one caller-visible result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ResultStrategy {
    /// First success wins; later responses only feed quorum bookkeeping.
    Any,
    /// All success values are returned together.
    All,
    /// Success values are merged into a single aggregate.
    Merge,
}

/// Node-level result of executing a task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum TaskResult {
    None,
    Bool(bool),
    Text(String),
    Json(serde_json::Value),
}
