use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::types::{PartitionKey, QuorumType, RequestId, ResultStrategy, TaskResult};
use super::wire::{TaskReader, TaskWriter};
use crate::cluster::manager::ClusterManager;
use crate::cluster::types::NodeId;
use crate::config::CoordinationConfig;
use crate::error::Result;
use crate::task::factory::TaskFactory;

/// Runtime of the node a task executes on.
#[derive(Clone)]
pub struct ServerContext {
    pub node_id: NodeId,
    pub config: Arc<CoordinationConfig>,
}

impl ServerContext {
    pub fn new(node_id: NodeId, config: Arc<CoordinationConfig>) -> Self {
        Self { node_id, config }
    }
}

/// Opaque handle to the local document database. The storage engine itself
/// is an external collaborator; tasks that declare `is_using_database` get
/// handed one, everything else (lock tasks included) gets `None`.
pub trait DatabaseHandle: Send + Sync {}

/// The polymorphic unit of distributed work.
///
/// Every variant is serializable, self-describing and carries its own
/// compensation. The coordinator only ever sees this interface: it routes on
/// `partition_key`, fans the task out, judges responses by `quorum_type` and
/// `result_strategy`, and on partial failure applies `undo_task` to the nodes
/// that already committed.
#[async_trait]
pub trait RemoteTask: Send + Sync + std::fmt::Debug {
    /// Short human-readable task name, used in logs.
    fn name(&self) -> &'static str;

    /// Numeric type tag driving factory resolution on the wire.
    fn factory_id(&self) -> u8;

    /// Performs the local effect on the receiving node. A domain failure is
    /// returned as an error and becomes a per-node failure at the
    /// coordinator, never a crash.
    async fn execute(
        &self,
        request_id: &RequestId,
        server: &ServerContext,
        cluster: &dyn ClusterManager,
        database: Option<&dyn DatabaseHandle>,
    ) -> Result<TaskResult>;

    /// Compensating task reversing effects already committed on
    /// `succeeded`, or `None` when no compensation exists or applies.
    ///
    /// Must be safe to apply to a subset of nodes that executed the forward
    /// task.
    fn undo_task(
        &self,
        cluster: &dyn ClusterManager,
        request_id: &RequestId,
        succeeded: &[NodeId],
    ) -> Option<Arc<dyn RemoteTask>>;

    /// Routing class; pure metadata, the router never looks deeper.
    fn partition_key(&self) -> PartitionKey;

    fn quorum_type(&self) -> QuorumType;

    fn result_strategy(&self) -> ResultStrategy;

    /// Whether the task needs a local database handle to execute.
    fn is_using_database(&self) -> bool {
        false
    }

    /// Whether the task is only meaningful while the originating node is
    /// reachable. Lock tasks return false: they must still be resolvable
    /// (auto-released) after the requester dies.
    fn is_node_online_required(&self) -> bool {
        true
    }

    /// Re-validates preconditions immediately before execution. Failing here
    /// aborts the operation instead of executing against a stale cluster
    /// view, and counts the node as a non-respondent for quorum purposes.
    fn check_is_valid(&self, _cluster: &dyn ClusterManager) -> Result<()> {
        Ok(())
    }

    /// Writes the variant's own fields. The type tag is written by the
    /// surrounding envelope, not here.
    fn write_to(&self, writer: &mut TaskWriter) -> Result<()>;

    /// Populates an empty instance from the wire, in the exact field order
    /// `write_to` produced. `factory` is available for nested task payloads.
    fn read_from(&mut self, reader: &mut TaskReader, factory: &TaskFactory) -> Result<()>;

    /// Bound on the whole distributed operation. Variants without an explicit
    /// positive timeout fall back to the process-wide default.
    fn distributed_timeout(&self, default: Duration) -> Duration {
        default
    }
}
