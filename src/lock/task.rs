use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::cluster::manager::ClusterManager;
use crate::cluster::types::NodeId;
use crate::error::{CoordinationError, Result};
use crate::task::contract::{DatabaseHandle, RemoteTask, ServerContext};
use crate::task::factory::TaskFactory;
use crate::task::types::{PartitionKey, QuorumType, RequestId, ResultStrategy, TaskResult};
use crate::task::wire::{TaskReader, TaskWriter};

/// Task acquiring or releasing a cluster-wide exclusive lock.
///
/// An acquire rides the serialized lock queue so competing acquisitions
/// cannot interleave; a release always rides the fast no-lock queue so it can
/// never be ordered behind a pending acquire that may itself be waiting on
/// the lock being freed.
#[derive(Debug, Clone)]
pub struct DistributedLockTask {
    resource: String,
    timeout: Duration,
    acquire: bool,
    /// Designated lock authority at construction time. Coordination-local
    /// state: consulted by the validity check, never serialized.
    lock_manager_server: Option<NodeId>,
}

impl DistributedLockTask {
    pub const FACTORY_ID: u8 = 26;

    /// Added on top of an explicit acquire wait when bounding the whole
    /// distributed call, so a wait that runs its full course on the manager
    /// reports its timeout instead of being cut off in flight.
    pub const DISPATCH_HEADROOM: Duration = Duration::from_secs(1);

    /// Empty instance for factory-driven deserialization.
    pub fn empty() -> Self {
        Self {
            resource: String::new(),
            timeout: Duration::ZERO,
            acquire: false,
            lock_manager_server: None,
        }
    }

    pub fn acquire(lock_manager_server: NodeId, resource: &str, timeout: Duration) -> Self {
        Self {
            resource: resource.to_string(),
            timeout,
            acquire: true,
            lock_manager_server: Some(lock_manager_server),
        }
    }

    pub fn release(lock_manager_server: NodeId, resource: &str) -> Self {
        Self {
            resource: resource.to_string(),
            timeout: Duration::ZERO,
            acquire: false,
            lock_manager_server: Some(lock_manager_server),
        }
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn is_acquire(&self) -> bool {
        self.acquire
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn verb(&self) -> &'static str {
        if self.acquire { "acquire" } else { "release" }
    }
}

#[async_trait]
impl RemoteTask for DistributedLockTask {
    fn name(&self) -> &'static str {
        "exc_lock"
    }

    fn factory_id(&self) -> u8 {
        Self::FACTORY_ID
    }

    async fn execute(
        &self,
        request_id: &RequestId,
        _server: &ServerContext,
        cluster: &dyn ClusterManager,
        _database: Option<&dyn DatabaseHandle>,
    ) -> Result<TaskResult> {
        let manager = cluster.lock_manager_executor();
        // The requester identity is the request's origin node, so a lock
        // survives as long as its origin does and no longer.
        if self.acquire {
            manager
                .acquire_exclusive(&self.resource, &request_id.origin, request_id, self.timeout)
                .await?;
        } else {
            manager.release_exclusive(&self.resource, &request_id.origin)?;
        }

        Ok(TaskResult::Bool(true))
    }

    fn undo_task(
        &self,
        _cluster: &dyn ClusterManager,
        _request_id: &RequestId,
        _succeeded: &[NodeId],
    ) -> Option<Arc<dyn RemoteTask>> {
        if self.acquire {
            // Guarantees the lock is not left dangling when only a subset of
            // the required nodes granted it.
            let mut release = self.clone();
            release.acquire = false;
            return Some(Arc::new(release));
        }

        None
    }

    fn partition_key(&self) -> PartitionKey {
        if self.acquire {
            PartitionKey::Lock
        } else {
            PartitionKey::FastNoLock
        }
    }

    fn quorum_type(&self) -> QuorumType {
        // A lock is only meaningful if universally recognized.
        QuorumType::All
    }

    fn result_strategy(&self) -> ResultStrategy {
        // The manager is a single serialized authority, not a voted value:
        // the first authoritative response is the answer.
        ResultStrategy::Any
    }

    fn is_using_database(&self) -> bool {
        false
    }

    fn is_node_online_required(&self) -> bool {
        // Must stay resolvable (auto-released) even after the requesting
        // node goes away.
        false
    }

    fn check_is_valid(&self, cluster: &dyn ClusterManager) -> Result<()> {
        let designated = cluster.lock_manager_server();

        // A failover between building this task and dispatching it means the
        // captured authority is no longer the authority. Deserialized copies
        // carry no capture and only check availability.
        if let Some(expected) = &self.lock_manager_server {
            if *expected != designated {
                return Err(CoordinationError::StaleCoordination(format!(
                    "lock manager server changed from '{expected}' to '{designated}' during lock {}",
                    self.verb()
                )));
            }
        }

        if !cluster.is_node_available(&designated) {
            return Err(CoordinationError::StaleCoordination(format!(
                "lock manager server '{designated}' is not a live cluster member for lock {}",
                self.verb()
            )));
        }
        Ok(())
    }

    fn write_to(&self, writer: &mut TaskWriter) -> Result<()> {
        writer.write_string(&self.resource)?;
        writer.write_bool(self.acquire);
        writer.write_u64(self.timeout.as_millis() as u64);
        Ok(())
    }

    fn read_from(&mut self, reader: &mut TaskReader, _factory: &TaskFactory) -> Result<()> {
        self.resource = reader.read_string()?;
        self.acquire = reader.read_bool()?;
        self.timeout = Duration::from_millis(reader.read_u64()?);
        Ok(())
    }

    fn distributed_timeout(&self, default: Duration) -> Duration {
        if self.timeout > Duration::ZERO {
            self.timeout + Self::DISPATCH_HEADROOM
        } else {
            default
        }
    }
}

impl std::fmt::Display for DistributedLockTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} resource={}", self.name(), self.verb(), self.resource)
    }
}
