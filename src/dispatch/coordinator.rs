//! Task Coordinator
//!
//! The control loop tying the dispatch pieces together: validity check,
//! request-id minting, queue routing, fan-out to the target nodes, quorum
//! evaluation, and compensation of partially-succeeded operations.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinSet;

use super::protocol::{NodeResponse, ResponseOutcome};
use super::quorum::evaluate;
use super::router::{route, DispatchJob, DispatchQueues, QueueId, DEFAULT_GENERAL_WORKERS};
use super::transport::TaskTransport;
use crate::cluster::manager::ClusterManager;
use crate::cluster::types::NodeId;
use crate::config::{CoordinationConfig, LockFanout};
use crate::error::{CoordinationError, Result};
use crate::lock::task::DistributedLockTask;
use crate::task::contract::RemoteTask;
use crate::task::types::{RequestId, TaskResult};

/// Everything the coordinator can tell the caller about one operation.
#[derive(Debug)]
pub struct TaskOutcome {
    pub request_id: RequestId,
    /// Whether the task's quorum policy was satisfied.
    pub committed: bool,
    /// Caller-visible result per the task's result strategy.
    pub result: TaskResult,
    pub succeeded: Vec<NodeId>,
    pub failed: Vec<NodeId>,
    /// Nodes the compensating task was successfully applied to, when the
    /// operation did not commit but some nodes had already executed it.
    pub undo_issued_to: Vec<NodeId>,
    /// Typed per-node execution errors, in arrival order.
    pub errors: Vec<(NodeId, CoordinationError)>,
}

/// Fans tasks out to the cluster and reconciles their responses.
pub struct TaskCoordinator {
    cluster: Arc<dyn ClusterManager>,
    transport: Arc<dyn TaskTransport>,
    queues: DispatchQueues,
    config: Arc<CoordinationConfig>,
    sequence: AtomicU64,
}

impl TaskCoordinator {
    /// Spawns the dispatch queue workers and returns the coordinator. Must
    /// be called from within a tokio runtime.
    pub fn new(
        cluster: Arc<dyn ClusterManager>,
        transport: Arc<dyn TaskTransport>,
        config: Arc<CoordinationConfig>,
    ) -> Arc<Self> {
        Arc::new(Self {
            cluster,
            transport,
            queues: DispatchQueues::start(DEFAULT_GENERAL_WORKERS),
            config,
            sequence: AtomicU64::new(1),
        })
    }

    pub fn cluster(&self) -> &Arc<dyn ClusterManager> {
        &self.cluster
    }

    fn next_request_id(&self) -> RequestId {
        RequestId::new(
            self.cluster.local_node(),
            self.sequence.fetch_add(1, Ordering::Relaxed),
        )
    }

    /// Submits `task` for execution on `targets`.
    ///
    /// The validity check runs first: a stale cluster view aborts the
    /// operation before it is even queued. The task is then routed by its
    /// partition key and waits its turn on that queue; the returned future
    /// resolves once every target answered (or timed out) and any required
    /// undo was issued.
    pub async fn submit(
        self: &Arc<Self>,
        task: Arc<dyn RemoteTask>,
        targets: Vec<NodeId>,
    ) -> Result<TaskOutcome> {
        task.check_is_valid(self.cluster.as_ref())?;

        if targets.is_empty() {
            return Err(CoordinationError::Execution {
                node: self.cluster.local_node(),
                reason: format!("no target nodes for task '{}'", task.name()),
            });
        }

        let request_id = self.next_request_id();
        let queue = route(task.partition_key(), self.queues.general_workers());
        tracing::debug!(task = task.name(), request = %request_id, %queue, targets = targets.len(), "Task routed");

        let (tx, rx) = oneshot::channel();
        let coordinator = self.clone();
        let job_request = request_id.clone();
        let job_task = task.clone();
        let job: DispatchJob = Box::pin(async move {
            let outcome = coordinator.run(queue, job_request, job_task, targets).await;
            let _ = tx.send(outcome);
        });
        self.queues.enqueue(queue, job)?;

        rx.await.map_err(|_| CoordinationError::Execution {
            node: self.cluster.local_node(),
            reason: format!("dispatch worker dropped request {request_id}"),
        })
    }

    /// Executes one dispatched task end to end on its queue worker.
    async fn run(
        self: Arc<Self>,
        queue: QueueId,
        request_id: RequestId,
        task: Arc<dyn RemoteTask>,
        targets: Vec<NodeId>,
    ) -> TaskOutcome {
        let timeout = task.distributed_timeout(self.config.default_task_timeout);
        let (responses, errors) = self.fan_out(&request_id, &task, &targets, timeout).await;

        let decision = evaluate(
            task.quorum_type(),
            task.result_strategy(),
            &responses,
            self.config.write_quorum,
        );

        let mut undo_issued_to = Vec::new();
        if !decision.committed && !decision.succeeded.is_empty() {
            if let Some(undo) = task.undo_task(self.cluster.as_ref(), &request_id, &decision.succeeded)
            {
                undo_issued_to = self
                    .issue_undo(queue, &request_id, undo, decision.succeeded.clone())
                    .await;
            }
        }

        if !decision.committed {
            tracing::warn!(
                task = task.name(),
                request = %request_id,
                succeeded = decision.succeeded.len(),
                failed = decision.failed.len(),
                "Distributed task did not reach its quorum"
            );
        }

        TaskOutcome {
            request_id,
            committed: decision.committed,
            result: decision.result,
            succeeded: decision.succeeded,
            failed: decision.failed,
            undo_issued_to,
            errors,
        }
    }

    /// Runs the task on every target concurrently, each bounded by `timeout`.
    /// Responses come back in completion order, so under
    /// `ResultStrategy::Any` the first success received is the one the
    /// caller observes.
    async fn fan_out(
        &self,
        request_id: &RequestId,
        task: &Arc<dyn RemoteTask>,
        targets: &[NodeId],
        timeout: Duration,
    ) -> (Vec<NodeResponse>, Vec<(NodeId, CoordinationError)>) {
        let mut join_set = JoinSet::new();

        for target in targets {
            let target = target.clone();
            let transport = self.transport.clone();
            let task = task.clone();
            let request = request_id.clone();
            let reachable =
                self.cluster.is_node_available(&target) || !task.is_node_online_required();

            join_set.spawn(async move {
                if !reachable {
                    return (
                        NodeResponse {
                            node: target.clone(),
                            outcome: ResponseOutcome::Unresponsive,
                        },
                        Some((target.clone(), CoordinationError::NodeUnavailable(target))),
                    );
                }

                match tokio::time::timeout(timeout, transport.execute(&target, &request, task)).await
                {
                    Ok(Ok(result)) => (
                        NodeResponse {
                            node: target,
                            outcome: ResponseOutcome::Success(result),
                        },
                        None,
                    ),
                    Ok(Err(CoordinationError::StaleCoordination(msg))) => (
                        NodeResponse {
                            node: target,
                            outcome: ResponseOutcome::PreconditionFailed(msg),
                        },
                        None,
                    ),
                    Ok(Err(err)) => (
                        NodeResponse {
                            node: target.clone(),
                            outcome: ResponseOutcome::Failure(err.to_string()),
                        },
                        Some((target, err)),
                    ),
                    Err(_) => (
                        NodeResponse {
                            node: target,
                            outcome: ResponseOutcome::Unresponsive,
                        },
                        None,
                    ),
                }
            });
        }

        let mut responses = Vec::with_capacity(targets.len());
        let mut errors = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((response, error)) => {
                    tracing::debug!(
                        request = %request_id,
                        node = %response.node,
                        success = response.is_success(),
                        "Node responded"
                    );
                    responses.push(response);
                    if let Some(error) = error {
                        errors.push(error);
                    }
                }
                Err(e) => {
                    tracing::error!(request = %request_id, "Fan-out worker panicked: {e}");
                }
            }
        }

        (responses, errors)
    }

    /// Dispatches the compensating task to the nodes that already executed
    /// the forward task, through the undo's own partition route. A release
    /// undoing an acquire rides the fast no-lock queue and can never end up
    /// ordered behind pending acquisitions.
    async fn issue_undo(
        self: &Arc<Self>,
        current_queue: QueueId,
        request_id: &RequestId,
        undo: Arc<dyn RemoteTask>,
        targets: Vec<NodeId>,
    ) -> Vec<NodeId> {
        let undo_queue = route(undo.partition_key(), self.queues.general_workers());
        tracing::warn!(
            request = %request_id,
            task = undo.name(),
            queue = %undo_queue,
            targets = targets.len(),
            "Issuing undo to partially-succeeded nodes"
        );

        // Only enqueue when the undo lands on a different worker; this
        // worker is busy with the current job and would never drain it.
        if undo_queue == current_queue {
            return self.apply_undo(request_id, undo, targets).await;
        }

        let (tx, rx) = oneshot::channel();
        let coordinator = self.clone();
        let request = request_id.clone();
        let job: DispatchJob = Box::pin(async move {
            let issued = coordinator.apply_undo(&request, undo, targets).await;
            let _ = tx.send(issued);
        });

        if self.queues.enqueue(undo_queue, job).is_err() {
            return Vec::new();
        }
        rx.await.unwrap_or_default()
    }

    async fn apply_undo(
        &self,
        request_id: &RequestId,
        undo: Arc<dyn RemoteTask>,
        targets: Vec<NodeId>,
    ) -> Vec<NodeId> {
        let timeout = undo.distributed_timeout(self.config.default_task_timeout);
        let mut issued = Vec::new();

        for target in targets {
            match tokio::time::timeout(
                timeout,
                self.transport.execute(&target, request_id, undo.clone()),
            )
            .await
            {
                Ok(Ok(_)) => issued.push(target),
                Ok(Err(err)) => {
                    tracing::warn!(request = %request_id, %target, "Undo failed: {err}");
                }
                Err(_) => {
                    tracing::warn!(request = %request_id, %target, "Undo timed out");
                }
            }
        }

        issued
    }

    // --- Cluster-lock facade ---

    /// Acquires the cluster-wide exclusive lock on `resource`, blocking up
    /// to `timeout`.
    pub async fn acquire_cluster_lock(
        self: &Arc<Self>,
        resource: &str,
        timeout: Duration,
    ) -> Result<()> {
        let server = self.cluster.lock_manager_server();
        let task = Arc::new(DistributedLockTask::acquire(server, resource, timeout));
        self.submit_lock(task).await
    }

    /// Releases the cluster-wide exclusive lock on `resource`.
    pub async fn release_cluster_lock(self: &Arc<Self>, resource: &str) -> Result<()> {
        let server = self.cluster.lock_manager_server();
        let task = Arc::new(DistributedLockTask::release(server, resource));
        self.submit_lock(task).await
    }

    async fn submit_lock(self: &Arc<Self>, task: Arc<DistributedLockTask>) -> Result<()> {
        let targets = match self.config.lock_fanout {
            LockFanout::ManagerOnly => vec![self.cluster.lock_manager_server()],
            LockFanout::AllOnline => self.cluster.online_nodes(),
        };

        let mut outcome = self.submit(task, targets).await?;
        if outcome.committed {
            return Ok(());
        }

        // Prefer the typed per-node error (lock timeout, ownership) over the
        // generic quorum failure.
        if let Some((_, err)) = outcome.errors.drain(..).next() {
            return Err(err);
        }

        Err(CoordinationError::QuorumNotReached {
            request_id: outcome.request_id,
            required: "ALL".to_string(),
            successes: outcome.succeeded.len(),
            expected: outcome.succeeded.len() + outcome.failed.len(),
        })
    }
}
