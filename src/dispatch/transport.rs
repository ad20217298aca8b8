//! Task Transport Seam
//!
//! The coordinator never talks to the network directly; it hands each
//! (target, request, task) triple to a [`TaskTransport`]. A production
//! deployment wires this to its RPC layer. [`LoopbackTransport`] runs every
//! target in-process, which is how the test batteries simulate a cluster;
//! it pushes the task through the binary wire form on the way, so anything
//! dispatched through it must actually round-trip.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use super::protocol::TaskRequest;
use crate::cluster::manager::ClusterManager;
use crate::cluster::types::NodeId;
use crate::error::{CoordinationError, Result};
use crate::task::contract::{RemoteTask, ServerContext};
use crate::task::factory::{decode_task, encode_task, TaskFactory};
use crate::task::types::{RequestId, TaskResult};

/// Carries one task execution to one target node.
#[async_trait]
pub trait TaskTransport: Send + Sync {
    async fn execute(
        &self,
        target: &NodeId,
        request_id: &RequestId,
        task: Arc<dyn RemoteTask>,
    ) -> Result<TaskResult>;
}

struct LoopbackNode {
    server: ServerContext,
    cluster: Arc<dyn ClusterManager>,
}

/// In-process transport: every registered node executes tasks on the calling
/// runtime against its own server context and cluster view.
pub struct LoopbackTransport {
    nodes: DashMap<NodeId, Arc<LoopbackNode>>,
    factory: TaskFactory,
}

impl LoopbackTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            nodes: DashMap::new(),
            factory: TaskFactory::new(),
        })
    }

    /// Registers a simulated node.
    pub fn register(&self, server: ServerContext, cluster: Arc<dyn ClusterManager>) {
        self.nodes
            .insert(server.node_id.clone(), Arc::new(LoopbackNode { server, cluster }));
    }

    pub fn factory(&self) -> &TaskFactory {
        &self.factory
    }
}

#[async_trait]
impl TaskTransport for LoopbackTransport {
    async fn execute(
        &self,
        target: &NodeId,
        request_id: &RequestId,
        task: Arc<dyn RemoteTask>,
    ) -> Result<TaskResult> {
        let node = self
            .nodes
            .get(target)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| CoordinationError::NodeUnavailable(target.clone()))?;

        // Frame the request exactly as a networked transport would: the
        // envelope travels as serde, the task body as its binary wire form.
        let request = TaskRequest {
            request_id: request_id.clone(),
            payload: encode_task(task.as_ref())?.to_vec(),
        };
        let frame = serde_json::to_vec(&request)
            .map_err(|e| CoordinationError::malformed(format!("request envelope: {e}")))?;

        let received: TaskRequest = serde_json::from_slice(&frame)
            .map_err(|e| CoordinationError::malformed(format!("request envelope: {e}")))?;
        let received = decode_task(Bytes::from(received.payload), &self.factory)?;

        // The receiving side re-validates before executing against its own
        // cluster view.
        received.check_is_valid(node.cluster.as_ref())?;

        tracing::debug!(task = received.name(), %target, request = %request_id, "Executing task on loopback node");

        received
            .execute(request_id, &node.server, node.cluster.as_ref(), None)
            .await
    }
}
