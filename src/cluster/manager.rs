use std::sync::{Arc, RwLock};

use dashmap::DashMap;

use super::types::{NodeId, NodeState};
use crate::lock::manager::LockManager;

/// The cluster interface consumed by the coordination core.
///
/// Implementations wrap whatever membership machinery the embedding server
/// runs. The lock manager designation must be read fresh on every call:
/// failover of the designated server is just a changed read, and callers must
/// never cache it beyond a single operation.
pub trait ClusterManager: Send + Sync {
    /// Identity of the node this view belongs to.
    fn local_node(&self) -> NodeId;

    /// Whether `node` is currently a reachable cluster member.
    fn is_node_available(&self, node: &NodeId) -> bool;

    /// All currently reachable members, local node included.
    fn online_nodes(&self) -> Vec<NodeId>;

    /// The node currently designated as the cluster-wide lock authority.
    fn lock_manager_server(&self) -> NodeId;

    /// Handle to the lock manager executing on the local node.
    fn lock_manager_executor(&self) -> Arc<LockManager>;
}

/// In-memory [`ClusterManager`] backed by a concurrent member table.
///
/// Serves as the cluster view for embedded deployments and tests; a real
/// deployment feeds it from its membership service and calls
/// [`LocalCluster::mark_unreachable`] when failure detection fires.
pub struct LocalCluster {
    local: NodeId,
    members: DashMap<NodeId, NodeState>,
    lock_manager_server: RwLock<NodeId>,
    lock_manager: Arc<LockManager>,
}

impl LocalCluster {
    /// Creates a view where the local node is the only member and also the
    /// designated lock manager server.
    pub fn new(local: NodeId) -> Arc<Self> {
        let members = DashMap::new();
        members.insert(local.clone(), NodeState::Online);

        Arc::new(Self {
            lock_manager_server: RwLock::new(local.clone()),
            local,
            members,
            lock_manager: LockManager::new(),
        })
    }

    /// Adds `node` to the member table as online.
    pub fn add_node(&self, node: NodeId) {
        tracing::info!(%node, "Node joined cluster view");
        self.members.insert(node, NodeState::Online);
    }

    /// Drops `node` from the member table entirely.
    pub fn remove_node(&self, node: &NodeId) {
        self.members.remove(node);
    }

    /// Re-designates the lock manager server, as an elected failover would.
    pub fn set_lock_manager_server(&self, node: NodeId) {
        tracing::info!(%node, "Lock manager server designated");
        let mut server = self
            .lock_manager_server
            .write()
            .unwrap_or_else(|e| e.into_inner());
        *server = node;
    }

    /// Reaction to failure detection: the node is flagged unreachable and
    /// every lock it holds on the local manager is force-released.
    pub fn mark_unreachable(&self, node: &NodeId) {
        if let Some(mut state) = self.members.get_mut(node) {
            *state = NodeState::Unreachable;
        }
        let freed = self.lock_manager.on_node_unreachable(node);
        if !freed.is_empty() {
            tracing::warn!(%node, count = freed.len(), "Auto-released locks of unreachable node");
        }
    }

    /// Marks a previously unreachable node online again.
    pub fn mark_online(&self, node: &NodeId) {
        if let Some(mut state) = self.members.get_mut(node) {
            *state = NodeState::Online;
        }
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

impl ClusterManager for LocalCluster {
    fn local_node(&self) -> NodeId {
        self.local.clone()
    }

    fn is_node_available(&self, node: &NodeId) -> bool {
        self.members
            .get(node)
            .map(|state| *state.value() == NodeState::Online)
            .unwrap_or(false)
    }

    fn online_nodes(&self) -> Vec<NodeId> {
        self.members
            .iter()
            .filter(|entry| *entry.value() == NodeState::Online)
            .map(|entry| entry.key().clone())
            .collect()
    }

    fn lock_manager_server(&self) -> NodeId {
        self.lock_manager_server
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn lock_manager_executor(&self) -> Arc<LockManager> {
        self.lock_manager.clone()
    }
}
