//! Cluster Module Tests
//!
//! Covers node identity semantics, the in-memory cluster view and its
//! coupling to the lock manager's auto-release on failure detection.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::time::Duration;

    use crate::cluster::manager::{ClusterManager, LocalCluster};
    use crate::cluster::types::{NodeId, NodeState};
    use crate::task::types::RequestId;

    // ============================================================
    // NODE IDENTITY
    // ============================================================

    #[test]
    fn test_generated_node_ids_are_unique() {
        let ids: HashSet<NodeId> = (0..100).map(|_| NodeId::new()).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_named_node_ids_compare_by_name() {
        assert_eq!(NodeId::named("n1"), NodeId::named("n1"));
        assert_ne!(NodeId::named("n1"), NodeId::named("n2"));
        assert_eq!(NodeId::named("n1").to_string(), "n1");
    }

    #[test]
    fn test_node_id_serde_round_trip() {
        let id = NodeId::named("europe-0");
        let json = serde_json::to_string(&id).unwrap();
        let back: NodeId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    // ============================================================
    // CLUSTER VIEW
    // ============================================================

    #[test]
    fn test_new_view_contains_only_the_local_node() {
        let cluster = LocalCluster::new(NodeId::named("n1"));
        assert_eq!(cluster.member_count(), 1);
        assert_eq!(cluster.local_node(), NodeId::named("n1"));
        assert!(cluster.is_node_available(&NodeId::named("n1")));
        assert!(!cluster.is_node_available(&NodeId::named("n2")));
    }

    #[test]
    fn test_local_node_is_the_initial_lock_manager_server() {
        let cluster = LocalCluster::new(NodeId::named("n1"));
        assert_eq!(cluster.lock_manager_server(), NodeId::named("n1"));
    }

    #[test]
    fn test_membership_changes() {
        let cluster = LocalCluster::new(NodeId::named("n1"));
        cluster.add_node(NodeId::named("n2"));
        cluster.add_node(NodeId::named("n3"));
        assert_eq!(cluster.member_count(), 3);

        cluster.mark_unreachable(&NodeId::named("n2"));
        assert!(!cluster.is_node_available(&NodeId::named("n2")));
        let online = cluster.online_nodes();
        assert_eq!(online.len(), 2);
        assert!(!online.contains(&NodeId::named("n2")));

        cluster.mark_online(&NodeId::named("n2"));
        assert!(cluster.is_node_available(&NodeId::named("n2")));

        cluster.remove_node(&NodeId::named("n3"));
        assert_eq!(cluster.member_count(), 2);
    }

    #[test]
    fn test_lock_manager_designation_is_read_fresh() {
        let cluster = LocalCluster::new(NodeId::named("n1"));
        cluster.add_node(NodeId::named("n2"));

        cluster.set_lock_manager_server(NodeId::named("n2"));
        assert_eq!(cluster.lock_manager_server(), NodeId::named("n2"));

        // Failover back; the next read observes the change immediately.
        cluster.set_lock_manager_server(NodeId::named("n1"));
        assert_eq!(cluster.lock_manager_server(), NodeId::named("n1"));
    }

    #[test]
    fn test_node_state_equality() {
        assert_eq!(NodeState::Online, NodeState::Online);
        assert_ne!(NodeState::Online, NodeState::Unreachable);
    }

    // ============================================================
    // FAILURE DETECTION x LOCKS
    // ============================================================

    #[tokio::test]
    async fn test_unreachable_member_loses_its_locks() {
        let cluster = LocalCluster::new(NodeId::named("n1"));
        let n2 = NodeId::named("n2");
        cluster.add_node(n2.clone());

        let manager = cluster.lock_manager_executor();
        manager
            .acquire_exclusive("db1", &n2, &RequestId::new(n2.clone(), 1), Duration::ZERO)
            .await
            .unwrap();
        manager
            .acquire_exclusive("db2", &n2, &RequestId::new(n2.clone(), 2), Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(manager.lock_count(), 2);

        cluster.mark_unreachable(&n2);
        assert_eq!(manager.lock_count(), 0);
        assert_eq!(manager.held_by("db1"), None);
        assert_eq!(manager.held_by("db2"), None);
    }

    #[tokio::test]
    async fn test_unreachable_member_only_loses_its_own_locks() {
        let cluster = LocalCluster::new(NodeId::named("n1"));
        let n1 = NodeId::named("n1");
        let n2 = NodeId::named("n2");
        cluster.add_node(n2.clone());

        let manager = cluster.lock_manager_executor();
        manager
            .acquire_exclusive("mine", &n1, &RequestId::new(n1.clone(), 1), Duration::ZERO)
            .await
            .unwrap();
        manager
            .acquire_exclusive("theirs", &n2, &RequestId::new(n2.clone(), 1), Duration::ZERO)
            .await
            .unwrap();

        cluster.mark_unreachable(&n2);
        assert_eq!(manager.held_by("mine"), Some(n1));
        assert_eq!(manager.held_by("theirs"), None);
    }
}
