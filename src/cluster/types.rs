use serde::{Deserialize, Serialize};

/// Cluster-unique node identifier.
///
/// Wrapper around a string so both generated (uuid) and operator-configured
/// names fit. Ordering and hashing follow the inner string, which lets the
/// id serve as a map key and as half of a `RequestId`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub String);

impl NodeId {
    /// Generates a new random UUID v4-based NodeId.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Wraps a configured node name.
    pub fn named(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reachability of a member as seen by the local node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NodeState {
    Online,
    Unreachable,
}
