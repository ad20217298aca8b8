//! Cluster View Module
//!
//! The coordination core never talks to the network itself; it consumes a
//! narrow view of the cluster through the [`manager::ClusterManager`] trait: which
//! nodes are reachable, which node is currently designated as the lock
//! manager authority, and a handle to the local lock manager executor.
//!
//! Failure detection (gossip, heartbeats) is an external collaborator. This
//! module only defines the *reaction* to a detected failure: marking the node
//! unavailable and force-releasing every lock it held.

pub mod manager;
pub mod types;

#[cfg(test)]
mod tests;
