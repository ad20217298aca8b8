//! Cluster Coordination Library
//!
//! Coordination layer for a replicated database: operations propagate to
//! peer nodes as typed, serializable tasks, agreement on their outcomes is
//! enforced by per-task quorum policies, and a cluster-wide exclusive lock
//! primitive is built on top of the same task mechanism.
//!
//! ## Architecture Modules
//! - **`cluster`**: node identity and the narrow cluster view the core
//!   consumes (reachability, lock manager designation); the reaction to node
//!   failure lives here.
//! - **`config`**: process-wide coordination settings, notably the default
//!   distributed command timeout.
//! - **`task`**: the polymorphic task contract: execute/undo, routing and
//!   agreement metadata, the binary wire codec and the tag-driven factory.
//! - **`lock`**: the per-node lock manager (blocking acquire with deadline,
//!   ownership-checked release, auto-release on node death) and the
//!   distributed lock task variant.
//! - **`dispatch`**: partition-keyed queues, the fan-out coordinator, quorum
//!   and result evaluation, and the transport seam.
//! - **`error`**: the crate-wide failure taxonomy.

pub mod cluster;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod lock;
pub mod task;
