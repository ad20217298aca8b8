//! Task Dispatch Module
//!
//! Fans a task out to its target nodes, collects responses, and decides the
//! operation's fate by the task's declared quorum and result policies.
//!
//! ## Submodules
//! - **`router`**: maps a task's partition key to one of a small fixed set of
//!   named queues, each drained in strict arrival order by a single worker.
//!   This is what serializes competing lock acquisitions while keeping
//!   releases (and unrelated traffic) flowing on their own queues.
//! - **`protocol`**: DTOs describing a dispatched request and the per-node
//!   responses.
//! - **`quorum`**: reduces the collected responses to a commit/abort decision
//!   and a single caller-visible result.
//! - **`transport`**: the seam to whatever carries requests between nodes,
//!   with an in-process loopback implementation.
//! - **`coordinator`**: the fan-out/collect/undo control loop and the
//!   cluster-lock convenience facade.

pub mod coordinator;
pub mod protocol;
pub mod quorum;
pub mod router;
pub mod transport;
