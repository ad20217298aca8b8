//! Cluster-Wide Exclusive Locking Module
//!
//! Two halves:
//! - **`manager`**: the per-node lock authority. Owns the resource-to-entry
//!   table, performs blocking-with-deadline acquisition, ownership-checked
//!   release, and the auto-release sweep when a holder node dies.
//! - **`task`**: the distributed lock task variant carrying acquire/release
//!   requests to the authority through the generic task pipeline.

pub mod manager;
pub mod task;
