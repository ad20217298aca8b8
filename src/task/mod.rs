//! Distributed Task Contract Module
//!
//! Defines the polymorphic unit of distributed work: a serializable,
//! self-describing task that declares its own routing class, agreement
//! policy, result reduction, timeout and compensation.
//!
//! ## Core Pieces
//! - **`types`**: `RequestId` plus the routing/quorum/strategy enums every
//!   task carries as metadata.
//! - **`contract`**: the [`contract::RemoteTask`] trait: execute, undo,
//!   metadata accessors and the wire codec hooks.
//! - **`wire`**: sequential binary writer/reader used for the task wire form
//!   (type tag first, then variant fields).
//! - **`factory`**: registry resolving a numeric type tag back to an empty
//!   task instance during deserialization.

pub mod contract;
pub mod factory;
pub mod types;
pub mod wire;
