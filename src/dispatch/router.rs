//! Partition Router & Dispatch Queues
//!
//! A small fixed set of named queues, each drained by a single spawned worker
//! that awaits every job to completion before taking the next. Tasks on one
//! queue therefore execute in strict arrival order; different queues run
//! concurrently with respect to each other.
//!
//! Routing is a pure function of the task's partition key. The router never
//! inspects task content beyond the key.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::error::{CoordinationError, Result};
use crate::task::types::PartitionKey;

/// Number of general hashed queues when not configured otherwise.
pub const DEFAULT_GENERAL_WORKERS: u32 = 4;

/// Identity of one dispatch queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueueId {
    /// Serialized lock queue: acquires execute one at a time.
    Lock,
    /// Fast no-lock queue: never blocked behind pending acquisitions.
    FastNoLock,
    /// One of the general hashed queues.
    General(u32),
}

impl std::fmt::Display for QueueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueId::Lock => f.write_str("lock"),
            QueueId::FastNoLock => f.write_str("fast-nolock"),
            QueueId::General(n) => write!(f, "general-{n}"),
        }
    }
}

/// Pure routing function from partition key to queue.
pub fn route(key: PartitionKey, general_workers: u32) -> QueueId {
    match key {
        PartitionKey::Lock => QueueId::Lock,
        PartitionKey::FastNoLock => QueueId::FastNoLock,
        PartitionKey::Hashed(hash) => QueueId::General(hash % general_workers.max(1)),
    }
}

/// A unit of work executed on a queue worker.
pub type DispatchJob = Pin<Box<dyn Future<Output = ()> + Send>>;

/// The fixed queue set with one worker per queue.
pub struct DispatchQueues {
    lock: mpsc::UnboundedSender<DispatchJob>,
    fast_nolock: mpsc::UnboundedSender<DispatchJob>,
    general: Vec<mpsc::UnboundedSender<DispatchJob>>,
}

impl DispatchQueues {
    /// Spawns the workers and returns the queue set. Must be called from
    /// within a tokio runtime.
    pub fn start(general_workers: u32) -> Self {
        let workers = general_workers.max(1);
        Self {
            lock: Self::spawn_worker(QueueId::Lock),
            fast_nolock: Self::spawn_worker(QueueId::FastNoLock),
            general: (0..workers)
                .map(|n| Self::spawn_worker(QueueId::General(n)))
                .collect(),
        }
    }

    pub fn general_workers(&self) -> u32 {
        self.general.len() as u32
    }

    /// Places `job` at the tail of `queue`. Jobs on one queue run strictly
    /// in the order they were enqueued.
    pub fn enqueue(&self, queue: QueueId, job: DispatchJob) -> Result<()> {
        let sender = match queue {
            QueueId::Lock => &self.lock,
            QueueId::FastNoLock => &self.fast_nolock,
            QueueId::General(n) => self
                .general
                .get(n as usize % self.general.len())
                .unwrap_or(&self.general[0]),
        };

        sender
            .send(job)
            .map_err(|_| CoordinationError::QueueClosed(queue.to_string()))
    }

    fn spawn_worker(id: QueueId) -> mpsc::UnboundedSender<DispatchJob> {
        let (tx, mut rx) = mpsc::unbounded_channel::<DispatchJob>();

        tokio::spawn(async move {
            tracing::debug!(queue = %id, "Dispatch queue worker started");
            // Awaiting each job before recv'ing the next is the whole
            // serialization guarantee of the queue.
            while let Some(job) = rx.recv().await {
                job.await;
            }
            tracing::debug!(queue = %id, "Dispatch queue worker stopped");
        });

        tx
    }
}
