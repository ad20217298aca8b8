use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::Notify;

use crate::cluster::types::NodeId;
use crate::error::{CoordinationError, Result};
use crate::task::types::RequestId;

/// A held exclusive lock. At most one live entry exists per resource name;
/// that is the core correctness invariant of the subsystem.
#[derive(Debug, Clone)]
pub struct LockEntry {
    /// Identity the lock was granted to.
    pub holder: NodeId,
    /// The distributed request that acquired the lock, kept for correlation
    /// in logs and undo handling.
    pub request: RequestId,
    pub acquired_at: Instant,
    /// `acquired_at` plus the acquire timeout, when one was declared.
    /// Recorded for inspection; re-entrant acquires never move it.
    pub deadline: Option<Instant>,
}

enum TryAcquire {
    Granted,
    AlreadyHeld,
    Busy,
}

/// Per-node authority over exclusive resource locks.
///
/// The entry table is the only mutable shared state of the coordination core.
/// All three mutations (test-and-set acquire, ownership-checked release, bulk
/// force-release) are atomic per resource key through the concurrent map, so
/// unrelated resources never serialize on each other.
pub struct LockManager {
    entries: DashMap<String, LockEntry>,
    /// One wakeup channel per contended resource. A release hands exactly one
    /// permit to the waiter set; a timed-out waiter passes a consumed permit on.
    waiters: DashMap<String, Arc<Notify>>,
}

impl LockManager {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            entries: DashMap::new(),
            waiters: DashMap::new(),
        })
    }

    /// Blocks the calling worker until the lock on `resource` is granted to
    /// `requester` or `timeout` elapses.
    ///
    /// Re-acquisition by the current holder is an immediate no-op success, so
    /// duplicate delivery of an acquire is harmless; the original deadline is
    /// not extended. On timeout the entry table is untouched: either the
    /// entry was created before the deadline or it was not, never both.
    pub async fn acquire_exclusive(
        &self,
        resource: &str,
        requester: &NodeId,
        request: &RequestId,
        timeout: Duration,
    ) -> Result<()> {
        let wait_deadline = tokio::time::Instant::now() + timeout;

        loop {
            let notify = self.waiter(resource);
            // Register interest before the test-and-set so a release landing
            // in between leaves a permit instead of a lost wakeup.
            let notified = notify.notified();

            match self.try_acquire(resource, requester, request, timeout) {
                TryAcquire::Granted => {
                    tracing::debug!(resource, %requester, request = %request, "Exclusive lock granted");
                    return Ok(());
                }
                TryAcquire::AlreadyHeld => {
                    tracing::debug!(resource, %requester, "Re-entrant acquire, lock already held");
                    return Ok(());
                }
                TryAcquire::Busy => {}
            }

            if tokio::time::Instant::now() >= wait_deadline {
                // Hand any permit we may have consumed to the next waiter.
                notify.notify_one();
                tracing::debug!(resource, %requester, ?timeout, "Lock acquisition timed out");
                return Err(CoordinationError::LockTimeout {
                    resource: resource.to_string(),
                    timeout,
                });
            }

            let _ = tokio::time::timeout_at(wait_deadline, notified).await;
        }
    }

    fn try_acquire(
        &self,
        resource: &str,
        requester: &NodeId,
        request: &RequestId,
        timeout: Duration,
    ) -> TryAcquire {
        match self.entries.entry(resource.to_string()) {
            Entry::Vacant(slot) => {
                let acquired_at = Instant::now();
                slot.insert(LockEntry {
                    holder: requester.clone(),
                    request: request.clone(),
                    acquired_at,
                    deadline: (timeout > Duration::ZERO).then(|| acquired_at + timeout),
                });
                TryAcquire::Granted
            }
            Entry::Occupied(held) if held.get().holder == *requester => TryAcquire::AlreadyHeld,
            Entry::Occupied(_) => TryAcquire::Busy,
        }
    }

    /// Releases the lock on `resource` if, and only if, `requester` holds it.
    ///
    /// A mismatched release indicates a coordination bug or a stale message;
    /// it fails with an ownership error and leaves the real holder's entry
    /// untouched.
    pub fn release_exclusive(&self, resource: &str, requester: &NodeId) -> Result<()> {
        let removed = self
            .entries
            .remove_if(resource, |_, entry| entry.holder == *requester);

        match removed {
            Some((_, entry)) => {
                tracing::debug!(
                    resource,
                    %requester,
                    held_for = ?entry.acquired_at.elapsed(),
                    "Exclusive lock released"
                );
                self.wake_one(resource);
                Ok(())
            }
            None => {
                let holder = self.entries.get(resource).map(|e| e.holder.clone());
                tracing::warn!(resource, %requester, ?holder, "Release by non-holder rejected");
                Err(CoordinationError::LockOwnership {
                    resource: resource.to_string(),
                    holder,
                    requester: requester.clone(),
                })
            }
        }
    }

    /// Force-releases every lock held by `node`, returning the freed resource
    /// names.
    ///
    /// This is the auto-release guarantee: a crashed or partitioned holder
    /// cannot starve a resource forever, and waiters blocked on its locks are
    /// unblocked instead of running out their own timeouts.
    pub fn on_node_unreachable(&self, node: &NodeId) -> Vec<String> {
        let held: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.value().holder == *node)
            .map(|entry| entry.key().clone())
            .collect();

        let mut freed = Vec::new();
        for resource in held {
            // Re-checked under the map shard lock: the holder may have
            // released (or the entry changed hands) since the scan.
            if self
                .entries
                .remove_if(&resource, |_, entry| entry.holder == *node)
                .is_some()
            {
                tracing::warn!(resource = %resource, %node, "Forced lock release, holder unreachable");
                self.wake_one(&resource);
                freed.push(resource);
            }
        }

        freed
    }

    /// Current holder of `resource`, if any.
    pub fn held_by(&self, resource: &str) -> Option<NodeId> {
        self.entries.get(resource).map(|entry| entry.holder.clone())
    }

    /// Snapshot of a lock entry, for inspection and status reporting.
    pub fn entry(&self, resource: &str) -> Option<LockEntry> {
        self.entries.get(resource).map(|entry| entry.clone())
    }

    pub fn lock_count(&self) -> usize {
        self.entries.len()
    }

    /// Number of live wakeup channels, for inspection. Channels are reclaimed
    /// on release once no waiter references them.
    pub fn waiter_count(&self) -> usize {
        self.waiters.len()
    }

    fn waiter(&self, resource: &str) -> Arc<Notify> {
        self.waiters
            .entry(resource.to_string())
            .or_insert_with(|| Arc::new(Notify::new()))
            .clone()
    }

    fn wake_one(&self, resource: &str) {
        if let Some(notify) = self.waiters.get(resource) {
            notify.notify_one();
        }
        // A strong count of one means the map holds the only reference: no
        // task is waiting, so the channel can go. The next contender
        // recreates it through `waiter`.
        self.waiters
            .remove_if(resource, |_, notify| Arc::strong_count(notify) == 1);
    }
}
