//! Queue registry and the cross-queue lock relation.
//!
//! The queue set is created at server start from configuration and
//! injected wherever the scheduler loop needs it; there is no process
//! global. It also owns the lock graph: a reference-counted map of
//! blocked queues, updated atomically under one mutex so concurrent
//! lock and release activity never observes a torn state.

use crate::queue::IntegrationQueue;
use crucible_core::config::QueueConfiguration;
use crucible_core::snapshot::QueueSetSnapshot;
use crucible_core::{Error, Result};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, trace};

/// Process-lifetime registry mapping queue name to queue.
pub struct IntegrationQueueSet {
    queues: RwLock<BTreeMap<String, Arc<IntegrationQueue>>>,
    locks: Arc<LockGraph>,
}

impl IntegrationQueueSet {
    pub fn new() -> Self {
        Self {
            queues: RwLock::new(BTreeMap::new()),
            locks: LockGraph::new(),
        }
    }

    /// Lazily creates the named queue. Adding a name that already exists
    /// returns the existing queue untouched; the configuration argument
    /// only applies on first creation.
    pub fn add(&self, name: &str, configuration: QueueConfiguration) -> Arc<IntegrationQueue> {
        if let Some(queue) = self.queues.read().get(name) {
            return queue.clone();
        }
        let mut queues = self.queues.write();
        queues
            .entry(name.to_string())
            .or_insert_with(|| {
                self.locks.register(name);
                debug!(queue = %name, "Integration queue created");
                Arc::new(IntegrationQueue::new(
                    name.to_string(),
                    configuration,
                    self.locks.clone(),
                ))
            })
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<IntegrationQueue>> {
        self.queues.read().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.queues.read().keys().cloned().collect()
    }

    /// Reporting snapshot of every non-empty queue.
    pub fn snapshot(&self) -> QueueSetSnapshot {
        QueueSetSnapshot {
            queues: self
                .queues
                .read()
                .values()
                .filter_map(|queue| queue.snapshot())
                .collect(),
        }
    }
}

impl Default for IntegrationQueueSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Reference-counted block state shared by every queue in a set.
pub(crate) struct LockGraph {
    state: Mutex<LockGraphState>,
}

#[derive(Default)]
struct LockGraphState {
    known: HashSet<String>,
    blocked: HashMap<String, usize>,
}

impl LockGraph {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(LockGraphState::default()),
        })
    }

    pub(crate) fn register(&self, name: &str) {
        self.state.lock().known.insert(name.to_string());
    }

    pub(crate) fn is_blocked(&self, name: &str) -> bool {
        self.state
            .lock()
            .blocked
            .get(name)
            .is_some_and(|count| *count > 0)
    }

    /// Increments every target's block count in one transaction. All
    /// targets are validated before any count moves, so a configuration
    /// error leaves the graph untouched.
    pub(crate) fn acquire(self: &Arc<Self>, owner: &str, targets: &[String]) -> Result<QueueLock> {
        {
            let mut state = self.state.lock();
            for target in targets {
                if !state.known.contains(target) {
                    return Err(Error::UnknownLockQueue(target.clone()));
                }
            }
            for target in targets {
                *state.blocked.entry(target.clone()).or_insert(0) += 1;
            }
        }
        if !targets.is_empty() {
            trace!(owner = %owner, targets = ?targets, "Queues blocked");
        }
        Ok(QueueLock {
            graph: self.clone(),
            owner: owner.to_string(),
            targets: targets.to_vec(),
        })
    }

    fn release(&self, owner: &str, targets: &[String]) {
        let mut state = self.state.lock();
        for target in targets {
            if let Some(count) = state.blocked.get_mut(target) {
                *count = count.saturating_sub(1);
            }
        }
        drop(state);
        if !targets.is_empty() {
            trace!(owner = %owner, targets = ?targets, "Queues released");
        }
    }
}

/// Holds the lock relation of one active build; the block counts are
/// released when the guard drops.
pub struct QueueLock {
    graph: Arc<LockGraph>,
    owner: String,
    targets: Vec<String>,
}

impl Drop for QueueLock {
    fn drop(&mut self) {
        self.graph.release(&self.owner, &self.targets);
    }
}
