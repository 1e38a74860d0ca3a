//! Integration-queue admission control.
//!
//! Each named queue owns an ordered sequence of admitted requests. The
//! first item is the head — the one item currently permitted to build;
//! everything behind it is pending. Admission reconciles duplicate
//! requests per project, inserts by priority, and reports every item's
//! lifecycle through its notifier. At most one pending item per project
//! exists at any time.

use crate::queue_set::LockGraph;
use crucible_core::config::{HandlingMode, QueueConfiguration};
use crucible_core::ports::QueueNotifier;
use crucible_core::snapshot::{QueueSnapshot, QueuedItemSnapshot};
use crucible_core::{BuildCondition, IntegrationRequest, Project, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, trace};

/// An admitted request waiting in (or at the head of) a queue.
pub struct IntegrationQueueItem {
    project: Arc<Project>,
    request: IntegrationRequest,
    notifier: Arc<dyn QueueNotifier>,
}

impl IntegrationQueueItem {
    pub fn new(
        project: Arc<Project>,
        request: IntegrationRequest,
        notifier: Arc<dyn QueueNotifier>,
    ) -> Self {
        Self {
            project,
            request,
            notifier,
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn request(&self) -> &IntegrationRequest {
        &self.request
    }

    fn enter(&self) {
        self.notifier.notify_entering_queue();
    }

    fn exit(&self, cancelled_while_pending: bool) {
        self.notifier.notify_exiting_queue(cancelled_while_pending);
    }
}

/// A named FIFO-with-priority queue of integration requests.
pub struct IntegrationQueue {
    name: String,
    configuration: QueueConfiguration,
    items: Mutex<Vec<IntegrationQueueItem>>,
    locks: Arc<LockGraph>,
}

impl IntegrationQueue {
    pub(crate) fn new(
        name: String,
        configuration: QueueConfiguration,
        locks: Arc<LockGraph>,
    ) -> Self {
        Self {
            name,
            configuration,
            items: Mutex::new(Vec::new()),
            locks,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn configuration(&self) -> &QueueConfiguration {
        &self.configuration
    }

    /// Admits a request. An empty queue makes it active immediately; a
    /// project that already has a pending item goes through duplicate
    /// reconciliation per the queue's handling mode; everything else is
    /// inserted by priority.
    pub fn enqueue(&self, item: IntegrationQueueItem) {
        let mut items = self.items.lock();

        if items.is_empty() {
            debug!(
                queue = %self.name,
                project = %item.project.name,
                "Queue was idle; request becomes active immediately"
            );
            item.enter();
            items.push(item);
            return;
        }

        let existing = items
            .iter()
            .skip(1)
            .position(|held| held.project.name == item.project.name)
            .map(|pending_ix| pending_ix + 1);

        let Some(existing_ix) = existing else {
            let ix = Self::prioritized_index(&items, item.project.queue_priority);
            debug!(
                queue = %self.name,
                project = %item.project.name,
                position = ix,
                "Request admitted as pending"
            );
            item.enter();
            items.insert(ix, item);
            return;
        };

        if item.request.condition != BuildCondition::ForceBuild {
            trace!(
                queue = %self.name,
                project = %item.project.name,
                "Duplicate request dropped; existing pending request preserved"
            );
            return;
        }

        match self.configuration.handling_mode {
            HandlingMode::UseFirst => {
                trace!(
                    queue = %self.name,
                    project = %item.project.name,
                    "Force-build duplicate dropped per use-first handling"
                );
            }
            HandlingMode::ReAdd => {
                let old = items.remove(existing_ix);
                old.exit(true);
                let ix = Self::prioritized_index(&items, item.project.queue_priority);
                debug!(
                    queue = %self.name,
                    project = %item.project.name,
                    position = ix,
                    "Pending request cancelled and re-added"
                );
                item.enter();
                items.insert(ix, item);
            }
            HandlingMode::ReAddTop => {
                let old = items.remove(existing_ix);
                old.exit(true);
                debug!(
                    queue = %self.name,
                    project = %item.project.name,
                    "Pending request cancelled and re-added at the front"
                );
                item.enter();
                items.insert(1, item);
            }
            HandlingMode::Replace => {
                debug!(
                    queue = %self.name,
                    project = %item.project.name,
                    position = existing_ix,
                    "Pending request replaced in place"
                );
                let old = std::mem::replace(&mut items[existing_ix], item);
                old.exit(true);
                items[existing_ix].enter();
            }
        }
    }

    /// Retires the head item and promotes the next pending item, if any.
    /// Promotion performs no notification; entering was already signalled
    /// at admission time.
    pub fn dequeue(&self) -> Option<IntegrationQueueItem> {
        let mut items = self.items.lock();
        if items.is_empty() {
            return None;
        }
        let head = items.remove(0);
        debug!(
            queue = %self.name,
            project = %head.project.name,
            remaining = items.len(),
            "Head item retired"
        );
        head.exit(false);
        Some(head)
    }

    /// Removes every item belonging to `project`. A removed head counts
    /// as a normal retirement; removed pending items count as cancelled.
    pub fn remove_project(&self, project: &Project) {
        let mut items = self.items.lock();
        let drained: Vec<IntegrationQueueItem> = items.drain(..).collect();
        for (ix, held) in drained.into_iter().enumerate() {
            if held.project.name == project.name {
                held.exit(ix != 0);
            } else {
                items.push(held);
            }
        }
    }

    /// Removes `project`'s pending item, if one exists. The head item is
    /// never touched.
    pub fn remove_pending_request(&self, project: &Project) {
        let mut items = self.items.lock();
        if let Some(pending_ix) = items
            .iter()
            .skip(1)
            .position(|held| held.project.name == project.name)
        {
            let held = items.remove(pending_ix + 1);
            debug!(
                queue = %self.name,
                project = %project.name,
                "Pending request cancelled"
            );
            held.exit(true);
        }
    }

    /// The head item's request, but only if the head belongs to `project`
    /// and the queue is not blocked by another queue's active build.
    pub fn next_request(&self, project: &Project) -> Option<IntegrationRequest> {
        let items = self.items.lock();
        if self.is_blocked() {
            trace!(queue = %self.name, "Queue is blocked; head request withheld");
            return None;
        }
        items
            .first()
            .filter(|head| head.project.name == project.name)
            .map(|head| head.request.clone())
    }

    pub fn has_pending_item(&self, project: &Project) -> bool {
        self.items
            .lock()
            .iter()
            .skip(1)
            .any(|held| held.project.name == project.name)
    }

    pub fn has_item(&self, project: &Project) -> bool {
        self.items
            .lock()
            .iter()
            .any(|held| held.project.name == project.name)
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Blocks the queues this queue's configuration names, for the
    /// duration of the returned guard. Naming an unregistered queue is a
    /// configuration error.
    pub fn try_lock(&self) -> Result<crate::queue_set::QueueLock> {
        self.locks
            .acquire(&self.name, &self.configuration.lock_queue_names)
    }

    /// True while any other queue's active build holds a lock on this
    /// queue. Reference counted: every lock must be released before the
    /// queue unblocks.
    pub fn is_blocked(&self) -> bool {
        self.locks.is_blocked(&self.name)
    }

    /// Reporting snapshot; `None` when the queue holds no items.
    pub fn snapshot(&self) -> Option<QueueSnapshot> {
        let items = self.items.lock();
        if items.is_empty() {
            return None;
        }
        Some(QueueSnapshot {
            queue_name: self.name.clone(),
            items: items
                .iter()
                .map(|held| QueuedItemSnapshot {
                    project_name: held.project.name.clone(),
                    queue_priority: held.project.queue_priority,
                    request_source: held.request.source.clone(),
                    condition: held.request.condition,
                })
                .collect(),
        })
    }

    /// Insertion slot for a genuinely new pending item. Nonzero
    /// priorities queue ahead of priority-zero items, but never ahead of
    /// a pending item whose priority is greater than or equal to their
    /// own; equal priorities keep arrival order.
    fn prioritized_index(items: &[IntegrationQueueItem], priority: u32) -> usize {
        if priority == 0 {
            return items.len();
        }
        for (ix, held) in items.iter().enumerate().skip(1) {
            let held_priority = held.project.queue_priority;
            if held_priority == 0 || held_priority < priority {
                return ix;
            }
        }
        items.len()
    }
}
