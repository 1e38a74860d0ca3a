//! Read-only reporting snapshots of queue state.

use crate::request::BuildCondition;
use serde::{Deserialize, Serialize};

/// State of every non-empty queue at one instant. Queues holding no
/// items are omitted entirely.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueueSetSnapshot {
    pub queues: Vec<QueueSnapshot>,
}

impl QueueSetSnapshot {
    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}

/// One queue's ordered contents; the first item is the active one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    pub queue_name: String,
    pub items: Vec<QueuedItemSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedItemSnapshot {
    pub project_name: String,
    pub queue_priority: u32,
    pub request_source: String,
    pub condition: BuildCondition,
}
