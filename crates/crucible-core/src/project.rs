//! Project identity and build status as the scheduler sees them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A configured project, read-only to the scheduler.
///
/// The scheduler only ever consumes the three fields below; everything
/// else about a project (source control, tasks, publishers) belongs to
/// the configuration and execution layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    /// The integration queue this project enqueues into. Defaults to the
    /// project name, giving every project a private queue unless
    /// configured otherwise.
    pub queue_name: String,
    /// 0 is the default and lowest precedence; nonzero requests queue
    /// ahead of default-priority pending items.
    pub queue_priority: u32,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            queue_name: name.clone(),
            name,
            queue_priority: 0,
        }
    }

    pub fn in_queue(mut self, queue_name: impl Into<String>) -> Self {
        self.queue_name = queue_name.into();
        self
    }

    pub fn with_priority(mut self, queue_priority: u32) -> Self {
        self.queue_priority = queue_priority;
        self
    }
}

/// Terminal outcome of a completed integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildOutcome {
    Success,
    Failure,
    Exception,
    Cancelled,
}

impl BuildOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, BuildOutcome::Success)
    }
}

/// Last known build of an externally-addressed project, as reported by
/// the status provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectBuildStatus {
    pub outcome: BuildOutcome,
    pub completed_at: DateTime<Utc>,
}
