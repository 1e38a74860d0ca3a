//! Configuration surface consumed by the scheduler.
//!
//! These types represent the externally-owned, declarative configuration:
//! per-queue admission policy and per-project trigger trees. The scheduler
//! reads them; it never writes them back.

use crate::project::{BuildOutcome, Project};
use crate::request::BuildCondition;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What to do when a `ForceBuild` request arrives for a project that
/// already has a pending item on the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlingMode {
    /// Keep the original pending request; drop the incoming one.
    #[default]
    UseFirst,
    /// Cancel the pending request and re-queue the incoming one behind
    /// the other pending items.
    ReAdd,
    /// Cancel the pending request and queue the incoming one directly
    /// behind the active item.
    ReAddTop,
    /// Swap the incoming request into the pending item's exact slot.
    Replace,
}

/// Per-queue admission policy.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueueConfiguration {
    #[serde(default)]
    pub handling_mode: HandlingMode,
    /// Queues blocked while this queue's head item is building.
    #[serde(default)]
    pub lock_queue_names: Vec<String>,
}

impl QueueConfiguration {
    pub fn with_handling_mode(mut self, handling_mode: HandlingMode) -> Self {
        self.handling_mode = handling_mode;
        self
    }

    /// Lock targets from the comma-separated form used in configuration
    /// files, e.g. `"commit,nightly"`.
    pub fn with_lock_queues(mut self, names: &str) -> Self {
        self.lock_queue_names = names
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        self
    }
}

/// Logical operator for [`TriggerDef::Multiple`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// Fire when any child fires.
    #[default]
    Or,
    /// Fire only when every child fires.
    And,
}

/// Declarative definition of a trigger tree.
///
/// Built into live triggers by the scheduler's trigger factory; all
/// validation (time-of-day strings, cron expressions, weekday names)
/// happens there, loudly, at construction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerDef {
    Interval {
        #[serde(default = "default_interval_seconds")]
        seconds: u64,
        #[serde(default = "default_condition")]
        condition: BuildCondition,
    },
    Schedule {
        /// Time of day, `"HH:MM"` or `"HH:MM:SS"`.
        time: String,
        #[serde(default = "default_condition")]
        condition: BuildCondition,
    },
    Cron {
        expression: String,
        #[serde(default = "default_condition")]
        condition: BuildCondition,
    },
    Multiple {
        #[serde(default)]
        operator: Operator,
        #[serde(default)]
        triggers: Vec<TriggerDef>,
    },
    Filter {
        start_time: String,
        end_time: String,
        /// Days the suppression window applies to; empty means every day.
        #[serde(default)]
        weekdays: Vec<String>,
        trigger: Box<TriggerDef>,
    },
    Project {
        /// Name of the dependent project whose builds gate this one.
        project: String,
        #[serde(default = "default_trigger_status")]
        trigger_status: BuildOutcome,
        #[serde(default)]
        trigger_first_time: bool,
        /// Inner cadence; a default-interval trigger when omitted.
        #[serde(default)]
        trigger: Option<Box<TriggerDef>>,
    },
    RollUp {
        minimum_seconds: u64,
        trigger: Box<TriggerDef>,
    },
    Parameter {
        #[serde(default)]
        parameters: HashMap<String, String>,
        trigger: Box<TriggerDef>,
    },
    PollingInterval {
        #[serde(default = "default_interval_seconds")]
        seconds: u64,
    },
    ForceBuildInterval {
        #[serde(default = "default_interval_seconds")]
        seconds: u64,
    },
    PollingSchedule {
        time: String,
    },
    ForceBuildSchedule {
        time: String,
    },
}

fn default_interval_seconds() -> u64 {
    60
}

fn default_condition() -> BuildCondition {
    BuildCondition::IfModificationExists
}

fn default_trigger_status() -> BuildOutcome {
    BuildOutcome::Success
}

/// Per-project configuration consumed by the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub name: String,
    /// Queue to enqueue into; the project name when omitted.
    #[serde(default)]
    pub queue: Option<String>,
    #[serde(default)]
    pub queue_priority: u32,
    #[serde(default)]
    pub triggers: Vec<TriggerDef>,
}

impl ProjectConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            queue: None,
            queue_priority: 0,
            triggers: Vec::new(),
        }
    }

    pub fn to_project(&self) -> Project {
        let mut project = Project::new(&self.name).with_priority(self.queue_priority);
        if let Some(queue) = &self.queue {
            project = project.in_queue(queue);
        }
        project
    }

    /// The project's trigger tree as one definition. Several configured
    /// triggers roll up into an `Or` composite; none means the project
    /// never self-triggers.
    pub fn trigger_def(&self) -> TriggerDef {
        match self.triggers.as_slice() {
            [single] => single.clone(),
            triggers => TriggerDef::Multiple {
                operator: Operator::Or,
                triggers: triggers.to_vec(),
            },
        }
    }
}
