//! Elapsed-time trigger.

use super::Trigger;
use chrono::{DateTime, Duration, Utc};
use crucible_core::ports::Clock;
use crucible_core::{BuildCondition, IntegrationRequest};
use std::sync::Arc;

const SOURCE: &str = "IntervalTrigger";

/// Fires once a configured amount of time has passed since the last
/// completed integration — immediately on the first evaluation after
/// construction. A `ForceBuild` condition disables the countdown and
/// fires on every evaluation.
pub struct IntervalTrigger {
    interval: Duration,
    condition: BuildCondition,
    clock: Arc<dyn Clock>,
    last_completed: Option<DateTime<Utc>>,
}

impl IntervalTrigger {
    pub const DEFAULT_INTERVAL_SECONDS: u64 = 60;

    pub fn new(interval: Duration, condition: BuildCondition, clock: Arc<dyn Clock>) -> Self {
        Self {
            interval,
            condition,
            clock,
            last_completed: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Re-evaluates against the same reference instant; an in-flight
    /// countdown is not restarted.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }
}

impl Trigger for IntervalTrigger {
    fn fire(&mut self) -> Option<IntegrationRequest> {
        let now = self.clock.now();
        if self.condition == BuildCondition::ForceBuild {
            return Some(IntegrationRequest::new(self.condition, SOURCE, now));
        }
        let due = match self.last_completed {
            None => true,
            Some(last) => now - last >= self.interval,
        };
        due.then(|| IntegrationRequest::new(self.condition, SOURCE, now))
    }

    fn next_build(&self) -> Option<DateTime<Utc>> {
        match self.last_completed {
            None => Some(self.clock.now()),
            Some(last) => Some(last + self.interval),
        }
    }

    fn integration_completed(&mut self) {
        self.last_completed = Some(self.clock.now());
    }
}
