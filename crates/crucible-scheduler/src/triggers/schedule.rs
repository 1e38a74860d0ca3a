//! Time-of-day trigger.

use super::Trigger;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use crucible_core::ports::Clock;
use crucible_core::{BuildCondition, Error, IntegrationRequest, Result};
use std::sync::Arc;

const SOURCE: &str = "ScheduleTrigger";

/// Fires once per day at a configured time of day, and keeps firing on
/// every evaluation until the integration completes; completion rolls
/// the reference forward to the next occurrence, collapsing any days
/// missed while the server was down into a single firing.
pub struct ScheduleTrigger {
    time: NaiveTime,
    condition: BuildCondition,
    clock: Arc<dyn Clock>,
    next_scheduled: DateTime<Utc>,
}

impl ScheduleTrigger {
    pub fn new(time: NaiveTime, condition: BuildCondition, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        let mut next_scheduled = clock.today().and_time(time).and_utc();
        if next_scheduled < now {
            next_scheduled += Duration::days(1);
        }
        Self {
            time,
            condition,
            clock,
            next_scheduled,
        }
    }

    /// Parses `"HH:MM"` or `"HH:MM:SS"`. A malformed value is a
    /// configuration error, never silently defaulted.
    pub fn parse_time_of_day(value: &str) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(value, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
            .map_err(|_| Error::InvalidTimeOfDay(value.to_string()))
    }

    fn advance_past(&mut self, now: DateTime<Utc>) {
        let mut next = now.date_naive().and_time(self.time).and_utc();
        if next <= now {
            next += Duration::days(1);
        }
        self.next_scheduled = next;
    }
}

impl Trigger for ScheduleTrigger {
    fn fire(&mut self) -> Option<IntegrationRequest> {
        let now = self.clock.now();
        (now >= self.next_scheduled)
            .then(|| IntegrationRequest::new(self.condition, SOURCE, now))
    }

    fn next_build(&self) -> Option<DateTime<Utc>> {
        Some(self.next_scheduled)
    }

    fn integration_completed(&mut self) {
        let now = self.clock.now();
        self.advance_past(now);
    }
}
