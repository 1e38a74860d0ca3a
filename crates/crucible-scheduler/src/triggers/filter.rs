//! Suppression-window decorator.

use super::Trigger;
use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc, Weekday};
use crucible_core::ports::Clock;
use crucible_core::IntegrationRequest;
use std::sync::Arc;
use tracing::trace;

/// Suppresses an inner trigger during a daily time window, optionally on
/// selected weekdays only. The window may span midnight. While inside
/// the window the inner trigger is not evaluated at all.
pub struct FilterTrigger {
    inner: Box<dyn Trigger>,
    start_time: NaiveTime,
    end_time: NaiveTime,
    /// Days the window applies to; empty means every day.
    weekdays: Vec<Weekday>,
    clock: Arc<dyn Clock>,
}

impl FilterTrigger {
    pub fn new(
        inner: Box<dyn Trigger>,
        start_time: NaiveTime,
        end_time: NaiveTime,
        weekdays: Vec<Weekday>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner,
            start_time,
            end_time,
            weekdays,
            clock,
        }
    }

    fn day_applies(&self, weekday: Weekday) -> bool {
        self.weekdays.is_empty() || self.weekdays.contains(&weekday)
    }

    fn suppressed_at(&self, instant: DateTime<Utc>) -> bool {
        if !self.day_applies(instant.weekday()) {
            return false;
        }
        let time = instant.time();
        if self.start_time <= self.end_time {
            time >= self.start_time && time < self.end_time
        } else {
            // Window spans midnight.
            time >= self.start_time || time < self.end_time
        }
    }

    /// End of the suppression window containing `instant`.
    fn window_end(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        let mut end = instant.date_naive().and_time(self.end_time).and_utc();
        if self.start_time > self.end_time && instant.time() >= self.start_time {
            end += Duration::days(1);
        }
        end
    }
}

impl Trigger for FilterTrigger {
    fn fire(&mut self) -> Option<IntegrationRequest> {
        if self.suppressed_at(self.clock.now()) {
            trace!("Inside suppression window; inner trigger not evaluated");
            return None;
        }
        self.inner.fire()
    }

    fn next_build(&self) -> Option<DateTime<Utc>> {
        let inner = self.inner.next_build()?;
        if self.suppressed_at(inner) {
            Some(self.window_end(inner))
        } else {
            Some(inner)
        }
    }

    fn integration_completed(&mut self) {
        self.inner.integration_completed();
    }
}
