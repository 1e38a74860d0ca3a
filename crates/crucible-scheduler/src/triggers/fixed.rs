//! Fixed-condition adapters over the interval and schedule triggers.
//!
//! These exist purely to pin the build condition at construction; every
//! other call passes straight through to the wrapped trigger.

use super::{IntervalTrigger, ScheduleTrigger, Trigger};
use chrono::{DateTime, Duration, NaiveTime, Utc};
use crucible_core::ports::Clock;
use crucible_core::{BuildCondition, IntegrationRequest};
use std::sync::Arc;

macro_rules! delegate_trigger {
    ($name:ident) => {
        impl Trigger for $name {
            fn fire(&mut self) -> Option<IntegrationRequest> {
                self.inner.fire()
            }

            fn next_build(&self) -> Option<DateTime<Utc>> {
                self.inner.next_build()
            }

            fn integration_completed(&mut self) {
                self.inner.integration_completed();
            }
        }
    };
}

/// Interval trigger pinned to `IfModificationExists`.
pub struct PollingIntervalTrigger {
    inner: IntervalTrigger,
}

impl PollingIntervalTrigger {
    pub fn new(interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: IntervalTrigger::new(interval, BuildCondition::IfModificationExists, clock),
        }
    }
}

delegate_trigger!(PollingIntervalTrigger);

/// Interval trigger pinned to `ForceBuild`.
pub struct ForceBuildIntervalTrigger {
    inner: IntervalTrigger,
}

impl ForceBuildIntervalTrigger {
    pub fn new(interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: IntervalTrigger::new(interval, BuildCondition::ForceBuild, clock),
        }
    }
}

delegate_trigger!(ForceBuildIntervalTrigger);

/// Schedule trigger pinned to `IfModificationExists`.
pub struct PollingScheduleTrigger {
    inner: ScheduleTrigger,
}

impl PollingScheduleTrigger {
    pub fn new(time: NaiveTime, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: ScheduleTrigger::new(time, BuildCondition::IfModificationExists, clock),
        }
    }
}

delegate_trigger!(PollingScheduleTrigger);

/// Schedule trigger pinned to `ForceBuild`.
pub struct ForceBuildScheduleTrigger {
    inner: ScheduleTrigger,
}

impl ForceBuildScheduleTrigger {
    pub fn new(time: NaiveTime, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: ScheduleTrigger::new(time, BuildCondition::ForceBuild, clock),
        }
    }
}

delegate_trigger!(ForceBuildScheduleTrigger);

#[cfg(test)]
mod tests {
    use super::*;
    use crucible_core::ports::ManualClock;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn test_polling_interval_pins_if_modification_exists() {
        let clock = Arc::new(ManualClock::at(at("2026-03-02T10:00:00Z")));
        let mut trigger = PollingIntervalTrigger::new(Duration::seconds(30), clock);
        assert_eq!(
            trigger.fire().unwrap().condition,
            BuildCondition::IfModificationExists
        );
    }

    #[test]
    fn test_force_build_interval_pins_force_build() {
        let clock = Arc::new(ManualClock::at(at("2026-03-02T10:00:00Z")));
        let mut trigger = ForceBuildIntervalTrigger::new(Duration::seconds(30), clock);
        assert_eq!(trigger.fire().unwrap().condition, BuildCondition::ForceBuild);
    }

    #[test]
    fn test_schedule_wrappers_pin_their_conditions() {
        let clock = Arc::new(ManualClock::at(at("2026-03-02T10:00:00Z")));
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();

        let mut polling = PollingScheduleTrigger::new(nine, clock.clone());
        let mut forcing = ForceBuildScheduleTrigger::new(nine, clock.clone());

        // 09:00 already passed today, so both target tomorrow.
        assert!(polling.fire().is_none());
        assert!(forcing.fire().is_none());

        clock.set(at("2026-03-03T09:00:00Z"));
        assert_eq!(
            polling.fire().unwrap().condition,
            BuildCondition::IfModificationExists
        );
        assert_eq!(forcing.fire().unwrap().condition, BuildCondition::ForceBuild);
    }
}
