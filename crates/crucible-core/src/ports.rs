//! Port traits (hexagonal architecture).
//!
//! These traits define the interfaces between the scheduling core and its
//! external collaborators. Everything the core needs from the outside
//! world — the clock, remote build status, cron evaluation, queue
//! reporting callbacks, and build execution — comes in through here, so
//! the core is fully substitutable for deterministic evaluation.

use crate::project::{BuildOutcome, Project, ProjectBuildStatus};
use crate::request::IntegrationRequest;
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Time source for all trigger logic. Nothing in the core reads the
/// hardware clock directly.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Wall-clock implementation used outside tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Programmable clock for deterministic evaluation.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now_ms: AtomicI64::new(now.timestamp_millis()),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.now_ms.store(now.timestamp_millis(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: chrono::Duration) {
        self.now_ms.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.now_ms.load(Ordering::SeqCst)).unwrap_or_default()
    }
}

/// Last-known build status of externally-addressed projects, backing the
/// cross-project dependency trigger. Implementations may go over the
/// network; failures are reported, not swallowed, and the caller decides
/// how to degrade.
pub trait BuildStatusProvider: Send + Sync {
    fn latest_status(&self, project_name: &str) -> Result<ProjectBuildStatus>;
}

/// Opaque cron-expression evaluation.
pub trait CronEvaluator: Send + Sync {
    /// First instant strictly after `after` matching `expression`.
    fn next_match(&self, expression: &str, after: DateTime<Utc>) -> Result<DateTime<Utc>>;
}

/// Lifecycle callbacks for one queue item, consumed by UI and reporting
/// layers.
pub trait QueueNotifier: Send + Sync {
    /// Called exactly once, when the item is accepted into a queue's
    /// sequence — whether it becomes active immediately or stays pending.
    fn notify_entering_queue(&self);

    /// Called exactly once, when the item leaves the sequence.
    /// `cancelled_while_pending` is `false` for an active item being
    /// retired normally and `true` for a pending item removed before
    /// ever becoming active.
    fn notify_exiting_queue(&self, cancelled_while_pending: bool);
}

/// Notifier for callers with no reporting layer attached.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl QueueNotifier for NoopNotifier {
    fn notify_entering_queue(&self) {}

    fn notify_exiting_queue(&self, _cancelled_while_pending: bool) {}
}

/// The build-execution collaborator. Runs one admitted request to
/// completion; failure and timeout detection belong to the implementor,
/// the scheduler only observes the outcome.
#[async_trait]
pub trait IntegrationRunner: Send + Sync {
    async fn run(&self, project: &Project, request: IntegrationRequest) -> Result<BuildOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_manual_clock_set_and_advance() {
        let start: DateTime<Utc> = "2026-03-02T10:00:00Z".parse().unwrap();
        let clock = ManualClock::at(start);
        assert_eq!(clock.now(), start);
        assert_eq!(clock.today(), start.date_naive());

        clock.advance(Duration::seconds(90));
        assert_eq!(clock.now(), start + Duration::seconds(90));

        clock.set(start);
        assert_eq!(clock.now(), start);
    }
}
