//! Trigger evaluation.
//!
//! A project's build cadence is described by a tree of trigger nodes.
//! Leaves fire on elapsed time, wall-clock schedule, or cron expressions;
//! decorators add filtering windows, logical composition, cross-project
//! gating, rate limiting, and parameter injection. Each node owns its
//! children exclusively — there is no shared mutable trigger state
//! between trees.

mod cron;
mod factory;
mod filter;
mod fixed;
mod interval;
mod multiple;
mod parameter;
mod project;
mod rollup;
mod schedule;

pub use cron::CronTrigger;
pub use factory::build_trigger;
pub use filter::FilterTrigger;
pub use fixed::{
    ForceBuildIntervalTrigger, ForceBuildScheduleTrigger, PollingIntervalTrigger,
    PollingScheduleTrigger,
};
pub use interval::IntervalTrigger;
pub use multiple::MultipleTrigger;
pub use parameter::ParameterTrigger;
pub use project::ProjectTrigger;
pub use rollup::RollUpTrigger;
pub use schedule::ScheduleTrigger;

use chrono::{DateTime, Utc};
use crucible_core::IntegrationRequest;

/// A node in a project's trigger tree.
///
/// `fire` is evaluated on every scheduler tick and never resets the
/// node's own cadence; the owner reports a finished integration through
/// `integration_completed`, and decorators propagate that call to every
/// child they own.
pub trait Trigger: Send {
    /// Evaluate now. `None` means nothing to do on this tick.
    fn fire(&mut self) -> Option<IntegrationRequest>;

    /// Best-effort estimate of the next instant `fire` could return a
    /// request. Used for diagnostics and reporting only; `None` when
    /// nothing is scheduled.
    fn next_build(&self) -> Option<DateTime<Utc>>;

    /// A request from this tree finished processing (success or failure).
    fn integration_completed(&mut self);
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Trigger;
    use chrono::{DateTime, Utc};
    use crucible_core::IntegrationRequest;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Programmable trigger for decorator tests. The returned handle
    /// stays with the test while the trigger itself moves into the tree.
    pub(crate) struct ScriptedTrigger {
        state: Arc<ScriptedState>,
        next: Option<DateTime<Utc>>,
    }

    #[derive(Default)]
    pub(crate) struct ScriptedState {
        pub result: Mutex<Option<IntegrationRequest>>,
        pub fires: AtomicUsize,
        pub completions: AtomicUsize,
    }

    impl ScriptedState {
        pub fn fires(&self) -> usize {
            self.fires.load(Ordering::SeqCst)
        }

        pub fn completions(&self) -> usize {
            self.completions.load(Ordering::SeqCst)
        }
    }

    impl ScriptedTrigger {
        pub fn new(result: Option<IntegrationRequest>) -> (Self, Arc<ScriptedState>) {
            let state = Arc::new(ScriptedState {
                result: Mutex::new(result),
                ..ScriptedState::default()
            });
            (Self { state: state.clone(), next: None }, state)
        }

        pub fn with_next(mut self, next: DateTime<Utc>) -> Self {
            self.next = Some(next);
            self
        }
    }

    impl Trigger for ScriptedTrigger {
        fn fire(&mut self) -> Option<IntegrationRequest> {
            self.state.fires.fetch_add(1, Ordering::SeqCst);
            self.state.result.lock().clone()
        }

        fn next_build(&self) -> Option<DateTime<Utc>> {
            self.next
        }

        fn integration_completed(&mut self) {
            self.state.completions.fetch_add(1, Ordering::SeqCst);
        }
    }
}
