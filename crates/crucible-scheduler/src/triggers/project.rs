//! Cross-project dependency gating.

use super::Trigger;
use chrono::{DateTime, Utc};
use crucible_core::ports::BuildStatusProvider;
use crucible_core::{BuildOutcome, IntegrationRequest};
use std::sync::Arc;
use tracing::{debug, warn};

/// Gates an inner trigger on the build outcome of a different project.
///
/// The inner trigger supplies the cadence: only when it fires is the
/// dependent project's status fetched, and the request passes through
/// only for a matching outcome on a build newer than the last one this
/// trigger reacted to. Status-provider failures are contained here and
/// retried on the next firing.
pub struct ProjectTrigger {
    project_name: String,
    trigger_status: BuildOutcome,
    trigger_first_time: bool,
    inner: Box<dyn Trigger>,
    provider: Arc<dyn BuildStatusProvider>,
    last_reacted_to: Option<DateTime<Utc>>,
}

impl ProjectTrigger {
    pub fn new(
        project_name: impl Into<String>,
        inner: Box<dyn Trigger>,
        provider: Arc<dyn BuildStatusProvider>,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            trigger_status: BuildOutcome::Success,
            trigger_first_time: false,
            inner,
            provider,
            last_reacted_to: None,
        }
    }

    pub fn with_trigger_status(mut self, trigger_status: BuildOutcome) -> Self {
        self.trigger_status = trigger_status;
        self
    }

    /// Whether the very first status observation may fire, instead of
    /// only recording the baseline.
    pub fn with_trigger_first_time(mut self, trigger_first_time: bool) -> Self {
        self.trigger_first_time = trigger_first_time;
        self
    }

    fn should_run(&mut self, request: IntegrationRequest) -> Option<IntegrationRequest> {
        let status = match self.provider.latest_status(&self.project_name) {
            Ok(status) => status,
            Err(err) => {
                warn!(
                    project = %self.project_name,
                    error = %err,
                    "Status lookup failed; skipping this evaluation"
                );
                return None;
            }
        };

        let matches = status.outcome == self.trigger_status;
        match self.last_reacted_to {
            None => {
                self.last_reacted_to = Some(status.completed_at);
                if self.trigger_first_time && matches {
                    Some(request)
                } else {
                    None
                }
            }
            Some(seen) if matches && status.completed_at > seen => {
                debug!(
                    project = %self.project_name,
                    completed_at = %status.completed_at,
                    "Dependent project produced a new matching build"
                );
                self.last_reacted_to = Some(status.completed_at);
                Some(request)
            }
            Some(_) => None,
        }
    }
}

impl Trigger for ProjectTrigger {
    fn fire(&mut self) -> Option<IntegrationRequest> {
        // An idle inner trigger means no remote query at all.
        let request = self.inner.fire()?;
        // Keep the inner cadence moving, win or lose.
        self.inner.integration_completed();
        self.should_run(request)
    }

    fn next_build(&self) -> Option<DateTime<Utc>> {
        self.inner.next_build()
    }

    fn integration_completed(&mut self) {
        self.inner.integration_completed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::triggers::testing::ScriptedTrigger;
    use crucible_core::ports::BuildStatusProvider;
    use crucible_core::{BuildCondition, Error, ProjectBuildStatus, Result};
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn request() -> IntegrationRequest {
        IntegrationRequest::new(BuildCondition::IfModificationExists, "inner", Utc::now())
    }

    #[derive(Default)]
    struct StubProvider {
        status: Mutex<Option<ProjectBuildStatus>>,
        calls: AtomicUsize,
    }

    impl StubProvider {
        fn with_status(outcome: BuildOutcome, completed_at: DateTime<Utc>) -> Self {
            Self {
                status: Mutex::new(Some(ProjectBuildStatus { outcome, completed_at })),
                calls: AtomicUsize::new(0),
            }
        }

        fn set(&self, outcome: BuildOutcome, completed_at: DateTime<Utc>) {
            *self.status.lock() = Some(ProjectBuildStatus { outcome, completed_at });
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl BuildStatusProvider for StubProvider {
        fn latest_status(&self, project_name: &str) -> Result<ProjectBuildStatus> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.status.lock().clone().ok_or_else(|| Error::StatusLookup {
                project: project_name.to_string(),
                message: "unreachable".to_string(),
            })
        }
    }

    #[test]
    fn test_idle_inner_trigger_skips_remote_query() {
        let provider = Arc::new(StubProvider::default());
        let (inner, inner_state) = ScriptedTrigger::new(None);
        let mut trigger = ProjectTrigger::new("upstream", Box::new(inner), provider.clone());

        assert!(trigger.fire().is_none());
        assert_eq!(provider.calls(), 0);
        // The inner cadence is only advanced after a real check.
        assert_eq!(inner_state.completions(), 0);
    }

    #[test]
    fn test_fires_on_new_matching_build_only() {
        let provider = Arc::new(StubProvider::with_status(
            BuildOutcome::Success,
            at("2026-03-02T08:00:00Z"),
        ));
        let (inner, _) = ScriptedTrigger::new(Some(request()));
        let mut trigger = ProjectTrigger::new("upstream", Box::new(inner), provider.clone());

        // First observation records the baseline without firing.
        assert!(trigger.fire().is_none());
        // Same build again: still nothing.
        assert!(trigger.fire().is_none());

        provider.set(BuildOutcome::Success, at("2026-03-02T09:00:00Z"));
        assert!(trigger.fire().is_some());
        // Reacted once; the same build does not fire twice.
        assert!(trigger.fire().is_none());
    }

    #[test]
    fn test_non_matching_outcome_does_not_fire() {
        let provider = Arc::new(StubProvider::with_status(
            BuildOutcome::Success,
            at("2026-03-02T08:00:00Z"),
        ));
        let (inner, _) = ScriptedTrigger::new(Some(request()));
        let mut trigger = ProjectTrigger::new("upstream", Box::new(inner), provider.clone());
        trigger.fire();

        provider.set(BuildOutcome::Failure, at("2026-03-02T09:00:00Z"));
        assert!(trigger.fire().is_none());

        // A later success is still picked up.
        provider.set(BuildOutcome::Success, at("2026-03-02T10:00:00Z"));
        assert!(trigger.fire().is_some());
    }

    #[test]
    fn test_configured_trigger_status() {
        let provider = Arc::new(StubProvider::with_status(
            BuildOutcome::Success,
            at("2026-03-02T08:00:00Z"),
        ));
        let (inner, _) = ScriptedTrigger::new(Some(request()));
        let mut trigger = ProjectTrigger::new("upstream", Box::new(inner), provider.clone())
            .with_trigger_status(BuildOutcome::Failure);
        trigger.fire();

        provider.set(BuildOutcome::Failure, at("2026-03-02T09:00:00Z"));
        assert!(trigger.fire().is_some());
    }

    #[test]
    fn test_trigger_first_time_fires_on_baseline() {
        let provider = Arc::new(StubProvider::with_status(
            BuildOutcome::Success,
            at("2026-03-02T08:00:00Z"),
        ));
        let (inner, _) = ScriptedTrigger::new(Some(request()));
        let mut trigger = ProjectTrigger::new("upstream", Box::new(inner), provider)
            .with_trigger_first_time(true);

        assert!(trigger.fire().is_some());
        assert!(trigger.fire().is_none());
    }

    #[test]
    fn test_provider_failure_is_contained_and_retried() {
        let provider = Arc::new(StubProvider::default());
        let (inner, inner_state) = ScriptedTrigger::new(Some(request()));
        let mut trigger = ProjectTrigger::new("upstream", Box::new(inner), provider.clone())
            .with_trigger_first_time(true);

        // Provider has no status: lookup errors, evaluation yields None.
        assert!(trigger.fire().is_none());
        assert_eq!(provider.calls(), 1);
        // The inner cadence was still advanced.
        assert_eq!(inner_state.completions(), 1);

        provider.set(BuildOutcome::Success, at("2026-03-02T09:00:00Z"));
        assert!(trigger.fire().is_some());
    }

    #[test]
    fn test_inner_completion_called_win_or_lose() {
        let provider = Arc::new(StubProvider::with_status(
            BuildOutcome::Success,
            at("2026-03-02T08:00:00Z"),
        ));
        let (inner, inner_state) = ScriptedTrigger::new(Some(request()));
        let mut trigger = ProjectTrigger::new("upstream", Box::new(inner), provider.clone());

        trigger.fire(); // baseline, no fire
        provider.set(BuildOutcome::Success, at("2026-03-02T09:00:00Z"));
        trigger.fire(); // fires

        assert_eq!(inner_state.completions(), 2);
    }
}
