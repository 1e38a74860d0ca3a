//! End-to-end admission scenarios across queues, triggers, and locks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crucible_core::config::{HandlingMode, ProjectConfig, QueueConfiguration, TriggerDef};
use crucible_core::ports::{
    BuildStatusProvider, IntegrationRunner, ManualClock, NoopNotifier, QueueNotifier,
};
use crucible_core::{
    BuildCondition, BuildOutcome, Error, IntegrationRequest, Project, ProjectBuildStatus,
};
use crucible_scheduler::cron_eval::CronExpressionEvaluator;
use crucible_scheduler::queue::IntegrationQueueItem;
use crucible_scheduler::{IntegrationQueue, IntegrationQueueSet, Scheduler};
use parking_lot::Mutex;
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn at(s: &str) -> DateTime<Utc> {
    s.parse().unwrap()
}

fn request(condition: BuildCondition) -> IntegrationRequest {
    IntegrationRequest::new(condition, "IntervalTrigger", Utc::now())
}

fn enqueue(queue: &Arc<IntegrationQueue>, project: &Arc<Project>, condition: BuildCondition) {
    queue.enqueue(IntegrationQueueItem::new(
        project.clone(),
        request(condition),
        Arc::new(NoopNotifier),
    ));
}

fn names(queue: &IntegrationQueue) -> Vec<String> {
    queue
        .snapshot()
        .map(|snapshot| {
            snapshot
                .items
                .into_iter()
                .map(|item| item.project_name)
                .collect()
        })
        .unwrap_or_default()
}

#[derive(Default)]
struct RecordingNotifier {
    events: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

impl QueueNotifier for RecordingNotifier {
    fn notify_entering_queue(&self) {
        self.events.lock().push("enter".to_string());
    }

    fn notify_exiting_queue(&self, cancelled_while_pending: bool) {
        self.events
            .lock()
            .push(format!("exit:{cancelled_while_pending}"));
    }
}

// Three projects with priorities {0, 1, 1} arriving A, B, C: A heads the
// queue regardless of priority, and the equal nonzero priorities of B
// and C preserve arrival order.
#[test]
fn priority_zero_one_one_preserves_arrival_order() {
    init_tracing();
    let set = IntegrationQueueSet::new();
    let queue = set.add("commit", QueueConfiguration::default());

    let a = Arc::new(Project::new("a").in_queue("commit"));
    let b = Arc::new(Project::new("b").in_queue("commit").with_priority(1));
    let c = Arc::new(Project::new("c").in_queue("commit").with_priority(1));

    enqueue(&queue, &a, BuildCondition::IfModificationExists);
    enqueue(&queue, &b, BuildCondition::IfModificationExists);
    enqueue(&queue, &c, BuildCondition::IfModificationExists);

    assert_eq!(names(&queue), vec!["a", "b", "c"]);
    assert!(queue.next_request(&a).is_some());
}

// A ForceBuild for a project with a pending non-force request on a
// re-add queue cancels the old item and appends the new one.
#[test]
fn re_add_reconciliation_choreography() {
    init_tracing();
    let set = IntegrationQueueSet::new();
    let queue = set.add(
        "commit",
        QueueConfiguration::default().with_handling_mode(HandlingMode::ReAdd),
    );

    let active = Arc::new(Project::new("active").in_queue("commit"));
    let p = Arc::new(Project::new("p").in_queue("commit"));
    let other = Arc::new(Project::new("other").in_queue("commit"));

    enqueue(&queue, &active, BuildCondition::IfModificationExists);

    let old_notifier = Arc::new(RecordingNotifier::default());
    queue.enqueue(IntegrationQueueItem::new(
        p.clone(),
        request(BuildCondition::IfModificationExists),
        old_notifier.clone(),
    ));
    enqueue(&queue, &other, BuildCondition::IfModificationExists);

    let new_notifier = Arc::new(RecordingNotifier::default());
    queue.enqueue(IntegrationQueueItem::new(
        p.clone(),
        request(BuildCondition::ForceBuild),
        new_notifier.clone(),
    ));

    assert_eq!(old_notifier.events(), vec!["enter", "exit:true"]);
    assert_eq!(new_notifier.events(), vec!["enter"]);
    assert_eq!(names(&queue), vec!["active", "other", "p"]);
}

#[test]
fn two_locks_on_one_queue_require_two_releases() {
    init_tracing();
    let set = IntegrationQueueSet::new();
    let commit = set.add("commit", QueueConfiguration::default().with_lock_queues("deploy"));
    let nightly = set.add("nightly", QueueConfiguration::default().with_lock_queues("deploy"));
    let deploy = set.add("deploy", QueueConfiguration::default());

    let site = Arc::new(Project::new("site").in_queue("deploy"));
    enqueue(&deploy, &site, BuildCondition::IfModificationExists);

    let commit_lock = commit.try_lock().unwrap();
    let nightly_lock = nightly.try_lock().unwrap();

    assert!(deploy.is_blocked());
    assert!(deploy.next_request(&site).is_none());

    drop(commit_lock);
    assert!(deploy.is_blocked());

    drop(nightly_lock);
    assert!(!deploy.is_blocked());
    assert!(deploy.next_request(&site).is_some());
}

#[test]
fn snapshot_serializes_for_reporting() {
    init_tracing();
    let set = IntegrationQueueSet::new();
    let queue = set.add("commit", QueueConfiguration::default());
    let web = Arc::new(Project::new("web").in_queue("commit").with_priority(2));
    enqueue(&queue, &web, BuildCondition::ForceBuild);

    let json = serde_json::to_value(set.snapshot()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "queues": [{
                "queue_name": "commit",
                "items": [{
                    "project_name": "web",
                    "queue_priority": 2,
                    "request_source": "IntervalTrigger",
                    "condition": "force_build"
                }]
            }]
        })
    );
}

/// Runner that records the order projects were built in.
#[derive(Default)]
struct RecordingRunner {
    runs: Mutex<Vec<String>>,
}

#[async_trait]
impl IntegrationRunner for RecordingRunner {
    async fn run(
        &self,
        project: &Project,
        _request: IntegrationRequest,
    ) -> crucible_core::Result<BuildOutcome> {
        self.runs.lock().push(project.name.clone());
        Ok(BuildOutcome::Success)
    }
}

struct NoStatus;

impl BuildStatusProvider for NoStatus {
    fn latest_status(&self, project_name: &str) -> crucible_core::Result<ProjectBuildStatus> {
        Err(Error::StatusLookup {
            project: project_name.to_string(),
            message: "not wired".to_string(),
        })
    }
}

// Full path: interval trigger fires, the request is admitted, the head
// runs through the execution port, completion resets the trigger, and a
// filter window keeps the second project quiet the whole time.
#[tokio::test]
async fn end_to_end_trigger_to_execution() {
    init_tracing();
    let clock = Arc::new(ManualClock::at(at("2026-03-02T10:30:00Z")));
    let runner = Arc::new(RecordingRunner::default());
    let mut scheduler = Scheduler::new(
        Arc::new(IntegrationQueueSet::new()),
        clock.clone(),
        Arc::new(CronExpressionEvaluator),
        Arc::new(NoStatus),
        runner.clone(),
    );

    let mut eager = ProjectConfig::new("eager");
    eager.queue = Some("commit".to_string());
    eager.triggers = vec![TriggerDef::Interval {
        seconds: 60,
        condition: BuildCondition::IfModificationExists,
    }];

    // Same cadence, but suppressed between 10:00 and 11:00.
    let mut quiet = ProjectConfig::new("quiet");
    quiet.queue = Some("commit".to_string());
    quiet.triggers = vec![TriggerDef::Filter {
        start_time: "10:00".to_string(),
        end_time: "11:00".to_string(),
        weekdays: vec![],
        trigger: Box::new(TriggerDef::Interval {
            seconds: 60,
            condition: BuildCondition::IfModificationExists,
        }),
    }];

    let eager = scheduler.register(&eager).unwrap();
    let quiet = scheduler.register(&quiet).unwrap();

    eager.tick().await.unwrap();
    quiet.tick().await.unwrap();
    assert_eq!(runner.runs.lock().clone(), vec!["eager"]);

    // Outside the window the filtered project builds too.
    clock.set(at("2026-03-02T11:30:00Z"));
    quiet.tick().await.unwrap();
    assert_eq!(runner.runs.lock().clone(), vec!["eager", "quiet"]);
}
