//! Per-project scheduling loop.
//!
//! Connects the two subsystems: each registered project gets an
//! integrator that polls its trigger tree, admits fired requests into the
//! project's queue, and carries the head-of-queue request through the
//! build-execution collaborator. Ticks across projects are independent;
//! the only serialization is per queue and per lock relation.

use crate::queue::{IntegrationQueue, IntegrationQueueItem};
use crate::queue_set::IntegrationQueueSet;
use crate::triggers::{build_trigger, Trigger};
use crucible_core::config::{ProjectConfig, QueueConfiguration};
use crucible_core::ports::{
    BuildStatusProvider, Clock, CronEvaluator, IntegrationRunner, NoopNotifier, QueueNotifier,
};
use crucible_core::{Project, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Drives one project's trigger tree and its queue admission.
pub struct ProjectIntegrator {
    project: Arc<Project>,
    trigger: Mutex<Box<dyn Trigger>>,
    queue: Arc<IntegrationQueue>,
    notifier: Arc<dyn QueueNotifier>,
    runner: Arc<dyn IntegrationRunner>,
}

impl ProjectIntegrator {
    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn queue(&self) -> &Arc<IntegrationQueue> {
        &self.queue
    }

    /// One evaluation tick: poll the trigger tree, admit any fired
    /// request, and run this project's request if it is at the head of
    /// an unblocked queue.
    pub async fn tick(&self) -> Result<()> {
        if let Some(request) = self.trigger.lock().fire() {
            debug!(
                project = %self.project.name,
                queue = %self.queue.name(),
                condition = ?request.condition,
                source = %request.source,
                "Trigger fired"
            );
            self.queue.enqueue(IntegrationQueueItem::new(
                self.project.clone(),
                request,
                self.notifier.clone(),
            ));
        }

        let Some(request) = self.queue.next_request(&self.project) else {
            return Ok(());
        };

        // Hold the configured lock relation for the duration of the build.
        let _lock = self.queue.try_lock()?;
        info!(project = %self.project.name, request = %request.id, "Integration started");
        match self.runner.run(&self.project, request).await {
            Ok(outcome) => {
                info!(project = %self.project.name, outcome = ?outcome, "Integration finished")
            }
            Err(err) => {
                error!(project = %self.project.name, error = %err, "Integration failed")
            }
        }
        self.queue.dequeue();
        self.trigger.lock().integration_completed();
        Ok(())
    }
}

/// Owns the integrators and the shared queue set. Dependency-injected
/// throughout: clock, cron evaluation, remote status, and execution all
/// come in as ports.
pub struct Scheduler {
    queues: Arc<IntegrationQueueSet>,
    clock: Arc<dyn Clock>,
    cron: Arc<dyn CronEvaluator>,
    status: Arc<dyn BuildStatusProvider>,
    runner: Arc<dyn IntegrationRunner>,
    integrators: Vec<Arc<ProjectIntegrator>>,
}

impl Scheduler {
    pub fn new(
        queues: Arc<IntegrationQueueSet>,
        clock: Arc<dyn Clock>,
        cron: Arc<dyn CronEvaluator>,
        status: Arc<dyn BuildStatusProvider>,
        runner: Arc<dyn IntegrationRunner>,
    ) -> Self {
        Self {
            queues,
            clock,
            cron,
            status,
            runner,
            integrators: Vec::new(),
        }
    }

    pub fn queue_set(&self) -> &Arc<IntegrationQueueSet> {
        &self.queues
    }

    pub fn integrators(&self) -> &[Arc<ProjectIntegrator>] {
        &self.integrators
    }

    /// Resolves the project's queue, builds its trigger tree, and
    /// registers an integrator. Trigger configuration errors surface
    /// here, before the project is accepted.
    pub fn register(&mut self, config: &ProjectConfig) -> Result<Arc<ProjectIntegrator>> {
        self.register_with_notifier(config, Arc::new(NoopNotifier))
    }

    pub fn register_with_notifier(
        &mut self,
        config: &ProjectConfig,
        notifier: Arc<dyn QueueNotifier>,
    ) -> Result<Arc<ProjectIntegrator>> {
        let project = Arc::new(config.to_project());
        let trigger = build_trigger(&config.trigger_def(), &self.clock, &self.cron, &self.status)?;
        let queue = self
            .queues
            .add(&project.queue_name, QueueConfiguration::default());

        debug!(
            project = %project.name,
            queue = %project.queue_name,
            priority = project.queue_priority,
            "Project registered"
        );
        let integrator = Arc::new(ProjectIntegrator {
            project,
            trigger: Mutex::new(trigger),
            queue,
            notifier,
            runner: self.runner.clone(),
        });
        self.integrators.push(integrator.clone());
        Ok(integrator)
    }

    /// Spawns one polling task per registered project. The caller owns
    /// the handles and aborts them at shutdown.
    pub fn run(&self, poll_interval: Duration) -> Vec<JoinHandle<()>> {
        self.integrators
            .iter()
            .map(|integrator| {
                let integrator = integrator.clone();
                tokio::spawn(async move {
                    let mut ticker = tokio::time::interval(poll_interval);
                    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                    loop {
                        ticker.tick().await;
                        if let Err(err) = integrator.tick().await {
                            warn!(
                                project = %integrator.project().name,
                                error = %err,
                                "Scheduler tick failed"
                            );
                        }
                    }
                })
            })
            .collect()
    }
}
