//! Build scheduling for Crucible CI.
//!
//! Two cooperating subsystems, evaluated on independent cadences per
//! project: the trigger engine (a tree of composable trigger nodes
//! deciding *when* a project should build) and the integration queue
//! (admission control deciding *whether and in what order* an admitted
//! request may run). A per-project scheduler loop connects the two and
//! hands the head-of-queue request to the build-execution collaborator.

pub mod cron_eval;
pub mod queue;
pub mod queue_set;
pub mod scheduler;
pub mod triggers;

pub use cron_eval::CronExpressionEvaluator;
pub use queue::{IntegrationQueue, IntegrationQueueItem};
pub use queue_set::{IntegrationQueueSet, QueueLock};
pub use scheduler::{ProjectIntegrator, Scheduler};
