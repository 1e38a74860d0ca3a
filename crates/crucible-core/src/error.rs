//! Error types for Crucible CI.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    // Trigger configuration errors
    #[error("Invalid time of day: {0}")]
    InvalidTimeOfDay(String),

    #[error("Invalid cron expression: {0}")]
    InvalidCron(String),

    #[error("Invalid trigger definition: {0}")]
    InvalidTrigger(String),

    // Queue errors
    #[error("Queue not found: {0}")]
    QueueNotFound(String),

    #[error("Unknown queue in lock configuration: {0}")]
    UnknownLockQueue(String),

    // Remote status errors
    #[error("Status lookup failed for project {project}: {message}")]
    StatusLookup { project: String, message: String },

    // Execution errors, surfaced by the build-execution collaborator
    #[error("Integration run failed: {0}")]
    RunFailed(String),

    // Generic
    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
