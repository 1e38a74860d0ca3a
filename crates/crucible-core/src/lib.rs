//! Crucible CI Core
//!
//! Core domain types, traits, and error handling for the Crucible CI
//! build scheduler. This crate has minimal dependencies and defines the
//! shared vocabulary used across all other crates.

pub mod config;
pub mod error;
pub mod ports;
pub mod project;
pub mod request;
pub mod snapshot;

pub use error::{Error, Result};
pub use project::{BuildOutcome, Project, ProjectBuildStatus};
pub use request::{BuildCondition, IntegrationRequest, RequestId};
