//! Build requests produced by the trigger engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Strength of a build request.
///
/// The ordering matters: trigger combinators pick the maximum condition
/// across their children, and only a `ForceBuild` request can displace a
/// pending queue item during reconciliation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BuildCondition {
    #[default]
    NoBuild,
    IfModificationExists,
    ForceBuild,
}

impl BuildCondition {
    pub fn is_build(&self) -> bool {
        !matches!(self, BuildCondition::NoBuild)
    }
}

/// Identifier assigned to a request when a trigger fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req_{}", self.0)
    }
}

impl std::str::FromStr for RequestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let uuid_str = s.strip_prefix("req_").unwrap_or(s);
        Ok(Self(Uuid::parse_str(uuid_str)?))
    }
}

/// An immutable candidate integration produced by a firing trigger.
///
/// Created at fire time and consumed once by the queue and execution
/// layer. `source` is free text describing which trigger fired;
/// `parameters` carries named build parameters injected along the way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationRequest {
    pub id: RequestId,
    pub condition: BuildCondition,
    pub source: String,
    #[serde(default)]
    pub parameters: HashMap<String, String>,
    pub created_at: DateTime<Utc>,
}

impl IntegrationRequest {
    pub fn new(
        condition: BuildCondition,
        source: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: RequestId::new(),
            condition,
            source: source.into(),
            parameters: HashMap::new(),
            created_at,
        }
    }

    pub fn with_parameters(mut self, parameters: HashMap<String, String>) -> Self {
        self.parameters = parameters;
        self
    }
}
