//! Rate-limiting decorator.

use super::Trigger;
use chrono::{DateTime, Duration, Utc};
use crucible_core::ports::Clock;
use crucible_core::IntegrationRequest;
use std::sync::Arc;
use tracing::trace;

/// Batches an inner trigger's firings: once an integration completes, any
/// further firing within `minimum_interval` is suppressed, rolling rapid
/// consecutive causes into one later build. When the inner trigger has
/// nothing to report there is nothing to batch, and nothing fires.
pub struct RollUpTrigger {
    inner: Box<dyn Trigger>,
    minimum_interval: Duration,
    clock: Arc<dyn Clock>,
    last_completed: Option<DateTime<Utc>>,
}

impl RollUpTrigger {
    pub fn new(inner: Box<dyn Trigger>, minimum_interval: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner,
            minimum_interval,
            clock,
            last_completed: None,
        }
    }
}

impl Trigger for RollUpTrigger {
    fn fire(&mut self) -> Option<IntegrationRequest> {
        let request = self.inner.fire()?;
        if let Some(last) = self.last_completed
            && self.clock.now() - last < self.minimum_interval
        {
            trace!("Rolling up; minimum time since last integration not yet reached");
            return None;
        }
        Some(request)
    }

    fn next_build(&self) -> Option<DateTime<Utc>> {
        let inner = self.inner.next_build()?;
        match self.last_completed {
            Some(last) => Some(inner.max(last + self.minimum_interval)),
            None => Some(inner),
        }
    }

    fn integration_completed(&mut self) {
        self.last_completed = Some(self.clock.now());
        self.inner.integration_completed();
    }
}
