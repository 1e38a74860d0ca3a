//! Cron-expression trigger.

use super::Trigger;
use chrono::{DateTime, Utc};
use crucible_core::ports::{Clock, CronEvaluator};
use crucible_core::{BuildCondition, IntegrationRequest, Result};
use std::sync::Arc;
use tracing::warn;

const SOURCE: &str = "CronTrigger";

/// Fires whenever the clock reaches the next instant matching a cron
/// expression. The expression itself is opaque to the trigger; an
/// external evaluator computes matching instants.
pub struct CronTrigger {
    expression: String,
    condition: BuildCondition,
    clock: Arc<dyn Clock>,
    evaluator: Arc<dyn CronEvaluator>,
    next_match: Option<DateTime<Utc>>,
}

impl CronTrigger {
    /// Validates the expression up front by computing its first match; an
    /// unparsable expression fails construction rather than producing a
    /// trigger that silently never fires.
    pub fn new(
        expression: impl Into<String>,
        condition: BuildCondition,
        clock: Arc<dyn Clock>,
        evaluator: Arc<dyn CronEvaluator>,
    ) -> Result<Self> {
        let expression = expression.into();
        let next_match = evaluator.next_match(&expression, clock.now())?;
        Ok(Self {
            expression,
            condition,
            clock,
            evaluator,
            next_match: Some(next_match),
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }
}

impl Trigger for CronTrigger {
    fn fire(&mut self) -> Option<IntegrationRequest> {
        let now = self.clock.now();
        let due = self.next_match.is_some_and(|next| now >= next);
        due.then(|| IntegrationRequest::new(self.condition, SOURCE, now))
    }

    fn next_build(&self) -> Option<DateTime<Utc>> {
        self.next_match
    }

    fn integration_completed(&mut self) {
        match self.evaluator.next_match(&self.expression, self.clock.now()) {
            Ok(next) => self.next_match = Some(next),
            Err(err) => {
                // The expression was valid at construction, so this means
                // it has no further occurrence. Park the trigger.
                warn!(
                    expression = %self.expression,
                    error = %err,
                    "No further cron occurrence; trigger will not fire again"
                );
                self.next_match = None;
            }
        }
    }
}
