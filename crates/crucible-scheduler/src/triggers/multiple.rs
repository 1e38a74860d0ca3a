//! Logical composition of trigger trees.

use super::Trigger;
use chrono::{DateTime, Utc};
use crucible_core::config::Operator;
use crucible_core::IntegrationRequest;

/// Combines several child triggers with `Or` or `And` semantics, always
/// returning the strongest condition among the firing children.
pub struct MultipleTrigger {
    operator: Operator,
    triggers: Vec<Box<dyn Trigger>>,
}

impl MultipleTrigger {
    pub fn new(operator: Operator, triggers: Vec<Box<dyn Trigger>>) -> Self {
        Self { operator, triggers }
    }
}

impl Trigger for MultipleTrigger {
    fn fire(&mut self) -> Option<IntegrationRequest> {
        // Every child is evaluated unconditionally; short-circuiting
        // would starve the cadence of the children it skips.
        let results: Vec<Option<IntegrationRequest>> =
            self.triggers.iter_mut().map(|trigger| trigger.fire()).collect();

        let total = results.len();
        let mut fired = 0;
        let mut best: Option<IntegrationRequest> = None;
        for request in results.into_iter().flatten() {
            fired += 1;
            best = match best {
                Some(held) if held.condition >= request.condition => Some(held),
                _ => Some(request),
            };
        }

        match self.operator {
            Operator::Or => best,
            Operator::And if fired == total => best,
            Operator::And => None,
        }
    }

    fn next_build(&self) -> Option<DateTime<Utc>> {
        self.triggers
            .iter()
            .filter_map(|trigger| trigger.next_build())
            .min()
    }

    fn integration_completed(&mut self) {
        for trigger in &mut self.triggers {
            trigger.integration_completed();
        }
    }
}
