//! Cron-expression evaluation backed by the `cron` crate.

use chrono::{DateTime, Utc};
use cron::Schedule;
use crucible_core::ports::CronEvaluator;
use crucible_core::{Error, Result};
use std::str::FromStr;

/// Default [`CronEvaluator`] implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct CronExpressionEvaluator;

impl CronEvaluator for CronExpressionEvaluator {
    fn next_match(&self, expression: &str, after: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let schedule = Schedule::from_str(expression)
            .map_err(|err| Error::InvalidCron(format!("{expression}: {err}")))?;
        schedule
            .after(&after)
            .next()
            .ok_or_else(|| Error::InvalidCron(format!("{expression}: no future occurrence")))
    }
}
