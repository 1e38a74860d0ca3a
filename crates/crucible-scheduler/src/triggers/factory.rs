//! Builds live trigger trees from their declarative definitions.
//!
//! This is the single point where trigger configuration is validated:
//! time-of-day strings, weekday names, and cron expressions all fail
//! loudly here instead of producing triggers that silently never fire.

use super::{
    CronTrigger, FilterTrigger, ForceBuildIntervalTrigger, ForceBuildScheduleTrigger,
    IntervalTrigger, MultipleTrigger, ParameterTrigger, PollingIntervalTrigger,
    PollingScheduleTrigger, ProjectTrigger, RollUpTrigger, ScheduleTrigger, Trigger,
};
use chrono::{Duration, Weekday};
use crucible_core::config::TriggerDef;
use crucible_core::ports::{BuildStatusProvider, Clock, CronEvaluator};
use crucible_core::{BuildCondition, Error, Result};
use std::sync::Arc;

pub fn build_trigger(
    def: &TriggerDef,
    clock: &Arc<dyn Clock>,
    cron: &Arc<dyn CronEvaluator>,
    status: &Arc<dyn BuildStatusProvider>,
) -> Result<Box<dyn Trigger>> {
    match def {
        TriggerDef::Interval { seconds, condition } => Ok(Box::new(IntervalTrigger::new(
            Duration::seconds(*seconds as i64),
            *condition,
            clock.clone(),
        ))),
        TriggerDef::Schedule { time, condition } => {
            let time = ScheduleTrigger::parse_time_of_day(time)?;
            Ok(Box::new(ScheduleTrigger::new(time, *condition, clock.clone())))
        }
        TriggerDef::Cron { expression, condition } => Ok(Box::new(CronTrigger::new(
            expression.clone(),
            *condition,
            clock.clone(),
            cron.clone(),
        )?)),
        TriggerDef::Multiple { operator, triggers } => {
            let children = triggers
                .iter()
                .map(|child| build_trigger(child, clock, cron, status))
                .collect::<Result<Vec<_>>>()?;
            Ok(Box::new(MultipleTrigger::new(*operator, children)))
        }
        TriggerDef::Filter { start_time, end_time, weekdays, trigger } => {
            let start = ScheduleTrigger::parse_time_of_day(start_time)?;
            let end = ScheduleTrigger::parse_time_of_day(end_time)?;
            let weekdays = weekdays
                .iter()
                .map(|day| {
                    day.parse::<Weekday>()
                        .map_err(|_| Error::InvalidTrigger(format!("unrecognized weekday: {day}")))
                })
                .collect::<Result<Vec<_>>>()?;
            let inner = build_trigger(trigger, clock, cron, status)?;
            Ok(Box::new(FilterTrigger::new(inner, start, end, weekdays, clock.clone())))
        }
        TriggerDef::Project {
            project,
            trigger_status,
            trigger_first_time,
            trigger,
        } => {
            let inner: Box<dyn Trigger> = match trigger {
                Some(child) => build_trigger(child, clock, cron, status)?,
                None => Box::new(IntervalTrigger::new(
                    Duration::seconds(IntervalTrigger::DEFAULT_INTERVAL_SECONDS as i64),
                    BuildCondition::IfModificationExists,
                    clock.clone(),
                )),
            };
            Ok(Box::new(
                ProjectTrigger::new(project.clone(), inner, status.clone())
                    .with_trigger_status(*trigger_status)
                    .with_trigger_first_time(*trigger_first_time),
            ))
        }
        TriggerDef::RollUp { minimum_seconds, trigger } => {
            let inner = build_trigger(trigger, clock, cron, status)?;
            Ok(Box::new(RollUpTrigger::new(
                inner,
                Duration::seconds(*minimum_seconds as i64),
                clock.clone(),
            )))
        }
        TriggerDef::Parameter { parameters, trigger } => {
            let inner = build_trigger(trigger, clock, cron, status)?;
            Ok(Box::new(ParameterTrigger::new(inner, parameters.clone())))
        }
        TriggerDef::PollingInterval { seconds } => Ok(Box::new(PollingIntervalTrigger::new(
            Duration::seconds(*seconds as i64),
            clock.clone(),
        ))),
        TriggerDef::ForceBuildInterval { seconds } => Ok(Box::new(
            ForceBuildIntervalTrigger::new(Duration::seconds(*seconds as i64), clock.clone()),
        )),
        TriggerDef::PollingSchedule { time } => {
            let time = ScheduleTrigger::parse_time_of_day(time)?;
            Ok(Box::new(PollingScheduleTrigger::new(time, clock.clone())))
        }
        TriggerDef::ForceBuildSchedule { time } => {
            let time = ScheduleTrigger::parse_time_of_day(time)?;
            Ok(Box::new(ForceBuildScheduleTrigger::new(time, clock.clone())))
        }
    }
}
