// Schedule parsing and next-fire-time calculation
//
// The runner has a single time-based trigger: a seconds-precision cron
// expression evaluated in a configured timezone (UTC unless overridden).

use crate::config::ScheduleConfig;
use crate::errors::ScheduleError;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use cron::Schedule as CronSchedule;
use std::str::FromStr;

/// Parse and validate a cron expression
pub fn parse_cron_expression(expression: &str) -> Result<CronSchedule, ScheduleError> {
    CronSchedule::from_str(expression).map_err(|e| ScheduleError::InvalidCronExpression {
        expression: expression.to_string(),
        reason: e.to_string(),
    })
}

/// Calculate the next fire time strictly after `after`
///
/// The expression is evaluated in the schedule's timezone and the result is
/// converted back to UTC.
pub fn next_execution(
    schedule: &ScheduleConfig,
    after: DateTime<Utc>,
) -> Result<DateTime<Utc>, ScheduleError> {
    next_in_timezone(&schedule.cron_expression, schedule.timezone, after)
}

fn next_in_timezone(
    expression: &str,
    timezone: Tz,
    after: DateTime<Utc>,
) -> Result<DateTime<Utc>, ScheduleError> {
    let schedule = parse_cron_expression(expression)?;
    let after_in_tz = after.with_timezone(&timezone);

    let next_in_tz = schedule
        .after(&after_in_tz)
        .next()
        .ok_or_else(|| ScheduleError::NoNextExecution(expression.to_string()))?;

    Ok(next_in_tz.with_timezone(&Utc))
}
