// Property-based tests for schedule calculation

use chrono::{DateTime, TimeZone, Timelike, Utc};
use common::config::ScheduleConfig;
use common::schedule::{next_execution, parse_cron_expression};
use proptest::prelude::*;

fn daily(hour: u32, minute: u32) -> ScheduleConfig {
    ScheduleConfig {
        cron_expression: format!("0 {minute} {hour} * * * *"),
        timezone: chrono_tz::UTC,
    }
}

fn arbitrary_instant() -> impl Strategy<Value = DateTime<Utc>> {
    // 2020-01-01 .. 2030-01-01, second precision
    (1_577_836_800i64..1_893_456_000).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

proptest! {
    /// The next fire time is strictly in the future of the reference instant
    #[test]
    fn property_next_fire_is_strictly_later(
        hour in 0u32..24,
        minute in 0u32..60,
        reference in arbitrary_instant(),
    ) {
        let schedule = daily(hour, minute);
        let next = next_execution(&schedule, reference).unwrap();
        prop_assert!(next > reference);
    }

    /// A daily schedule always fires at its configured wall-clock time
    #[test]
    fn property_daily_fire_matches_expression(
        hour in 0u32..24,
        minute in 0u32..60,
        reference in arbitrary_instant(),
    ) {
        let schedule = daily(hour, minute);
        let next = next_execution(&schedule, reference).unwrap();
        prop_assert_eq!(next.hour(), hour);
        prop_assert_eq!(next.minute(), minute);
        prop_assert_eq!(next.second(), 0);
    }

    /// Consecutive daily fire times are exactly one day apart
    #[test]
    fn property_daily_fires_are_a_day_apart(
        hour in 0u32..24,
        minute in 0u32..60,
        reference in arbitrary_instant(),
    ) {
        let schedule = daily(hour, minute);
        let first = next_execution(&schedule, reference).unwrap();
        let second = next_execution(&schedule, first).unwrap();
        prop_assert_eq!(second - first, chrono::Duration::days(1));
    }

    /// A daily schedule is never more than 24 hours out
    #[test]
    fn property_fire_never_more_than_a_day_away(
        hour in 0u32..24,
        minute in 0u32..60,
        reference in arbitrary_instant(),
    ) {
        let schedule = daily(hour, minute);
        let next = next_execution(&schedule, reference).unwrap();
        prop_assert!(next - reference <= chrono::Duration::days(1));
    }
}

#[test]
fn default_schedule_parses_and_fires_daily_at_0930_utc() {
    let settings = common::config::Settings::default();
    parse_cron_expression(&settings.schedule.cron_expression).unwrap();

    let reference = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
    let next = next_execution(&settings.schedule, reference).unwrap();
    assert_eq!(next, Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap());
}
