//! Humanized relative timestamps ("5 minutes ago", "in 2 days").
//!
//! Each unit is rounded from the previous one and the first threshold that
//! matches wins, so 45 seconds already reads as "a minute" and 26 days as
//! "a month".

use chrono::{DateTime, Utc};

const FEW_SECONDS: i64 = 44;
const MINUTES: i64 = 45;
const HOURS: i64 = 22;
const DAYS: i64 = 26;
const MONTHS: i64 = 11;

fn round_div(value: f64, by: f64) -> i64 {
    (value / by).round() as i64
}

/// Describes `then` relative to `now`.
pub fn from_now(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed_ms = (now - then).num_milliseconds();
    let phrase = describe(elapsed_ms.unsigned_abs() as f64 / 1000.0);
    if elapsed_ms < 0 {
        format!("in {phrase}")
    } else {
        format!("{phrase} ago")
    }
}

fn describe(seconds: f64) -> String {
    let seconds_rounded = seconds.round() as i64;
    let minutes = round_div(seconds, 60.0);
    let hours = round_div(seconds, 3_600.0);
    let days = round_div(seconds, 86_400.0);
    // 400 years hold 146097 days.
    let months = round_div(seconds / 86_400.0 * 4_800.0, 146_097.0);
    let years = round_div(months as f64, 12.0);

    match () {
        _ if seconds_rounded <= FEW_SECONDS => "a few seconds".to_string(),
        _ if minutes <= 1 => "a minute".to_string(),
        _ if minutes < MINUTES => format!("{minutes} minutes"),
        _ if hours <= 1 => "an hour".to_string(),
        _ if hours < HOURS => format!("{hours} hours"),
        _ if days <= 1 => "a day".to_string(),
        _ if days < DAYS => format!("{days} days"),
        _ if months <= 1 => "a month".to_string(),
        _ if months < MONTHS => format!("{months} months"),
        _ if years <= 1 => "a year".to_string(),
        _ => format!("{years} years"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn ago(duration: Duration) -> String {
        let now = Utc.with_ymd_and_hms(2020, 10, 7, 12, 0, 0).unwrap();
        from_now(now - duration, now)
    }

    #[test]
    fn past_thresholds() {
        assert_eq!(ago(Duration::seconds(10)), "a few seconds ago");
        assert_eq!(ago(Duration::seconds(50)), "a minute ago");
        assert_eq!(ago(Duration::minutes(5)), "5 minutes ago");
        assert_eq!(ago(Duration::minutes(50)), "an hour ago");
        assert_eq!(ago(Duration::hours(3)), "3 hours ago");
        assert_eq!(ago(Duration::hours(23)), "a day ago");
        assert_eq!(ago(Duration::days(4)), "4 days ago");
        assert_eq!(ago(Duration::days(28)), "a month ago");
        assert_eq!(ago(Duration::days(95)), "3 months ago");
        assert_eq!(ago(Duration::days(400)), "a year ago");
        assert_eq!(ago(Duration::days(1200)), "3 years ago");
    }

    #[test]
    fn future_is_prefixed() {
        assert_eq!(ago(Duration::days(-2)), "in 2 days");
    }
}
