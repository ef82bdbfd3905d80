//! crates/study_planner_core/src/calendar.rs
//!
//! Calendar arithmetic for plans: the planner's week numbering, weekday
//! resolution relative to "now", and conversions between the user's
//! wall-clock and stored UTC instants.
//!
//! "Now" is always a `DateTime<FixedOffset>` carrying the user's offset, so
//! "today", weekdays and week numbers are read from the user's calendar.

use crate::domain::WeekKey;
use crate::error::PlannerError;
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use std::str::FromStr;

/// The longest single session, in hours.
pub const MAX_SESSION_HOURS: f64 = 24.0;

/// Converts a fractional hour count into a `Duration`, rounded to the millisecond.
///
/// Callers bound `h` first; see [`session_end`].
pub fn hours(h: f64) -> Duration {
    Duration::milliseconds((h * 3_600_000.0).round() as i64)
}

/// When a session of `duration` hours starting at `start` ends.
///
/// The length must round to at least one millisecond and be no longer than
/// [`MAX_SESSION_HOURS`], so the end always lies strictly after the start.
pub fn session_end(start: DateTime<Utc>, duration: f64) -> Result<DateTime<Utc>, PlannerError> {
    if !duration.is_finite() || duration <= 0.0 || duration > MAX_SESSION_HOURS {
        return Err(PlannerError::InvalidDuration(duration));
    }
    let span = hours(duration);
    if span <= Duration::zero() {
        return Err(PlannerError::InvalidDuration(duration));
    }
    start
        .checked_add_signed(span)
        .ok_or(PlannerError::InvalidDuration(duration))
}

/// `ceil((daysSinceJan1 + jan1Weekday + 1) / 7)` with Sunday = 0.
///
/// Deliberately not ISO-8601: stored plans are keyed by this number.
pub fn week_number(date: NaiveDate) -> u32 {
    let days_since_jan1 = date.ordinal0() as i64;
    let weekday = date.weekday().num_days_from_sunday() as i64;
    let jan1_weekday = (weekday - days_since_jan1).rem_euclid(7);
    ((days_since_jan1 + jan1_weekday + 1 + 6) / 7) as u32
}

pub fn week_key(date: NaiveDate) -> WeekKey {
    WeekKey {
        week_number: week_number(date),
        year: date.year(),
    }
}

/// The plan week `now` falls in, on the user's calendar.
pub fn current_week(now: &DateTime<FixedOffset>) -> WeekKey {
    week_key(now.date_naive())
}

/// How a requested weekday that matches today is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DayOffsetPolicy {
    /// Today's weekday means the same weekday next week (offset 7).
    #[default]
    NextWeek,
    /// Today's weekday means today (offset 0).
    SameDay,
}

impl FromStr for DayOffsetPolicy {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "next_week" => Ok(DayOffsetPolicy::NextWeek),
            "same_day" => Ok(DayOffsetPolicy::SameDay),
            other => Err(PlannerError::InvalidValue {
                field: "day offset policy",
                value: other.to_string(),
            }),
        }
    }
}

/// The date of the next `target` weekday on or after `today`, with a 7-day wrap.
pub fn next_occurrence(today: NaiveDate, target: Weekday, policy: DayOffsetPolicy) -> NaiveDate {
    let current = today.weekday().num_days_from_sunday() as i64;
    let wanted = target.num_days_from_sunday() as i64;
    let mut offset = (wanted - current).rem_euclid(7);
    if offset == 0 && policy == DayOffsetPolicy::NextWeek {
        offset = 7;
    }
    today + Duration::days(offset)
}

/// Parses a full English weekday name ("Monday"). Abbreviations are accepted too.
pub fn parse_weekday(name: &str) -> Result<Weekday, PlannerError> {
    Weekday::from_str(name.trim()).map_err(|_| PlannerError::UnknownWeekday(name.to_string()))
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Parses "HH:MM" (24h).
pub fn parse_start_time(text: &str) -> Result<NaiveTime, PlannerError> {
    NaiveTime::parse_from_str(text.trim(), "%H:%M")
        .map_err(|_| PlannerError::InvalidStartTime(text.to_string()))
}

pub fn format_start_time(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// The UTC instant of `date` at wall-clock `time` in `offset`.
pub fn at_local(date: NaiveDate, time: NaiveTime, offset: &FixedOffset) -> DateTime<Utc> {
    let local = date.and_time(time);
    Utc.from_utc_datetime(&(local - Duration::seconds(offset.local_minus_utc() as i64)))
}

/// The user's calendar date of a stored instant.
pub fn local_date(instant: DateTime<Utc>, offset: &FixedOffset) -> NaiveDate {
    instant.with_timezone(offset).date_naive()
}

/// Whether `instant` falls on the same calendar day as `now` for the user.
pub fn is_today(instant: DateTime<Utc>, now: &DateTime<FixedOffset>) -> bool {
    local_date(instant, now.offset()) == now.date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_week_number_first_week() {
        // 2025-01-01 is a Wednesday; the first week runs until Saturday the 4th.
        assert_eq!(week_number(date(2025, 1, 1)), 1);
        assert_eq!(week_number(date(2025, 1, 4)), 1);
        assert_eq!(week_number(date(2025, 1, 5)), 2);
    }

    #[test]
    fn test_week_number_when_year_starts_on_sunday() {
        // 2023-01-01 is a Sunday.
        assert_eq!(week_number(date(2023, 1, 1)), 1);
        assert_eq!(week_number(date(2023, 1, 7)), 1);
        assert_eq!(week_number(date(2023, 1, 8)), 2);
    }

    #[test]
    fn test_week_number_end_of_year() {
        // 2024-12-31 is a Tuesday, 2024-01-01 a Monday: ceil((365 + 1 + 1) / 7) = 53.
        assert_eq!(week_number(date(2024, 12, 31)), 53);
        assert_eq!(week_key(date(2024, 12, 31)).year, 2024);
    }

    #[test]
    fn test_next_occurrence_wraps_forward() {
        let wednesday = date(2025, 3, 12);
        assert_eq!(
            next_occurrence(wednesday, Weekday::Fri, DayOffsetPolicy::NextWeek),
            date(2025, 3, 14)
        );
        assert_eq!(
            next_occurrence(wednesday, Weekday::Mon, DayOffsetPolicy::NextWeek),
            date(2025, 3, 17)
        );
    }

    #[test]
    fn test_next_occurrence_same_weekday_depends_on_policy() {
        let wednesday = date(2025, 3, 12);
        assert_eq!(
            next_occurrence(wednesday, Weekday::Wed, DayOffsetPolicy::NextWeek),
            date(2025, 3, 19)
        );
        assert_eq!(
            next_occurrence(wednesday, Weekday::Wed, DayOffsetPolicy::SameDay),
            wednesday
        );
    }

    #[test]
    fn test_parse_weekday() {
        assert_eq!(parse_weekday("Monday").unwrap(), Weekday::Mon);
        assert_eq!(parse_weekday("sunday").unwrap(), Weekday::Sun);
        assert!(matches!(
            parse_weekday("Someday"),
            Err(PlannerError::UnknownWeekday(name)) if name == "Someday"
        ));
        assert_eq!(weekday_name(Weekday::Thu), "Thursday");
    }

    #[test]
    fn test_start_time_round_trip() {
        let t = parse_start_time("18:05").unwrap();
        assert_eq!(format_start_time(t), "18:05");
        assert!(parse_start_time("6pm").is_err());
        assert!(parse_start_time("25:00").is_err());
    }

    #[test]
    fn test_at_local_applies_offset() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let instant = at_local(date(2025, 3, 10), parse_start_time("18:00").unwrap(), &offset);
        assert_eq!(instant, Utc.with_ymd_and_hms(2025, 3, 10, 16, 0, 0).unwrap());
        assert_eq!(local_date(instant, &offset), date(2025, 3, 10));
    }

    #[test]
    fn test_is_today_uses_user_calendar() {
        let offset = FixedOffset::west_opt(5 * 3600).unwrap();
        // 23:30 on the 10th in UTC-5 is 04:30 on the 11th in UTC.
        let now = offset.with_ymd_and_hms(2025, 3, 10, 23, 30, 0).unwrap();
        let late_evening = Utc.with_ymd_and_hms(2025, 3, 11, 3, 0, 0).unwrap();
        let next_morning = Utc.with_ymd_and_hms(2025, 3, 11, 12, 0, 0).unwrap();
        assert!(is_today(late_evening, &now));
        assert!(!is_today(next_morning, &now));
    }

    #[test]
    fn test_hours_handles_fractions() {
        assert_eq!(hours(1.5), Duration::minutes(90));
        assert_eq!(hours(0.25), Duration::minutes(15));
    }

    #[test]
    fn test_session_end_bounds_the_length() {
        let start = Utc.with_ymd_and_hms(2025, 3, 10, 18, 0, 0).unwrap();
        assert_eq!(session_end(start, 1.5).unwrap(), start + Duration::minutes(90));
        assert_eq!(session_end(start, MAX_SESSION_HOURS).unwrap(), start + Duration::hours(24));

        // Shorter than half a millisecond rounds to nothing.
        for bad in [1e-9, 0.0, -1.0, 24.5, 1e15, f64::NAN, f64::INFINITY] {
            assert!(
                matches!(session_end(start, bad), Err(PlannerError::InvalidDuration(_))),
                "{} should be rejected",
                bad
            );
        }
    }
}
