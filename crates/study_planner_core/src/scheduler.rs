//! crates/study_planner_core/src/scheduler.rs
//!
//! Turns subjects plus the user's constraints into time-boxed session drafts.
//! Everything here is pure; persisting the drafts (and detecting that a plan
//! already exists) is the caller's job.

use crate::calendar::{
    at_local, hours, next_occurrence, parse_start_time, parse_weekday, session_end, DayOffsetPolicy,
};
use crate::domain::{Difficulty, SessionDraft, Subject};
use crate::error::PlannerError;
use crate::scoring::{ScoringContext, ScoringStrategy};
use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Weekday};

/// Gap left between two generated sessions on the same day.
pub const BREAK_MINUTES: i64 = 10;

/// The longest single block the generator gives a subject.
pub fn allocation_cap(difficulty: Difficulty) -> f64 {
    match difficulty {
        Difficulty::Hard => 2.0,
        Difficulty::Easy | Difficulty::Medium => 1.0,
    }
}

/// The user's constraints for a generated week.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleRequest {
    pub daily_hours: f64,
    pub start_time: NaiveTime,
    pub days: Vec<Weekday>,
}

impl ScheduleRequest {
    /// Builds a request from its wire form: "HH:MM" and weekday names.
    pub fn parse<S: AsRef<str>>(
        daily_hours: f64,
        start_time: &str,
        days: &[S],
    ) -> Result<Self, PlannerError> {
        let start_time = parse_start_time(start_time)?;
        let days = days
            .iter()
            .map(|d| parse_weekday(d.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            daily_hours,
            start_time,
            days,
        })
    }
}

/// Generates the session drafts for every requested day.
///
/// Subjects are ordered once by generation score (stable). Each day walks
/// that order, giving each subject `min(cap, remaining)` hours, separated by
/// a [`BREAK_MINUTES`] break, until the day's budget or the subjects run out.
/// A subject appears at most once per day. A non-positive budget yields no
/// sessions for the day, and a leftover that rounds to under a millisecond
/// ends it.
pub fn generate_schedule(
    subjects: &[Subject],
    request: &ScheduleRequest,
    now: &DateTime<FixedOffset>,
    policy: DayOffsetPolicy,
) -> Result<Vec<SessionDraft>, PlannerError> {
    if subjects.is_empty() {
        return Err(PlannerError::NoSubjects);
    }

    let ctx = ScoringContext {
        all_subjects: subjects,
        week_sessions: &[],
        now,
    };
    let ranked = ScoringStrategy::Generation.rank(subjects, &ctx);
    let today = now.date_naive();
    let mut drafts = Vec::new();

    for &day in &request.days {
        let date = next_occurrence(today, day, policy);
        let mut clock = at_local(date, request.start_time, now.offset());
        let mut remaining = request.daily_hours;

        for (subject, _) in &ranked {
            if remaining <= 0.0 {
                break;
            }
            let allocation = allocation_cap(subject.difficulty).min(remaining);
            if hours(allocation) <= Duration::zero() {
                break;
            }
            let end = session_end(clock, allocation)?;
            drafts.push(SessionDraft {
                subject_id: subject.id,
                subject_name: subject.name.clone(),
                scheduled_start: clock,
                scheduled_end: end,
                allocated: allocation,
            });
            clock = end + Duration::minutes(BREAK_MINUTES);
            remaining -= allocation;
        }
    }

    Ok(drafts)
}

/// Drafts a single user-placed session on the next `day` at `start_time`.
pub fn manual_session(
    subject: &Subject,
    day: Weekday,
    start_time: NaiveTime,
    duration: f64,
    now: &DateTime<FixedOffset>,
    policy: DayOffsetPolicy,
) -> Result<SessionDraft, PlannerError> {
    let date = next_occurrence(now.date_naive(), day, policy);
    let start = at_local(date, start_time, now.offset());
    let end = session_end(start, duration)?;
    Ok(SessionDraft {
        subject_id: subject.id,
        subject_name: subject.name.clone(),
        scheduled_start: start,
        scheduled_end: end,
        allocated: duration,
    })
}
