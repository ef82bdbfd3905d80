//! crates/study_planner_core/src/progress.rs
//!
//! Completion metrics over sessions.

use crate::calendar::local_date;
use crate::domain::Session;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use std::collections::HashSet;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeeklyProgress {
    pub total: usize,
    pub completed: usize,
    /// Rounded to the nearest whole percent.
    pub percentage: u32,
    /// The week's sessions, in plan order.
    pub sessions: Vec<Session>,
}

pub fn weekly_progress(sessions: &[Session]) -> WeeklyProgress {
    let total = sessions.len();
    let completed = sessions.iter().filter(|s| s.completed).count();
    let percentage = if total == 0 {
        0
    } else {
        (completed as f64 / total as f64 * 100.0).round() as u32
    };
    WeeklyProgress {
        total,
        completed,
        percentage,
        sessions: sessions.to_vec(),
    }
}

/// Consecutive calendar days, ending today, with at least one completed
/// session. A session's day is its `actual_end`, else its `scheduled_end`.
pub fn study_streak<'a>(
    sessions: impl IntoIterator<Item = &'a Session>,
    now: &DateTime<FixedOffset>,
) -> u32 {
    let offset = now.offset();
    let studied: HashSet<NaiveDate> = sessions
        .into_iter()
        .filter(|s| s.completed)
        .map(|s| local_date(s.actual_end.unwrap_or(s.scheduled_end), offset))
        .collect();

    let mut streak = 0;
    let mut day = now.date_naive();
    while studied.contains(&day) {
        streak += 1;
        day = day - Duration::days(1);
    }
    streak
}
