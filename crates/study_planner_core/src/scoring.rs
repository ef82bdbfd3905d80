//! crates/study_planner_core/src/scoring.rs
//!
//! The three subject scoring strategies. They answer different questions and
//! are kept apart on purpose:
//!
//! - [`generation_score`]: which subjects fill a day when a week is generated.
//! - [`recommendation_score`]: "what should I study next", from history alone.
//! - [`adaptive_score`]: "what should I study now", from the live state of
//!   this week's sessions.
//!
//! All three are pure: no clock reads, no storage.

use crate::calendar::is_today;
use crate::domain::{Difficulty, Priority, Session, SessionStatus, Subject};
use chrono::{DateTime, FixedOffset};
use uuid::Uuid;

const MILLIS_PER_DAY: i64 = 86_400_000;

//=========================================================================================
// Generation Score
//=========================================================================================

fn difficulty_weight(difficulty: Difficulty) -> f64 {
    match difficulty {
        Difficulty::Easy => 1.0,
        Difficulty::Medium => 2.0,
        Difficulty::Hard => 3.0,
    }
}

fn priority_weight(priority: Priority) -> f64 {
    match priority {
        Priority::Low => 0.8,
        Priority::Medium => 1.0,
        Priority::High => 1.2,
    }
}

pub fn generation_score(subject: &Subject) -> f64 {
    difficulty_weight(subject.difficulty) * priority_weight(subject.priority)
}

//=========================================================================================
// Static Recommendation Score
//=========================================================================================

fn recommendation_multiplier(priority: Priority) -> f64 {
    match priority {
        Priority::High => 1.5,
        Priority::Medium => 1.0,
        Priority::Low => 0.7,
    }
}

fn difficulty_bonus(difficulty: Difficulty) -> f64 {
    match difficulty {
        Difficulty::Hard => 15.0,
        Difficulty::Medium => 5.0,
        Difficulty::Easy => 0.0,
    }
}

/// Whole days elapsed since the subject was last studied.
///
/// Elapsed wall-clock time floored to 24h units, not calendar-day boundaries.
/// A `last_studied` in the future counts as zero days.
pub fn days_since_studied(subject: &Subject, now: &DateTime<FixedOffset>) -> i64 {
    let elapsed = now.timestamp_millis() - subject.last_studied.timestamp_millis();
    elapsed.div_euclid(MILLIS_PER_DAY).max(0)
}

pub fn average_total_hours(subjects: &[Subject]) -> Option<f64> {
    if subjects.is_empty() {
        return None;
    }
    let sum: f64 = subjects.iter().map(|s| s.total_hours).sum();
    Some(sum / subjects.len() as f64)
}

/// Scores `subject` against the rest of the user's subjects.
pub fn recommendation_score(
    subject: &Subject,
    all_subjects: &[Subject],
    now: &DateTime<FixedOffset>,
) -> f64 {
    let mut score = days_since_studied(subject, now) as f64 * 10.0;
    score *= recommendation_multiplier(subject.priority);

    let average = average_total_hours(all_subjects).unwrap_or(subject.total_hours);
    if subject.total_hours < average {
        score += (average - subject.total_hours) * 5.0;
    }

    score += difficulty_bonus(subject.difficulty);
    score += subject.skips_this_week as f64 * 50.0;
    score
}

//=========================================================================================
// Adaptive Recommendation Score
//=========================================================================================

fn adaptive_multiplier(priority: Priority) -> f64 {
    match priority {
        Priority::High => 1.3,
        Priority::Medium => 1.0,
        Priority::Low => 0.8,
    }
}

/// How one subject is doing in the current week's sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubjectActivity {
    pub planned: usize,
    pub completed: usize,
    pub skipped_today: usize,
    pub completed_today: usize,
}

impl SubjectActivity {
    /// Tallies the sessions of `subject_id`. "Today" is judged by `scheduled_start`.
    pub fn collect(subject_id: Uuid, week_sessions: &[Session], now: &DateTime<FixedOffset>) -> Self {
        week_sessions
            .iter()
            .filter(|s| s.subject_id == subject_id)
            .fold(Self::default(), |mut acc, s| {
                acc.planned += 1;
                let today = is_today(s.scheduled_start, now);
                match s.status {
                    SessionStatus::Completed => {
                        acc.completed += 1;
                        if today {
                            acc.completed_today += 1;
                        }
                    }
                    SessionStatus::Skipped if today => acc.skipped_today += 1,
                    _ => {}
                }
                acc
            })
    }

    /// Completed over planned; zero when nothing is planned.
    pub fn completion_rate(&self) -> f64 {
        if self.planned == 0 {
            0.0
        } else {
            self.completed as f64 / self.planned as f64
        }
    }
}

pub fn adaptive_score(subject: &Subject, week_sessions: &[Session], now: &DateTime<FixedOffset>) -> f64 {
    let activity = SubjectActivity::collect(subject.id, week_sessions, now);

    let mut score = subject.skips_this_week as f64 * 100.0;
    if activity.skipped_today > 0 {
        score += 150.0;
    }
    if activity.planned > 0 && activity.completion_rate() < 0.5 {
        score += 80.0;
    }
    score *= adaptive_multiplier(subject.priority);

    // Damp rather than exclude: twice today is enough.
    if activity.completed_today >= 2 {
        score *= 0.3;
    }
    score
}

//=========================================================================================
// Strategy Selection
//=========================================================================================

/// The inputs a strategy may read. Strategies ignore what they don't need.
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub all_subjects: &'a [Subject],
    pub week_sessions: &'a [Session],
    pub now: &'a DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoringStrategy {
    Generation,
    StaticRecommendation,
    AdaptiveRecommendation,
}

impl ScoringStrategy {
    pub fn score(&self, subject: &Subject, ctx: &ScoringContext<'_>) -> f64 {
        match self {
            ScoringStrategy::Generation => generation_score(subject),
            ScoringStrategy::StaticRecommendation => {
                recommendation_score(subject, ctx.all_subjects, ctx.now)
            }
            ScoringStrategy::AdaptiveRecommendation => {
                adaptive_score(subject, ctx.week_sessions, ctx.now)
            }
        }
    }

    /// Scores every subject and orders them by descending score.
    /// Equal scores keep their input order.
    pub fn rank<'s>(&self, subjects: &'s [Subject], ctx: &ScoringContext<'_>) -> Vec<(&'s Subject, f64)> {
        let mut scored: Vec<(&Subject, f64)> =
            subjects.iter().map(|s| (s, self.score(s, ctx))).collect();
        // `sort_by` is stable.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::hours;
    use crate::domain::SessionDraft;
    use chrono::{Duration, TimeZone, Utc};

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2025, 3, 12, 15, 0, 0)
            .unwrap()
    }

    fn subject(name: &str, difficulty: Difficulty, priority: Priority) -> Subject {
        let created = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        Subject::new(Uuid::nil(), name, difficulty, priority, created).unwrap()
    }

    fn session_for(subject: &Subject, start_hour: u32, status: SessionStatus) -> Session {
        let start = Utc.with_ymd_and_hms(2025, 3, 12, start_hour, 0, 0).unwrap();
        let mut s = Session::from_draft(SessionDraft {
            subject_id: subject.id,
            subject_name: subject.name.clone(),
            scheduled_start: start,
            scheduled_end: start + hours(1.0),
            allocated: 1.0,
        });
        s.status = status;
        s.completed = status == SessionStatus::Completed;
        s
    }

    #[test]
    fn test_generation_score_table() {
        let hard_high = subject("Math", Difficulty::Hard, Priority::High);
        let easy_low = subject("Art", Difficulty::Easy, Priority::Low);
        let medium = subject("History", Difficulty::Medium, Priority::Medium);
        assert!((generation_score(&hard_high) - 3.6).abs() < 1e-9);
        assert!((generation_score(&easy_low) - 0.8).abs() < 1e-9);
        assert!((generation_score(&medium) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_days_since_studied_floors_elapsed_time() {
        let mut s = subject("Math", Difficulty::Hard, Priority::High);
        s.last_studied = now().with_timezone(&Utc) - Duration::hours(47);
        assert_eq!(days_since_studied(&s, &now()), 1);
        s.last_studied = now().with_timezone(&Utc) - Duration::hours(48);
        assert_eq!(days_since_studied(&s, &now()), 2);
        s.last_studied = now().with_timezone(&Utc) + Duration::hours(5);
        assert_eq!(days_since_studied(&s, &now()), 0);
    }

    #[test]
    fn test_recommendation_score_formula() {
        let mut behind = subject("Chemistry", Difficulty::Hard, Priority::High);
        behind.last_studied = now().with_timezone(&Utc) - Duration::days(3);
        behind.total_hours = 2.0;
        behind.skips_this_week = 1;
        let mut ahead = subject("Art", Difficulty::Easy, Priority::Low);
        ahead.last_studied = now().with_timezone(&Utc);
        ahead.total_hours = 10.0;

        let all = vec![behind.clone(), ahead.clone()];
        // 3 days * 10 * 1.5 = 45; average 6 -> +20; hard +15; one skip +50.
        assert!((recommendation_score(&behind, &all, &now()) - 130.0).abs() < 1e-9);
        // Studied today, above average, easy, no skips.
        assert_eq!(recommendation_score(&ahead, &all, &now()), 0.0);
    }

    #[test]
    fn test_recommendation_score_strictly_increases_with_skips() {
        let base = subject("Math", Difficulty::Medium, Priority::Low);
        let mut previous = f64::NEG_INFINITY;
        for skips in 0..5 {
            let mut s = base.clone();
            s.skips_this_week = skips;
            let score = recommendation_score(&s, std::slice::from_ref(&s), &now());
            assert!(score > previous, "score should grow with skips");
            previous = score;
        }
    }

    #[test]
    fn test_adaptive_score_rewards_skips_and_low_completion() {
        let mut s = subject("Math", Difficulty::Hard, Priority::High);
        s.skips_this_week = 1;
        let sessions = vec![
            session_for(&s, 9, SessionStatus::Skipped),
            session_for(&s, 18, SessionStatus::Scheduled),
        ];
        // (100 + 150 + 80) * 1.3
        assert!((adaptive_score(&s, &sessions, &now()) - 429.0).abs() < 1e-9);
    }

    #[test]
    fn test_adaptive_score_damps_twice_studied_subject() {
        let s = subject("Math", Difficulty::Hard, Priority::Medium);
        let sessions = vec![
            session_for(&s, 8, SessionStatus::Completed),
            session_for(&s, 10, SessionStatus::Completed),
            session_for(&s, 18, SessionStatus::Scheduled),
            session_for(&s, 20, SessionStatus::Scheduled),
            session_for(&s, 21, SessionStatus::Scheduled),
        ];
        // Completion 2/5 < 0.5 -> 80, then damped by 0.3.
        assert!((adaptive_score(&s, &sessions, &now()) - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_adaptive_score_ignores_other_subjects_sessions() {
        let a = subject("Math", Difficulty::Hard, Priority::Medium);
        let mut b = subject("Art", Difficulty::Easy, Priority::Medium);
        b.id = Uuid::new_v4();
        let sessions = vec![session_for(&b, 9, SessionStatus::Skipped)];
        assert_eq!(adaptive_score(&a, &sessions, &now()), 0.0);
        assert_eq!(SubjectActivity::collect(a.id, &sessions, &now()).completion_rate(), 0.0);
    }

    #[test]
    fn test_rank_is_stable_for_equal_scores() {
        let mut first = subject("First", Difficulty::Medium, Priority::Medium);
        first.id = Uuid::new_v4();
        let mut second = subject("Second", Difficulty::Medium, Priority::Medium);
        second.id = Uuid::new_v4();
        let mut top = subject("Top", Difficulty::Hard, Priority::High);
        top.id = Uuid::new_v4();
        let subjects = vec![first, second, top];
        let now = now();
        let ctx = ScoringContext {
            all_subjects: &subjects,
            week_sessions: &[],
            now: &now,
        };

        let ranked = ScoringStrategy::Generation.rank(&subjects, &ctx);
        let names: Vec<&str> = ranked.iter().map(|(s, _)| s.name.as_str()).collect();
        assert_eq!(names, vec!["Top", "First", "Second"]);
    }
}
