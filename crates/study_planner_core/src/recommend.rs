//! crates/study_planner_core/src/recommend.rs
//!
//! "What to study next" rankings built on the scoring strategies.

use crate::domain::{Session, Subject};
use crate::lifecycle::{refresh_week, SessionEvent, WeekRefresh};
use crate::scoring::{days_since_studied, ScoringContext, ScoringStrategy, SubjectActivity};
use chrono::{DateTime, FixedOffset};
use uuid::Uuid;

/// One entry of the static ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub subject: Subject,
    pub score: f64,
    pub days_since_studied: i64,
}

/// Ranks subjects by the history-only recommendation score.
pub fn rank_static(subjects: &[Subject], now: &DateTime<FixedOffset>) -> Vec<Recommendation> {
    let ctx = ScoringContext {
        all_subjects: subjects,
        week_sessions: &[],
        now,
    };
    ScoringStrategy::StaticRecommendation
        .rank(subjects, &ctx)
        .into_iter()
        .map(|(subject, score)| Recommendation {
            subject: subject.clone(),
            score,
            days_since_studied: days_since_studied(subject, now),
        })
        .collect()
}

/// One entry of the adaptive ranking, with the week activity behind its score.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveRecommendation {
    pub subject: Subject,
    pub score: f64,
    pub activity: SubjectActivity,
}

/// The adaptive ranking plus the state changes the caller must persist.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveRanking {
    pub recommendations: Vec<AdaptiveRecommendation>,
    pub sessions: Vec<Session>,
    pub subjects: Vec<Subject>,
    pub events: Vec<SessionEvent>,
    pub changed_subjects: Vec<Uuid>,
}

/// Ranks subjects by the live, session-aware score.
///
/// The week's sessions are re-evaluated first so that every skip and
/// activation up to `now` is reflected before anything is scored.
pub fn rank_recommendations(
    subjects: &[Subject],
    week_sessions: &[Session],
    now: &DateTime<FixedOffset>,
) -> AdaptiveRanking {
    let WeekRefresh {
        sessions,
        subjects,
        events,
        changed_subjects,
    } = refresh_week(subjects, week_sessions, now);

    let ctx = ScoringContext {
        all_subjects: &subjects,
        week_sessions: &sessions,
        now,
    };
    let recommendations = ScoringStrategy::AdaptiveRecommendation
        .rank(&subjects, &ctx)
        .into_iter()
        .map(|(subject, score)| AdaptiveRecommendation {
            subject: subject.clone(),
            score,
            activity: SubjectActivity::collect(subject.id, &sessions, now),
        })
        .collect();

    AdaptiveRanking {
        recommendations,
        sessions,
        subjects,
        events,
        changed_subjects,
    }
}
